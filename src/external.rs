pub mod directions;
pub mod openroute;

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    entities::{Coordinates, Route},
    error::Error,
};

/// Source of driving routes between two points.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn fetch_route(&self, start: Coordinates, end: Coordinates) -> Result<Route, Error>;
}

pub type DynDirections = Arc<dyn DirectionsProvider>;
