use async_trait::async_trait;
use serde_json::Value;

use crate::entities::{Coordinates, Marker, MarkerDraft};
use crate::error::Error;

#[async_trait]
pub trait MarkerAPI {
    async fn list_markers(&self) -> Result<Vec<Marker>, Error>;
    async fn create_marker(&self, draft: MarkerDraft) -> Result<Marker, Error>;
    async fn export_markers(&self) -> Result<String, Error>;
}

#[async_trait]
pub trait RouteAPI {
    /// Provider directions body for a driving route, passed through untouched.
    async fn find_route(&self, start: Coordinates, end: Coordinates) -> Result<Value, Error>;
}

pub trait API: MarkerAPI + RouteAPI {}
