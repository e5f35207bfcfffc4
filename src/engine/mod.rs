mod marker_api;
mod route_api;

use crate::{api::API, external::openroute::OpenRouteService, store::DynMarkerStore};

pub struct Engine {
    store: DynMarkerStore,
    directions: OpenRouteService,
}

impl Engine {
    pub fn new(store: DynMarkerStore, directions: OpenRouteService) -> Self {
        Self { store, directions }
    }
}

impl API for Engine {}
