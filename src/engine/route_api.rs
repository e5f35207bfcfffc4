use super::Engine;

use async_trait::async_trait;
use serde_json::Value;

use crate::{api::RouteAPI, entities::Coordinates, error::Error};

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_route(&self, start: Coordinates, end: Coordinates) -> Result<Value, Error> {
        self.directions.directions(start, end).await
    }
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    use crate::error::ErrorKind;
    use crate::external::openroute::OpenRouteService;
    use crate::store::MemoryMarkerStore;
    use std::{sync::Arc, time::Duration};

    // nothing listens on the discard port
    let directions =
        OpenRouteService::new("http://127.0.0.1:9", "key", "driving-car", Duration::from_secs(1))
            .unwrap();
    let engine = Engine::new(Arc::new(MemoryMarkerStore::new()), directions);

    let err = engine
        .find_route(Coordinates::new(1.0, 2.0), Coordinates::new(3.0, 4.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}
