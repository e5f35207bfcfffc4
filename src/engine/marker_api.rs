use super::Engine;

use async_trait::async_trait;

use crate::{
    api::MarkerAPI,
    cache::MarkerCache,
    entities::{Marker, MarkerDraft},
    error::Error,
};

#[async_trait]
impl MarkerAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_markers(&self) -> Result<Vec<Marker>, Error> {
        self.store.list_markers().await
    }

    #[tracing::instrument(skip(self))]
    async fn create_marker(&self, draft: MarkerDraft) -> Result<Marker, Error> {
        let marker = draft.validate()?;
        let id = self.store.create_marker(marker.clone()).await?;

        tracing::info!("created marker {}", id);

        Ok(marker.with_id(id))
    }

    #[tracing::instrument(skip(self))]
    async fn export_markers(&self) -> Result<String, Error> {
        let mut cache = MarkerCache::new();
        cache.replace(self.store.list_markers().await?);

        cache.export()
    }
}

#[cfg(test)]
fn engine_with(store: crate::store::MemoryMarkerStore) -> Engine {
    use crate::external::openroute::OpenRouteService;
    use std::{sync::Arc, time::Duration};

    let directions =
        OpenRouteService::new("http://127.0.0.1:9", "key", "driving-car", Duration::from_secs(1))
            .unwrap();

    Engine::new(Arc::new(store), directions)
}

#[tokio::test]
async fn create_assigns_id_and_lists() {
    use crate::entities::Category;
    use crate::store::MemoryMarkerStore;

    let engine = engine_with(MemoryMarkerStore::new());

    let marker = engine
        .create_marker(MarkerDraft {
            lat: 40.4168,
            lng: -3.7038,
            title: "".into(),
            category: "Restaurant".into(),
        })
        .await
        .unwrap();

    assert!(!marker.id.is_empty());
    assert_eq!(marker.title, crate::entities::DEFAULT_TITLE);

    let markers = engine.list_markers().await.unwrap();
    assert_eq!(markers, vec![marker]);
    assert_eq!(markers[0].category, Category::Restaurant);
}

#[tokio::test]
async fn invalid_category_is_not_stored() {
    use crate::error::ErrorKind;
    use crate::store::MemoryMarkerStore;

    let engine = engine_with(MemoryMarkerStore::new());

    let err = engine
        .create_marker(MarkerDraft {
            lat: 0.0,
            lng: 0.0,
            title: "x".into(),
            category: "Beach".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.list_markers().await.unwrap().is_empty());
}

#[tokio::test]
async fn export_is_a_json_array() {
    use crate::entities::Category;
    use crate::store::MemoryMarkerStore;

    let marker = Marker {
        id: "m1".into(),
        lat: 1.0,
        lng: 2.0,
        title: "t".into(),
        category: Category::Parc,
    };
    let engine = engine_with(MemoryMarkerStore::with_markers(vec![marker.clone()]));

    let json = engine.export_markers().await.unwrap();

    assert_eq!(MarkerCache::parse_export(&json).unwrap(), vec![marker]);
}
