use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::MarkerStore;
use crate::{
    entities::{Marker, NewMarker},
    error::Error,
};

/// Fixed name of the local slot holding the marker list.
pub const MARKERS_KEY: &str = "markers";

/// Local persistence fallback used when no remote store is configured. The whole
/// list lives in one JSON file; there is no change feed.
pub struct FileMarkerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMarkerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", MARKERS_KEY)),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[tracing::instrument(skip(self, markers), fields(count = markers.len()))]
    pub async fn replace_all(&self, markers: &[Marker]) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        self.write(markers).await
    }

    async fn read(&self) -> Result<Vec<Marker>, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(crate::error::store_error),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, markers: &[Marker]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(markers).map_err(crate::error::store_error)?;
        tokio::fs::write(&self.path, bytes).await?;

        Ok(())
    }
}

#[async_trait]
impl MarkerStore for FileMarkerStore {
    #[tracing::instrument(skip(self))]
    async fn list_markers(&self) -> Result<Vec<Marker>, Error> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    #[tracing::instrument(skip(self))]
    async fn create_marker(&self, marker: NewMarker) -> Result<String, Error> {
        let _guard = self.lock.lock().await;

        let mut markers = self.read().await?;
        let id = Uuid::new_v4().to_string();
        markers.push(marker.with_id(id.clone()));
        self.write(&markers).await?;

        Ok(id)
    }

    async fn replace_markers(&self, markers: Vec<Marker>) -> Result<(), Error> {
        self.replace_all(&markers).await
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("lightnav-{}", Uuid::new_v4()))
}

#[tokio::test]
async fn missing_slot_lists_empty() {
    let store = FileMarkerStore::new(scratch_dir());

    assert!(store.list_markers().await.unwrap().is_empty());
    assert!(store.subscribe().await.unwrap().is_none());
}

#[tokio::test]
async fn created_markers_survive_reopening() {
    use crate::entities::Category;

    let dir = scratch_dir();
    let store = FileMarkerStore::new(&dir);
    assert!(store.path().ends_with("markers.json"));

    let id = store
        .create_marker(NewMarker {
            lat: 48.85,
            lng: 2.35,
            title: "Louvre".into(),
            category: Category::Museum,
        })
        .await
        .unwrap();

    let reopened = FileMarkerStore::new(&dir);
    let markers = reopened.list_markers().await.unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].id, id);
    assert_eq!(markers[0].category, Category::Museum);

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn corrupt_slot_is_a_store_error() {
    use crate::error::ErrorKind;

    let dir = scratch_dir();
    let store = FileMarkerStore::new(&dir);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(store.path(), b"<html>").await.unwrap();

    assert_eq!(store.list_markers().await.unwrap_err().kind(), ErrorKind::Remote);

    tokio::fs::remove_dir_all(dir).await.unwrap();
}
