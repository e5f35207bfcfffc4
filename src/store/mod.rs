mod file;
mod memory;
mod postgres;

pub use file::{FileMarkerStore, MARKERS_KEY};
pub use memory::MemoryMarkerStore;
pub use postgres::PgMarkerStore;

#[cfg(test)]
pub(crate) use file::scratch_dir;

use async_trait::async_trait;
use async_channel::Receiver;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::{
    entities::{Marker, NewMarker},
    error::Error,
};

/// Remote document collection holding the markers.
///
/// Category membership is checked before anything reaches a store: writes only
/// accept a [`NewMarker`], which can only be built from a validated draft or an
/// existing marker.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn list_markers(&self) -> Result<Vec<Marker>, Error>;

    /// Persists the marker and returns the id assigned by the store.
    async fn create_marker(&self, marker: NewMarker) -> Result<String, Error>;

    /// Replaces the whole collection, keeping the given ids where the backend
    /// can represent them.
    async fn replace_markers(&self, markers: Vec<Marker>) -> Result<(), Error>;

    /// Live snapshots of the whole collection, when the backend can push them.
    async fn subscribe(&self) -> Result<Option<Subscription>, Error> {
        Ok(None)
    }
}

pub type DynMarkerStore = Arc<dyn MarkerStore>;

/// Stream of full collection snapshots. Dropping it unsubscribes.
pub struct Subscription {
    receiver: Receiver<Vec<Marker>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(receiver: Receiver<Vec<Marker>>, task: Option<JoinHandle<()>>) -> Self {
        Self { receiver, task }
    }

    /// Next snapshot, or `None` once the store side has gone away.
    pub async fn next(&self) -> Option<Vec<Marker>> {
        self.receiver.recv().await.ok()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
