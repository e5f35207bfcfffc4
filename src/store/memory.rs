use async_channel::Sender;
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{MarkerStore, Subscription};
use crate::{
    entities::{Marker, NewMarker},
    error::Error,
};

/// In-process collection with live snapshots.
#[derive(Default)]
pub struct MemoryMarkerStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    markers: Vec<Marker>,
    subscribers: Vec<Sender<Vec<Marker>>>,
}

impl Inner {
    fn publish(&mut self) {
        let snapshot = self.markers.clone();
        self.subscribers
            .retain(|subscriber| subscriber.try_send(snapshot.clone()).is_ok());
    }
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(markers: Vec<Marker>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                markers,
                subscribers: vec![],
            }),
        }
    }
}

#[async_trait]
impl MarkerStore for MemoryMarkerStore {
    async fn list_markers(&self) -> Result<Vec<Marker>, Error> {
        Ok(self.inner.lock().await.markers.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn create_marker(&self, marker: NewMarker) -> Result<String, Error> {
        let id = Uuid::new_v4().to_string();

        let mut inner = self.inner.lock().await;
        inner.markers.push(marker.with_id(id.clone()));
        inner.publish();

        Ok(id)
    }

    #[tracing::instrument(skip(self, markers), fields(count = markers.len()))]
    async fn replace_markers(&self, markers: Vec<Marker>) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        inner.markers = markers;
        inner.publish();

        Ok(())
    }

    async fn subscribe(&self) -> Result<Option<Subscription>, Error> {
        let (sender, receiver) = async_channel::unbounded();

        let mut inner = self.inner.lock().await;
        sender
            .try_send(inner.markers.clone())
            .map_err(|_| crate::error::unexpected_error())?;
        inner.subscribers.push(sender);

        Ok(Some(Subscription::new(receiver, None)))
    }
}

#[tokio::test]
async fn subscribers_get_full_snapshots() {
    use crate::entities::Category;

    let store = MemoryMarkerStore::new();
    let subscription = store.subscribe().await.unwrap().unwrap();

    assert_eq!(subscription.next().await.unwrap(), vec![]);

    let draft = NewMarker {
        lat: 1.0,
        lng: 2.0,
        title: "first".into(),
        category: Category::Parc,
    };
    let first = store.create_marker(draft.clone()).await.unwrap();
    let second = store.create_marker(draft).await.unwrap();

    let snapshot = subscription.next().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, first);

    let snapshot = subscription.next().await.unwrap();
    let ids: Vec<_> = snapshot.iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn dropped_subscriptions_are_pruned() {
    use crate::entities::Category;

    let store = MemoryMarkerStore::new();
    let subscription = store.subscribe().await.unwrap().unwrap();
    subscription.unsubscribe();

    store
        .create_marker(NewMarker {
            lat: 0.0,
            lng: 0.0,
            title: "x".into(),
            category: Category::Subway,
        })
        .await
        .unwrap();

    assert!(store.inner.lock().await.subscribers.is_empty());
}
