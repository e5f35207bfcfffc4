mod route_fetcher;

pub use route_fetcher::{RouteFetcher, RouteState, RouteTicket};

use async_channel::{Receiver, Sender};
use tokio::runtime::Handle;

use crate::{
    cache::MarkerCache,
    entities::{CategoryFilter, Marker, MarkerDraft, Route, Selection},
    error::{not_found_error, runtime_error, Error, ErrorKind},
    external::DynDirections,
    store::{DynMarkerStore, FileMarkerStore, Subscription},
};

/// User-visible alerts raised by the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    InvalidMarker(String),
    ProviderError(String),
    NoRouteFound,
    RouteUnavailable,
}

impl Notice {
    fn for_route_failure(err: &Error) -> Self {
        match err.kind() {
            ErrorKind::Provider => Self::ProviderError(err.message.clone()),
            ErrorKind::NoRoute => Self::NoRouteFound,
            _ => Self::RouteUnavailable,
        }
    }
}

/// What [`Planner::next_update`] processed.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    Markers { count: usize },
    Route,
    StaleRoute { generation: u64 },
    SubscriptionClosed,
}

enum Incoming {
    Snapshot(Option<Vec<Marker>>),
    Route(u64, Result<Route, Error>),
}

type RouteResult = (u64, Result<Route, Error>);

/// Client-side marker and route state.
///
/// One owner drives it through `&mut self`; directions calls run on spawned
/// tasks and come back through [`Planner::next_update`].
pub struct Planner {
    store: DynMarkerStore,
    directions: DynDirections,
    cache: MarkerCache,
    filter: CategoryFilter,
    selection: Selection,
    fetcher: RouteFetcher,
    subscription: Option<Subscription>,
    route_results: Receiver<RouteResult>,
    route_sender: Sender<RouteResult>,
    notices: Sender<Notice>,
}

impl Planner {
    pub fn new(store: DynMarkerStore, directions: DynDirections) -> (Self, Receiver<Notice>) {
        let (route_sender, route_results) = async_channel::unbounded();
        let (notices, notice_receiver) = async_channel::unbounded();

        let planner = Self {
            store,
            directions,
            cache: MarkerCache::new(),
            filter: CategoryFilter::All,
            selection: Selection::new(),
            fetcher: RouteFetcher::new(),
            subscription: None,
            route_results,
            route_sender,
            notices,
        };

        (planner, notice_receiver)
    }

    pub fn markers(&self) -> &[Marker] {
        self.cache.markers()
    }

    pub fn visible_markers(&self) -> Vec<&Marker> {
        self.cache.filtered(self.filter)
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn route(&self) -> Option<&Route> {
        self.fetcher.route()
    }

    pub fn route_state(&self) -> &RouteState {
        self.fetcher.state()
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribes to the store when it can push changes, otherwise lists once.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> Result<usize, Error> {
        match self.store.subscribe().await? {
            Some(subscription) => {
                let snapshot = subscription.next().await.unwrap_or_default();
                self.subscription = Some(subscription);
                self.apply_snapshot(snapshot);
            }
            None => {
                let markers = self.store.list_markers().await?;
                self.apply_snapshot(markers);
            }
        }

        tracing::info!("{} markers loaded", self.cache.len());

        Ok(self.cache.len())
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_marker(&mut self, draft: MarkerDraft) -> Result<String, Error> {
        let marker = match draft.validate() {
            Ok(marker) => marker,
            Err(err) => {
                self.notify(Notice::InvalidMarker(err.message.clone()));
                return Err(err);
            }
        };

        let id = self.store.create_marker(marker).await?;

        // live stores deliver the new collection through the subscription
        if self.subscription.is_none() {
            let markers = self.store.list_markers().await?;
            self.apply_snapshot(markers);
        }

        Ok(id)
    }

    /// Selects or deselects a cached marker and refreshes the route.
    ///
    /// Completing a pair spawns the directions call on the current tokio
    /// runtime; without one the route fails with an error instead.
    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, marker_id: &str) -> Result<&Selection, Error> {
        let marker = self
            .cache
            .get(marker_id)
            .cloned()
            .ok_or_else(not_found_error)?;

        self.selection.toggle(&marker);
        self.refresh_route()?;

        Ok(&self.selection)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.fetcher.select(&self.selection);
    }

    fn refresh_route(&mut self) -> Result<(), Error> {
        let ticket = match self.fetcher.select(&self.selection) {
            Some(ticket) => ticket,
            None => return Ok(()),
        };

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("cannot fetch route: {}", err);
                self.fetcher.resolve(ticket.generation, Err(runtime_error()));
                self.notify(Notice::RouteUnavailable);
                return Err(runtime_error());
            }
        };

        tracing::info!(
            "fetching route {} -> {} (generation {})",
            ticket.start.to_lng_lat(),
            ticket.end.to_lng_lat(),
            ticket.generation
        );

        let directions = self.directions.clone();
        let sender = self.route_sender.clone();

        runtime.spawn(async move {
            let result = directions.fetch_route(ticket.start, ticket.end).await;

            if sender.send((ticket.generation, result)).await.is_err() {
                tracing::debug!("planner dropped before route arrived");
            }
        });

        Ok(())
    }

    /// Waits for and applies the next snapshot or route result.
    pub async fn next_update(&mut self) -> Update {
        let incoming = tokio::select! {
            snapshot = next_snapshot(self.subscription.as_ref()) => Incoming::Snapshot(snapshot),
            Ok((generation, result)) = self.route_results.recv() => Incoming::Route(generation, result),
        };

        match incoming {
            Incoming::Snapshot(Some(markers)) => {
                self.apply_snapshot(markers);
                Update::Markers {
                    count: self.cache.len(),
                }
            }
            Incoming::Snapshot(None) => {
                tracing::warn!("marker subscription closed");
                self.subscription = None;
                Update::SubscriptionClosed
            }
            Incoming::Route(generation, result) => self.apply_route(generation, result),
        }
    }

    /// Processes updates until the current route request settles.
    pub async fn wait_for_route(&mut self) -> Option<&Route> {
        while self.fetcher.is_fetching() {
            self.next_update().await;
        }

        self.fetcher.route()
    }

    fn apply_route(&mut self, generation: u64, result: Result<Route, Error>) -> Update {
        if !self.fetcher.resolve(generation, result) {
            return Update::StaleRoute { generation };
        }

        match self.fetcher.state() {
            RouteState::Resolved(route) => tracing::info!(
                "route ready: {:.2} km, {} min",
                route.distance_km(),
                route.duration_minutes()
            ),
            RouteState::Failed(err) => {
                tracing::error!("route fetch failed: {}", err);
                self.notify(Notice::for_route_failure(err));
            }
            _ => {}
        }

        Update::Route
    }

    fn apply_snapshot(&mut self, markers: Vec<Marker>) {
        self.cache.replace(markers);
    }

    pub fn export(&self) -> Result<String, Error> {
        self.cache.export()
    }

    /// Replaces the store contents with an exported list and reloads from it.
    #[tracing::instrument(skip(self, json))]
    pub async fn import(&mut self, json: &str) -> Result<usize, Error> {
        let mut imported = MarkerCache::new();
        imported.replace(MarkerCache::parse_export(json)?);

        self.store
            .replace_markers(imported.markers().to_vec())
            .await?;

        let markers = self.store.list_markers().await?;
        self.apply_snapshot(markers);

        Ok(self.cache.len())
    }

    /// Copies the current markers into the local fallback slot.
    pub async fn mirror(&self, slot: &FileMarkerStore) -> Result<(), Error> {
        slot.replace_all(self.cache.markers()).await
    }

    fn notify(&self, notice: Notice) {
        tracing::warn!("notice: {:?}", notice);

        if self.notices.try_send(notice).is_err() {
            tracing::debug!("nobody is listening for notices");
        }
    }
}

async fn next_snapshot(subscription: Option<&Subscription>) -> Option<Vec<Marker>> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => futures::future::pending().await,
    }
}

#[cfg(test)]
mod tests;
