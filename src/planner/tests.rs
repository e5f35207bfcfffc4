use super::*;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::entities::{Category, Coordinates};
use crate::error::{format_error, no_route_error, provider_error};
use crate::external::DirectionsProvider;
use crate::store::{MarkerStore, MemoryMarkerStore};

/// Routes from a start at latitude 1 are held until `release` is notified;
/// some end latitudes trigger canned failures.
#[derive(Default)]
struct ScriptedDirections {
    calls: AtomicUsize,
    release: Notify,
}

#[async_trait]
impl DirectionsProvider for ScriptedDirections {
    async fn fetch_route(&self, start: Coordinates, end: Coordinates) -> Result<Route, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if start.lat == 1.0 {
            self.release.notified().await;
        }

        match end.lat as i64 {
            9 => Err(provider_error("quota exceeded")),
            8 => Err(no_route_error()),
            7 => Err(format_error("content type \"text/html\"")),
            _ => Ok(Route::new(start.lat * 1000.0, 120.0, vec![start, end])),
        }
    }
}

fn marker(id: &str, lat: f64, category: Category) -> Marker {
    Marker {
        id: id.into(),
        lat,
        lng: lat + 10.0,
        title: id.into(),
        category,
    }
}

fn draft(category: &str) -> MarkerDraft {
    MarkerDraft {
        lat: 40.4168,
        lng: -3.7038,
        title: "Puerta del Sol".into(),
        category: category.into(),
    }
}

async fn planner_with(
    markers: Vec<Marker>,
) -> (Planner, Receiver<Notice>, Arc<ScriptedDirections>) {
    let directions = Arc::new(ScriptedDirections::default());
    let store = Arc::new(MemoryMarkerStore::with_markers(markers));

    let (mut planner, notices) = Planner::new(store, directions.clone());
    planner.load().await.unwrap();

    (planner, notices, directions)
}

#[tokio::test]
async fn live_store_updates_through_subscription() {
    let (mut planner, _notices, _) = planner_with(vec![]).await;
    assert!(planner.is_live());

    let id = planner.add_marker(draft("Subway")).await.unwrap();
    assert_eq!(planner.next_update().await, Update::Markers { count: 1 });

    assert_eq!(planner.markers()[0].id, id);
    assert_eq!(planner.markers()[0].category, Category::Subway);
}

#[tokio::test]
async fn polling_store_relists_after_create() {
    let dir = crate::store::scratch_dir();
    let store = Arc::new(FileMarkerStore::new(&dir));
    let (mut planner, _notices) = Planner::new(store, Arc::new(ScriptedDirections::default()));

    assert_eq!(planner.load().await.unwrap(), 0);
    assert!(!planner.is_live());

    let id = planner.add_marker(draft("Parc")).await.unwrap();
    assert_eq!(planner.markers().len(), 1);
    assert_eq!(planner.markers()[0].id, id);

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn invalid_category_never_reaches_the_store() {
    let store = Arc::new(MemoryMarkerStore::new());
    let (mut planner, notices) = Planner::new(store.clone(), Arc::new(ScriptedDirections::default()));
    planner.load().await.unwrap();

    let err = planner.add_marker(draft("Beach")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(notices.try_recv(), Ok(Notice::InvalidMarker(_))));
    assert!(store.list_markers().await.unwrap().is_empty());
    assert!(planner.markers().is_empty());
}

#[tokio::test]
async fn two_selected_markers_produce_a_route() {
    let (mut planner, _notices, _) = planner_with(vec![
        marker("a", 2.0, Category::Museum),
        marker("b", 3.0, Category::Parc),
    ])
    .await;

    planner.toggle("a").unwrap();
    assert_eq!(planner.route_state(), &RouteState::Idle);

    planner.toggle("b").unwrap();
    let route = planner.wait_for_route().await.unwrap();

    assert_eq!(route.distance_meters, 2000.0);
    assert_eq!(
        route.coordinates,
        vec![Coordinates::new(2.0, 12.0), Coordinates::new(3.0, 13.0)]
    );
}

#[tokio::test]
async fn latest_selection_wins_over_slow_response() {
    let (mut planner, _notices, directions) = planner_with(vec![
        marker("a", 1.0, Category::Museum),
        marker("b", 2.0, Category::Parc),
        marker("c", 3.0, Category::Airport),
    ])
    .await;

    // [a, b] is held back until released
    planner.toggle("a").unwrap();
    planner.toggle("b").unwrap();
    let stale_generation = planner.fetcher.generation();

    // third pick resets to [c], then [c, b] answers quickly
    planner.toggle("c").unwrap();
    planner.toggle("b").unwrap();

    let route = planner.wait_for_route().await.unwrap();
    assert_eq!(route.distance_meters, 3000.0);

    directions.release.notify_one();
    assert_eq!(
        planner.next_update().await,
        Update::StaleRoute {
            generation: stale_generation
        }
    );
    assert_eq!(planner.route().unwrap().distance_meters, 3000.0);
}

#[tokio::test]
async fn deselecting_clears_route_without_a_call() {
    let (mut planner, _notices, directions) = planner_with(vec![
        marker("a", 2.0, Category::Museum),
        marker("b", 3.0, Category::Parc),
    ])
    .await;

    planner.toggle("a").unwrap();
    planner.toggle("b").unwrap();
    assert!(planner.wait_for_route().await.is_some());
    assert_eq!(directions.calls.load(Ordering::SeqCst), 1);

    planner.toggle("b").unwrap();
    assert!(planner.route().is_none());
    assert_eq!(planner.route_state(), &RouteState::Idle);

    planner.clear_selection();
    assert!(planner.selection().is_empty());
    assert_eq!(directions.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failures_raise_distinct_notices() {
    let (mut planner, notices, _) = planner_with(vec![
        marker("start", 2.0, Category::Restaurant),
        marker("provider", 9.0, Category::Parc),
        marker("nowhere", 8.0, Category::Parc),
        marker("html", 7.0, Category::Parc),
    ])
    .await;

    let cases = [
        ("provider", Notice::ProviderError("quota exceeded".into())),
        ("nowhere", Notice::NoRouteFound),
        ("html", Notice::RouteUnavailable),
    ];

    for (end, expected) in cases {
        planner.clear_selection();
        planner.toggle("start").unwrap();
        planner.toggle(end).unwrap();

        assert!(planner.wait_for_route().await.is_none());
        assert!(matches!(planner.route_state(), RouteState::Failed(_)));
        assert_eq!(notices.try_recv().unwrap(), expected);
    }
}

#[tokio::test]
async fn unknown_marker_cannot_be_selected() {
    let (mut planner, _notices, _) = planner_with(vec![marker("a", 1.0, Category::Museum)]).await;

    let err = planner.toggle("missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(planner.selection().is_empty());
}

#[tokio::test]
async fn filter_projects_visible_markers() {
    let (mut planner, _notices, _) = planner_with(vec![
        marker("a", 1.0, Category::Museum),
        marker("b", 2.0, Category::Parc),
        marker("c", 3.0, Category::Museum),
    ])
    .await;

    planner.set_filter(CategoryFilter::Only(Category::Museum));
    let visible: Vec<&str> = planner
        .visible_markers()
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(visible, vec!["a", "c"]);

    planner.set_filter(CategoryFilter::All);
    assert_eq!(planner.visible_markers().len(), 3);
}

#[tokio::test]
async fn export_mirror_and_reload() {
    let (planner, _notices, _) = planner_with(vec![
        marker("a", 1.0, Category::Museum),
        marker("b", 2.0, Category::Airport),
    ])
    .await;

    let json = planner.export().unwrap();

    let dir = crate::store::scratch_dir();
    let slot = Arc::new(FileMarkerStore::new(&dir));
    planner.mirror(&slot).await.unwrap();

    let (mut reloaded, _notices) = Planner::new(slot, Arc::new(ScriptedDirections::default()));
    reloaded.load().await.unwrap();
    assert_eq!(reloaded.markers(), planner.markers());

    let (mut imported, _notices, _) = planner_with(vec![]).await;
    assert_eq!(imported.import(&json).await.unwrap(), 2);
    assert_eq!(imported.markers(), planner.markers());

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn imported_markers_survive_later_creates() {
    let dir = crate::store::scratch_dir();
    let store = Arc::new(FileMarkerStore::new(&dir));
    let (mut planner, _notices) = Planner::new(store.clone(), Arc::new(ScriptedDirections::default()));
    planner.load().await.unwrap();

    let mut exported = MarkerCache::new();
    exported.replace(vec![
        marker("a", 1.0, Category::Museum),
        marker("b", 2.0, Category::Airport),
    ]);
    let json = exported.export().unwrap();

    assert_eq!(planner.import(&json).await.unwrap(), 2);
    let id = planner.add_marker(draft("Subway")).await.unwrap();

    let ids: Vec<&str> = planner.markers().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", id.as_str()]);
    assert_eq!(store.list_markers().await.unwrap().len(), 3);

    tokio::fs::remove_dir_all(dir).await.unwrap();
}

#[tokio::test]
async fn live_store_keeps_imported_markers() {
    let (mut planner, _notices, _) = planner_with(vec![marker("old", 2.0, Category::Parc)]).await;

    let mut exported = MarkerCache::new();
    exported.replace(vec![marker("a", 2.0, Category::Museum)]);
    planner.import(&exported.export().unwrap()).await.unwrap();

    planner.add_marker(draft("Subway")).await.unwrap();

    // the replace snapshot, then the create snapshot
    assert_eq!(planner.next_update().await, Update::Markers { count: 1 });
    assert_eq!(planner.next_update().await, Update::Markers { count: 2 });
    assert_eq!(planner.markers()[0].id, "a");
}

#[test]
fn toggle_without_runtime_fails_the_route() {
    use tokio_test::block_on;

    let store = Arc::new(MemoryMarkerStore::with_markers(vec![
        marker("a", 2.0, Category::Museum),
        marker("b", 3.0, Category::Parc),
    ]));
    let (mut planner, notices) = Planner::new(store, Arc::new(ScriptedDirections::default()));
    block_on(planner.load()).unwrap();

    let handle = std::thread::spawn(move || {
        planner.toggle("a").unwrap();
        let err = planner.toggle("b").unwrap_err();

        (err, planner.route_state().clone(), planner.selection().len())
    });
    let (err, state, selected) = handle.join().unwrap();

    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert!(matches!(state, RouteState::Failed(_)));
    assert_eq!(selected, 2);
    assert_eq!(notices.try_recv().unwrap(), Notice::RouteUnavailable);
}
