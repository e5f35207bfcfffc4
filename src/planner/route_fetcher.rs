use crate::{
    entities::{Coordinates, Route, Selection},
    error::Error,
};

#[derive(Clone, Debug, PartialEq)]
pub enum RouteState {
    Idle,
    Fetching { generation: u64 },
    Resolved(Route),
    Failed(Error),
}

impl Default for RouteState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Request issued for one selection change.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteTicket {
    pub generation: u64,
    pub start: Coordinates,
    pub end: Coordinates,
}

/// Route state driven by selection changes.
///
/// Every selection change bumps the generation. Only a result carrying the
/// current generation is ever applied, so an answer for an older selection
/// cannot overwrite the route of a newer one.
#[derive(Debug, Default)]
pub struct RouteFetcher {
    generation: u64,
    state: RouteState,
}

impl RouteFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    pub fn route(&self) -> Option<&Route> {
        match &self.state {
            RouteState::Resolved(route) => Some(route),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.state, RouteState::Fetching { .. })
    }

    /// Returns the request to issue, if the selection now holds two endpoints.
    pub fn select(&mut self, selection: &Selection) -> Option<RouteTicket> {
        self.generation += 1;

        match selection.endpoints() {
            Some((start, end)) => {
                self.state = RouteState::Fetching {
                    generation: self.generation,
                };

                Some(RouteTicket {
                    generation: self.generation,
                    start: start.coordinates(),
                    end: end.coordinates(),
                })
            }
            None => {
                self.state = RouteState::Idle;
                None
            }
        }
    }

    /// Applies a fetch result. Returns `false` when the result is stale.
    pub fn resolve(&mut self, generation: u64, result: Result<Route, Error>) -> bool {
        if generation != self.generation || !self.is_fetching() {
            tracing::debug!(
                "discarding route result for generation {} (current {})",
                generation,
                self.generation
            );
            return false;
        }

        self.state = match result {
            Ok(route) => RouteState::Resolved(route),
            Err(err) => RouteState::Failed(err),
        };

        true
    }
}

#[cfg(test)]
fn marker(id: &str, lat: f64, lng: f64) -> crate::entities::Marker {
    use crate::entities::{Category, Marker};

    Marker {
        id: id.into(),
        lat,
        lng,
        title: id.into(),
        category: Category::Restaurant,
    }
}

#[test]
fn two_endpoints_issue_a_ticket() {
    let mut fetcher = RouteFetcher::new();
    let mut selection = Selection::new();

    selection.toggle(&marker("a", 1.0, 2.0));
    assert!(fetcher.select(&selection).is_none());
    assert_eq!(fetcher.state(), &RouteState::Idle);

    selection.toggle(&marker("b", 3.0, 4.0));
    let ticket = fetcher.select(&selection).unwrap();
    assert_eq!(ticket.start, Coordinates::new(1.0, 2.0));
    assert_eq!(ticket.end, Coordinates::new(3.0, 4.0));
    assert!(fetcher.is_fetching());

    assert!(fetcher.resolve(ticket.generation, Ok(Route::new(1.0, 2.0, vec![]))));
    assert_eq!(fetcher.route().unwrap().distance_meters, 1.0);
}

#[test]
fn stale_results_are_discarded() {
    let mut fetcher = RouteFetcher::new();
    let mut selection = Selection::new();

    selection.toggle(&marker("a", 1.0, 1.0));
    selection.toggle(&marker("b", 2.0, 2.0));
    let first = fetcher.select(&selection).unwrap();

    selection.toggle(&marker("c", 3.0, 3.0));
    fetcher.select(&selection);
    selection.toggle(&marker("b", 2.0, 2.0));
    let second = fetcher.select(&selection).unwrap();

    assert!(fetcher.resolve(second.generation, Ok(Route::new(2.0, 0.0, vec![]))));
    assert!(!fetcher.resolve(first.generation, Ok(Route::new(1.0, 0.0, vec![]))));
    assert_eq!(fetcher.route().unwrap().distance_meters, 2.0);
}

#[test]
fn shrinking_selection_clears_route() {
    let mut fetcher = RouteFetcher::new();
    let mut selection = Selection::new();

    selection.toggle(&marker("a", 1.0, 1.0));
    selection.toggle(&marker("b", 2.0, 2.0));
    let ticket = fetcher.select(&selection).unwrap();
    fetcher.resolve(ticket.generation, Ok(Route::new(1.0, 0.0, vec![])));

    selection.toggle(&marker("b", 2.0, 2.0));
    assert!(fetcher.select(&selection).is_none());
    assert!(fetcher.route().is_none());

    // a late duplicate for the old ticket must not resurrect it
    assert!(!fetcher.resolve(ticket.generation, Ok(Route::new(1.0, 0.0, vec![]))));
}

#[test]
fn failures_clear_the_route() {
    use crate::error::no_route_error;

    let mut fetcher = RouteFetcher::new();
    let mut selection = Selection::new();

    selection.toggle(&marker("a", 1.0, 1.0));
    selection.toggle(&marker("b", 2.0, 2.0));
    let ticket = fetcher.select(&selection).unwrap();

    assert!(fetcher.resolve(ticket.generation, Err(no_route_error())));
    assert!(fetcher.route().is_none());
    assert_eq!(fetcher.state(), &RouteState::Failed(no_route_error()));
}
