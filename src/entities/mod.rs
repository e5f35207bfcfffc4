mod coordinates;
mod marker;
mod route;
mod selection;

pub use coordinates::Coordinates;
pub use marker::{Category, CategoryFilter, Marker, MarkerDraft, NewMarker, DEFAULT_TITLE};
pub use route::Route;
pub use selection::Selection;
