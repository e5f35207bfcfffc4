pub mod markers;
pub mod routes;
