pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod engine;
pub mod entities;
pub mod error;
pub mod external;
pub mod planner;
pub mod server;
pub mod store;

#[cfg(test)]
mod testing;
