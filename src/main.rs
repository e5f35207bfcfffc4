use std::sync::Arc;

use lightnav::config::Config;
use lightnav::db::PgPool;
use lightnav::engine::Engine;
use lightnav::error::Error;
use lightnav::external::openroute::OpenRouteService;
use lightnav::server::serve;
use lightnav::store::{DynMarkerStore, FileMarkerStore, PgMarkerStore};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let store: DynMarkerStore = match &config.database_url {
        Some(url) => {
            let PgPool(pool) = PgPool::new(url, config.max_connections).await?;
            Arc::new(PgMarkerStore::new(pool).await?)
        }
        None => {
            let store = FileMarkerStore::new(&config.markers_dir);
            tracing::info!("no database configured, keeping markers in {:?}", store.path());
            Arc::new(store)
        }
    };

    let directions = OpenRouteService::new(
        config.openroute_api_base.clone(),
        config.openroute_api_key.clone(),
        config.profile.clone(),
        config.route_timeout,
    )?;

    serve(Engine::new(store, directions), config.listen_addr).await
}
