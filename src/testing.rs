use axum::Router;
use std::net::SocketAddr;

/// Serves `app` on an ephemeral local port for the duration of the test runtime.
pub(crate) async fn spawn_app(app: Router) -> SocketAddr {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(app.into_make_service());
    let addr = server.local_addr();

    tokio::spawn(server);

    addr
}
