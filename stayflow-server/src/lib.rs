use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
};

use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod auth;
mod bookings;
mod context;
mod docs;
mod errors;
mod friends;
mod listings;
mod logging;
mod notifications;
mod reviews;
mod schemas;
mod serialized;

pub use context::ServerContext;
pub use logging::init_logger;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Port must be a number")]
    InvalidPort,
    #[error("Could not listen on {0}: {1}")]
    Bind(SocketAddr, std::io::Error),
    #[error("Server stopped unexpectedly: {0}")]
    Serve(std::io::Error),
}

/// Starts the StayFlow server
pub async fn run_server(context: ServerContext) -> Result<(), ServeError> {
    let port = match env::var("STAYFLOW_SERVER_PORT") {
        Ok(raw) => raw.parse::<u16>().map_err(|_| ServeError::InvalidPort)?,
        Err(_) => DEFAULT_PORT,
    };

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/listings", listings::router())
        .nest("/hosts", listings::hosts_router())
        .nest("/favorites", listings::favorites_router())
        .nest("/bookings", bookings::router())
        .nest("/reviews", reviews::router())
        .nest("/notifications", notifications::router())
        .nest("/friends", friends::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServeError::Bind(addr, e))?;

    log::info!("Listening on {}", addr);

    axum::serve(listener, root_router.into_make_service())
        .await
        .map_err(ServeError::Serve)
}
