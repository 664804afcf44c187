//! lovebot-server - HTTP shell for lovebot.
//!
//! Exposes the decision core to a chat transport over HTTP: the transport
//! posts each inbound message and sends whatever comes back.
//!
//! # Example
//!
//! ```ignore
//! use lovebot_server::{create_server, AppState};
//!
//! let state = AppState::new(Arc::new(orchestrator));
//! let app = create_server(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
