//! HTTP surface: health check, WebSocket upgrade and static assets

pub mod routes;

pub use routes::build_router;
