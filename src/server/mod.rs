mod assets;
mod routes;

pub use routes::{AppState, BroadcastSink, router, serve, status_for};
