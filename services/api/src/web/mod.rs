pub mod auth;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod router;
pub mod state;

// Re-export what the binary needs to build the web server.
pub use middleware::require_auth;
pub use router::build_router;
pub use state::AppState;
