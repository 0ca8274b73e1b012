pub mod auth;
pub mod documents;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod training;

// Re-export what the binary needs to build the web server.
pub use middleware::require_auth;
pub use rest::{router, ApiDoc};
pub use state::AppState;
