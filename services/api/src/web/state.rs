//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use newcomer_core::ports::DatabaseService;
use newcomer_core::ProfileService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Used directly for auth sessions; profile writes go through `profiles`.
    pub db: Arc<dyn DatabaseService>,
    pub profiles: ProfileService,
    pub config: Arc<Config>,
}
