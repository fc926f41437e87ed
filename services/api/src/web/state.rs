//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use nexskill_core::ports::{DatabaseService, QuestionRepository};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Both ports are implemented by the same database adapter; they are held
/// separately so the quiz editor only ever sees its narrow collaborator.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub questions: Arc<dyn QuestionRepository>,
    pub config: Arc<Config>,
}
