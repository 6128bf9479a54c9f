//! Application state and actions

mod action;
mod search;
mod state;

pub use action::Action;
pub use search::NamespaceFilter;
pub use state::{AppState, InputMode, Notice, Screen, UiState};
