//! Interactive filter console for logtree
//!
//! This crate provides the terminal user interface used to inspect and
//! change a live filter tree: state management, keybindings, event
//! handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, InputMode, NamespaceFilter, Notice, Screen, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{
    FilterTable, HelpOverlay, InputBar, StatusBar, console_hints, viewer_hints,
};
pub use ui::screens::{FilterConsoleScreen, ProbeViewerScreen};
pub use ui::{Layout, Theme};
