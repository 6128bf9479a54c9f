mod filter_table;
mod help_overlay;
mod input_bar;
mod status_bar;

pub use filter_table::FilterTable;
pub use help_overlay::HelpOverlay;
pub use input_bar::InputBar;
pub use status_bar::{StatusBar, console_hints, viewer_hints};
