mod filter_console;
mod probe_viewer;

pub use filter_console::FilterConsoleScreen;
pub use probe_viewer::ProbeViewerScreen;
