mod config_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use logtree_core::{ConfigUpdate, LogRegistry, NullSink, OutputSink, ProbeBuffer};
use logtree_tui::{
    Action, AppState, Event, EventHandler, FilterConsoleScreen, HelpOverlay, InputMode,
    KeyBindings, KeyContext, ProbeViewerScreen, Screen, Tui,
};

use config_file::ConfigFormat;

/// logtree - inspect and edit hierarchical log filters
#[derive(Parser, Debug)]
#[command(name = "logtree")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Filter configuration file (defaults to ~/.logtree/filters.toml)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the resulting configuration and exit
    #[arg(long)]
    print: bool,

    /// Output format for --print (defaults to the file's format)
    #[arg(long, value_enum)]
    format: Option<ConfigFormat>,

    /// Number of probes kept by the probe viewer
    #[arg(long, default_value = "5000")]
    buffer_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = if args.print {
        print_config(&args)
    } else {
        run_app(args).await
    };

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn config_path(args: &Args) -> Result<PathBuf> {
    args.config
        .clone()
        .or_else(config_file::default_path)
        .context("No config file given and no home directory to look in")
}

/// Build the registry: the given sink first, then the config file on top
fn load_registry(path: &Path, sink: Arc<dyn OutputSink>) -> Result<LogRegistry> {
    let registry = LogRegistry::default();
    registry.config(Some(ConfigUpdate::new().output_handler(sink)))?;

    if let Some(update) = config_file::load(path)? {
        registry
            .config(Some(update))
            .with_context(|| format!("Cannot apply {}", path.display()))?;
    }

    Ok(registry)
}

fn print_config(args: &Args) -> Result<()> {
    let path = config_path(args)?;
    let registry = load_registry(&path, Arc::new(NullSink))?;
    let format = args.format.unwrap_or_else(|| ConfigFormat::from_path(&path));
    println!("{}", format.render(&registry.snapshot())?);
    Ok(())
}

async fn run_app(args: Args) -> Result<()> {
    let path = config_path(&args)?;

    // Probes go to the viewer's buffer, never to the terminal the UI owns
    let probes = ProbeBuffer::new(args.buffer_size);
    let registry = load_registry(&path, Arc::new(probes.clone()))?;
    registry.post(&format!("Filters loaded from {}", path.display()), None);

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut state = AppState::new(registry, probes);

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut state)?;

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.help_visible {
                            Some(Action::ToggleHelp)
                        } else if state.ui_state.input_mode != InputMode::Off {
                            keybindings.get_input_action(&key)
                        } else {
                            let context = match state.current_screen {
                                Screen::FilterConsole => KeyContext::FilterConsole,
                                Screen::ProbeViewer => KeyContext::ProbeViewer,
                            };
                            keybindings.get_action(context, &key)
                        };
                        if let Some(action) = action {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick => {
                        // Pick up filters changed through other holders of the registry
                        state.refresh();
                    }
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                    }
                }
            }

            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &path, action);
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state)?;
    }

    events.shutdown().await;
    tui.restore()?;

    Ok(())
}

fn handle_action(state: &mut AppState, path: &Path, action: Action) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::GoBack => {
            if state.ui_state.notice.is_some() {
                state.dismiss_notice();
            } else {
                state.go_back();
            }
        }
        Action::SwitchView => {
            state.switch_view();
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }

        // Filter table
        Action::ListUp => state.list_up(),
        Action::ListDown => state.list_down(),
        Action::ListTop => state.list_top(),
        Action::ListBottom => state.list_bottom(),
        Action::LevelDown => state.step_level(-1),
        Action::LevelUp => state.step_level(1),
        Action::UnsetLevel => state.unset_level(),
        Action::ToggleClientErrors => state.toggle_client_errors(),
        Action::OpenAddNamespace => state.start_input(InputMode::AddNamespace),
        Action::OpenEditNote => state.start_input(InputMode::EditNote),
        Action::EmitSamples => state.emit_samples(),
        Action::WriteConfig => {
            let snapshot = state.registry.snapshot();
            match config_file::save(path, &snapshot) {
                Ok(()) => {
                    let notice = format!("Filters written to {}", path.display());
                    state.registry.post(&notice, None);
                    state.show_info(notice);
                }
                Err(e) => state.show_error(format!("{:#}", e)),
            }
        }

        // Search
        Action::OpenSearch => state.start_input(InputMode::Search),
        Action::ClearFilter => state.clear_filter(),
        Action::ToggleCaseSensitive => state.toggle_case_sensitive(),

        // Input line
        Action::InputChar(c) => state.input_char(c),
        Action::InputBackspace => state.input_backspace(),
        Action::InputClear => state.ui_state.input.clear(),
        Action::InputSubmit => state.submit_input(),
        Action::InputCancel => state.cancel_input(),

        // Probe viewer
        Action::ScrollUp(n) => {
            state.ui_state.auto_scroll = false;
            state.ui_state.probe_scroll = state.ui_state.probe_scroll.saturating_sub(n);
        }
        Action::ScrollDown(n) => {
            state.ui_state.auto_scroll = false;
            // Clamped to the real bottom at render time
            state.ui_state.probe_scroll = state.ui_state.probe_scroll.saturating_add(n);
        }
        Action::PageUp => {
            state.ui_state.auto_scroll = false;
            state.ui_state.probe_scroll = state.ui_state.probe_scroll.saturating_sub(20);
        }
        Action::PageDown => {
            state.ui_state.auto_scroll = false;
            state.ui_state.probe_scroll = state.ui_state.probe_scroll.saturating_add(20);
        }
        Action::ScrollToTop => {
            state.ui_state.auto_scroll = false;
            state.ui_state.probe_scroll = 0;
        }
        Action::ScrollToBottom => {
            state.ui_state.auto_scroll = true;
            state.ui_state.probe_scroll = usize::MAX;
        }
        Action::ToggleAutoScroll => {
            state.ui_state.auto_scroll = !state.ui_state.auto_scroll;
        }
        Action::ClearProbes => state.clear_probes(),

        Action::Render => {}
    }
}

fn render(tui: &mut Tui, state: &mut AppState) -> Result<()> {
    tui.draw(|frame| {
        match state.current_screen {
            Screen::FilterConsole => FilterConsoleScreen::render(frame, state),
            Screen::ProbeViewer => ProbeViewerScreen::render(frame, state),
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let registry = LogRegistry::default();
        let probes = ProbeBuffer::new(50);
        registry
            .config(Some(ConfigUpdate::new().output_handler(Arc::new(probes.clone()))))
            .unwrap();
        AppState::new(registry, probes)
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["logtree", "f.json", "--print", "--format", "toml"]);
        assert_eq!(args.config, Some(PathBuf::from("f.json")));
        assert!(args.print);
        assert_eq!(args.format, Some(ConfigFormat::Toml));
        assert_eq!(args.buffer_size, 5000);
    }

    #[test]
    fn test_write_config_action() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.toml");
        let mut state = state();

        handle_action(&mut state, &path, Action::ListDown);
        handle_action(&mut state, &path, Action::OpenAddNamespace);
        for c in "net.http".chars() {
            handle_action(&mut state, &path, Action::InputChar(c));
        }
        handle_action(&mut state, &path, Action::InputSubmit);
        handle_action(&mut state, &path, Action::LevelDown);
        handle_action(&mut state, &path, Action::WriteConfig);

        assert!(!state.ui_state.notice.as_ref().unwrap().is_error());
        let reloaded = load_registry(&path, Arc::new(NullSink)).unwrap();
        assert_eq!(reloaded.filter("net.http").unwrap(), "DEBUG");
    }

    #[test]
    fn test_go_back_dismisses_notice_first() {
        let path = PathBuf::from("unused.toml");
        let mut state = state();
        handle_action(&mut state, &path, Action::SwitchView);
        state.show_info("hello".to_string());

        handle_action(&mut state, &path, Action::GoBack);
        assert!(state.ui_state.notice.is_none());
        assert_eq!(state.current_screen, Screen::ProbeViewer);

        handle_action(&mut state, &path, Action::GoBack);
        assert_eq!(state.current_screen, Screen::FilterConsole);
    }

    #[test]
    fn test_render_action_leaves_state_alone() {
        let path = PathBuf::from("unused.toml");
        let mut state = state();
        handle_action(&mut state, &path, Action::ListDown);
        let selected = state.ui_state.table_state.selected();

        handle_action(&mut state, &path, Action::Render);
        assert_eq!(state.ui_state.table_state.selected(), selected);
        assert_eq!(state.current_screen, Screen::FilterConsole);
        assert!(state.ui_state.notice.is_none());
        assert!(!state.should_quit);
    }
}
