use ratatui::widgets::TableState;

use logtree_core::{
    ConfigSnapshot, ConfigUpdate, FilterEntry, LEVEL_NONE, LogRegistry, OFF, ProbeBuffer,
    ProbeRecord, ROOT_NAMESPACE,
};

use super::NamespaceFilter;

/// Screen enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    FilterConsole,
    ProbeViewer,
}

/// What the text input line is collecting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Off,
    Search,
    AddNamespace,
    EditNote,
}

impl InputMode {
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Off => "",
            Self::Search => " /",
            Self::AddNamespace => " Namespace: ",
            Self::EditNote => " Note: ",
        }
    }
}

/// One-line message shown above the status bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Info(text) | Self::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// UI-specific transient state
pub struct UiState {
    /// What the input line is collecting, if open
    pub input_mode: InputMode,

    /// Current input text
    pub input: String,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Selection in the filter table
    pub table_state: TableState,

    /// Last operator notice
    pub notice: Option<Notice>,

    /// Currently active namespace search (None = show all)
    pub active_filter: Option<NamespaceFilter>,

    /// Search input error message (e.g., invalid regex)
    pub filter_error: Option<String>,

    /// Case insensitive search?
    pub filter_case_insensitive: bool,

    /// Scroll position in the probe viewer, in lines
    pub probe_scroll: usize,

    /// Follow new probes?
    pub auto_scroll: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Off,
            input: String::new(),
            help_visible: false,
            table_state: TableState::default(),
            notice: None,
            active_filter: None,
            filter_error: None,
            filter_case_insensitive: true,
            probe_scroll: 0,
            auto_scroll: true,
        }
    }
}

/// Global console state
pub struct AppState {
    /// Registry being inspected and edited
    pub registry: LogRegistry,

    /// Probes captured from the registry's output
    pub probes: ProbeBuffer,

    /// Configuration as of the last read or write
    pub snapshot: ConfigSnapshot,

    /// Current screen being displayed
    pub current_screen: Screen,

    /// Navigation stack for back navigation
    pub screen_stack: Vec<Screen>,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(registry: LogRegistry, probes: ProbeBuffer) -> Self {
        let mut ui_state = UiState::default();
        ui_state.table_state.select(Some(0));

        Self {
            snapshot: registry.snapshot(),
            registry,
            probes,
            current_screen: Screen::FilterConsole,
            screen_stack: Vec::new(),
            ui_state,
            should_quit: false,
        }
    }

    /// Re-read the configuration (e.g. after another component changed it)
    pub fn refresh(&mut self) {
        self.snapshot = self.registry.snapshot();
        self.clamp_selection();
    }

    /// Navigate to a new screen, pushing current to stack
    pub fn navigate_to(&mut self, screen: Screen) {
        if self.current_screen == screen {
            return;
        }
        self.screen_stack.push(self.current_screen);
        self.current_screen = screen;
    }

    /// Go back to previous screen
    pub fn go_back(&mut self) -> bool {
        if let Some(prev_screen) = self.screen_stack.pop() {
            self.current_screen = prev_screen;
            true
        } else {
            false
        }
    }

    /// Toggle between the filter console and the probe viewer
    pub fn switch_view(&mut self) {
        match self.current_screen {
            Screen::FilterConsole => self.navigate_to(Screen::ProbeViewer),
            Screen::ProbeViewer => {
                if !self.go_back() {
                    self.current_screen = Screen::FilterConsole;
                }
            }
        }
    }

    /// Buffered probes whose namespace matches the active search
    pub fn visible_probes(&self) -> Vec<ProbeRecord> {
        match &self.ui_state.active_filter {
            Some(filter) => self
                .probes
                .filtered(|record| filter.matches_namespace(&record.namespace)),
            None => self.probes.all(),
        }
    }

    /// Filter entries matching the active search, root first
    pub fn visible_entries(&self) -> Vec<&FilterEntry> {
        self.snapshot
            .filter
            .iter()
            .filter(|e| {
                self.ui_state
                    .active_filter
                    .as_ref()
                    .is_none_or(|f| f.matches(e))
            })
            .collect()
    }

    pub fn current_list_len(&self) -> usize {
        self.visible_entries().len()
    }

    /// Get currently selected index
    pub fn selected_index(&self) -> Option<usize> {
        self.ui_state.table_state.selected()
    }

    /// Currently selected filter entry
    pub fn selected_entry(&self) -> Option<FilterEntry> {
        let index = self.selected_index()?;
        self.visible_entries().get(index).map(|e| (*e).clone())
    }

    /// Move selection up
    pub fn list_up(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            return;
        }

        let i = match self.selected_index() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.ui_state.table_state.select(Some(i));
    }

    /// Move selection down
    pub fn list_down(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            return;
        }

        let i = match self.selected_index() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.ui_state.table_state.select(Some(i));
    }

    pub fn list_top(&mut self) {
        self.ui_state.table_state.select(Some(0));
    }

    pub fn list_bottom(&mut self) {
        let len = self.current_list_len();
        self.ui_state.table_state.select(Some(len.saturating_sub(1)));
    }

    fn clamp_selection(&mut self) {
        let len = self.current_list_len();
        match self.selected_index() {
            _ if len == 0 => self.ui_state.table_state.select(None),
            Some(i) if i >= len => self.ui_state.table_state.select(Some(len - 1)),
            None => self.ui_state.table_state.select(Some(0)),
            Some(_) => {}
        }
    }

    fn select_namespace(&mut self, namespace: &str) {
        if let Some(i) = self
            .visible_entries()
            .iter()
            .position(|e| e.namespace == namespace)
        {
            self.ui_state.table_state.select(Some(i));
        }
    }

    /// Level names a filter can be set to, least severe first, `OFF` last
    pub fn level_choices(&self) -> Vec<String> {
        self.snapshot
            .log_levels
            .iter()
            .map(|name| name.trim_start_matches(logtree_core::DEFAULT_MARKER).to_string())
            .chain(std::iter::once(OFF.to_string()))
            .collect()
    }

    /// Move the selected filter `steps` levels up (positive) or down.
    ///
    /// An inheriting filter starts from the level it currently resolves to.
    pub fn step_level(&mut self, steps: isize) {
        let Some(entry) = self.selected_entry() else {
            return;
        };

        let choices = self.level_choices();
        let current = if entry.level == LEVEL_NONE {
            &entry.resolved
        } else {
            &entry.level
        };
        let Some(index) = choices.iter().position(|c| c == current) else {
            return;
        };

        let target = index
            .saturating_add_signed(steps)
            .min(choices.len().saturating_sub(1));
        if target == index && entry.level != LEVEL_NONE {
            return;
        }

        let level = &choices[target];
        self.write(
            ConfigUpdate::new().filter(entry.namespace.as_str(), level.as_str()),
            format!("Filter '{}' set to {}", entry.namespace, level),
        );
    }

    /// Let the selected filter inherit its parent's level
    pub fn unset_level(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        if entry.level == LEVEL_NONE {
            return;
        }
        self.write(
            ConfigUpdate::new().filter(entry.namespace.as_str(), LEVEL_NONE),
            format!("Filter '{}' now inherits", entry.namespace),
        );
    }

    pub fn toggle_client_errors(&mut self) {
        let exclude = !self.snapshot.exclude_client_errors;
        let notice = if exclude {
            "Client errors are now kept out of the log"
        } else {
            "Client errors are now logged"
        };
        self.write(
            ConfigUpdate::new().exclude_client_errors(exclude),
            notice.to_string(),
        );
    }

    /// Select the filter of a namespace, creating an inheriting node first
    /// when the registry has none. An existing level is left alone.
    pub fn add_namespace(&mut self, namespace: &str) {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return;
        }
        if let Err(e) = self.registry.node(namespace) {
            self.show_error(e.to_string());
            return;
        }

        let known = self.snapshot.entry(namespace).is_some();
        self.refresh();
        if !known {
            let notice = format!("Added filter '{}'", namespace);
            self.registry.post(&notice, None);
            self.show_info(notice);
        }
        self.select_namespace(namespace);
    }

    /// Replace the note of the selected filter, keeping its level
    pub fn set_note(&mut self, note: &str) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        self.write(
            ConfigUpdate::new().filter_with_note(
                entry.namespace.as_str(),
                entry.level.as_str(),
                note.trim(),
            ),
            format!("Note of '{}' updated", entry.namespace),
        );
    }

    /// Emit one probe at every level from the selected namespace
    pub fn emit_samples(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        let log = match self.registry.handle(&entry.namespace) {
            Ok(log) => log,
            Err(e) => {
                self.show_error(e.to_string());
                return;
            }
        };

        let levels = self.registry.schema().levels();
        let mut passed = 0;
        for level in &levels {
            if log.is_level_enabled(level, None) {
                passed += 1;
            }
            log.log(
                level,
                || format!("Sample probe at {} from the filter console", level.name()),
                None,
            );
        }

        let notice = format!(
            "{} of {} sample probes passed the filter of '{}'",
            passed,
            levels.len(),
            entry.namespace
        );
        self.registry.post(&notice, None);
        self.ui_state.notice = Some(Notice::Info(notice));
    }

    /// Apply a configuration write, post a notice on success
    fn write(&mut self, update: ConfigUpdate, notice: String) -> bool {
        match self.registry.config(Some(update)) {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.clamp_selection();
                self.registry.post(&notice, None);
                self.ui_state.notice = Some(Notice::Info(notice));
                true
            }
            Err(e) => {
                self.show_error(e.to_string());
                false
            }
        }
    }

    /// Is the selected filter the tree root?
    pub fn root_selected(&self) -> bool {
        self.selected_entry()
            .is_some_and(|e| e.namespace == ROOT_NAMESPACE)
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.notice = Some(Notice::Error(msg));
    }

    /// Show an informational message
    pub fn show_info(&mut self, msg: String) {
        self.ui_state.notice = Some(Notice::Info(msg));
    }

    pub fn dismiss_notice(&mut self) {
        self.ui_state.notice = None;
    }

    /// Open the input line
    pub fn start_input(&mut self, mode: InputMode) {
        if mode == InputMode::EditNote {
            match self.selected_entry() {
                Some(entry) => self.ui_state.input = entry.note,
                None => return,
            }
        } else {
            self.ui_state.input.clear();
        }
        self.ui_state.input_mode = mode;
        self.ui_state.filter_error = None;
    }

    /// Close the input line; a cancelled search also clears the filter
    pub fn cancel_input(&mut self) {
        if self.ui_state.input_mode == InputMode::Search {
            self.ui_state.active_filter = None;
            self.ui_state.filter_error = None;
            self.clamp_selection();
        }
        self.ui_state.input_mode = InputMode::Off;
        self.ui_state.input.clear();
    }

    /// Act on the input line
    pub fn submit_input(&mut self) {
        match self.ui_state.input_mode {
            InputMode::Off => {}
            InputMode::Search => self.apply_filter(),
            InputMode::AddNamespace => {
                let namespace = std::mem::take(&mut self.ui_state.input);
                self.ui_state.input_mode = InputMode::Off;
                self.add_namespace(&namespace);
            }
            InputMode::EditNote => {
                let note = std::mem::take(&mut self.ui_state.input);
                self.ui_state.input_mode = InputMode::Off;
                self.set_note(&note);
            }
        }
    }

    /// Apply the current input as the namespace search
    pub fn apply_filter(&mut self) {
        self.ui_state.input_mode = InputMode::Off;
        self.ui_state.filter_error = None;

        if self.ui_state.input.is_empty() {
            self.ui_state.active_filter = None;
            self.clamp_selection();
            return;
        }

        let result = if self.ui_state.filter_case_insensitive {
            NamespaceFilter::new_case_insensitive(&self.ui_state.input)
        } else {
            NamespaceFilter::new(&self.ui_state.input)
        };

        match result {
            Ok(filter) => {
                self.ui_state.active_filter = Some(filter);
                self.ui_state.table_state.select(Some(0));
                self.clamp_selection();
            }
            Err(e) => {
                self.ui_state.filter_error = Some(format!("Invalid regex: {}", e));
                self.ui_state.input_mode = InputMode::Search; // Keep input open to fix
            }
        }
    }

    /// Clear the active search
    pub fn clear_filter(&mut self) {
        self.ui_state.active_filter = None;
        self.ui_state.input.clear();
        self.ui_state.filter_error = None;
        self.clamp_selection();
    }

    /// Flip case sensitivity and re-apply an active search
    pub fn toggle_case_sensitive(&mut self) {
        self.ui_state.filter_case_insensitive = !self.ui_state.filter_case_insensitive;
        if let Some(filter) = &self.ui_state.active_filter {
            self.ui_state.input = filter.pattern().to_string();
            self.apply_filter();
        }
    }

    /// Add a character to the input line
    pub fn input_char(&mut self, c: char) {
        self.ui_state.input.push(c);
    }

    /// Remove last character from the input line
    pub fn input_backspace(&mut self) {
        self.ui_state.input.pop();
    }

    pub fn clear_probes(&mut self) {
        self.probes.clear();
        self.ui_state.probe_scroll = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state() -> AppState {
        let registry = LogRegistry::with_levels(&["TRACE", "DEBUG", "*INFO", "WARN", "ERROR"]).unwrap();
        let probes = ProbeBuffer::new(100);
        registry
            .config(Some(
                ConfigUpdate::new()
                    .output_handler(Arc::new(probes.clone()))
                    .filter("actions.retrieve", "DEBUG")
                    .filter("startup", "none"),
            ))
            .unwrap();
        AppState::new(registry, probes)
    }

    fn select(state: &mut AppState, namespace: &str) {
        state.select_namespace(namespace);
        assert_eq!(state.selected_entry().unwrap().namespace, namespace);
    }

    #[test]
    fn test_rows_root_first() {
        let state = state();
        let names: Vec<&str> = state
            .visible_entries()
            .iter()
            .map(|e| e.namespace.as_str())
            .collect();
        assert_eq!(names, vec!["root", "actions", "actions.retrieve", "startup"]);
    }

    #[test]
    fn test_list_navigation_wraps() {
        let mut state = state();
        state.list_up();
        assert_eq!(state.selected_index(), Some(3));
        state.list_down();
        assert_eq!(state.selected_index(), Some(0));
        state.list_bottom();
        assert_eq!(state.selected_index(), Some(3));
    }

    #[test]
    fn test_step_level_from_inherited() {
        let mut state = state();
        select(&mut state, "startup");
        state.step_level(-1);
        assert_eq!(state.registry.filter("startup").unwrap(), "DEBUG");
        assert_eq!(state.selected_entry().unwrap().level, "DEBUG");

        state.step_level(10);
        assert_eq!(state.registry.filter("startup").unwrap(), "OFF");

        let posts = state.probes.filtered(|r| r.level_name == "POST");
        assert_eq!(posts.len(), 2);
        assert!(posts[1].text.contains("Filter 'startup' set to OFF"));
    }

    #[test]
    fn test_unset_and_root_refusal() {
        let mut state = state();
        select(&mut state, "actions.retrieve");
        state.unset_level();
        assert_eq!(state.registry.filter("actions.retrieve").unwrap(), "none");

        state.list_top();
        assert!(state.root_selected());
        state.step_level(1);
        assert_eq!(state.registry.filter("root").unwrap(), "WARN");
        state.unset_level();
        assert!(state.ui_state.notice.as_ref().unwrap().is_error());
        assert_eq!(state.registry.filter("root").unwrap(), "WARN");
    }

    #[test]
    fn test_toggle_client_errors() {
        let mut state = state();
        assert!(state.snapshot.exclude_client_errors);
        state.toggle_client_errors();
        assert!(!state.registry.exclude_client_errors());
        assert!(!state.snapshot.exclude_client_errors);
    }

    #[test]
    fn test_add_namespace_and_note() {
        let mut state = state();
        state.start_input(InputMode::AddNamespace);
        for c in "ui.form".chars() {
            state.input_char(c);
        }
        state.submit_input();
        assert_eq!(state.selected_entry().unwrap().namespace, "ui.form");
        assert_eq!(state.selected_entry().unwrap().level, "none");

        state.start_input(InputMode::EditNote);
        state.ui_state.input = "checking validation".to_string();
        state.submit_input();
        assert_eq!(state.snapshot.entry("ui.form").unwrap().note, "checking validation");

        state.start_input(InputMode::AddNamespace);
        state.ui_state.input = "bad name".to_string();
        state.submit_input();
        assert!(state.ui_state.notice.as_ref().unwrap().is_error());
        assert!(state.snapshot.entry("bad name").is_none());
    }

    #[test]
    fn test_add_namespace_keeps_level_set_elsewhere() {
        let mut state = state();
        // set through another holder of the registry, not yet refreshed
        state.registry.set_level("late.ns", "WARN", None).unwrap();
        assert!(state.snapshot.entry("late.ns").is_none());

        state.add_namespace("late.ns");
        assert_eq!(state.registry.filter("late.ns").unwrap(), "WARN");
        assert_eq!(state.selected_entry().unwrap().namespace, "late.ns");
        assert_eq!(state.selected_entry().unwrap().level, "WARN");

        // adding an already listed namespace only selects it
        select(&mut state, "root");
        state.add_namespace("actions.retrieve");
        assert_eq!(state.selected_entry().unwrap().level, "DEBUG");
    }

    #[test]
    fn test_search_narrows_rows() {
        let mut state = state();
        state.start_input(InputMode::Search);
        for c in "ACTIONS".chars() {
            state.input_char(c);
        }
        state.submit_input();
        assert_eq!(state.current_list_len(), 2);

        state.toggle_case_sensitive();
        assert_eq!(state.current_list_len(), 0);
        assert_eq!(state.selected_index(), None);

        state.clear_filter();
        assert_eq!(state.current_list_len(), 4);
        assert_eq!(state.selected_index(), Some(0));

        state.start_input(InputMode::Search);
        state.ui_state.input = "[".to_string();
        state.submit_input();
        assert!(state.ui_state.filter_error.is_some());
        assert_eq!(state.ui_state.input_mode, InputMode::Search);
    }

    #[test]
    fn test_search_narrows_probes() {
        let mut state = state();
        state.registry.handle("actions.retrieve").unwrap().debug(|| "fetch".to_string(), None);
        state.registry.handle("startup").unwrap().info(|| "boot".to_string(), None);
        state.registry.post("operator", None);
        assert_eq!(state.visible_probes().len(), 3);

        state.start_input(InputMode::Search);
        state.ui_state.input = "^actions".to_string();
        state.submit_input();

        let namespaces: Vec<String> = state
            .visible_probes()
            .into_iter()
            .map(|r| r.namespace)
            .collect();
        assert_eq!(namespaces, ["actions.retrieve", ""]);

        state.clear_filter();
        assert_eq!(state.visible_probes().len(), 3);
    }

    #[test]
    fn test_emit_samples_respects_filter() {
        let mut state = state();
        select(&mut state, "actions.retrieve");
        state.emit_samples();

        let counts = state.probes.level_counts();
        assert_eq!(counts.get("TRACE"), 0);
        assert_eq!(counts.get("DEBUG"), 1);
        assert_eq!(counts.get("ERROR"), 1);
        assert_eq!(counts.get("POST"), 1);
        assert_eq!(
            state.ui_state.notice.as_ref().unwrap().text(),
            "4 of 5 sample probes passed the filter of 'actions.retrieve'"
        );
    }

    #[test]
    fn test_switch_view() {
        let mut state = state();
        state.switch_view();
        assert_eq!(state.current_screen, Screen::ProbeViewer);
        state.switch_view();
        assert_eq!(state.current_screen, Screen::FilterConsole);
        assert!(state.screen_stack.is_empty());
    }
}
