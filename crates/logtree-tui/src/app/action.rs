/// All possible actions in the console (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Navigation
    SwitchView,
    GoBack,
    Quit,

    // UI toggles
    ToggleHelp,

    // Filter table navigation
    ListUp,
    ListDown,
    ListTop,
    ListBottom,

    // Filter edits, applied through the registry
    LevelDown,
    LevelUp,
    UnsetLevel,
    ToggleClientErrors,
    OpenAddNamespace,
    OpenEditNote,
    EmitSamples,
    WriteConfig,

    // Namespace search
    OpenSearch,
    ClearFilter,
    ToggleCaseSensitive,

    // Text input (search, new namespace, note)
    InputChar(char),
    InputBackspace,
    InputClear,
    InputSubmit,
    InputCancel,

    // Probe viewer
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    ToggleAutoScroll,
    ClearProbes,

    // Redraw after a terminal resize
    Render,
}
