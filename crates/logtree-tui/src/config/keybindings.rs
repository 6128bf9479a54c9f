use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    FilterConsole,
    ProbeViewer,
    TextInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        global.insert(KeyBinding::new(KeyCode::Tab), Action::SwitchView);
        global.insert(KeyBinding::new(KeyCode::Char('w')), Action::WriteConfig);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Filter console: vi-style movement, h/l walk the severity ladder
        let mut console = HashMap::new();
        console.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        console.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        console.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        console.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        console.insert(KeyBinding::new(KeyCode::Char('g')), Action::ListTop);
        console.insert(KeyBinding::new(KeyCode::Home), Action::ListTop);
        console.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ListBottom);
        console.insert(KeyBinding::new(KeyCode::End), Action::ListBottom);
        console.insert(KeyBinding::new(KeyCode::Char('h')), Action::LevelDown);
        console.insert(KeyBinding::new(KeyCode::Left), Action::LevelDown);
        console.insert(KeyBinding::new(KeyCode::Char('l')), Action::LevelUp);
        console.insert(KeyBinding::new(KeyCode::Right), Action::LevelUp);
        console.insert(KeyBinding::new(KeyCode::Char('n')), Action::UnsetLevel);
        console.insert(KeyBinding::new(KeyCode::Char('x')), Action::ToggleClientErrors);
        console.insert(KeyBinding::new(KeyCode::Char('a')), Action::OpenAddNamespace);
        console.insert(KeyBinding::new(KeyCode::Char('e')), Action::OpenEditNote);
        console.insert(KeyBinding::new(KeyCode::Enter), Action::OpenEditNote);
        console.insert(KeyBinding::new(KeyCode::Char('p')), Action::EmitSamples);
        console.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        console.insert(KeyBinding::new(KeyCode::Char('i')), Action::ToggleCaseSensitive);
        console.insert(KeyBinding::new(KeyCode::Backspace), Action::ClearFilter);
        bindings.insert(KeyContext::FilterConsole, console);

        // Probe viewer bindings - less-like navigation
        let mut viewer = HashMap::new();
        viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleAutoScroll);
        viewer.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearProbes);
        bindings.insert(KeyContext::ProbeViewer, viewer);

        // Text input bindings (search, new namespace, note)
        let mut input = HashMap::new();
        input.insert(KeyBinding::new(KeyCode::Enter), Action::InputSubmit);
        input.insert(KeyBinding::new(KeyCode::Esc), Action::InputCancel);
        input.insert(KeyBinding::new(KeyCode::Backspace), Action::InputBackspace);
        input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::InputClear);
        input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::InputCancel);
        bindings.insert(KeyContext::TextInput, input);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event while the input line is open.
    /// Returns Some(Action) for special keys and typed characters
    pub fn get_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::TextInput)
            .and_then(|input_bindings| input_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        match key.code {
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                Some(Action::InputChar(c))
            }
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_context_binding_wins_over_global() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::FilterConsole, &key(KeyCode::Char('l'))),
            Some(Action::LevelUp)
        );
        assert_eq!(
            bindings.get_action(KeyContext::ProbeViewer, &key(KeyCode::Char('c'))),
            Some(Action::ClearProbes)
        );
        assert_eq!(
            bindings.get_action(KeyContext::ProbeViewer, &key(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
        assert_eq!(
            bindings.get_action(KeyContext::FilterConsole, &key(KeyCode::Char('z'))),
            None
        );
    }

    #[test]
    fn test_input_mode_captures_characters() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_input_action(&key(KeyCode::Char('q'))),
            Some(Action::InputChar('q'))
        );
        assert_eq!(
            bindings.get_input_action(&key(KeyCode::Enter)),
            Some(Action::InputSubmit)
        );
        assert_eq!(
            bindings.get_input_action(&KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)),
            Some(Action::InputClear)
        );
        assert_eq!(bindings.get_input_action(&key(KeyCode::F(1))), None);
    }
}
