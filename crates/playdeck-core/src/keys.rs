//! Keyboard shortcuts

use crate::config::PlayerConfig;
use crate::controls::Command;

/// A pressed key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowLeft,
    ArrowRight,
    Char(char),
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            " " | "Spacebar" => Key::Space,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other,
                }
            }
        }
    }
}

/// Where keyboard focus was when the key was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Player,
    Page,
    /// Text input, textarea or editable content
    TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub focus: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: Key, focus: FocusTarget) -> Self {
        Self { key, focus }
    }
}

/// Command bound to a key
#[derive(Debug, Clone, PartialEq)]
pub struct ShortcutAction {
    pub command: Command,
    /// Suppress the browser default (page scroll on space)
    pub prevent_default: bool,
}

/// Key bindings: space, arrows, `f` and `m`
#[derive(Debug, Clone)]
pub struct Shortcuts {
    seek_step: f64,
    suppress_in_text_input: bool,
}

impl Shortcuts {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            seek_step: config.seek_step,
            suppress_in_text_input: config.suppress_shortcuts_in_text_input,
        }
    }

    pub fn resolve(&self, event: &KeyEvent) -> Option<ShortcutAction> {
        if self.suppress_in_text_input && event.focus == FocusTarget::TextInput {
            return None;
        }

        let (command, prevent_default) = match event.key {
            Key::Space => (Command::TogglePlay, true),
            Key::ArrowRight => (Command::SeekBy(self.seek_step), false),
            Key::ArrowLeft => (Command::SeekBy(-self.seek_step), false),
            Key::Char('f' | 'F') => (Command::ToggleFullscreen, false),
            Key::Char('m' | 'M') => (Command::ToggleMute, false),
            _ => return None,
        };

        Some(ShortcutAction {
            command,
            prevent_default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortcuts() -> Shortcuts {
        Shortcuts::new(&PlayerConfig::default())
    }

    fn press(key: &str) -> Option<ShortcutAction> {
        shortcuts().resolve(&KeyEvent::new(Key::from_dom(key), FocusTarget::Page))
    }

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom(" "), Key::Space);
        assert_eq!(Key::from_dom("ArrowRight"), Key::ArrowRight);
        assert_eq!(Key::from_dom("f"), Key::Char('f'));
        assert_eq!(Key::from_dom("Escape"), Key::Other);
    }

    #[test]
    fn test_default_bindings() {
        let space = press(" ").unwrap();
        assert_eq!(space.command, Command::TogglePlay);
        assert!(space.prevent_default);

        assert_eq!(press("ArrowRight").unwrap().command, Command::SeekBy(5.0));
        assert_eq!(press("ArrowLeft").unwrap().command, Command::SeekBy(-5.0));
        assert_eq!(press("F").unwrap().command, Command::ToggleFullscreen);
        assert_eq!(press("m").unwrap().command, Command::ToggleMute);
        assert!(press("x").is_none());
    }

    #[test]
    fn test_text_input_focus_suppresses_shortcuts() {
        let event = KeyEvent::new(Key::Space, FocusTarget::TextInput);
        assert!(shortcuts().resolve(&event).is_none());

        let config = PlayerConfig {
            suppress_shortcuts_in_text_input: false,
            ..PlayerConfig::default()
        };
        assert!(Shortcuts::new(&config).resolve(&event).is_some());
    }

    #[test]
    fn test_seek_step_from_config() {
        let config = PlayerConfig {
            seek_step: 10.0,
            ..PlayerConfig::default()
        };
        let action = Shortcuts::new(&config)
            .resolve(&KeyEvent::new(Key::ArrowLeft, FocusTarget::Player))
            .unwrap();
        assert_eq!(action.command, Command::SeekBy(-10.0));
    }
}
