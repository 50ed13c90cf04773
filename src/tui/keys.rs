//! Key chords and the configurable bindings built from them.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;

use crate::core::config::KeyBindings;

/// One key plus its modifiers, parsed from names like `ctrl+c` or `alt+up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        let mut parts: Vec<&str> = name.split('+').collect();
        // "ctrl++" names the plus key
        if name.ends_with("++") {
            parts.truncate(parts.len() - 2);
            parts.push("+");
        }
        let key = parts.pop()?;

        let mut modifiers = KeyModifiers::NONE;
        for part in parts {
            modifiers |= match part {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" | "meta" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return None,
            };
        }

        let code = match key {
            "enter" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" if modifiers.contains(KeyModifiers::SHIFT) => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pgup" | "pageup" => KeyCode::PageUp,
            "pgdown" | "pagedown" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };

        Some(Self { code, modifiers })
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        if self.code != event.code {
            return false;
        }
        match event.code {
            // Terminals disagree on whether these carry SHIFT.
            KeyCode::BackTab => true,
            KeyCode::Char(_) => {
                let relevant = KeyModifiers::CONTROL | KeyModifiers::ALT;
                (event.modifiers & relevant) == (self.modifiers & relevant)
            }
            _ => event.modifiers == self.modifiers,
        }
    }
}

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    Switch,
    History,
    Log,
    Quit,
    Modal,
    Followup,
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(KeyChord, KeyAction)>,
}

impl KeyMap {
    pub fn new(keys: &KeyBindings) -> Self {
        let groups = [
            (KeyAction::Quit, &keys.quit),
            (KeyAction::Submit, &keys.submit),
            (KeyAction::Switch, &keys.switch),
            (KeyAction::History, &keys.history),
            (KeyAction::Log, &keys.log),
            (KeyAction::Modal, &keys.modal),
            (KeyAction::Followup, &keys.followup),
        ];

        let mut bindings = Vec::new();
        for (action, names) in groups {
            for name in names {
                match KeyChord::parse(name) {
                    Some(chord) => bindings.push((chord, action)),
                    None => warn!("Ignoring unknown key name {name:?} for {action:?}"),
                }
            }
        }
        Self { bindings }
    }

    pub fn action(&self, event: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .iter()
            .find(|(chord, _)| chord.matches(event))
            .map(|(_, action)| *action)
    }

    /// Key names per action, as configured. Used by the help overlay.
    pub fn describe(keys: &KeyBindings) -> Vec<(&'static str, String)> {
        vec![
            ("submit", keys.submit.join(", ")),
            ("switch focus", keys.switch.join(", ")),
            ("history", keys.history.join(", ")),
            ("transcript", keys.log.join(", ")),
            ("followups", keys.followup.join(", ")),
            ("help", keys.modal.join(", ")),
            ("quit", keys.quit.join(", ")),
        ]
    }
}
