//! Key to [`Command`] lookup table.

use cairn_core::command::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

const BINDINGS: &[(KeyCode, KeyModifiers, Command)] = &[
    (KeyCode::Char('j'), KeyModifiers::NONE, Command::NextItem),
    (KeyCode::Down, KeyModifiers::NONE, Command::NextItem),
    (KeyCode::Char('k'), KeyModifiers::NONE, Command::PreviousItem),
    (KeyCode::Up, KeyModifiers::NONE, Command::PreviousItem),
    (KeyCode::Char('n'), KeyModifiers::NONE, Command::NextGroup),
    (KeyCode::Char('p'), KeyModifiers::NONE, Command::PreviousGroup),
    (KeyCode::Char('g'), KeyModifiers::NONE, Command::FirstGroup),
    (KeyCode::Char('G'), KeyModifiers::NONE, Command::LastGroup),
    (KeyCode::Home, KeyModifiers::NONE, Command::FirstItem),
    (KeyCode::End, KeyModifiers::NONE, Command::LastItem),
    (KeyCode::Char('+'), KeyModifiers::NONE, Command::OpenGroup),
    (KeyCode::Char('-'), KeyModifiers::NONE, Command::CloseGroup),
    (KeyCode::Char(' '), KeyModifiers::NONE, Command::ToggleGroup),
    (KeyCode::Char('/'), KeyModifiers::NONE, Command::FocusFilter),
    (KeyCode::Char('u'), KeyModifiers::CONTROL, Command::ClearFilter),
    (KeyCode::Char('d'), KeyModifiers::NONE, Command::ToggleDetails),
    (KeyCode::Char('h'), KeyModifiers::NONE, Command::PanelLeft),
    (KeyCode::Left, KeyModifiers::NONE, Command::PanelLeft),
    (KeyCode::Char('l'), KeyModifiers::NONE, Command::PanelRight),
    (KeyCode::Right, KeyModifiers::NONE, Command::PanelRight),
    (KeyCode::Enter, KeyModifiers::NONE, Command::OpenOverlay),
    (KeyCode::Esc, KeyModifiers::NONE, Command::CloseOverlay),
    (KeyCode::Char('r'), KeyModifiers::NONE, Command::Reload),
    (KeyCode::Char('y'), KeyModifiers::CONTROL, Command::ScrollUp),
    (KeyCode::Char('e'), KeyModifiers::CONTROL, Command::ScrollDown),
    (KeyCode::PageUp, KeyModifiers::NONE, Command::PageUp),
    (KeyCode::Char('b'), KeyModifiers::CONTROL, Command::PageUp),
    (KeyCode::PageDown, KeyModifiers::NONE, Command::PageDown),
    (KeyCode::Char('f'), KeyModifiers::CONTROL, Command::PageDown),
    (KeyCode::Char('t'), KeyModifiers::NONE, Command::ScrollTop),
    (KeyCode::Char('b'), KeyModifiers::NONE, Command::ScrollBottom),
];

#[derive(Debug)]
pub struct Keymap {
    table: HashMap<(KeyCode, KeyModifiers), Command>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

impl Keymap {
    #[must_use]
    pub fn new() -> Self {
        let table = BINDINGS
            .iter()
            .map(|&(code, modifiers, command)| ((code, modifiers), command))
            .collect();
        Self { table }
    }

    /// Shift is folded into the character for `Char` keys.
    #[must_use]
    pub fn lookup(&self, key: KeyEvent) -> Option<Command> {
        let modifiers = match key.code {
            KeyCode::Char(_) => key.modifiers.difference(KeyModifiers::SHIFT),
            _ => key.modifiers,
        };
        self.table.get(&(key.code, modifiers)).copied()
    }

    /// Display labels for every key bound to `command`, in binding order.
    #[must_use]
    pub fn keys_for(command: Command) -> Vec<String> {
        BINDINGS
            .iter()
            .filter(|(_, _, bound)| *bound == command)
            .map(|&(code, modifiers, _)| key_label(code, modifiers))
            .collect()
    }
}

fn key_label(code: KeyCode, modifiers: KeyModifiers) -> String {
    let base = match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        other => format!("{other:?}"),
    };
    if modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{base}")
    } else {
        base
    }
}
