//! Key event dispatch.
//!
//! Right/Left page through the process table, Ctrl+Q quits. Ctrl+C quits as
//! well because raw mode turns it into a key press instead of SIGINT.
//! Everything else is ignored.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::pagination::PageCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Page(PageCommand),
    Quit,
    Ignore,
}

pub fn dispatch(key: &KeyEvent) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::Ignore;
    }

    match key.code {
        KeyCode::Right => Action::Page(PageCommand::Next),
        KeyCode::Left => Action::Page(PageCommand::Prev),
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Action::Quit
        }
        _ => Action::Ignore,
    }
}
