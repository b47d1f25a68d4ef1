use ratatui::{style::Style, text::Span};

use crate::{app::Focus, ui::theme::Theme};

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone, Copy)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

/// Hints for the focused control of the current screen.
pub fn for_focus(focus: Focus) -> Vec<KeyHint> {
    match focus {
        Focus::Username | Focus::Password => vec![
            KeyHint::new("Tab", "next"),
            KeyHint::new("Enter", "login"),
            KeyHint::new("Ctrl+R", "register"),
        ],
        Focus::Accounts => vec![
            KeyHint::new("↑↓", "select"),
            KeyHint::new("Enter", "reload statement"),
            KeyHint::new("Ctrl+N", "new account"),
            KeyHint::new("Tab", "operation"),
            KeyHint::new("Ctrl+L", "logout"),
            KeyHint::new("q", "quit"),
        ],
        Focus::Amount => vec![
            KeyHint::new("Enter", "submit"),
            KeyHint::new("Ctrl+T", "deposit/withdraw"),
            KeyHint::new("Tab", "accounts"),
            KeyHint::new("Ctrl+L", "logout"),
        ],
    }
}

/// Converts a list of key hints into styled spans for rendering.
pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}
