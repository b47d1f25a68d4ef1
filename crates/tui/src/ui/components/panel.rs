use ratatui::{
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders},
};

use crate::ui::theme::Theme;

/// Rounded block used by every dashboard panel. Focused panels get the
/// accent border; busy ones say so in the title.
pub fn block<'a>(title: &str, focused: bool, busy: bool, theme: &Theme) -> Block<'a> {
    let border = if focused { theme.accent } else { theme.border };
    let title = if busy {
        format!(" {title} · working ")
    } else {
        format!(" {title} ")
    };

    Block::default()
        .title(Span::styled(title, Style::default().fg(theme.accent)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
}
