use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// Formats an amount as Brazilian reais, e.g. `R$ 1.234,56`.
///
/// Rounded to cents; thousands use `.`, decimals use `,`.
#[must_use]
pub fn format_brl(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = (abs / 100).to_string();
    let cents = abs % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}R$ {grouped},{cents:02}")
}

/// Styled balance: negative in red, everything else neutral.
#[must_use]
pub fn styled_balance(amount: f64, theme: &Theme) -> Span<'static> {
    let color = if amount < 0.0 {
        theme.negative
    } else {
        theme.text
    };
    Span::styled(format_brl(amount), Style::default().fg(color))
}
