use api_types::operation::{OperationKind, StatementRow};
use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Row, Table},
};

use crate::{
    app::{AppState, Focus},
    controller::{Resource, StatementView},
    ui::{
        components::{money, panel, toast},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(layout[0]);

    render_accounts(frame, columns[0], state, &theme);
    render_statement(frame, columns[1], state, &theme);
    render_operation(frame, layout[1], state, &theme);
}

fn render_accounts(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let views = &state.views;
    let items = views
        .accounts
        .iter()
        .map(|account| {
            ListItem::new(Line::from(vec![
                Span::styled(account.owner.clone(), Style::default().fg(theme.text)),
                Span::styled(
                    format!("  ID {}  ", account.id),
                    Style::default().fg(theme.text_muted),
                ),
                money::styled_balance(account.balance, theme),
            ]))
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(
        views
            .selected
            .and_then(|id| views.accounts.iter().position(|account| account.id == id)),
    );

    let block = panel::block(
        "Accounts",
        state.focus == Focus::Accounts,
        views.is_busy(Resource::Accounts),
        theme,
    );
    if items.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "No accounts yet. Ctrl+N creates one.",
            Style::default().fg(theme.text_muted),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_statement(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let title = match &state.views.statement {
        StatementView::Rows { account_id, .. } | StatementView::Unavailable { account_id } => {
            format!("Statement · ID {account_id}")
        }
        StatementView::Empty => "Statement".to_string(),
    };
    let block = panel::block(&title, false, false, theme);

    let rows = match &state.views.statement {
        StatementView::Empty => {
            let hint = Paragraph::new(Span::styled(
                "Select an account to see its statement.",
                Style::default().fg(theme.text_muted),
            ))
            .block(block);
            frame.render_widget(hint, area);
            return;
        }
        StatementView::Unavailable { .. } => {
            let hint = Paragraph::new(Span::styled(
                "No statement, or it could not be loaded.",
                Style::default().fg(theme.text_muted),
            ))
            .block(block);
            frame.render_widget(hint, area);
            return;
        }
        StatementView::Rows { rows, .. } => rows,
    };

    let table_rows = rows
        .iter()
        .map(|row| statement_row(row, state.timezone, theme))
        .collect::<Vec<_>>();
    let header = Row::new(["Type", "Amount", "Date"]).style(
        Style::default()
            .fg(theme.text_muted)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(
        table_rows,
        [
            Constraint::Length(10),
            Constraint::Length(18),
            Constraint::Min(19),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

fn statement_row(row: &StatementRow, timezone: chrono_tz::Tz, theme: &Theme) -> Row<'static> {
    let (label, color) = match row.kind {
        OperationKind::Deposit => ("Deposit", theme.positive),
        OperationKind::Withdraw => ("Withdraw", theme.negative),
    };
    Row::new([
        Line::from(Span::styled(label, Style::default().fg(color))),
        Line::from(money::format_brl(row.amount)),
        Line::from(format_timestamp(row.timestamp, timezone)),
    ])
}

fn render_operation(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let views = &state.views;
    let focused = state.focus == Focus::Amount;
    let busy = views
        .selected
        .is_some_and(|id| views.is_busy(Resource::Account(id)));
    let block = panel::block("Operation", focused, busy, theme);

    let account = views
        .selected_account()
        .map(|account| format!("{} (ID {})", account.owner, account.id))
        .or_else(|| views.selected.map(|id| format!("ID {id}")))
        .unwrap_or_else(|| "none".to_string());
    let cursor = if focused { "│" } else { "" };
    let kind = match views.operation.kind {
        OperationKind::Deposit => "Deposit",
        OperationKind::Withdraw => "Withdraw",
    };

    let form = Line::from(vec![
        Span::styled("Account", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {account}  ")),
        Span::styled("Type", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {kind}  ")),
        Span::styled("Amount", Style::default().fg(theme.text_muted)),
        Span::styled(
            format!(": {}{cursor}", views.operation.amount),
            Style::default().fg(if focused { theme.accent } else { theme.text }),
        ),
    ]);
    let message = views
        .operation_message
        .as_ref()
        .map(|notice| {
            Line::from(Span::styled(
                notice.message.clone(),
                toast::style_for(notice.level, theme),
            ))
        })
        .unwrap_or_default();

    frame.render_widget(Paragraph::new(vec![form, message]).block(block), area);
}

/// Local date and time in `timezone`, day first.
pub fn format_timestamp(timestamp: DateTime<Utc>, timezone: chrono_tz::Tz) -> String {
    timestamp
        .with_timezone(&timezone)
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}
