//! Sentinels view rendering.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Render the sentinel table with the out-of-sync banner above it.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(4)]).split(area);

    let masters = app.view.ha_masters.len();
    let banner = if app.view.sentinel_out_of_sync {
        Line::from(vec![
            Span::styled(" OUT OF SYNC ", app.theme.escalated().add_modifier(Modifier::REVERSED)),
            Span::raw(format!(" {} masters tracked, press s to resync", masters)),
        ])
    } else {
        Line::from(Span::styled(
            format!(" {} masters tracked", masters),
            Style::default().add_modifier(Modifier::DIM),
        ))
    };
    frame.render_widget(Paragraph::new(banner), chunks[0]);

    let block = Block::default()
        .title(format!(" Sentinels ({}) ", app.view.sentinels.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.view.sentinels.is_empty() {
        frame.render_widget(
            Paragraph::new(" No sentinels. Press a to add one.").block(block),
            chunks[1],
        );
        return;
    }

    let header = Row::new(vec![
        Cell::from("Sentinel"),
        Cell::from("Status"),
        Cell::from("Masters"),
        Cell::from("Down"),
        Cell::from("Avg Slaves"),
        Cell::from("Avg Sentinels"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = app
        .view
        .sentinels
        .iter()
        .map(|s| {
            let down_style = if s.masters_down > 0 {
                Style::default().fg(app.theme.critical)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(s.addr.as_str()),
                Cell::from(s.status.label()).style(app.theme.status_style(s.status)),
                Cell::from(s.masters.to_string()),
                Cell::from(s.masters_down.to_string()).style(down_style),
                Cell::from(format!("{:.2}", s.avg_slaves)),
                Cell::from(format!("{:.2}", s.avg_sentinels)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Min(8),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_sentinel.min(app.view.sentinels.len() - 1)));

    frame.render_stateful_widget(table, chunks[1], &mut state);
}
