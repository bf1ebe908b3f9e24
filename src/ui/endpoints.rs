//! Endpoints view rendering: load balancers and proxy template files.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, List, ListItem, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::BalancerKind;

/// Render the balancer table (haproxy then lvs) beside the template files.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks =
        Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).split(area);

    let header = Row::new(vec![Cell::from("Kind"), Cell::from("Address"), Cell::from("Status")])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = [BalancerKind::Haproxy, BalancerKind::Lvs]
        .into_iter()
        .flat_map(|kind| {
            app.view.balancers(kind).iter().map(move |b| {
                Row::new(vec![
                    Cell::from(kind.as_str()),
                    Cell::from(b.addr.as_str()),
                    Cell::from(b.status.label()).style(app.theme.status_style(b.status)),
                ])
            })
        })
        .collect();

    let widths = [Constraint::Min(8), Constraint::Fill(3), Constraint::Min(8)];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(
                    " Balancers (haproxy {}, lvs {}) ",
                    app.view.haproxy.len(),
                    app.view.lvs.len()
                ))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if app.endpoint_count() > 0 {
        state.select(Some(app.selected_endpoint.min(app.endpoint_count() - 1)));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    let items: Vec<ListItem> = if app.view.template_files.is_empty() {
        vec![ListItem::new(Line::styled(
            "none",
            Style::default().add_modifier(Modifier::DIM),
        ))]
    } else {
        app.view
            .template_files
            .iter()
            .map(|t| ListItem::new(t.name.as_str()))
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .title(" Template files ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(list, chunks[1]);
}
