//! Groups view rendering.
//!
//! One table holds every shard group followed by its replicas in index
//! order, so the selected row maps straight onto [`GroupRow`].

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{format_count, sparkline};
use crate::app::{App, GroupRow};
use crate::data::{ReplicaServer, ShardGroup, NOT_AVAILABLE};

/// Render the Groups view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let rows = app.group_rows();
    if rows.is_empty() {
        let text = if app.is_connected() {
            "No groups. Press g to create one."
        } else {
            "Waiting for cluster data..."
        };
        frame.render_widget(
            Paragraph::new(format!(" {}", text)).block(block.title(" Groups ")),
            area,
        );
        return;
    }

    let header = Row::new(vec![
        Cell::from("Server"),
        Cell::from("Status"),
        Cell::from("Memory"),
        Cell::from("DB Size"),
        Cell::from("OPS"),
        Cell::from("Trend"),
        Cell::from("Upstream"),
        Cell::from("Sync"),
        Cell::from("HA"),
    ])
    .height(1)
    .style(app.theme.header);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| match *row {
            GroupRow::Group(g) => group_row(app, &app.view.groups[g]),
            GroupRow::Server(g, s) => server_row(app, &app.view.groups[g].servers[s], s),
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Min(8),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Min(8),
        Constraint::Fill(2),
        Constraint::Min(4),
        Constraint::Min(11),
    ];

    let selected = app.selected_row.min(rows.len().saturating_sub(1));
    let title = format!(
        " Groups ({}) [{}/{}] ",
        app.view.groups.len(),
        selected + 1,
        rows.len()
    );

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block.title(title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn group_row<'a>(app: &App, group: &'a ShardGroup) -> Row<'a> {
    let mut name = vec![Span::styled(
        format!("Group-[{}]", group.name),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if group.proxy_read_port != 0 || group.proxy_write_port != 0 {
        name.push(Span::styled(
            format!(" r:{} w:{}", group.proxy_read_port, group.proxy_write_port),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    let mut notes = Vec::new();
    if let Some(p) = &group.promoting {
        notes.push(Span::styled(
            format!("promoting #{} {} ", p.index, p.state),
            Style::default().fg(app.theme.warning),
        ));
    }
    if group.out_of_sync {
        notes.push(Span::styled("out of sync ", Style::default().fg(app.theme.warning)));
    }
    if let Some(warning) = &group.ha_warning {
        notes.push(Span::styled(warning.clone(), app.theme.escalated()));
    }

    Row::new(vec![
        Cell::from(Line::from(name)),
        Cell::from(format!("{} srv", group.servers.len())),
        Cell::from(Line::from(notes)),
    ])
}

fn server_row<'a>(app: &App, server: &'a ReplicaServer, index: usize) -> Row<'a> {
    let ops = server
        .ops_per_sec
        .map(format_count)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let sync = match server.replication_ok {
        Some(true) => "✓",
        Some(false) => "✗",
        None => "-",
    };
    let addr_style = if server.is_promoting {
        Style::default().fg(app.theme.warning).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(format!("  {} {}", index, server.label)).style(addr_style),
        Cell::from(server.status.label()).style(app.theme.status_style(server.status)),
        Cell::from(format!("{} / {}", server.memory, server.max_memory)),
        Cell::from(server.db_size.as_str()),
        Cell::from(ops),
        Cell::from(sparkline(&app.history.server_sparkline(&server.addr), 8)),
        Cell::from(server.upstream.as_str()),
        Cell::from(sync).style(app.theme.sync_style(server.replication_ok)),
        Cell::from(server.ha_role.label()).style(app.theme.role_style(server.ha_role)),
    ])
}
