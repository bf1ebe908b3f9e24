//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay,
//! plus small formatting helpers used by the views.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::NOT_AVAILABLE;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the header bar with cluster identity and total throughput.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" SHARDWATCH ", Style::default().add_modifier(Modifier::BOLD));

    let Some(cluster) = app.cluster.as_deref() else {
        let line = Line::from(vec![title, Span::raw("| No cluster selected (c to choose)")]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    if !app.is_connected() {
        let line = Line::from(vec![
            title,
            Span::raw("│ "),
            Span::styled(cluster.to_string(), app.theme.header),
            Span::raw(" │ Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let info = &app.view.info;
    let ops = app
        .history
        .total_ops()
        .map(format_count)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut spans = vec![
        title,
        Span::raw("│ "),
        Span::styled(cluster.to_string(), app.theme.header),
        Span::raw(" │ admin "),
        Span::raw(info.admin_addr.clone()),
    ];
    if !info.coordinator_kind.is_empty() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            info.coordinator_kind.clone(),
            Style::default().fg(app.theme.highlight),
        ));
        spans.push(Span::raw(format!(" {}", info.coordinator_addr)));
    }
    spans.push(Span::raw(" │ QPS "));
    spans.push(Span::styled(ops, Style::default().add_modifier(Modifier::BOLD)));
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        sparkline(&app.history.total_sparkline(), 16),
        Style::default().fg(app.theme.highlight),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!(" {}:{} ", i + 1, view.label())))
        .collect();

    let selected = View::ALL
        .iter()
        .position(|v| *v == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Temporary messages win; otherwise the source, freshness and any poll
/// error are shown alongside the controls for the current view.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Groups => "a:add g:group d:del p:promote f:fullsync s:resync S:all ?:help",
        View::Sentinels => "a:add d:del D:force s:resync ?:help",
        View::Endpoints => "a:haproxy A:lvs d:del ?:help",
    };

    let mut spans = vec![Span::raw(format!(" {} ", app.source_description()))];
    if app.in_flight > 0 {
        spans.push(Span::styled(
            format!("| {} pending ", app.in_flight),
            Style::default().fg(app.theme.warning),
        ));
    }
    if let Some(err) = &app.load_error {
        spans.push(Span::styled(
            format!("| Error: {} ", err),
            Style::default().fg(app.theme.critical),
        ));
    } else if let Some(updated) = app.last_update {
        spans.push(Span::raw(format!(
            "| Updated {:.1}s ago ",
            updated.elapsed().as_secs_f64()
        )));
    }
    spans.push(Span::raw(format!("| {}", controls)));

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |name: &'static str| {
        Line::from(vec![Span::styled(name, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l 1-3  Switch views"),
        Line::from("  ↑/↓ j/k      Navigate list"),
        Line::from("  PgUp/PgDn    Jump 10 items"),
        Line::from("  Home/End     Jump to first/last"),
        Line::from("  Enter        Server detail"),
        Line::from("  Esc          Go back"),
        Line::from("  c            Choose cluster"),
        Line::from(""),
        section(" Commands"),
        Line::from("  a            Add server/sentinel/haproxy"),
        Line::from("  A            Add lvs"),
        Line::from("  g            Create group"),
        Line::from("  d / D        Remove / force remove"),
        Line::from("  p            Promote server"),
        Line::from("  f            Force full sync"),
        Line::from("  s / S        Resync / resync all groups"),
        Line::from(""),
        section(" Prompts"),
        Line::from("  y / Enter    Confirm"),
        Line::from("  Y            Confirm despite HA conflict"),
        Line::from("  n / Esc      Cancel"),
        Line::from(""),
        section(" General"),
        Line::from("  r            Refresh now"),
        Line::from("  e            Export to JSON"),
        Line::from("  q            Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_area = centered(area, 48, 34);
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render the last `width` levels as bar characters.
pub fn sparkline(data: &[u8], width: usize) -> String {
    if data.is_empty() {
        return " ".repeat(width);
    }
    let skip = data.len().saturating_sub(width);
    data[skip..]
        .iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect()
}

/// Format large numbers with K/M suffixes
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_keeps_latest() {
        assert_eq!(sparkline(&[0, 7, 3], 2), "█▄");
        assert_eq!(sparkline(&[], 3), "   ");
        assert_eq!(sparkline(&[9], 4), "█");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(12_345), "12.3K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }

    #[test]
    fn test_centered_fits_small_area() {
        let area = Rect::new(0, 0, 30, 10);
        let rect = centered(area, 48, 34);
        assert_eq!(rect.width, 26);
        assert_eq!(rect.height, 8);
        assert_eq!(rect.x, 2);
        assert_eq!(rect.y, 1);
    }
}
