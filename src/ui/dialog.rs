//! Modal dialogs: prompts, notices, coordinator errors, add-forms, the
//! cluster picker and the replica detail overlay.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::common::{centered, format_count, sparkline};
use super::theme::Theme;
use crate::app::{App, Dialog, InputForm};
use crate::coordinator::ErrorBody;
use crate::dispatch::{Prompt, Severity};

/// Minimum size for the detail overlay.
const MIN_OVERLAY_WIDTH: u16 = 50;
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render whichever dialog is open.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(dialog) = &app.dialog else {
        return;
    };

    match dialog {
        Dialog::Confirm(prompt) => render_confirm(frame, &app.theme, prompt, area),
        Dialog::Notice(text) => render_notice(frame, &app.theme, text, area),
        Dialog::Error { title, body } => render_error(frame, &app.theme, title, body, area),
        Dialog::Input(form) => render_form(frame, &app.theme, form, area),
        Dialog::ClusterPicker { selected } => render_picker(frame, app, *selected, area),
        Dialog::ServerDetail => render_detail(frame, app, area),
    }
}

fn framed<'a>(theme: &Theme, title: String, style: Style) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(style)
}

fn render_confirm(frame: &mut Frame, theme: &Theme, prompt: &Prompt, area: Rect) {
    let escalated = prompt.severity == Severity::Escalated;
    let border = if escalated {
        theme.escalated()
    } else {
        Style::default().fg(theme.highlight)
    };

    let mut lines: Vec<Line> = prompt.body.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    lines.push(if escalated {
        Line::from(vec![
            Span::styled("Y", theme.escalated()),
            Span::raw(" confirm despite HA conflict   "),
            Span::styled("n/Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ])
    } else {
        Line::from(vec![
            Span::styled("y/Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" confirm   "),
            Span::styled("n/Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ])
    });

    let height = (lines.len() as u16 + 2).clamp(6, 30);
    let rect = centered(area, 72, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(framed(theme, format!(" {} ", prompt.title), border))
            .wrap(Wrap { trim: false }),
        rect,
    );
}

fn render_notice(frame: &mut Frame, theme: &Theme, text: &str, area: Rect) {
    let rect = centered(area, 60, 7);
    frame.render_widget(Clear, rect);
    let lines = vec![
        Line::from(text.to_string()),
        Line::from(""),
        Line::styled("Enter/Esc to close", Style::default().add_modifier(Modifier::DIM)),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .block(framed(theme, " Notice ".to_string(), Style::default().fg(theme.warning)))
            .wrap(Wrap { trim: true }),
        rect,
    );
}

fn render_error(frame: &mut Frame, theme: &Theme, title: &str, body: &ErrorBody, area: Rect) {
    let lines: Vec<Line> = match body {
        ErrorBody::Json(text) => text.lines().map(|l| highlight_json(theme, l)).collect(),
        ErrorBody::Text(text) => text.lines().map(|l| Line::from(l.to_string())).collect(),
    };

    let height = (lines.len() as u16 + 2).clamp(5, 30);
    let rect = centered(area, 80, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(framed(theme, format!(" {} ", title), theme.escalated()))
            .wrap(Wrap { trim: false }),
        rect,
    );
}

/// Color one line of pretty-printed JSON: keys, strings, and literals.
fn highlight_json<'a>(theme: &Theme, line: &str) -> Line<'a> {
    let mut spans = Vec::new();
    let mut rest = line;

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('"') {
            // Find the closing quote, skipping escaped ones
            let mut end = None;
            let mut escaped = false;
            for (i, c) in stripped.char_indices() {
                match c {
                    '\\' if !escaped => escaped = true,
                    '"' if !escaped => {
                        end = Some(i);
                        break;
                    }
                    _ => escaped = false,
                }
            }
            let len = end.map(|e| e + 2).unwrap_or(rest.len());
            let (token, tail) = rest.split_at(len);
            let style = if tail.trim_start().starts_with(':') {
                Style::default().fg(theme.highlight)
            } else {
                Style::default().fg(theme.healthy)
            };
            spans.push(Span::styled(token.to_string(), style));
            rest = tail;
        } else {
            let len = rest.find('"').unwrap_or(rest.len());
            let (token, tail) = rest.split_at(len);
            let trimmed = token.trim_matches(|c: char| c.is_whitespace() || ",:[]{}".contains(c));
            if trimmed.is_empty() {
                spans.push(Span::raw(token.to_string()));
            } else {
                spans.push(Span::styled(token.to_string(), Style::default().fg(theme.warning)));
            }
            rest = tail;
        }
    }

    Line::from(spans)
}

fn render_form(frame: &mut Frame, theme: &Theme, form: &InputForm, area: Rect) {
    let mut lines = Vec::new();
    for (i, (label, value)) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>12}: ", label), label_style),
            Span::raw(value.clone()),
            Span::raw(if focused { "_" } else { "" }),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(
        "Tab next field | Enter submit | Esc cancel",
        Style::default().add_modifier(Modifier::DIM),
    ));

    let rect = centered(area, 60, lines.len() as u16 + 2);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(framed(
            theme,
            format!(" {} ", form.title()),
            Style::default().fg(theme.highlight),
        )),
        rect,
    );
}

fn render_picker(frame: &mut Frame, app: &App, selected: usize, area: Rect) {
    let theme = &app.theme;
    let items: Vec<ListItem> = if app.clusters.is_empty() {
        vec![ListItem::new(Line::styled(
            "Loading cluster list...",
            Style::default().add_modifier(Modifier::DIM),
        ))]
    } else {
        app.clusters
            .iter()
            .map(|name| {
                let current = app.cluster.as_deref() == Some(name.as_str());
                let marker = if current { " *" } else { "" };
                ListItem::new(format!("{}{}", name, marker))
            })
            .collect()
    };

    let height = (items.len() as u16 + 2).clamp(5, 20);
    let rect = centered(area, 40, height);
    frame.render_widget(Clear, rect);

    let list = List::new(items)
        .block(framed(
            theme,
            " Clusters ".to_string(),
            Style::default().fg(theme.highlight),
        ))
        .highlight_style(theme.selected)
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    if !app.clusters.is_empty() {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(list, rect, &mut state);
}

/// Replica detail: identity, memory, replication and the key-count lines.
fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }
    let (Some(group), Some(server)) = (app.selected_group(), app.selected_server()) else {
        return;
    };
    let theme = &app.theme;

    let overlay_width = (area.width * 90 / 100).clamp(MIN_OVERLAY_WIDTH, 100);
    let overlay_height = (area.height * 85 / 100).clamp(MIN_OVERLAY_HEIGHT, 40);
    let rect = centered(area, overlay_width, overlay_height);
    frame.render_widget(Clear, rect);

    let chunks = Layout::vertical([Constraint::Length(9), Constraint::Min(3)]).split(rect);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let samples = app.history.samples(&server.addr);
    let peak = samples.iter().copied().max().unwrap_or(0);

    let mut info = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", server.label), bold),
            Span::raw(" in "),
            Span::styled(format!("Group-[{}]", group.name), bold),
        ]),
        Line::from(vec![
            Span::raw(" Status: "),
            Span::styled(server.status.label(), theme.status_style(server.status)),
            Span::raw("   HA: "),
            Span::styled(server.ha_role.label(), theme.role_style(server.ha_role)),
        ]),
        Line::from(format!(
            " Memory: {} / {}   DB size: {}",
            server.memory, server.max_memory, server.db_size
        )),
        Line::from(vec![
            Span::raw(format!(
                " Upstream: {}   expected: {} ",
                server.upstream, server.expected_upstream
            )),
            Span::styled(
                match server.replication_ok {
                    Some(true) => "in sync",
                    Some(false) => "MISMATCH",
                    None => "unknown",
                },
                theme.sync_style(server.replication_ok),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!(
                " OPS: {}   peak {}   ",
                server.ops_per_sec.map(format_count).unwrap_or_else(|| "NA".to_string()),
                format_count(peak)
            )),
            Span::styled(
                sparkline(&app.history.server_sparkline(&server.addr), 30),
                Style::default().fg(theme.highlight),
            ),
        ]),
    ];
    if server.is_promoting {
        info.push(Line::styled(" Promotion in progress", Style::default().fg(theme.warning)));
    }
    frame.render_widget(
        Paragraph::new(info).block(framed(
            theme,
            " Server Detail ".to_string(),
            Style::default().fg(theme.highlight),
        )),
        chunks[0],
    );

    let keys: Vec<ListItem> = if server.keys.is_empty() {
        vec![ListItem::new(Line::styled(
            "no keyspace",
            Style::default().add_modifier(Modifier::DIM),
        ))]
    } else {
        server.keys.iter().map(|k| ListItem::new(k.as_str())).collect()
    };
    frame.render_widget(
        List::new(keys).block(framed(
            theme,
            " Keyspace (↑↓ server, Esc close) ".to_string(),
            Style::default().fg(theme.border),
        )),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_highlight_json_keeps_text() {
        let theme = Theme::dark();
        let raw = r#"  "Cause": "group-[1] is \"locked\"", "Code": 1500,"#;
        let line = highlight_json(&theme, raw);
        assert_eq!(text(&line), raw);
    }

    #[test]
    fn test_highlight_json_colors_keys_and_values() {
        let theme = Theme::dark();
        let line = highlight_json(&theme, r#"  "Code": 1500"#);

        let key = line.spans.iter().find(|s| s.content == "\"Code\"").unwrap();
        assert_eq!(key.style.fg, Some(theme.highlight));

        let number = line.spans.iter().find(|s| s.content.contains("1500")).unwrap();
        assert_eq!(number.style.fg, Some(theme.warning));
    }

    #[test]
    fn test_highlight_json_unterminated_string() {
        let theme = Theme::dark();
        let line = highlight_json(&theme, r#""open"#);
        assert_eq!(text(&line), "\"open");
    }
}
