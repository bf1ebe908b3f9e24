//! Terminal UI rendering using ratatui.
//!
//! Each view lives in its own submodule with a `render` function.
//!
//! - [`groups`]: shard groups with their replicas, health and HA roles
//! - [`sentinels`]: sentinel table and the out-of-sync banner
//! - [`endpoints`]: haproxy/lvs balancers and proxy template files
//! - [`dialog`]: prompts, errors, add-forms, cluster picker, server detail
//! - [`common`]: header, tabs, status bar, help overlay
//! - [`theme`]: light/dark theme support with terminal auto-detection
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │ View Content                         │
//! │ (groups/sentinels/endpoints::render) │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!    Overlays on top: dialog::render, common::render_help
//! ```

pub mod common;
pub mod dialog;
pub mod endpoints;
pub mod groups;
pub mod sentinels;
pub mod theme;

use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

use crate::app::{App, View};

pub use theme::Theme;

/// Draw one full frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Groups => groups::render(frame, app, chunks[2]),
        View::Sentinels => sentinels::render(frame, app, chunks[2]),
        View::Endpoints => endpoints::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3]);

    dialog::render(frame, app, area);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
