use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, Dialog, View};

/// File written by the export key.
pub const EXPORT_PATH: &str = "shardwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.dialog.is_some() {
        handle_dialog_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Groups),
        KeyCode::Char('2') => app.set_view(View::Sentinels),
        KeyCode::Char('3') => app.set_view(View::Endpoints),

        // Navigation (up/down for items, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Enter => app.enter_detail(),
        KeyCode::Esc => app.go_back(),

        KeyCode::Char('c') => app.open_cluster_picker(),
        KeyCode::Char('r') => {
            app.refresh();
            app.set_status_message("Refreshing".to_string());
        }
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        // Commands
        KeyCode::Char('a') => app.open_add_form(false),
        KeyCode::Char('A') if app.current_view == View::Endpoints => app.open_add_form(true),
        KeyCode::Char('g') if app.current_view == View::Groups => app.open_add_form(true),
        KeyCode::Char('d') => app.request_remove(false),
        KeyCode::Char('D') if app.current_view == View::Sentinels => app.request_remove(true),
        KeyCode::Char('p') if app.current_view == View::Groups => app.request_promote(),
        KeyCode::Char('f') if app.current_view == View::Groups => app.request_force_full_sync(),
        KeyCode::Char('s') => app.request_resync(),
        KeyCode::Char('S') if app.current_view == View::Groups => app.request_resync_all(),

        _ => {}
    }
}

/// Handle key input while a dialog is open
fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let Some(dialog) = app.dialog.as_mut() else {
        return;
    };

    match dialog {
        Dialog::Confirm(_) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm(false),
            KeyCode::Char('Y') => app.confirm(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') | KeyCode::Esc => {
                app.go_back()
            }
            _ => {}
        },

        Dialog::Input(form) => match key.code {
            KeyCode::Enter => app.submit_form(),
            KeyCode::Esc => app.go_back(),
            KeyCode::Tab => form.next_field(),
            KeyCode::Backspace => form.pop(),
            KeyCode::Char(c) => form.push(c),
            _ => {}
        },

        Dialog::ClusterPicker { .. } => match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.picker_move(false),
            KeyCode::Down | KeyCode::Char('j') => app.picker_move(true),
            KeyCode::Enter => app.picker_choose(),
            KeyCode::Esc | KeyCode::Char('q') => app.go_back(),
            _ => {}
        },

        // Allow scrolling through servers while the detail overlay is open
        Dialog::ServerDetail => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                app.select_prev();
                keep_detail_on_server(app);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.select_next();
                keep_detail_on_server(app);
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.go_back()
            }
            _ => {}
        },

        Dialog::Notice(_) | Dialog::Error { .. } => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char(' ') => {
                app.go_back()
            }
            _ => {}
        },
    }
}

/// Close the detail overlay when the selection lands on a group row.
fn keep_detail_on_server(app: &mut App) {
    if app.selected_server().is_none() {
        app.dialog = None;
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    if app.dialog.is_some() {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Content area starts after header, tabs and table header
            if clicked_row > content_start_row {
                let item_row = (clicked_row - content_start_row - 1) as usize;
                app.select_first();
                app.select_next_n(item_row);
            }

            // Tab clicks (row 1, after header)
            if clicked_row == 1 {
                let col = mouse.column;
                // Approximate tab positions: Groups (0-11), Sentinels (12-26), Endpoints (27-41)
                if col < 12 {
                    app.set_view(View::Groups);
                } else if col < 27 {
                    app.set_view(View::Sentinels);
                } else if col < 42 {
                    app.set_view(View::Endpoints);
                }
            }
        }

        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Command;
    use crate::source::{DataSource, SourceEvent};

    #[derive(Debug)]
    struct Idle;

    impl DataSource for Idle {
        fn request_clusters(&mut self) {}
        fn request_overview(&mut self, _cluster: &str) {}
        fn request_stats(&mut self, _cluster: &str) {}
        fn submit(&mut self, _cluster: &str, _command: Command) {}
        fn poll(&mut self) -> Option<SourceEvent> {
            None
        }
        fn description(&self) -> &str {
            "idle"
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_quit() {
        let mut app = App::new(Box::new(Idle));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn test_view_switching() {
        let mut app = App::new(Box::new(Idle));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view, View::Sentinels);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.current_view, View::Endpoints);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_view, View::Groups);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = App::new(Box::new(Idle));
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_form_typing() {
        let mut app = App::new(Box::new(Idle));
        app.select_cluster("demo");
        app.set_view(View::Sentinels);

        press(&mut app, KeyCode::Char('a'));
        for c in "10.0.0.1:26379".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);

        match &app.dialog {
            Some(Dialog::Input(form)) => assert_eq!(form.fields[0].1, "10.0.0.1:2637"),
            other => panic!("expected form, got {:?}", other),
        }

        // Typing 'q' goes into the form, Esc closes it
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        press(&mut app, KeyCode::Esc);
        assert!(app.dialog.is_none());
    }

    #[test]
    fn test_notice_closes_on_enter() {
        let mut app = App::new(Box::new(Idle));
        app.dialog = Some(Dialog::Notice("nope".to_string()));
        press(&mut app, KeyCode::Enter);
        assert!(app.dialog.is_none());
    }
}
