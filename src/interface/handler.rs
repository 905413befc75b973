use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{MouseEvent, MouseEventKind};

use crate::filter::ShowsFilter;
use crate::interface::app::App;

/// Handles the key events and updates the state of [`App`].
pub fn handle_key_events(key_event: KeyEvent, app: &mut App) -> eyre::Result<()> {
    app.status = None;
    match key_event.code {
        // Exit application on `ESC` or `q`
        KeyCode::Esc | KeyCode::Char('q') => {
            app.quit();
        }
        // Exit application on `Ctrl-C`
        KeyCode::Char('c') | KeyCode::Char('C') => {
            if key_event.modifiers == KeyModifiers::CONTROL {
                app.quit();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.prev(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.next(1);
        }
        KeyCode::Char('u') => {
            if key_event.modifiers == KeyModifiers::CONTROL {
                app.prev(20);
            }
        }
        KeyCode::Char('d') => {
            if key_event.modifiers == KeyModifiers::CONTROL {
                app.next(20);
            }
        }
        KeyCode::Char('g') => {
            app.first();
        }
        KeyCode::Char('G') => {
            app.last();
        }
        KeyCode::Char('s') => {
            app.toggle_starred()?;
        }
        KeyCode::Char('a') => {
            app.toggle_archived()?;
        }
        KeyCode::Char('w') => {
            app.set_show_watched(true)?;
        }
        KeyCode::Char('W') => {
            app.set_show_watched(false)?;
        }
        KeyCode::Char('f') | KeyCode::Tab => {
            app.cycle_filter()?;
        }
        // filter menu: 1..=5
        KeyCode::Char(c @ '1'..='5') => {
            let code = c as i32 - '1' as i32;
            if let Some(mode) = ShowsFilter::from_code(code) {
                app.set_filter(mode)?;
            }
        }
        _ => {}
    }
    Ok(())
}

// handle mouse events as well
pub fn handle_mouse_events(mouse_event: MouseEvent, app: &mut App) -> eyre::Result<()> {
    match mouse_event.kind {
        MouseEventKind::ScrollDown => {
            app.next(1);
        }
        MouseEventKind::ScrollUp => {
            app.prev(1);
        }
        _ => {}
    }

    Ok(())
}
