use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode};
use crate::surface::MapSurface;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::ModelsLoaded(seq, result) => app.on_models_loaded(seq, result),
        AppEvent::SearchDone(seq, result) => app.on_search_done(seq, result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('n') => {
                app.reset_session();
                return;
            }
            _ => {}
        }
    }

    if app.show_model_picker {
        handle_model_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_model_picker = false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.model_picker_nav_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.model_picker_nav_up();
        }
        KeyCode::Enter => {
            app.select_model();
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the prompt
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
            app.prompt_cursor = app.prompt_input.chars().count();
        }

        // Tab cycles: Input -> Chat -> Map -> Places -> Input
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Input => FocusPane::Chat,
                FocusPane::Chat => FocusPane::Map,
                FocusPane::Map => {
                    if app.session.places().is_empty() {
                        FocusPane::Input
                    } else {
                        FocusPane::Places
                    }
                }
                FocusPane::Places => FocusPane::Input,
            };
            if app.focus == FocusPane::Input {
                app.input_mode = InputMode::Editing;
                app.prompt_cursor = app.prompt_input.chars().count();
            }
        }

        KeyCode::Char('M') => app.open_model_picker(),
        KeyCode::Char('L') => app.toggle_language(),

        // Focus-dependent navigation
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Chat => app.chat_scroll_down(1),
            FocusPane::Places => app.places_nav_down(),
            FocusPane::Map => app.surface.pan(0.0, -1.0),
            FocusPane::Input => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Chat => app.chat_scroll_up(1),
            FocusPane::Places => app.places_nav_up(),
            FocusPane::Map => app.surface.pan(0.0, 1.0),
            FocusPane::Input => {}
        },
        KeyCode::Char('h') | KeyCode::Left => {
            if app.focus == FocusPane::Map {
                app.surface.pan(-1.0, 0.0);
            }
        }
        KeyCode::Char('l') | KeyCode::Right => {
            if app.focus == FocusPane::Map {
                app.surface.pan(1.0, 0.0);
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            if app.focus == FocusPane::Map {
                app.surface.zoom_in();
            }
        }
        KeyCode::Char('-') => {
            if app.focus == FocusPane::Map {
                app.surface.zoom_out();
            }
        }

        KeyCode::Char('g') => {
            if app.focus == FocusPane::Chat {
                app.chat_scroll = 0;
            }
        }
        KeyCode::Char('G') => {
            if app.focus == FocusPane::Chat {
                app.scroll_chat_to_bottom();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Chat;
        }
        KeyCode::Enter => {
            app.submit_prompt();
        }
        KeyCode::Backspace => {
            if app.prompt_cursor > 0 {
                app.prompt_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.prompt_input, app.prompt_cursor);
                app.prompt_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.prompt_input.chars().count();
            if app.prompt_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.prompt_input, app.prompt_cursor);
                app.prompt_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.prompt_cursor = app.prompt_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.prompt_input.chars().count();
            app.prompt_cursor = (app.prompt_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.prompt_cursor = 0;
        }
        KeyCode::End => {
            app.prompt_cursor = app.prompt_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.prompt_input, app.prompt_cursor);
            app.prompt_input.insert(byte_pos, c);
            app.prompt_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_map = app.map_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_places = app.places_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.chat_scroll_down(3);
            } else if in_map {
                app.surface.zoom_out();
            } else if in_places {
                app.places_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.chat_scroll_up(3);
            } else if in_map {
                app.surface.zoom_in();
            } else if in_places {
                app.places_nav_up();
            }
        }
        _ => {}
    }
}
