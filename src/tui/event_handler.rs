use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;

use super::app::{App, AppMode};
use super::session::Action;

/// Handle input in main mode
pub fn handle_main_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Sample navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),

        // Open a photo from disk
        KeyCode::Char('o') | KeyCode::Char('i') | KeyCode::Char('/') => {
            app.mode = AppMode::Input;
            app.clear_messages();
        }

        // Pick the highlighted sample
        KeyCode::Enter => {
            if let Some(url) = app.selected_sample_url().map(String::from) {
                request(app, Action::SelectSample(url));
            }
        }

        // Pick a sample by number
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if let Some(url) = app.samples.get(index).cloned() {
                app.selected_sample = index;
                request(app, Action::SelectSample(url));
            }
        }

        KeyCode::Char('g') => request(app, Action::Generate),

        KeyCode::Char('d') => {
            if app.session.can_download() {
                app.send(Action::Download);
            }
        }

        KeyCode::Char('x') => request(app, Action::ClearImage),

        // Quit
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }

        _ => {}
    }
}

/// Actions that change the session are disabled while something is loading
fn request(app: &mut App, action: Action) {
    if app.is_busy() {
        app.set_status("Please wait for the current request to finish");
        return;
    }
    app.send(action);
}

/// Handle input in path input mode
pub fn handle_input_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.mode = AppMode::Main;
            app.input.clear();
            app.cursor_pos = 0;
        }

        KeyCode::Enter => {
            let raw = app.input.trim().to_string();
            if raw.is_empty() {
                return;
            }
            app.input.clear();
            app.cursor_pos = 0;
            app.mode = AppMode::Main;
            request(app, Action::SelectFile(expand_home(&raw)));
        }

        KeyCode::Char(c) => {
            app.input.insert(byte_index(&app.input, app.cursor_pos), c);
            app.cursor_pos += 1;
        }

        KeyCode::Backspace => {
            if app.cursor_pos > 0 {
                app.cursor_pos -= 1;
                app.input.remove(byte_index(&app.input, app.cursor_pos));
            }
        }

        KeyCode::Delete => {
            if app.cursor_pos < app.input.chars().count() {
                app.input.remove(byte_index(&app.input, app.cursor_pos));
            }
        }

        KeyCode::Left => {
            if app.cursor_pos > 0 {
                app.cursor_pos -= 1;
            }
        }

        KeyCode::Right => {
            if app.cursor_pos < app.input.chars().count() {
                app.cursor_pos += 1;
            }
        }

        KeyCode::Home => {
            app.cursor_pos = 0;
        }

        KeyCode::End => {
            app.cursor_pos = app.input.chars().count();
        }

        _ => {}
    }
}

/// Cursor positions count chars; `String` edits need byte offsets
fn byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(raw)
}
