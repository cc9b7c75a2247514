use async_channel::Sender;
use std::path::PathBuf;

use crate::config::Config;
use crate::core::SessionState;

use super::session::{Action, UiEvent};

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Main view
    Main,
    /// Typing a file path
    Input,
}

/// TUI application state.
///
/// `session` is a read-only copy of the controller's state, refreshed every
/// time the session task reports a transition.
pub struct App {
    /// Current mode
    pub mode: AppMode,

    /// Latest session snapshot
    pub session: SessionState,

    /// Sample URLs from config
    pub samples: Vec<String>,

    /// Selected sample index
    pub selected_sample: usize,

    /// Path input buffer
    pub input: String,

    /// Cursor position in input
    pub cursor_pos: usize,

    /// Where the last download went
    pub saved_path: Option<PathBuf>,

    /// Status message
    pub status_message: Option<String>,

    /// Error not tied to the session (bad path, failed download)
    pub error_message: Option<String>,

    /// Whether to quit
    pub should_quit: bool,

    /// Download directory
    pub output_dir: PathBuf,

    /// Light or dark palette
    pub theme: String,

    actions: Sender<Action>,

    /// A loading action was sent but its first snapshot hasn't arrived yet
    pending: bool,
}

impl App {
    pub fn new(config: &Config, actions: Sender<Action>) -> Self {
        Self {
            mode: AppMode::Main,
            session: SessionState::default(),
            samples: config.samples.urls.clone(),
            selected_sample: 0,
            input: String::new(),
            cursor_pos: 0,
            saved_path: None,
            status_message: None,
            error_message: None,
            should_quit: false,
            output_dir: config.output_dir(),
            theme: config.tui.theme.clone(),
            actions,
            pending: false,
        }
    }

    /// Loading, or about to be
    pub fn is_busy(&self) -> bool {
        self.pending || self.session.is_loading()
    }

    /// Forward an action to the session task
    pub fn send(&mut self, action: Action) {
        let starts_loading = matches!(action, Action::Generate | Action::SelectSample(_));
        if self.actions.try_send(action).is_err() {
            self.set_error("Session has stopped");
        } else if starts_loading {
            self.pending = true;
        }
    }

    /// Apply an event coming back from the session task
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::State(state) => {
                self.pending = false;
                if state.is_loading() || state.result().is_none() {
                    self.saved_path = None;
                }
                if state.is_loading() {
                    self.clear_messages();
                }
                self.session = state;
            }
            UiEvent::Saved(path) => {
                self.set_status(format!("Saved avatar to {}", path.display()));
                self.saved_path = Some(path);
            }
            UiEvent::Error(message) => {
                self.pending = false;
                self.set_error(message);
            }
        }
    }

    /// Set status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.error_message = None;
    }

    /// Set error message
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error_message = Some(msg.into());
        self.status_message = None;
    }

    /// Clear messages
    pub fn clear_messages(&mut self) {
        self.status_message = None;
        self.error_message = None;
    }

    /// Move sample selection up
    pub fn select_previous(&mut self) {
        if self.selected_sample > 0 {
            self.selected_sample -= 1;
        }
    }

    /// Move sample selection down
    pub fn select_next(&mut self) {
        if self.selected_sample < self.samples.len().saturating_sub(1) {
            self.selected_sample += 1;
        }
    }

    pub fn selected_sample_url(&self) -> Option<&str> {
        self.samples.get(self.selected_sample).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GenerationResult;

    fn app() -> (App, async_channel::Receiver<Action>) {
        let (tx, rx) = async_channel::unbounded();
        let mut config = Config::default();
        config.samples.urls = vec!["https://x/a.jpg".into(), "https://x/b.jpg".into()];
        (App::new(&config, tx), rx)
    }

    #[test]
    fn test_sample_selection_is_clamped() {
        let (mut app, _rx) = app();
        app.select_previous();
        assert_eq!(app.selected_sample, 0);
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_sample, 1);
        assert_eq!(app.selected_sample_url(), Some("https://x/b.jpg"));
    }

    #[test]
    fn test_loading_snapshot_clears_saved_path_and_messages() {
        let (mut app, _rx) = app();
        app.apply(UiEvent::Saved(PathBuf::from("/tmp/cartoon-avatar.png")));
        assert!(app.status_message.is_some());

        let mut loading = SessionState::default();
        loading.is_loading = true;
        app.apply(UiEvent::State(loading));

        assert!(app.saved_path.is_none());
        assert!(app.status_message.is_none());
        assert!(app.session.is_loading());
    }

    #[test]
    fn test_send_after_session_stopped_reports_error() {
        let (mut app, rx) = app();
        drop(rx);
        app.send(Action::Generate);
        assert_eq!(app.error_message.as_deref(), Some("Session has stopped"));
    }

    #[test]
    fn test_busy_until_first_snapshot_arrives() {
        let (mut app, _rx) = app();
        assert!(!app.is_busy());

        app.send(Action::Generate);
        assert!(app.is_busy());

        let mut loading = SessionState::default();
        loading.is_loading = true;
        app.apply(UiEvent::State(loading));
        assert!(app.is_busy());

        app.apply(UiEvent::State(SessionState::default()));
        assert!(!app.is_busy());
    }

    #[test]
    fn test_download_does_not_mark_busy() {
        let (mut app, _rx) = app();
        app.send(Action::Download);
        assert!(!app.is_busy());
    }

    #[test]
    fn test_success_snapshot_keeps_saved_path() {
        let (mut app, _rx) = app();
        let mut done = SessionState::default();
        done.result = Some(GenerationResult::from_base64("abc"));
        app.apply(UiEvent::Saved(PathBuf::from("/tmp/a.png")));
        app.apply(UiEvent::State(done));
        assert_eq!(app.saved_path, Some(PathBuf::from("/tmp/a.png")));
    }
}
