mod app;
mod event_handler;
mod session;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

use crate::config::Config;
use crate::core::SessionController;

use app::{App, AppMode};

/// Run the TUI application
pub async fn run(config: &Config, controller: SessionController) -> Result<()> {
    let (action_tx, action_rx) = async_channel::unbounded();
    let (event_tx, event_rx) = async_channel::unbounded();

    let session = tokio::spawn(session::run_session(
        controller,
        action_rx,
        event_tx,
        config.output_dir(),
    ));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, action_tx);

    let result = run_app(&mut terminal, &mut app, &event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Closing the action channel lets the session task finish; anything
    // still in flight is abandoned with the runtime.
    drop(app);
    session.abort();

    result
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &async_channel::Receiver<session::UiEvent>,
) -> Result<()> {
    loop {
        // Pick up whatever the session reported since the last frame
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }

        // Draw UI
        terminal.draw(|f| ui::draw(f, app))?;

        // Handle events
        if poll(Duration::from_millis(100))? {
            if let Event::Key(key) = read()? {
                // Global quit shortcut
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle mode-specific input
                match app.mode {
                    AppMode::Main => event_handler::handle_main_input(app, key),
                    AppMode::Input => event_handler::handle_input_mode(app, key),
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            return Ok(());
        }

        // Let the session task make progress between frames
        tokio::task::yield_now().await;
    }
}
