use async_channel::{Receiver, Sender};
use std::path::PathBuf;

use crate::core::{SessionController, SessionState};

/// User actions forwarded from the UI to the session task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectFile(PathBuf),
    ClearImage,
    SelectSample(String),
    Generate,
    Download,
}

/// What the session task reports back to the UI
#[derive(Debug, Clone)]
pub enum UiEvent {
    State(SessionState),
    Saved(PathBuf),
    Error(String),
}

/// Own the controller and apply actions one at a time until the UI hangs up
pub async fn run_session(
    mut controller: SessionController,
    actions: Receiver<Action>,
    events: Sender<UiEvent>,
    output_dir: PathBuf,
) {
    let snapshots = events.clone();
    controller.subscribe(move |state| {
        let _ = snapshots.try_send(UiEvent::State(state.clone()));
    });

    while let Ok(action) = actions.recv().await {
        tracing::debug!("Session action: {:?}", action);

        match action {
            Action::SelectFile(path) => {
                if let Err(e) = controller.select_file(&path).await {
                    let _ = events.send(UiEvent::Error(e.user_message())).await;
                }
            }
            Action::ClearImage => controller.clear_image(),
            Action::SelectSample(url) => controller.select_sample(&url).await,
            Action::Generate => controller.generate().await,
            Action::Download => match controller.download(&output_dir).await {
                Ok(Some(path)) => {
                    let _ = events.send(UiEvent::Saved(path)).await;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Download failed: {}", e);
                    let _ = events
                        .send(UiEvent::Error(format!("Download failed: {}", e)))
                        .await;
                }
            },
        }
    }

    tracing::debug!("Session task finished");
}
