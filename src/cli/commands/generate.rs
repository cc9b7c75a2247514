use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{Config, DisplayMode};
use crate::core::{SessionController, SessionState, SessionStatus};

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to the photo to turn into an avatar
    #[arg(required = true)]
    pub image: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options shared by every command that produces an avatar
#[derive(Args, Clone)]
pub struct OutputArgs {
    /// Output directory for the downloaded avatar
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't save the avatar to disk
    #[arg(long)]
    pub no_download: bool,

    /// Output format (text, json, quiet)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Machine-readable summary printed with `--format json`
#[derive(Serialize)]
struct Report<'a> {
    status: SessionStatus,
    source: Option<&'a str>,
    model: &'a str,
    error: Option<&'a str>,
    path: Option<String>,
    generated_at: Option<String>,
}

pub async fn run(
    args: GenerateArgs,
    config: &Config,
    controller: &mut SessionController,
) -> Result<()> {
    let image_path = args.image.canonicalize().context("Image file not found")?;

    controller
        .select_file(&image_path)
        .await
        .with_context(|| format!("Failed to load {}", image_path.display()))?;

    generate_and_report(controller, config, &args.output).await
}

/// Run a generation on the selected source and report it in the requested format
pub(crate) async fn generate_and_report(
    controller: &mut SessionController,
    config: &Config,
    args: &OutputArgs,
) -> Result<()> {
    let subscription = if args.format == "text" {
        let pb = spinner("Generating your avatar...")?;
        Some(controller.subscribe(follow_progress(pb)))
    } else {
        None
    };

    controller.generate().await;
    if let Some(id) = subscription {
        controller.unsubscribe(id);
    }

    let state = controller.state().clone();
    let output_dir = args.output.clone().unwrap_or_else(|| config.output_dir());

    let saved = if state.status() == SessionStatus::Success && !args.no_download {
        controller.download(&output_dir).await?
    } else {
        None
    };

    report(&state, config, args, saved.as_deref())?;

    match state.error() {
        Some(message) => anyhow::bail!("{}", message),
        None => Ok(()),
    }
}

fn report(
    state: &SessionState,
    config: &Config,
    args: &OutputArgs,
    saved: Option<&Path>,
) -> Result<()> {
    match args.format.as_str() {
        "json" => {
            let report = Report {
                status: state.status(),
                source: state.preview(),
                model: &config.api.model,
                error: state.error(),
                path: saved.map(|p| p.display().to_string()),
                generated_at: state.result().map(|r| r.generated_at.to_rfc3339()),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "quiet" => {
            if let Some(path) = saved {
                println!("{}", path.display());
            }
        }
        _ => {
            if let Some(message) = state.error() {
                eprintln!("{}: {}", "Error".red().bold(), message);
                return Ok(());
            }

            println!();
            if let Some(source) = state.source_image() {
                println!("{}: {}", "Source".cyan().bold(), source.name);
            }
            println!("{}: {}", "Model".cyan().bold(), config.api.model);
            println!("{}: {}", "Status".cyan().bold(), "completed".green());

            match saved {
                Some(path) => {
                    println!("{}: {}", "Avatar".cyan().bold(), path.display());
                    show_image(path, config.output.display);
                }
                None => println!("{}", "(not downloaded)".dimmed()),
            }
        }
    }
    Ok(())
}

/// Keep the spinner in step with the session; it finishes on the first
/// transition out of `Loading`
fn follow_progress(pb: ProgressBar) -> impl Fn(&SessionState) + Send + Sync + 'static {
    move |state| {
        if pb.is_finished() {
            return;
        }
        match state.status() {
            SessionStatus::Loading => pb.set_message("Generating your avatar..."),
            SessionStatus::Success => {
                pb.finish_with_message(format!("{} Avatar ready", "✓".green()))
            }
            SessionStatus::Failed => {
                pb.finish_with_message(format!("{} Generation failed", "✗".red()))
            }
            SessionStatus::Idle => pb.finish_and_clear(),
        }
    }
}

pub(crate) fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.magenta} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Show the saved avatar according to the configured display mode
fn show_image(path: &Path, mode: DisplayMode) {
    match mode {
        DisplayMode::Terminal => {
            println!();
            display_image_terminal(path);
        }
        DisplayMode::Viewer => open_in_viewer(path),
        DisplayMode::None => {}
    }
}

/// Display an image in the terminal using viuer
fn display_image_terminal(path: &Path) {
    let conf = viuer::Config {
        width: Some(60),
        height: Some(30),
        absolute_offset: false,
        ..Default::default()
    };

    if let Err(e) = viuer::print_from_file(path, &conf) {
        tracing::debug!("Failed to display image in terminal: {}", e);
    }
}

fn open_in_viewer(path: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };

    if let Err(e) = std::process::Command::new(opener).arg(path).spawn() {
        tracing::debug!("Failed to open image viewer: {}", e);
    }
}
