pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "toonify",
    version,
    about = "Turn a photo into a cartoon avatar with Google Gemini",
    long_about = r#"Turn a photo into a cartoon avatar with Google Gemini

Pick a photo (or one of the built-in samples), send it to a Gemini image
model and save the cartoon-style result as cartoon-avatar.png.
Run without arguments to launch the interactive TUI.

SETUP:
  Set your API key via environment variable or config:
    export GEMINI_API_KEY=your-key-here
    toonify config set api.key your-key-here

EXAMPLES:
  Cartoonify a photo:
    toonify generate me.jpg
    toonify g portrait.png --output ~/Pictures

  Try a sample:
    toonify sample --list
    toonify sample 2

  Manage configuration:
    toonify config show
    toonify config set output.directory ~/Pictures/avatars

  Launch interactive TUI:
    toonify

OUTPUT FORMATS:
  --format text   Human-readable output (default)
  --format json   Machine-readable JSON
  --format quiet  Minimal output, just the file path"#
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn a photo into a cartoon avatar
    ///
    /// Sends the photo to the configured Gemini model and saves the result
    /// to the output directory.
    #[command(
        alias = "g",
        after_help = r#"EXAMPLES:
  Basic:
    toonify generate me.jpg

  Custom output directory:
    toonify generate me.jpg --output ./avatars

  JSON output:
    toonify generate me.jpg --format json

  Just look, don't save:
    toonify generate me.jpg --no-download"#
    )]
    Generate(commands::generate::GenerateArgs),

    /// Cartoonify one of the built-in sample photos
    #[command(
        alias = "s",
        after_help = r#"EXAMPLES:
  List samples:
    toonify sample --list

  Use sample number 3:
    toonify sample 3"#
    )]
    Sample(commands::sample::SampleArgs),

    /// View or modify configuration
    ///
    /// Changes are saved to the config file immediately.
    #[command(
        alias = "c",
        after_help = r#"EXAMPLES:
  Show all settings:
    toonify config show

  Set values:
    toonify config set api.key YOUR_API_KEY
    toonify config set output.directory ~/Pictures/avatars
    toonify config set output.display none

AVAILABLE SETTINGS:
  api.key              - Gemini API key
  api.model            - Image model
  api.base_url         - API endpoint
  prompt.instruction   - Instruction sent with every photo
  samples.urls         - Comma-separated sample image URLs
  output.directory     - Where to save avatars
  output.filename      - Saved file name
  output.display       - Display mode (terminal/viewer/none)
  tui.theme            - TUI theme (dark/light)"#
    )]
    Config(commands::config::ConfigArgs),
}
