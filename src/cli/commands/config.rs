use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::config::{env_api_key, Config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show all configuration values
    Show,

    /// Get a specific configuration value
    Get {
        /// Config key (e.g., api.key, output.directory)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Config key (e.g., api.key, output.directory)
        key: String,
        /// Value to set
        value: String,
    },

    /// Show the config file path
    Path,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, config: &mut Config) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show_config(config),
        Some(ConfigCommand::Get { key }) => get_config(&key, config),
        Some(ConfigCommand::Set { key, value }) => set_config(&key, &value, config),
        Some(ConfigCommand::Path) => show_path(config),
        Some(ConfigCommand::Reset { force }) => reset_config(force, config),
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", "Configuration".cyan().bold());
    println!("{}", "=".repeat(50));
    println!();

    println!("[{}]", "api".yellow());
    let key = config
        .get("api.key")
        .unwrap_or_else(|| "(not set)".dimmed().to_string());
    println!("  {} = {}", "key".bold(), key);
    println!("  {} = {}", "model".bold(), config.api.model);
    println!("  {} = {}", "base_url".bold(), config.api.base_url);
    println!();

    println!("[{}]", "prompt".yellow());
    println!("  {} = {}", "instruction".bold(), config.prompt.instruction);
    println!();

    println!("[{}]", "samples".yellow());
    for (i, url) in config.samples.urls.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).bold(), url);
    }
    println!();

    println!("[{}]", "output".yellow());
    println!("  {} = {}", "directory".bold(), config.output.directory);
    println!("  {} = {}", "filename".bold(), config.output.filename);
    println!("  {} = {}", "display".bold(), config.output.display.as_str());
    println!();

    println!("[{}]", "tui".yellow());
    println!("  {} = {}", "theme".bold(), config.tui.theme);
    println!();

    println!("{}", format!("Config file: {}", config.config_path.display()).dimmed());

    Ok(())
}

fn get_config(key: &str, config: &Config) -> Result<()> {
    if let Some(value) = config.get(key) {
        println!("{}", value);
        return Ok(());
    }

    if Config::keys().contains(&key) {
        println!("{}", "(not set)".dimmed());
        return Ok(());
    }

    eprintln!("{}: Unknown config key '{}'", "Error".red().bold(), key);
    eprintln!();
    eprintln!("Available keys:");
    for k in Config::keys() {
        eprintln!("  {}", k);
    }
    Ok(())
}

fn set_config(key: &str, value: &str, config: &mut Config) -> Result<()> {
    config.set(key, value)?;
    config.save()?;

    let shown = if key == "api.key" { "****" } else { value };
    println!("{} Set {} = {}", "✓".green(), key.cyan(), shown);
    Ok(())
}

fn show_path(config: &Config) -> Result<()> {
    println!("{}", config.config_path.display());
    Ok(())
}

fn reset_config(force: bool, config: &mut Config) -> Result<()> {
    if !force {
        eprintln!(
            "{}: This will reset all configuration to defaults. Use --force to confirm.",
            "Warning".yellow().bold()
        );
        return Ok(());
    }

    // Preserve the path
    let path = config.config_path.clone();

    // Reset to defaults
    *config = Config::default();
    config.config_path = path;

    config.apply_env_key(env_api_key());

    config.save()?;

    println!("{} Configuration reset to defaults", "✓".green());
    Ok(())
}
