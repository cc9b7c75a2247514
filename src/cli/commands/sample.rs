use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::generate::{generate_and_report, spinner, OutputArgs};
use crate::config::Config;
use crate::core::SessionController;

#[derive(Args)]
pub struct SampleArgs {
    /// Sample number (see --list)
    pub index: Option<usize>,

    /// List the available samples
    #[arg(short, long)]
    pub list: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl SampleArgs {
    /// Listing needs no model access
    pub fn wants_list(&self) -> bool {
        self.list || self.index.is_none()
    }
}

pub async fn run(
    args: SampleArgs,
    config: &Config,
    controller: &mut SessionController,
) -> Result<()> {
    let index = match args.index {
        Some(index) if !args.wants_list() => index,
        _ => return list_samples(config),
    };

    let Some(url) = config.sample_url(index) else {
        anyhow::bail!(
            "No sample #{}. There are {} samples, run `toonify sample --list`",
            index,
            config.samples.urls.len()
        );
    };

    let pb = if args.output.format == "text" {
        Some(spinner("Loading sample image...")?)
    } else {
        None
    };

    controller.select_sample(url).await;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if let Some(message) = controller.state().error() {
        if args.output.format != "quiet" {
            eprintln!("{}: {}", "Error".red().bold(), message);
        }
        anyhow::bail!("{}", message);
    }

    generate_and_report(controller, config, &args.output).await
}

pub fn list_samples(config: &Config) -> Result<()> {
    if config.samples.urls.is_empty() {
        println!("{}", "No samples configured (set samples.urls)".dimmed());
        return Ok(());
    }

    println!("{}", "Samples".cyan().bold());
    for (i, url) in config.samples.urls.iter().enumerate() {
        println!("  {} {}", format!("{:>2}.", i + 1).yellow(), url);
    }
    Ok(())
}
