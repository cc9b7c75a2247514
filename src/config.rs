use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variables checked for the API key, in order of precedence
const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Main configuration structure, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub samples: SamplesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tui: TuiConfig,

    #[serde(skip)]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: Option<String>,
    /// Key from the environment; never written back to the file
    #[serde(skip)]
    pub env_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_instruction")]
    pub instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplesConfig {
    #[serde(default = "default_sample_urls")]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default = "default_display")]
    pub display: DisplayMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Terminal,
    Viewer,
    None,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Terminal => "terminal",
            DisplayMode::Viewer => "viewer",
            DisplayMode::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terminal" => Some(DisplayMode::Terminal),
            "viewer" => Some(DisplayMode::Viewer),
            "none" => Some(DisplayMode::None),
            _ => None,
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["terminal", "viewer", "none"]
    }
}

// Default value functions
fn default_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_instruction() -> String {
    "Please turn this photo into a cute and stylish cartoon avatar, suitable for a profile picture. \
     Focus on a clean, vibrant, and modern cartoon style."
        .to_string()
}

fn default_sample_urls() -> Vec<String> {
    [
        "https://images.unsplash.com/photo-1544005313-94ddf0286df2?w=512",
        "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?w=512",
        "https://images.unsplash.com/photo-1534528741775-53994a69daeb?w=512",
        "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=512",
        "https://images.unsplash.com/photo-1517841905240-472988babdf9?w=512",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_filename() -> String {
    "cartoon-avatar.png".to_string()
}

fn default_display() -> DisplayMode {
    DisplayMode::Terminal
}

fn default_theme() -> String {
    "dark".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            env_key: None,
            model: default_model(),
            base_url: default_base_url(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            instruction: default_instruction(),
        }
    }
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            urls: default_sample_urls(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            filename: default_filename(),
            display: DisplayMode::Terminal,
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            prompt: PromptConfig::default(),
            samples: SamplesConfig::default(),
            output: OutputConfig::default(),
            tui: TuiConfig::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "toonify", "toonify")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location or create it
    pub fn load_or_create() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_key(env_api_key());
        Ok(config)
    }

    /// Load config from `path`, writing defaults there if it doesn't exist yet
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .context("Failed to read config file")?;
            let mut config: Config = toml::from_str(&content)
                .context("Failed to parse config file")?;
            config.config_path = path.to_path_buf();
            Ok(config)
        } else {
            let config = Config {
                config_path: path.to_path_buf(),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Environment variable takes precedence over the file
    pub fn apply_env_key(&mut self, key: Option<String>) {
        self.api.env_key = key.filter(|k| !k.trim().is_empty());
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&self.config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get API key (from config or environment)
    pub fn api_key(&self) -> Option<&str> {
        self.api
            .env_key
            .as_deref()
            .or(self.api.key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    /// Where downloads are written
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.directory)
    }

    /// Sample URL by 1-based index, as shown to the user
    pub fn sample_url(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.samples.urls.get(i))
            .map(String::as_str)
    }

    /// Set a config value by key path (e.g., "api.key", "output.directory")
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.key" => self.api.key = Some(value.to_string()),
            "api.model" => self.api.model = value.to_string(),
            "api.base_url" => self.api.base_url = value.to_string(),
            "prompt.instruction" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Instruction cannot be empty");
                }
                self.prompt.instruction = value.to_string();
            }
            "samples.urls" => {
                self.samples.urls = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            "output.directory" => self.output.directory = value.to_string(),
            "output.filename" => {
                if value.contains(['/', '\\']) || value.trim().is_empty() {
                    anyhow::bail!("Filename must be a plain file name");
                }
                self.output.filename = value.to_string();
            }
            "output.display" => {
                self.output.display = DisplayMode::parse(value).with_context(|| {
                    format!(
                        "Invalid display mode. Valid values: {}",
                        DisplayMode::variants().join(", ")
                    )
                })?;
            }
            "tui.theme" => {
                let valid = ["dark", "light"];
                if valid.contains(&value) {
                    self.tui.theme = value.to_string();
                } else {
                    anyhow::bail!("Invalid theme. Valid values: {}", valid.join(", "));
                }
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value by key path
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api.key" => self.api_key().map(|_| "****".to_string()), // Mask API key
            "api.model" => Some(self.api.model.clone()),
            "api.base_url" => Some(self.api.base_url.clone()),
            "prompt.instruction" => Some(self.prompt.instruction.clone()),
            "samples.urls" => Some(self.samples.urls.join(",")),
            "output.directory" => Some(self.output.directory.clone()),
            "output.filename" => Some(self.output.filename.clone()),
            "output.display" => Some(self.output.display.as_str().to_string()),
            "tui.theme" => Some(self.tui.theme.clone()),
            _ => None,
        }
    }

    /// Get all config keys
    pub fn keys() -> &'static [&'static str] {
        &[
            "api.key",
            "api.model",
            "api.base_url",
            "prompt.instruction",
            "samples.urls",
            "output.directory",
            "output.filename",
            "output.display",
            "tui.theme",
        ]
    }
}

/// First non-empty API key found in the environment
pub fn env_api_key() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
}
