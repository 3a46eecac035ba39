use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Files searched, in order, when no explicit config path is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = ["./baton.toml", "~/.config/baton/config.toml", "~/.baton.toml"];

const MIN_SPINNER_INTERVAL_MS: u64 = 10;
const MIN_STATUS_WIDTH: usize = 20;
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How progress is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Interactive when stderr is a terminal, plain otherwise
    #[default]
    Auto,
    /// Always a flat, line-oriented log
    Plain,
    /// Always redraw the status line in place
    Interactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Echo streamed assistant text as permanent lines
    #[serde(default = "default_stream_tokens")]
    pub stream_tokens: bool,
    #[serde(default = "default_spinner_interval_ms")]
    pub spinner_interval_ms: u64,
    /// Status line width in terminal columns
    #[serde(default = "default_status_width")]
    pub status_width: usize,
    #[serde(default)]
    pub output: OutputMode,
}

fn default_stream_tokens() -> bool {
    true
}

fn default_spinner_interval_ms() -> u64 {
    100
}

fn default_status_width() -> usize {
    80
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            stream_tokens: default_stream_tokens(),
            spinner_interval_ms: default_spinner_interval_ms(),
            status_width: default_status_width(),
            output: OutputMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for baton's own diagnostics (they share stderr with the progress view)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from `config_path`, or the first existing default path, or defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path_to_load = match config_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    anyhow::bail!("Config file not found: {}", path);
                }
                Some(path.to_string())
            }
            None => DEFAULT_CONFIG_PATHS.iter().find_map(|path| {
                let expanded_path = shellexpand::tilde(path);
                if Path::new(expanded_path.as_ref()).exists() {
                    Some(expanded_path.to_string())
                } else {
                    None
                }
            }),
        };

        let Some(path) = path_to_load else {
            return Ok(Self::default());
        };

        let config_content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&config_content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load, then apply command-line overrides.
    pub fn load_with_overrides(
        config_path: Option<&str>,
        stream_tokens_override: Option<bool>,
        output_override: Option<OutputMode>,
    ) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        if let Some(stream_tokens) = stream_tokens_override {
            config.progress.stream_tokens = stream_tokens;
        }
        if let Some(output) = output_override {
            config.progress.output = output;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.progress.spinner_interval_ms < MIN_SPINNER_INTERVAL_MS {
            anyhow::bail!(
                "progress.spinner_interval_ms must be at least {} (got {})",
                MIN_SPINNER_INTERVAL_MS,
                self.progress.spinner_interval_ms
            );
        }
        if self.progress.status_width < MIN_STATUS_WIDTH {
            anyhow::bail!(
                "progress.status_width must be at least {} (got {})",
                MIN_STATUS_WIDTH,
                self.progress.status_width
            );
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "logging.level must be one of {:?} (got '{}')",
                LOG_LEVELS,
                self.logging.level
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
