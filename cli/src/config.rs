use crate::{
    api::DEFAULT_BASE_URL,
    controller::DEFAULT_POLL_INTERVAL,
    types::{is_supported_duration, VideoStyle, DEFAULT_DURATION_SECONDS},
};
use anyhow::{anyhow, bail, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_CONFIG_PATH: &str = "VIDGEN_CONFIG_PATH";
const ENV_BASE_URL: &str = "VIDGEN_BASE_URL";
const ENV_POLL_INTERVAL_MS: &str = "VIDGEN_POLL_INTERVAL_MS";
const ENV_DEFAULT_STYLE: &str = "VIDGEN_DEFAULT_STYLE";
const ENV_DEFAULT_DURATION: &str = "VIDGEN_DEFAULT_DURATION";

#[derive(Debug, Clone)]
pub struct AppConfig {
    base_url: String,
    poll_interval: Duration,
    default_style: VideoStyle,
    default_duration_seconds: u32,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let path = match config_file_override() {
            Some(path) => Some(path),
            None => Self::default_config_path().ok(),
        };
        if let Some(path) = path.filter(|path| path.exists()) {
            let partial = read_partial(&path)?;
            config.apply_partial(partial)?;
        }

        config.apply_env()?;
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn default_style(&self) -> VideoStyle {
        self.default_style
    }

    pub fn default_duration_seconds(&self) -> u32 {
        self.default_duration_seconds
    }

    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url;
    }

    pub fn set_poll_interval_ms(&mut self, millis: u64) -> Result<()> {
        self.poll_interval = poll_interval_from_ms(millis)?;
        Ok(())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "Vidgen", "Vidgen")
            .ok_or_else(|| anyhow!("unable to determine config directory"))?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn apply_partial(&mut self, partial: PartialConfig) -> Result<()> {
        if let Some(url) = partial.base_url {
            self.base_url = url;
        }
        if let Some(millis) = partial.poll_interval_ms {
            self.poll_interval = poll_interval_from_ms(millis)?;
        }
        if let Some(style) = partial.default_style {
            self.default_style = style;
        }
        if let Some(duration) = partial.default_duration_seconds {
            self.default_duration_seconds = duration_from_secs(duration)?;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = env::var(ENV_BASE_URL) {
            if !value.trim().is_empty() {
                self.base_url = value.trim().to_string();
            }
        }
        if let Ok(value) = env::var(ENV_POLL_INTERVAL_MS) {
            if !value.trim().is_empty() {
                let millis = value
                    .trim()
                    .parse::<u64>()
                    .context("VIDGEN_POLL_INTERVAL_MS must be a positive integer")?;
                self.poll_interval = poll_interval_from_ms(millis)?;
            }
        }
        if let Ok(value) = env::var(ENV_DEFAULT_STYLE) {
            if !value.trim().is_empty() {
                self.default_style = value
                    .parse()
                    .map_err(|style| anyhow!("VIDGEN_DEFAULT_STYLE: unknown style '{style}'"))?;
            }
        }
        if let Ok(value) = env::var(ENV_DEFAULT_DURATION) {
            if !value.trim().is_empty() {
                let parsed = value
                    .trim()
                    .parse::<u32>()
                    .context("VIDGEN_DEFAULT_DURATION must be one of 15, 30, 45, 60")?;
                self.default_duration_seconds = duration_from_secs(parsed)?;
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_style: VideoStyle::default(),
            default_duration_seconds: DEFAULT_DURATION_SECONDS,
        }
    }
}

fn poll_interval_from_ms(millis: u64) -> Result<Duration> {
    if millis == 0 {
        bail!("poll interval must be greater than zero");
    }
    Ok(Duration::from_millis(millis))
}

fn duration_from_secs(seconds: u32) -> Result<u32> {
    if !is_supported_duration(seconds) {
        bail!("default duration {seconds}s is not one of 15, 30, 45, 60");
    }
    Ok(seconds)
}

fn config_file_override() -> Option<PathBuf> {
    let value = env::var_os(ENV_CONFIG_PATH)?;
    if value.is_empty() {
        return None;
    }
    let path = PathBuf::from(value);
    if path.is_dir() {
        return Some(path.join(CONFIG_FILE_NAME));
    }
    Some(path)
}

fn read_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    parse_partial(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_partial(contents: &str) -> Result<PartialConfig> {
    Ok(toml::from_str(contents)?)
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PartialConfig {
    base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    default_style: Option<VideoStyle>,
    default_duration_seconds: Option<u32>,
}
