use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub script: ScriptSettings,
    pub replay: ReplaySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ScriptSettings {
    /// How far behind the watermark an element may be stamped without an
    /// explicit per-call allowance
    pub allowed_lateness_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReplaySettings {
    /// Buffer size of channel-backed intakes; a full buffer stalls replay
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
    Full,
}

impl ScriptSettings {
    pub fn allowed_lateness(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.allowed_lateness_ms).unwrap_or(i64::MAX))
    }
}

impl Settings {
    /// Defaults, then `config/test_stream`, `config/test_stream.local` and
    /// `TEST_STREAM__*` environment variables
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_dir("config")
    }

    /// Same layering as [`Settings::new`], reading files from `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        Self::with_defaults()?
            .add_source(File::from(dir.join("test_stream")).required(false))
            .add_source(File::from(dir.join("test_stream.local")).required(false))
            .add_source(Environment::with_prefix("TEST_STREAM").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Defaults overlaid with a single explicit file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::with_defaults()?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("script.allowed_lateness_ms", 0)?
            .set_default("replay.channel_capacity", 64)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script: ScriptSettings {
                allowed_lateness_ms: 0,
            },
            replay: ReplaySettings {
                channel_capacity: 64,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}
