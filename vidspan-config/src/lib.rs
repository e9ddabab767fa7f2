use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

use vidspan_common::error::ConfigError;
use vidspan_common::player::default_probe_paths;
use vidspan_common::{ErrorReporting, PlayerSettings, Result, VidspanError};

// Custom deserialization for Duration from human-readable strings
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let duration_str = String::deserialize(deserializer)?;
    vidspan_common::duration::parse_duration(&duration_str).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    /// Explicit player executable; overrides discovery when set.
    pub path: Option<String>,
    #[serde(default = "default_player_bin")]
    pub bin: String,
    /// Install locations probed when the player is not on PATH.
    #[serde(default = "default_probe_path_strings")]
    pub probe_paths: Vec<String>,
    /// Extra arguments appended to every launch command.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StagingConfig {
    /// Pause between consecutive player launches.
    #[serde(default = "default_launch_delay", deserialize_with = "deserialize_duration")]
    pub launch_delay: Duration,
    /// Wait after a termination request before force-killing.
    #[serde(default = "default_grace_period", deserialize_with = "deserialize_duration")]
    pub grace_period: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_query_command")]
    pub query_command: String,
}

fn default_player_bin() -> String {
    "vlc".to_string()
}

fn default_probe_path_strings() -> Vec<String> {
    default_probe_paths()
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect()
}

fn default_launch_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_grace_period() -> Duration {
    Duration::from_secs(5)
}

fn default_query_command() -> String {
    "xrandr".to_string()
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            path: None,
            bin: default_player_bin(),
            probe_paths: default_probe_path_strings(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            launch_delay: default_launch_delay(),
            grace_period: default_grace_period(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            query_command: default_query_command(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            staging: StagingConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Loads the daemon config, degrading to the defaults on a missing
    /// or unusable file so a config typo never blocks startup.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{}; using default configuration", e.user_friendly_message());
                return Self::default();
            }
        };

        if !config_path.exists() {
            log::info!("No config file at {:?}, using defaults", config_path);
            return Self::default();
        }

        match Self::load_from_path(&config_path) {
            Ok(config) => {
                log::info!("Configuration loaded from {:?}", config_path);
                config
            }
            Err(e) => {
                log::error!(
                    "Ignoring unusable config file {:?}: {}",
                    config_path,
                    e.user_friendly_message()
                );
                Self::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VidspanError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            VidspanError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            VidspanError::Config(ConfigError::TomlParse {
                message: e.to_string(),
            })
        })?;

        config.validate()?;
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(VidspanError::Config(ConfigError::NoConfigDir))?
            .join("vidspan");

        Ok(config_dir.join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.staging.launch_delay.is_zero() {
            return Err(VidspanError::Config(ConfigError::InvalidValue {
                field: "staging.launch_delay".to_string(),
                value: format!("{:?}", self.staging.launch_delay),
            }));
        }

        if self.staging.grace_period.is_zero() {
            return Err(VidspanError::Config(ConfigError::InvalidValue {
                field: "staging.grace_period".to_string(),
                value: format!("{:?}", self.staging.grace_period),
            }));
        }

        if self.player.bin.is_empty() {
            return Err(VidspanError::Config(ConfigError::InvalidValue {
                field: "player.bin".to_string(),
                value: self.player.bin.clone(),
            }));
        }

        if self.display.query_command.is_empty() {
            return Err(VidspanError::Config(ConfigError::InvalidValue {
                field: "display.query_command".to_string(),
                value: self.display.query_command.clone(),
            }));
        }

        Ok(())
    }

    /// Supervisor settings derived from the player and staging sections.
    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            path: self.player.path.as_ref().map(PathBuf::from),
            bin_name: self.player.bin.clone(),
            probe_paths: self.player.probe_paths.iter().map(PathBuf::from).collect(),
            extra_args: self.player.extra_args.clone(),
            grace_period: self.staging.grace_period,
        }
    }
}
