use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vidspan operations
#[derive(Error, Debug)]
pub enum VidspanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Display enumeration error: {0}")]
    Display(#[from] DisplayError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Assignment persistence error: {0}")]
    State(#[from] StateError),

    #[error("Player launch error: {0}")]
    Launch(#[from] LaunchError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path:?}")]
    FileRead { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse TOML configuration: {message}")]
    TomlParse { message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Display enumeration errors
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to run display query command {command:?}")]
    CommandRun { command: String, source: std::io::Error },

    #[error("Display query command {command:?} failed with exit code {code}")]
    CommandStatus { command: String, code: i32, stderr: String },

    #[error("No active displays detected")]
    NoDisplays,
}

/// Video asset validation errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Video file not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("Not a regular file: {path:?}")]
    NotAFile { path: PathBuf },
}

/// Assignment persistence errors
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to write assignment file: {path:?}")]
    FileWrite { path: PathBuf, source: std::io::Error },

    #[error("Failed to serialize assignment")]
    Serialization,

    #[error("Failed to create assignment directory: {path:?}")]
    DirectoryCreation { path: PathBuf, source: std::io::Error },
}

/// Player process launch errors
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Video file missing at launch time: {path:?}")]
    AssetMissing { path: PathBuf },

    #[error("No media player executable found")]
    PlayerNotFound,

    #[error("Failed to spawn player process: {command}")]
    Spawn { command: String, source: std::io::Error },
}

/// Whole-session precondition errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No videos assigned to any display")]
    NothingToPlay,

    #[error("{assets} videos assigned but only {displays} displays detected")]
    MoreAssetsThanDisplays { assets: usize, displays: usize },
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, VidspanError>;

impl From<serde_json::Error> for VidspanError {
    fn from(_err: serde_json::Error) -> Self {
        VidspanError::State(StateError::Serialization)
    }
}

impl From<toml::de::Error> for VidspanError {
    fn from(err: toml::de::Error) -> Self {
        VidspanError::Config(ConfigError::TomlParse {
            message: err.to_string(),
        })
    }
}

// Error reporting utilities
pub trait ErrorReporting {
    fn log_error(&self, context: &str);
    fn user_friendly_message(&self) -> String;
}

impl ErrorReporting for VidspanError {
    fn log_error(&self, context: &str) {
        log::error!("{}: {:?}", context, self);
    }

    fn user_friendly_message(&self) -> String {
        match self {
            VidspanError::Config(ConfigError::FileRead { path, .. }) => {
                format!("Configuration file not found: {:?}", path)
            }
            VidspanError::Config(ConfigError::TomlParse { message }) => {
                format!("Invalid configuration format: {}", message)
            }
            VidspanError::Display(DisplayError::NoDisplays) => {
                "No active displays detected. Check that the display server is running.".to_string()
            }
            VidspanError::Display(DisplayError::CommandRun { command, .. }) => {
                format!("Could not query displays: {} is not available", command)
            }
            VidspanError::Launch(LaunchError::PlayerNotFound) => {
                "No media player found. Install VLC or set an explicit player path in the config."
                    .to_string()
            }
            VidspanError::Launch(LaunchError::AssetMissing { path }) => {
                format!("Video file no longer exists: {:?}", path)
            }
            VidspanError::Session(SessionError::NothingToPlay) => {
                "No videos assigned. Select video files before starting playback.".to_string()
            }
            VidspanError::State(StateError::FileWrite { path, .. }) => {
                format!("Failed to save assignment to {:?}", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_player_not_found_user_friendly_message() {
        let error = VidspanError::Launch(LaunchError::PlayerNotFound);

        let message = error.user_friendly_message();
        assert!(message.contains("No media player found"));
        assert!(message.contains("VLC"));
    }

    #[test]
    fn test_asset_missing_user_friendly_message() {
        let error = VidspanError::Launch(LaunchError::AssetMissing {
            path: PathBuf::from("/videos/gone.mp4"),
        });

        let message = error.user_friendly_message();
        assert!(message.contains("no longer exists"));
        assert!(message.contains("/videos/gone.mp4"));
    }

    #[test]
    fn test_session_error_messages() {
        let error = VidspanError::Session(SessionError::MoreAssetsThanDisplays {
            assets: 4,
            displays: 2,
        });
        let message = error.user_friendly_message();
        assert!(message.contains("4"));
        assert!(message.contains("2"));

        let error = VidspanError::Session(SessionError::NothingToPlay);
        assert!(error.user_friendly_message().contains("Select video files"));
    }

    #[test]
    fn test_config_error_user_friendly_message() {
        let error = ConfigError::FileRead {
            path: PathBuf::from("/nonexistent/config.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "File not found"),
        };
        let vidspan_error = VidspanError::Config(error);

        let message = vidspan_error.user_friendly_message();
        assert!(message.contains("Configuration file not found"));
        assert!(message.contains("/nonexistent/config.toml"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let vidspan_error: VidspanError = json_error.into();

        match vidspan_error {
            VidspanError::State(StateError::Serialization) => {}
            _ => panic!("Expected StateError::Serialization"),
        }
    }
}
