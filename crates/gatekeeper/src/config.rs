//! Configuration management for Gatekeeper.

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::AccountEntry;
use crate::captcha::{Board, PuzzleSettings};
use crate::gate::LockoutPolicy;
use gatekeeper_common::constants::{
    BOARD_HEIGHT, BOARD_WIDTH, DEFAULT_IMAGE_PATH, LOCK_DURATION_SECS, LOCK_POLL_INTERVAL_SECS,
    MAX_FAILED_ATTEMPTS, PLACEMENT_TOLERANCE,
};

/// Longest lockout accepted from configuration (one year)
const MAX_LOCK_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Puzzle configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Attempt limit and lockout configuration
    #[serde(default)]
    pub lockout: LockoutConfig,

    /// Known accounts
    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
}

/// Puzzle-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Image the puzzle is cut from
    #[serde(default = "default_image_path")]
    pub image_path: PathBuf,

    /// Board width in display units
    #[serde(default = "default_board_width")]
    pub board_width: u32,

    /// Board height in display units
    #[serde(default = "default_board_height")]
    pub board_height: u32,

    /// Max per-axis distance from a tile's origin cell (inclusive)
    #[serde(default = "default_tolerance")]
    pub tolerance: u32,

    /// Fixed RNG seed for reproducible tile placement
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            image_path: default_image_path(),
            board_width: default_board_width(),
            board_height: default_board_height(),
            tolerance: default_tolerance(),
            seed: None,
        }
    }
}

/// Lockout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    /// Failed captcha checks before locking
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lock duration in seconds
    #[serde(default = "default_lock_duration")]
    pub lock_duration_secs: u64,

    /// Lockout re-check interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lock_duration_secs: default_lock_duration(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Values given on the command line or in the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub image_path: Option<PathBuf>,
    pub seed: Option<u64>,
}

// Default value functions
fn default_image_path() -> PathBuf { PathBuf::from(DEFAULT_IMAGE_PATH) }
fn default_board_width() -> u32 { BOARD_WIDTH }
fn default_board_height() -> u32 { BOARD_HEIGHT }
fn default_tolerance() -> u32 { PLACEMENT_TOLERANCE }
fn default_max_attempts() -> u32 { MAX_FAILED_ATTEMPTS }
fn default_lock_duration() -> u64 { LOCK_DURATION_SECS } // 10 minutes
fn default_poll_interval() -> u64 { LOCK_POLL_INTERVAL_SECS }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref image_path) = overrides.image_path {
            config.captcha.image_path = image_path.clone();
        }
        if overrides.seed.is_some() {
            config.captcha.seed = overrides.seed;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the puzzle or gate cannot work with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.captcha.board_width > 0 && self.captcha.board_height > 0,
            "captcha board must be at least 1x1"
        );
        ensure!(
            self.captcha.board_width <= i32::MAX as u32 && self.captcha.board_height <= i32::MAX as u32,
            "captcha board is too large"
        );
        ensure!(self.lockout.max_attempts > 0, "lockout.max_attempts must be at least 1");
        ensure!(
            self.lockout.lock_duration_secs <= MAX_LOCK_DURATION_SECS,
            "lockout.lock_duration_secs must not exceed {}",
            MAX_LOCK_DURATION_SECS
        );
        ensure!(self.lockout.poll_interval_secs > 0, "lockout.poll_interval_secs must be at least 1");
        Ok(())
    }

    pub fn puzzle_settings(&self) -> PuzzleSettings {
        PuzzleSettings {
            board: Board::new(self.captcha.board_width, self.captcha.board_height),
            tolerance: self.captcha.tolerance,
        }
    }

    pub fn lockout_policy(&self) -> Result<LockoutPolicy> {
        let policy = LockoutPolicy::new(
            self.lockout.max_attempts,
            Duration::from_secs(self.lockout.lock_duration_secs),
        )?;
        Ok(policy)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.lockout.poll_interval_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            captcha: CaptchaConfig::default(),
            lockout: LockoutConfig::default(),
            accounts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeeper_common::Role;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.puzzle_settings(), PuzzleSettings::default());
        assert_eq!(config.lockout_policy().unwrap(), LockoutPolicy::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults_and_overrides() {
        let overrides = ConfigOverrides {
            image_path: Some(PathBuf::from("other.png")),
            seed: Some(7),
        };
        let config = AppConfig::load("no/such/gatekeeper.toml", &overrides).unwrap();
        assert_eq!(config.captcha.image_path, PathBuf::from("other.png"));
        assert_eq!(config.captcha.seed, Some(7));
        assert_eq!(config.lockout.max_attempts, 3);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [captcha]
            image_path = "assets/cat.png"
            tolerance = 10

            [lockout]
            max_attempts = 5
            lock_duration_secs = 120

            [[accounts]]
            email = "org@example.com"
            password = "pw"
            role = "organizer"
            display_name = "Olga"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.captcha.tolerance, 10);
        assert_eq!(config.captcha.board_width, 300);
        assert_eq!(config.lockout.max_attempts, 5);
        assert_eq!(config.lockout.poll_interval_secs, 1);
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].role, Role::Organizer);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.lockout.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.captcha.board_width = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.lockout.lock_duration_secs = u64::MAX;
        assert!(config.validate().is_err());
    }
}
