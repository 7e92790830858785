use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, TicketType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub booking: BookingConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding persisted wizard state
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Event name printed on issued tickets
    #[serde(default = "default_event_name")]
    pub event_name: String,
    /// Event venue and date line printed on issued tickets
    #[serde(default = "default_event_details")]
    pub event_details: String,
    /// Largest quantity a single booking may request (default: 20)
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
    /// Prefix for generated ticket codes
    #[serde(default = "default_ticket_code_prefix")]
    pub ticket_code_prefix: String,
    /// Ticket types offered on the selection step
    #[serde(default = "default_ticket_types")]
    pub ticket_types: Vec<TicketType>,
}

fn default_event_name() -> String {
    "Techember Fest \"25".to_string()
}

fn default_event_details() -> String {
    "Ikoyi, Lagos | March 15, 2025 | 7:00PM".to_string()
}

fn default_max_quantity() -> u32 {
    20
}

fn default_ticket_code_prefix() -> String {
    "TKT".to_string()
}

fn default_ticket_types() -> Vec<TicketType> {
    Catalog::default().iter().map(|(_, t)| t.clone()).collect()
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            event_name: default_event_name(),
            event_details: default_event_details(),
            max_quantity: default_max_quantity(),
            ticket_code_prefix: default_ticket_code_prefix(),
            ticket_types: default_ticket_types(),
        }
    }
}

/// Whether an avatar must be present before attendee details are accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarPolicy {
    /// Avatar may be left empty
    #[default]
    Optional,
    /// Attendee details are rejected until an avatar URL is set
    Required,
}

impl AvatarPolicy {
    pub fn display_name(&self) -> &'static str {
        match self {
            AvatarPolicy::Optional => "optional",
            AvatarPolicy::Required => "required",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub avatar_policy: AvatarPolicy,
}

/// Image host used for avatar uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload endpoint (ImgBB compatible)
    #[serde(default = "default_upload_endpoint")]
    pub endpoint: String,
    /// API key for the image host; uploads are disabled when unset
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

fn default_upload_endpoint() -> String {
    "https://api.imgbb.com/1/upload".to_string()
}

fn default_upload_timeout() -> u64 {
    30
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: default_upload_endpoint(),
            api_key: None,
            timeout_secs: default_upload_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to a file under the state directory (false = stderr)
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".booth/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so booth works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/booth/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("booth").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with BOOTH_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("BOOTH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Write the config as TOML to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create booth config directory")?;
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Build the ticket catalog from the configured types
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.booking.ticket_types.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                state: ".booth".to_string(), // Relative to cwd
            },
            booking: BookingConfig::default(),
            validation: ValidationConfig::default(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.booking.max_quantity, 20);
        assert_eq!(config.validation.avatar_policy, AvatarPolicy::Optional);
        assert!(config.upload.api_key.is_none());
        assert_eq!(config.catalog().len(), 3);
    }

    #[test]
    fn test_load_from_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("booth.toml");
        std::fs::write(
            &path,
            r#"
[paths]
state = "/tmp/booth-test-state"

[booking]
max_quantity = 5

[validation]
avatar_policy = "required"
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.paths.state, "/tmp/booth-test-state");
        assert_eq!(config.booking.max_quantity, 5);
        assert_eq!(config.validation.avatar_policy, AvatarPolicy::Required);
        // Untouched sections keep their defaults
        assert_eq!(config.booking.ticket_code_prefix, "TKT");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_absolute_state_path_is_kept() {
        let mut config = Config::default();
        config.paths.state = "/var/lib/booth".to_string();
        assert_eq!(config.state_path(), PathBuf::from("/var/lib/booth"));
        assert_eq!(config.logs_path(), PathBuf::from("/var/lib/booth/logs"));
    }

    #[test]
    fn test_relative_state_path_resolves_against_cwd() {
        let config = Config::default();
        assert!(config.state_path().is_absolute());
        assert!(config.state_path().ends_with(".booth"));
    }

    #[test]
    fn test_saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.booking.max_quantity = 5;
        config.validation.avatar_policy = AvatarPolicy::Required;

        config.save_to(&path).unwrap();
        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(loaded.booking.max_quantity, 5);
        assert_eq!(loaded.validation.avatar_policy, AvatarPolicy::Required);
        assert_eq!(loaded.booking.ticket_types, config.booking.ticket_types);
    }
}
