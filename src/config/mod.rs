//! # Configuration Management Module
//!
//! Centralized configuration for the bot: a TOML file parsed into typed
//! sections with defaults, validated on load.
//!
//! ## Configuration File Format
//!
//! ```toml
//! [telegram]
//! token = "123456:ABC-DEF..."
//! admin_id = 111111111
//!
//! [sheet]
//! spreadsheet_id = "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms"
//! api_key = "AIza..."
//! range = "Cards!A1:G200"
//!
//! [storage]
//! database_url = "sqlite://bunker.db"
//!
//! [game]
//! room_code_length = 4
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Precedence: CLI verbosity flags > config file > built-in defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub sheet: SheetConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    pub token: String,
    /// Telegram user id of the single game admin.
    pub admin_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet document id.
    pub spreadsheet_id: String,
    /// Google API key with read access to the sheet.
    pub api_key: String,
    /// A1-notation range covering the header row and all value rows.
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_sheet_timeout")]
    pub timeout_secs: u64,
}

fn default_range() -> String {
    "A1:Z500".to_string()
}

fn default_sheet_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// sqlx SQLite URL, e.g. `sqlite://bunker.db`.
    pub database_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Length of generated room codes.
    #[serde(default = "default_code_length")]
    pub room_code_length: usize,
}

fn default_code_length() -> usize {
    4
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            room_code_length: default_code_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; stderr only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file for the operator to fill in.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Sanity-check values an operator is likely to get wrong.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(anyhow!("telegram.token must be set"));
        }
        if self.telegram.admin_id == 0 {
            return Err(anyhow!("telegram.admin_id must be set"));
        }
        if self.storage.database_url.trim().is_empty() {
            return Err(anyhow!("storage.database_url must be set"));
        }
        if self.game.room_code_length < 3 || self.game.room_code_length > 8 {
            return Err(anyhow!("game.room_code_length must be between 3 and 8"));
        }
        if self.sheet.timeout_secs == 0 {
            return Err(anyhow!("sheet.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            telegram: TelegramConfig {
                token: String::new(),
                admin_id: 0,
            },
            sheet: SheetConfig {
                spreadsheet_id: String::new(),
                api_key: String::new(),
                range: default_range(),
                timeout_secs: default_sheet_timeout(),
            },
            storage: StorageConfig {
                database_url: "sqlite://bunker.db".to_string(),
            },
            game: GameConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
