//! Application configuration loading and validation.
//!
//! Configuration is loaded from a single TOML file. Secrets (the Telegram
//! bot token and chat id) come from environment variables only, never from
//! the file.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Currency pair all configured venues trade.
    #[serde(default)]
    pub pair: PairConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub venues: Vec<VenueConfig>,
    #[serde(default)]
    pub telegram: TelegramAppConfig,
}

/// The currency pair a deployment trades.
#[derive(Debug, Clone, Deserialize)]
pub struct PairConfig {
    #[serde(default = "default_trading_currency")]
    pub trading_currency: String,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
}

fn default_trading_currency() -> String {
    "BTC".to_string()
}

fn default_base_currency() -> String {
    "EUR".to_string()
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            trading_currency: default_trading_currency(),
            base_currency: default_base_currency(),
        }
    }
}

/// Scanner loop settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Minimum fee-adjusted margin worth acting on (e.g. `0.01` = 1%).
    #[serde(default = "default_min_profit")]
    pub min_profit: Decimal,
    /// Delay between scan passes.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Maximum base currency committed to a single trade.
    #[serde(default = "default_max_stake")]
    pub max_stake: Decimal,
}

fn default_min_profit() -> Decimal {
    Decimal::new(1, 2) // 1%
}

const fn default_scan_interval_secs() -> u64 {
    30
}

fn default_max_stake() -> Decimal {
    Decimal::from(1000)
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_profit: default_min_profit(),
            scan_interval_secs: default_scan_interval_secs(),
            max_stake: default_max_stake(),
        }
    }
}

/// Two-leg execution settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Ask the operator before the risky leg.
    #[serde(default = "default_true")]
    pub confirm_risky: bool,
    /// Ask the operator before the safer leg (after the risky leg committed).
    #[serde(default)]
    pub confirm_safe: bool,
    /// Dry-run mode: evaluate and size trades but place no orders.
    #[serde(default)]
    pub dry_run: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            confirm_risky: default_true(),
            confirm_safe: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Supported venue kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    /// In-memory paper venue.
    Simulated,
}

/// One venue entry under `[[venues]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub kind: VenueKind,
    pub name: String,
    /// Risk score; lower = safer. Drives executor leg ordering.
    pub risk: u8,
    #[serde(default)]
    pub buy_fee: Decimal,
    #[serde(default)]
    pub sell_fee: Decimal,
    /// Simulated book: quoted mid price.
    #[serde(default = "default_mid_price")]
    pub mid_price: Decimal,
    /// Simulated book: relative half-spread.
    #[serde(default = "default_spread")]
    pub spread: Decimal,
    /// Simulated book: trading-currency depth per side.
    #[serde(default = "default_book_depth")]
    pub book_depth: Decimal,
    /// Smallest accepted order, in trading currency.
    #[serde(default)]
    pub min_order: Decimal,
    #[serde(default)]
    pub base_balance: Decimal,
    #[serde(default)]
    pub trading_balance: Decimal,
    /// Artificial request latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
    /// Venue request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_mid_price() -> Decimal {
    Decimal::from(100)
}

fn default_spread() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

fn default_book_depth() -> Decimal {
    Decimal::from(10)
}

const fn default_timeout_secs() -> u64 {
    20
}

/// Telegram operator channel configuration.
///
/// The bot token and chat id are read from `TELEGRAM_BOT_TOKEN` and
/// `TELEGRAM_CHAT_ID` at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAppConfig {
    #[serde(default)]
    pub enabled: bool,
    /// How long `decide` waits for a yes/no reply before answering no.
    #[serde(default = "default_decide_timeout_secs")]
    pub decide_timeout_secs: u64,
}

const fn default_decide_timeout_secs() -> u64 {
    120
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            decide_timeout_secs: default_decide_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.scanner.min_profit <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "scanner.min_profit",
                reason: "must be positive".into(),
            }
            .into());
        }
        if self.scanner.max_stake <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "scanner.max_stake",
                reason: "must be positive".into(),
            }
            .into());
        }
        if self.scanner.scan_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.scan_interval_secs",
                reason: "must be non-zero".into(),
            }
            .into());
        }

        let mut names = std::collections::HashSet::new();
        for venue in &self.venues {
            if venue.name.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "venues.name",
                }
                .into());
            }
            if !names.insert(venue.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "venues.name",
                    reason: format!("duplicate venue name '{}'", venue.name),
                }
                .into());
            }
            for (field, fee) in [("venues.buy_fee", venue.buy_fee), ("venues.sell_fee", venue.sell_fee)] {
                if fee < Decimal::ZERO || fee >= Decimal::ONE {
                    return Err(ConfigError::InvalidValue {
                        field,
                        reason: format!("fee {fee} outside [0, 1)"),
                    }
                    .into());
                }
            }
            if venue.mid_price <= Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: "venues.mid_price",
                    reason: "must be positive".into(),
                }
                .into());
            }
        }

        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pair: PairConfig::default(),
            scanner: ScannerConfig::default(),
            execution: ExecutionConfig::default(),
            logging: LoggingConfig::default(),
            venues: Vec::new(),
            telegram: TelegramAppConfig::default(),
        }
    }
}
