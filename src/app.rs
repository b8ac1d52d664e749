//! App orchestration module.
//!
//! Wires configuration into venues, an operator channel, and the scanner
//! loop, then hands control to the scanner for the life of the process.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::domain::{Btc, Currency, Eur, Usd};
use crate::error::{ConfigError, Result};
use crate::executor::{ExecutorConfig, TradeExecutor};
use crate::market::build_venues;
use crate::operator::{ConsoleOperator, LogOperator, Operator};
use crate::scanner::ArbitrageScanner;

/// Main application struct.
pub struct App;

impl App {
    /// Run the scan loop for the configured currency pair.
    pub async fn run(config: Config) -> Result<()> {
        let pair = (
            config.pair.trading_currency.clone(),
            config.pair.base_currency.clone(),
        );
        match (pair.0.as_str(), pair.1.as_str()) {
            ("BTC", "EUR") => run_pair::<Btc, Eur>(config).await,
            ("BTC", "USD") => run_pair::<Btc, Usd>(config).await,
            (trading, base) => Err(ConfigError::InvalidValue {
                field: "pair",
                reason: format!("unsupported currency pair {trading}/{base}"),
            }
            .into()),
        }
    }
}

async fn run_pair<T: Currency, B: Currency>(config: Config) -> Result<()> {
    if config.venues.len() < 2 {
        return Err(ConfigError::InvalidValue {
            field: "venues",
            reason: "arbitrage needs at least two venues".into(),
        }
        .into());
    }

    let operator = build_operator(&config);
    let backends = build_venues::<T, B>(&config.venues);
    info!(
        venues = backends.len(),
        trading = T::CODE,
        base = B::CODE,
        dry_run = config.execution.dry_run,
        "Venues initialized"
    );

    let executor = Arc::new(TradeExecutor::new(
        ExecutorConfig::from_config(&config),
        operator.clone(),
    ));
    let scanner = ArbitrageScanner::new(backends, executor, operator, &config.scanner);

    scanner.run().await;
    Ok(())
}

/// Pick the operator channel: Telegram when enabled and credentialed,
/// console when confirmations are on, plain logging otherwise.
fn build_operator(config: &Config) -> Arc<dyn Operator> {
    #[cfg(feature = "telegram")]
    if config.telegram.enabled {
        use crate::operator::{TelegramConfig, TelegramOperator};
        use std::time::Duration;

        let decide_timeout = Duration::from_secs(config.telegram.decide_timeout_secs);
        match TelegramConfig::from_env(decide_timeout) {
            Some(telegram) => {
                info!("Telegram operator channel enabled");
                return Arc::new(TelegramOperator::new(telegram));
            }
            None => {
                tracing::warn!(
                    "telegram.enabled is set but TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID \
                     are missing; falling back to the console"
                );
            }
        }
    }

    if config.execution.confirm_risky || config.execution.confirm_safe {
        Arc::new(ConsoleOperator)
    } else {
        Arc::new(LogOperator)
    }
}
