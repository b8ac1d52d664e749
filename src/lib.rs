//! Gaphound - cross-venue arbitrage scanning and two-leg execution.
//!
//! This crate coordinates trades that span two independent, mutually
//! distrusting trading venues: it computes whether a margin exists net of
//! fees, decides which leg is riskier, executes that leg first, and only
//! then commits the second leg, surfacing every failure as a value and
//! escalating the one state it cannot roll back.
//!
//! # Architecture
//!
//! - **[`market`]** - The [`MarketBackend`](market::MarketBackend)
//!   capability every venue implements, the per-venue
//!   [`RequestSerializer`](market::RequestSerializer) (one in-flight
//!   authenticated request, strictly monotonic nonces), and an in-memory
//!   paper venue.
//! - **[`domain`]** - Currency-tagged amounts and prices, offers, unified
//!   trade records, and the fee-adjusted margin calculator.
//! - **[`scanner`]** - Polls all ordered venue pairs and triggers the
//!   executor above a margin threshold.
//! - **[`executor`]** - The two-leg protocol: risk ordering, concrete-offer
//!   revalidation, confirmation gates, and post-commit escalation.
//! - **[`operator`]** - The human channel: yes/no confirmation gates and
//!   fire-and-forget event reporting (console, log, or Telegram).
//! - **[`report`]** - Read-only trade-history aggregation across venues.
//!
//! # Features
//!
//! - `telegram` - Telegram operator channel (enabled by default)
//! - `testkit` - Scripted mocks for integration tests
//!
//! # Example
//!
//! ```no_run
//! use gaphound::app::App;
//! use gaphound::config::Config;
//!
//! # async fn run() -> gaphound::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! App::run(config).await
//! # }
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod market;
pub mod operator;
pub mod report;
pub mod scanner;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
