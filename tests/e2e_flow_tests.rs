//! End-to-end flow over simulated venues: scan, execute, settle, report.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gaphound::config::ScannerConfig;
use gaphound::domain::{Btc, Eur};
use gaphound::executor::{ExecutorConfig, TradeExecutor, TradeOutcome};
use gaphound::market::{MarketBackend, SimulatedConfig, SimulatedMarket};
use gaphound::report::combined_report;
use gaphound::scanner::ArbitrageScanner;
use gaphound::testkit::operator::ScriptedOperator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

type Backend = Arc<dyn MarketBackend<Trading = Btc, Base = Eur>>;

fn venue(
    name: &str,
    risk: u8,
    mid: Decimal,
    base: Decimal,
    trading: Decimal,
) -> Arc<SimulatedMarket<Btc, Eur>> {
    Arc::new(SimulatedMarket::new(SimulatedConfig {
        name: name.into(),
        risk,
        buy_fee: dec!(0),
        sell_fee: dec!(0),
        mid_price: mid,
        spread: dec!(0),
        book_depth: dec!(20),
        min_order: dec!(0.01),
        base_balance: base,
        trading_balance: trading,
        latency: Duration::ZERO,
        timeout: Duration::from_secs(20),
    }))
}

fn executor_config() -> ExecutorConfig {
    ExecutorConfig {
        min_profit: dec!(0.01),
        max_stake: dec!(10000),
        confirm_risky: false,
        confirm_safe: false,
        dry_run: false,
    }
}

/// Buy 10 on the risky cheap venue at 100, sell 10 on the safe dear venue
/// at 103: both legs commit and every balance lands where it should.
#[tokio::test]
async fn full_trade_moves_balances_on_both_venues() {
    let cheap = venue("cheap.test", 5, dec!(100), dec!(1000), dec!(0));
    let dear = venue("dear.test", 1, dec!(103), dec!(0), dec!(15));

    let operator = Arc::new(ScriptedOperator::new());
    let executor = TradeExecutor::new(executor_config(), operator.clone());

    let outcome = executor
        .execute(cheap.clone() as Backend, dear.clone() as Backend)
        .await
        .unwrap();

    match outcome {
        TradeOutcome::Completed { amount, margin } => {
            assert_eq!(amount, dec!(10));
            assert_eq!(margin, dec!(0.03));
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    // 10 BTC bought for 1000 EUR on the cheap venue.
    assert_eq!(
        cheap.available_base_currency().await.unwrap().value(),
        dec!(0)
    );
    assert_eq!(
        cheap.available_trading_currency().await.unwrap().value(),
        dec!(10)
    );
    // 10 BTC sold for 1030 EUR on the dear venue.
    assert_eq!(
        dear.available_base_currency().await.unwrap().value(),
        dec!(1030)
    );
    assert_eq!(
        dear.available_trading_currency().await.unwrap().value(),
        dec!(5)
    );

    // The combined report sees the 30 EUR the round trip realized.
    let backends: Vec<Backend> = vec![cheap, dear];
    let report = combined_report(
        &backends,
        Utc::now() - chrono::Duration::minutes(1),
        Utc::now(),
    )
    .await
    .unwrap();
    assert_eq!(report.total.trading_amount.value(), dec!(0));
    assert_eq!(report.total.base_amount.value(), dec!(30));
}

/// The scanner finds the gap and the detached execution settles it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scan_pass_triggers_a_real_execution() {
    let cheap = venue("cheap.test", 5, dec!(100), dec!(1000), dec!(0));
    let dear = venue("dear.test", 1, dec!(103), dec!(0), dec!(15));

    let operator = Arc::new(ScriptedOperator::new());
    let executor = Arc::new(TradeExecutor::new(executor_config(), operator.clone()));
    let scanner = ArbitrageScanner::new(
        vec![cheap.clone() as Backend, dear.clone() as Backend],
        executor,
        operator,
        &ScannerConfig {
            min_profit: dec!(0.01),
            scan_interval_secs: 1,
            max_stake: dec!(10000),
        },
    );

    let outcomes = scanner.scan_once().await;
    assert_eq!(outcomes.iter().filter(|o| o.is_triggered()).count(), 1);

    // The execution runs detached from the scan pass.
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        cheap.available_trading_currency().await.unwrap().value(),
        dec!(10)
    );
    assert_eq!(
        dear.available_base_currency().await.unwrap().value(),
        dec!(1030)
    );
}

/// After the gap closes, the same setup aborts on revalidation and nothing
/// moves.
#[tokio::test]
async fn closed_gap_aborts_with_untouched_balances() {
    let cheap = venue("cheap.test", 5, dec!(100), dec!(1000), dec!(0));
    let dear = venue("dear.test", 1, dec!(103), dec!(0), dec!(15));

    // Gap closes between scan and execution.
    dear.set_mid(dec!(100.2));

    let operator = Arc::new(ScriptedOperator::new());
    let executor = TradeExecutor::new(executor_config(), operator);

    let outcome = executor
        .execute(cheap.clone() as Backend, dear.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(outcome, TradeOutcome::Aborted(_)));
    assert_eq!(
        cheap.available_base_currency().await.unwrap().value(),
        dec!(1000)
    );
    assert_eq!(
        dear.available_trading_currency().await.unwrap().value(),
        dec!(15)
    );
}
