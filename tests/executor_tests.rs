//! Integration tests for the two-leg trade executor.

use std::sync::Arc;

use gaphound::domain::{Btc, Eur};
use gaphound::error::MarketError;
use gaphound::executor::{AbortReason, ExecutorConfig, TradeExecutor, TradeOutcome};
use gaphound::market::MarketBackend;
use gaphound::testkit::market::MockMarket;
use gaphound::testkit::operator::ScriptedOperator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

type Backend = Arc<dyn MarketBackend<Trading = Btc, Base = Eur>>;
type Mock = Arc<MockMarket<Btc, Eur>>;

fn config() -> ExecutorConfig {
    ExecutorConfig {
        min_profit: dec!(0.01),
        max_stake: dec!(100000),
        confirm_risky: false,
        confirm_safe: false,
        dry_run: false,
    }
}

/// Two fee-free mocks with a 3% gap: buy at 100, sell at 103.
fn profitable_pair(buy_risk: u8, sell_risk: u8) -> (Mock, Mock) {
    let buy = Arc::new(MockMarket::<Btc, Eur>::new("buyer.test", buy_risk));
    let sell = Arc::new(MockMarket::<Btc, Eur>::new("seller.test", sell_risk));
    buy.set_buy_offer(dec!(0), dec!(1000), dec!(100));
    sell.set_sell_offer(dec!(0), dec!(1000), dec!(103));
    (buy, sell)
}

fn executor_with(config: ExecutorConfig, operator: Arc<ScriptedOperator>) -> TradeExecutor {
    TradeExecutor::new(config, operator)
}

#[tokio::test]
async fn risky_leg_runs_first_when_buy_backend_is_riskier() {
    let (buy, sell) = profitable_pair(5, 1);
    let executor = executor_with(config(), Arc::new(ScriptedOperator::new()));

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(outcome, TradeOutcome::Completed { .. }));
    // Risky buy leg pinned its offer; safer sell leg went out as a market order.
    assert_eq!(buy.call_count("execute_pending_offer"), 1);
    assert_eq!(buy.call_count("set_market_order"), 0);
    assert_eq!(sell.call_count("execute_pending_offer"), 0);
    assert_eq!(sell.call_count("set_market_order"), 1);
}

/// Risk ordering depends only on the risk scores, not on which argument is
/// the buy side.
#[tokio::test]
async fn risky_leg_runs_first_when_sell_backend_is_riskier() {
    let (buy, sell) = profitable_pair(1, 5);
    let executor = executor_with(config(), Arc::new(ScriptedOperator::new()));

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(outcome, TradeOutcome::Completed { .. }));
    // Now the sell leg is risky: it pins the offer, the buy side is the
    // market order.
    assert_eq!(sell.call_count("execute_pending_offer"), 1);
    assert_eq!(sell.call_count("set_market_order"), 0);
    assert_eq!(buy.call_count("execute_pending_offer"), 0);
    assert_eq!(buy.call_count("set_market_order"), 1);
}

/// A scanner-level margin means nothing: the executor re-checks against
/// concrete offers and must walk away without touching either venue.
#[tokio::test]
async fn stale_margin_aborts_without_any_order() {
    let buy = Arc::new(MockMarket::<Btc, Eur>::new("buyer.test", 5));
    let sell = Arc::new(MockMarket::<Btc, Eur>::new("seller.test", 1));
    // Quotes would suggest 2%...
    buy.set_buy_price(dec!(100));
    sell.set_sell_price(dec!(102));
    // ...but the concrete offers only give 0.5% against a 1% threshold.
    buy.set_buy_offer(dec!(0), dec!(1000), dec!(100));
    sell.set_sell_offer(dec!(0), dec!(1000), dec!(100.5));

    let executor = executor_with(config(), Arc::new(ScriptedOperator::new()));
    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TradeOutcome::Aborted(AbortReason::StaleMargin { .. })
    ));
    for mock in [&buy, &sell] {
        assert_eq!(mock.call_count("execute_pending_offer"), 0);
        assert_eq!(mock.call_count("set_market_order"), 0);
    }
}

#[tokio::test]
async fn safer_leg_failure_escalates_and_is_never_retried() {
    let (buy, sell) = profitable_pair(5, 1);
    sell.set_market_order_result(Err(MarketError::retryable("seller.test", "timeout")));

    let operator = Arc::new(ScriptedOperator::new());
    let executor = executor_with(config(), operator.clone());

    let err = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap_err();

    assert!(err.is_unbalanced());
    // Exactly one attempt on the safer leg, even though the error said
    // it could be retried.
    assert_eq!(sell.call_count("set_market_order"), 1);
    assert!(operator.saw_unbalanced());
}

#[tokio::test]
async fn risky_leg_failure_is_an_ordinary_outcome_with_nothing_moved() {
    let (buy, sell) = profitable_pair(5, 1);
    buy.set_execute_result(Err(MarketError::retryable("buyer.test", "offer gone")));

    let operator = Arc::new(ScriptedOperator::new());
    let executor = executor_with(config(), operator.clone());

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(outcome, TradeOutcome::RiskyLegFailed(_)));
    // The safer leg must not have been attempted.
    assert_eq!(sell.call_count("set_market_order"), 0);
    assert!(!operator.saw_unbalanced());
}

#[tokio::test]
async fn declined_risky_confirmation_aborts_before_any_leg() {
    let (buy, sell) = profitable_pair(5, 1);
    let operator = Arc::new(ScriptedOperator::with_answers([false]));
    let executor = executor_with(
        ExecutorConfig {
            confirm_risky: true,
            ..config()
        },
        operator.clone(),
    );

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TradeOutcome::Aborted(AbortReason::DeclinedRisky)
    ));
    assert_eq!(operator.questions().len(), 1);
    for mock in [&buy, &sell] {
        assert_eq!(mock.call_count("execute_pending_offer"), 0);
        assert_eq!(mock.call_count("set_market_order"), 0);
    }
}

/// Declining the safe gate happens after the risky leg committed, so it is
/// the escalated case, not an abort.
#[tokio::test]
async fn declined_safe_confirmation_escalates_after_commit() {
    let (buy, sell) = profitable_pair(5, 1);
    let operator = Arc::new(ScriptedOperator::with_answers([false]));
    let executor = executor_with(
        ExecutorConfig {
            confirm_safe: true,
            ..config()
        },
        operator.clone(),
    );

    let err = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap_err();

    assert!(err.is_unbalanced());
    assert_eq!(buy.call_count("execute_pending_offer"), 1);
    assert_eq!(sell.call_count("set_market_order"), 0);
    assert!(operator.saw_unbalanced());
}

#[tokio::test]
async fn dry_run_sizes_the_trade_but_places_no_orders() {
    let (buy, sell) = profitable_pair(5, 1);
    let executor = executor_with(
        ExecutorConfig {
            dry_run: true,
            ..config()
        },
        Arc::new(ScriptedOperator::new()),
    );

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(outcome, TradeOutcome::DryRun { .. }));
    for mock in [&buy, &sell] {
        assert_eq!(mock.call_count("execute_pending_offer"), 0);
        assert_eq!(mock.call_count("set_market_order"), 0);
    }
}

#[tokio::test]
async fn pre_commit_backend_failure_propagates_as_ordinary_error() {
    let (buy, sell) = profitable_pair(5, 1);
    buy.fail_buy_offer(MarketError::retryable("buyer.test", "order book empty"));

    let executor = executor_with(config(), Arc::new(ScriptedOperator::new()));
    let err = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap_err();

    assert!(!err.is_unbalanced());
}

/// The end-to-end sizing scenario: amount = min(1000 / 100, 20) = 10.
#[tokio::test]
async fn trade_amount_is_bounded_by_balance_and_offer() {
    let buy = Arc::new(MockMarket::<Btc, Eur>::new("buyer.test", 5));
    let sell = Arc::new(MockMarket::<Btc, Eur>::new("seller.test", 1));
    buy.set_buy_offer(dec!(0), dec!(20), dec!(100));
    buy.set_balances(dec!(1000), dec!(0));
    sell.set_sell_offer(dec!(0), dec!(1000), dec!(103));
    sell.set_balances(dec!(0), dec!(1000));

    let operator = Arc::new(ScriptedOperator::new());
    let executor = executor_with(config(), operator.clone());

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    match outcome {
        TradeOutcome::Completed { amount, margin } => {
            assert_eq!(amount, dec!(10));
            assert_eq!(margin, dec!(0.03));
        }
        other => panic!("expected Completed, got {other:?}"),
    }
    assert_eq!(buy.call_count("execute_pending_offer"), 1);
    assert_eq!(sell.call_count("set_market_order"), 1);
}

#[tokio::test]
async fn amount_below_venue_minimum_aborts() {
    let (buy, sell) = profitable_pair(5, 1);
    // Balance affords 0.5 units but the buy offer insists on at least 1.
    buy.set_buy_offer(dec!(1), dec!(1000), dec!(100));
    buy.set_balances(dec!(50), dec!(0));

    let executor = executor_with(config(), Arc::new(ScriptedOperator::new()));
    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TradeOutcome::Aborted(AbortReason::BelowVenueMinimum { .. })
    ));
    assert_eq!(buy.call_count("execute_pending_offer"), 0);
}

#[tokio::test]
async fn max_stake_caps_the_spend() {
    let (buy, sell) = profitable_pair(5, 1);
    buy.set_balances(dec!(100000), dec!(0));

    let executor = executor_with(
        ExecutorConfig {
            max_stake: dec!(500),
            ..config()
        },
        Arc::new(ScriptedOperator::new()),
    );
    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    match outcome {
        // 500 EUR at an effective 100 EUR/BTC affords 5.
        TradeOutcome::Completed { amount, .. } => assert_eq!(amount, dec!(5)),
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn equal_risk_scores_treat_the_buy_leg_as_risky() {
    let (buy, sell) = profitable_pair(3, 3);
    let executor = executor_with(config(), Arc::new(ScriptedOperator::new()));

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    assert!(matches!(outcome, TradeOutcome::Completed { .. }));
    assert_eq!(buy.call_count("execute_pending_offer"), 1);
    assert_eq!(sell.call_count("set_market_order"), 1);
}

#[tokio::test]
async fn completed_margin_is_never_below_threshold() {
    let (buy, sell) = profitable_pair(5, 1);
    let executor = executor_with(config(), Arc::new(ScriptedOperator::new()));

    let outcome = executor
        .execute(buy.clone() as Backend, sell.clone() as Backend)
        .await
        .unwrap();

    if let TradeOutcome::Completed { margin, .. } = outcome {
        assert!(margin >= dec!(0.01));
        assert_eq!(margin, Decimal::from(3) / Decimal::from(100));
    } else {
        panic!("expected Completed");
    }
}
