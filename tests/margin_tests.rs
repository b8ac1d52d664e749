//! Integration tests for the margin calculator.

use gaphound::domain::{margin, margin_between, Btc, Eur, Price};
use gaphound::error::MarketError;
use gaphound::market::MarketBackend;
use gaphound::testkit::market::MockMarket;
use rust_decimal_macros::dec;

#[tokio::test]
async fn margin_applies_each_backends_own_fee_transform() {
    let buyer = MockMarket::<Btc, Eur>::new("buyer.test", 1).with_fees(dec!(0.004), dec!(0.008));
    let seller = MockMarket::<Btc, Eur>::new("seller.test", 1).with_fees(dec!(0.01), dec!(0.002));
    buyer.set_buy_price(dec!(100));
    seller.set_sell_price(dec!(103));

    let result = margin_between(&buyer, &seller).await.unwrap();

    // Only the buyer's buy transform and the seller's sell transform count;
    // the buyer's sell fee and the seller's buy fee must play no part.
    let eff_buy = buyer.effective_buy_price(Price::new(dec!(100)).unwrap());
    let eff_sell = seller.effective_sell_price(Price::new(dec!(103)).unwrap());
    assert_eq!(eff_buy.value(), dec!(100.4));
    assert_eq!(eff_sell.value(), dec!(102.794));
    assert_eq!(result, margin(eff_buy, eff_sell));
}

/// The two directions of a pair are independent values; nothing may assume
/// the fees are symmetric.
#[tokio::test]
async fn margin_is_not_antisymmetric_under_asymmetric_fees() {
    let a = MockMarket::<Btc, Eur>::new("a.test", 1).with_fees(dec!(0.004), dec!(0.008));
    let b = MockMarket::<Btc, Eur>::new("b.test", 1).with_fees(dec!(0), dec!(0));
    a.set_buy_price(dec!(100));
    a.set_sell_price(dec!(100));
    b.set_buy_price(dec!(100));
    b.set_sell_price(dec!(100));

    let forward = margin_between(&a, &b).await.unwrap();
    let backward = margin_between(&b, &a).await.unwrap();

    // Same quotes both ways, but a's fees push both directions negative by
    // different offsets.
    assert_ne!(forward, -backward);
}

#[tokio::test]
async fn margin_without_fees_is_the_relative_spread() {
    let buyer = MockMarket::<Btc, Eur>::new("buyer.test", 1);
    let seller = MockMarket::<Btc, Eur>::new("seller.test", 1);
    buyer.set_buy_price(dec!(100));
    seller.set_sell_price(dec!(103));

    assert_eq!(margin_between(&buyer, &seller).await.unwrap(), dec!(0.03));
}

#[tokio::test]
async fn buy_side_failure_propagates_first() {
    let buyer = MockMarket::<Btc, Eur>::new("buyer.test", 1);
    let seller = MockMarket::<Btc, Eur>::new("seller.test", 1);
    buyer.fail_buy_price(MarketError::retryable("buyer.test", "order book empty"));
    seller.fail_sell_price(MarketError::fatal("seller.test", "malformed response"));

    let err = margin_between(&buyer, &seller).await.unwrap_err();
    assert_eq!(err.origin, "buyer.test");
    assert!(err.can_retry);
}

/// A failing read must leave balances untouched.
#[tokio::test]
async fn failed_price_read_has_no_side_effect_on_balances() {
    let buyer = MockMarket::<Btc, Eur>::new("buyer.test", 1);
    let seller = MockMarket::<Btc, Eur>::new("seller.test", 1);
    buyer.set_balances(dec!(1234), dec!(5));
    buyer.fail_buy_price(MarketError::retryable("buyer.test", "timeout"));

    let base_before = buyer.available_base_currency().await.unwrap();
    let trading_before = buyer.available_trading_currency().await.unwrap();

    assert!(margin_between(&buyer, &seller).await.is_err());

    assert_eq!(buyer.available_base_currency().await.unwrap(), base_before);
    assert_eq!(
        buyer.available_trading_currency().await.unwrap(),
        trading_before
    );
}
