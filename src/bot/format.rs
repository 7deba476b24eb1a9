//! Message formatting for alerts, digests and command replies
//!
//! Prices render at two fraction digits, except sub-unit magnitudes which
//! get six so a 0.0123 quote does not collapse to `0.00`.

use chrono::DateTime;
use rust_decimal::Decimal;

use crate::core::store::Subscription;
use crate::feed::Metric;

/// Render a scaled price or delta.
pub fn format_price(value: Decimal) -> String {
    if value.abs() < Decimal::ONE && !value.is_zero() {
        format!("{value:.6}")
    } else {
        format!("{value:.2}")
    }
}

/// Render a signed delta with an explicit plus for gains.
pub fn format_signed(value: Decimal) -> String {
    if value.is_sign_negative() {
        format_price(value)
    } else {
        format!("+{}", format_price(value))
    }
}

/// Render a signed percentage with two fraction digits.
pub fn format_percent(change: f64) -> String {
    format!("{change:+.2}%")
}

fn format_timestamp(timestamp: u64) -> String {
    match DateTime::from_timestamp(timestamp as i64, 0) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{timestamp}s"),
    }
}

/// One alert for one subscriber, Markdown-formatted.
pub fn alert_message(metric: &Metric, change: f64) -> String {
    let direction = if change >= 0.0 { "▲" } else { "▼" };
    [
        format!("🚨 *{}* ({}) alert", metric.pair_id, metric.source),
        format!("Change: *{} {}*", direction, format_percent(change)),
        format!(
            "Price: {} {}",
            format_price(metric.price),
            metric.quote_token
        ),
        format!("Delta: {}", format_signed(metric.price_delta)),
        format!("Updated: {}", format_timestamp(metric.timestamp)),
    ]
    .join("\n")
}

/// Periodic summary of current prices, one line per visible pair. Uses the
/// change the upstream record itself carries.
pub fn digest_message(metrics: &[&Metric]) -> String {
    let mut lines = vec!["📊 *Price digest*".to_string()];
    for metric in metrics {
        let direction = if metric.price_delta_percent >= 0.0 {
            "▲"
        } else {
            "▼"
        };
        lines.push(format!(
            "{}: {} {} ({} {})",
            metric.pair_id,
            format_price(metric.price),
            metric.quote_token,
            direction,
            format_percent(metric.price_delta_percent),
        ));
    }
    lines.join("\n")
}

/// Reply to `/start`: current configuration plus the command list.
pub fn welcome_message(subscription: &Subscription) -> String {
    let tracking = if subscription.pairs.is_empty() {
        "Tracking all supported pairs.".to_string()
    } else {
        format!("Tracking pairs: {}", subscription.pairs.join(", "))
    };

    [
        "👋 Welcome to the Somnia price alerts bot!".to_string(),
        String::new(),
        format!("Current threshold: {}%", subscription.threshold),
        tracking,
        String::new(),
        "Commands:".to_string(),
        "• /subscribe <pairId>[,<pairId>...]".to_string(),
        "• /setthreshold <percent>".to_string(),
        "• /stop".to_string(),
    ]
    .join("\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::core::types::Address;

    fn metric(pair_id: &str, price: Decimal, delta: Decimal) -> Metric {
        Metric {
            pair_id: pair_id.to_string(),
            base_token: "ETH".to_string(),
            quote_token: "USD".to_string(),
            source: "Chainlink".to_string(),
            price,
            price_delta: delta,
            price_delta_percent: 1.25,
            price_feed: Address::zero(),
            decimals: 8,
            base_address: Address::zero(),
            quote_address: Address::zero(),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_format_price_two_digits_above_one() {
        assert_eq!(format_price(Decimal::new(2100, 0)), "2100.00");
        assert_eq!(format_price(Decimal::new(210012, 2)), "2100.12");
    }

    #[test]
    fn test_format_price_six_digits_below_one() {
        assert_eq!(format_price(Decimal::new(1234, 5)), "0.012340");
        assert_eq!(format_price(Decimal::new(-1234, 5)), "-0.012340");
    }

    #[test]
    fn test_format_price_zero() {
        assert_eq!(format_price(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_format_signed_adds_plus_for_gains() {
        assert_eq!(format_signed(Decimal::new(100, 0)), "+100.00");
        assert_eq!(format_signed(Decimal::new(-100, 0)), "-100.00");
    }

    #[test]
    fn test_alert_message_rising() {
        let text = alert_message(
            &metric("ETH-USD", Decimal::new(2100, 0), Decimal::new(100, 0)),
            5.0,
        );
        assert!(text.contains("*ETH-USD* (Chainlink) alert"));
        assert!(text.contains("▲ +5.00%"));
        assert!(text.contains("Price: 2100.00 USD"));
        assert!(text.contains("Delta: +100.00"));
    }

    #[test]
    fn test_alert_message_falling() {
        let text = alert_message(
            &metric("ETH-USD", Decimal::new(1900, 0), Decimal::new(-100, 0)),
            -5.0,
        );
        assert!(text.contains("▼ -5.00%"));
        assert!(text.contains("Delta: -100.00"));
    }

    #[test]
    fn test_digest_lists_each_pair() {
        let eth = metric("ETH-USD", Decimal::new(2100, 0), Decimal::ZERO);
        let som = metric("SOM-USDT", Decimal::new(1234, 5), Decimal::ZERO);
        let text = digest_message(&[&eth, &som]);

        assert!(text.starts_with("📊"));
        assert!(text.contains("ETH-USD: 2100.00 USD"));
        assert!(text.contains("SOM-USDT: 0.012340 USD"));
        assert!(text.contains("+1.25%"));
    }

    #[test]
    fn test_welcome_message_default_subscription() {
        let text = welcome_message(&Subscription::default());
        assert!(text.contains("Current threshold: 5%"));
        assert!(text.contains("Tracking all supported pairs."));
        assert!(text.contains("/setthreshold"));
    }

    #[test]
    fn test_welcome_message_with_filter() {
        let sub = Subscription {
            pairs: vec!["ETH-USD".to_string(), "BTC-USD".to_string()],
            threshold: 2.5,
        };
        let text = welcome_message(&sub);
        assert!(text.contains("Current threshold: 2.5%"));
        assert!(text.contains("Tracking pairs: ETH-USD, BTC-USD"));
    }
}
