//! Reconciles the three strategy signals for one instrument.

use crate::models::Signal;

/// Final action from the trend-filter, volume-breakout and panic signals.
///
/// First match wins:
/// 1. panic BUY -> BUY
/// 2. trend BUY and breakout BUY -> BUY
/// 3. trend SELL -> SELL
/// 4. otherwise HOLD
pub fn synthesize(trend: Signal, breakout: Signal, panic: Signal) -> Signal {
    if panic == Signal::Buy {
        return Signal::Buy;
    }
    if trend == Signal::Buy && breakout == Signal::Buy {
        return Signal::Buy;
    }
    if trend == Signal::Sell {
        return Signal::Sell;
    }
    Signal::Hold
}

#[cfg(test)]
mod tests {
    use super::*;
    use Signal::*;

    #[test]
    fn test_panic_buy_overrides_trend_sell() {
        assert_eq!(synthesize(Sell, Hold, Buy), Buy);
    }

    #[test]
    fn test_breakout_concordance_buys() {
        assert_eq!(synthesize(Buy, Buy, Wait), Buy);
    }

    #[test]
    fn test_single_breakout_buy_is_not_enough() {
        assert_eq!(synthesize(Buy, Hold, Wait), Hold);
        assert_eq!(synthesize(Hold, Buy, Wait), Hold);
    }

    #[test]
    fn test_trend_sell_beats_breakout_buy() {
        assert_eq!(synthesize(Sell, Buy, Wait), Sell);
    }

    #[test]
    fn test_default_is_hold() {
        assert_eq!(synthesize(Hold, Hold, Wait), Hold);
        assert_eq!(synthesize(Wait, Wait, Sell), Hold);
    }
}
