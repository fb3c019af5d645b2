//! Position risk: ATR volatility stop and the exit ladder for triggered entries.

use std::time::Duration;

use crate::indicators;
use crate::models::{Candle, ExitReason, PositionRiskState};

use super::config::{LadderConfig, RiskConfig};

/// Outcome of checking one candle window against an entry price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCheck {
    pub atr: f64,
    pub stop_price: f64,
    pub close: f64,
    pub breached: bool,
}

/// Stop placed `multiplier` ATRs below entry.
#[derive(Debug, Clone)]
pub struct AtrStop {
    period: usize,
    multiplier: f64,
}

impl AtrStop {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            period: config.atr_period,
            multiplier: config.atr_multiplier,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn stop_price(&self, entry_price: f64, atr: f64) -> f64 {
        entry_price - self.multiplier * atr
    }

    /// Compare the latest close with the stop. `None` when the window is too
    /// short to produce an ATR.
    pub fn check(&self, entry_price: f64, candles: &[Candle]) -> Option<StopCheck> {
        let atr = indicators::last(&indicators::atr(candles, self.period))?;
        let close = candles.last()?.close;
        let stop_price = self.stop_price(entry_price, atr);

        Some(StopCheck {
            atr,
            stop_price,
            close,
            breached: close <= stop_price,
        })
    }
}

/// Exit fired by the ladder along with the position's state at that tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LadderExit {
    pub reason: ExitReason,
    pub pnl_pct: f64,
    pub drawdown_pct: f64,
}

/// Hard stop, then trailing stop, then time decay. First match wins.
#[derive(Debug, Clone)]
pub struct ExitLadder {
    hard_stop_pct: f64,
    trail_stop_pct: f64,
    time_decay: Duration,
    time_decay_min_pnl_pct: f64,
}

impl ExitLadder {
    pub fn new(config: &LadderConfig) -> Self {
        Self {
            hard_stop_pct: config.hard_stop_pct,
            trail_stop_pct: config.trail_stop_pct,
            time_decay: config.time_decay(),
            time_decay_min_pnl_pct: config.time_decay_min_pnl_pct,
        }
    }

    /// Record `price` against `state` and decide whether to exit.
    pub fn tick(&self, state: &mut PositionRiskState, price: f64, elapsed: Duration) -> Option<LadderExit> {
        state.observe(price);

        let pnl_pct = state.pnl_pct(price);
        let drawdown_pct = state.drawdown_pct(price);

        let reason = if pnl_pct <= self.hard_stop_pct {
            ExitReason::HardStop
        } else if drawdown_pct <= self.trail_stop_pct {
            ExitReason::TrailStop
        } else if elapsed >= self.time_decay && pnl_pct < self.time_decay_min_pnl_pct {
            ExitReason::TimeDecay
        } else {
            return None;
        };

        Some(LadderExit {
            reason,
            pnl_pct,
            drawdown_pct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    /// Flat bars with a 2.0 range, so ATR is exactly 2.0.
    fn flat(close: f64, n: usize) -> Vec<Candle> {
        let bars: Vec<_> = (0..n).map(|_| (close, close + 1.0, close - 1.0, close, 10.0)).collect();
        fixtures::from_ohlcv(&bars)
    }

    #[test]
    fn test_stop_price() {
        let stop = AtrStop::new(&RiskConfig::default());
        assert_eq!(stop.stop_price(100.0, 2.0), 95.0);
    }

    #[test]
    fn test_close_below_stop_breaches() {
        let stop = AtrStop::new(&RiskConfig::default());

        let check = stop.check(100.0, &flat(94.0, 30)).unwrap();
        assert!((check.atr - 2.0).abs() < 1e-9);
        assert_eq!(check.stop_price, 95.0);
        assert!(check.breached);

        let check = stop.check(100.0, &flat(96.0, 30)).unwrap();
        assert!(!check.breached);
    }

    #[test]
    fn test_short_window_has_no_stop() {
        let stop = AtrStop::new(&RiskConfig::default());
        assert!(stop.check(100.0, &flat(94.0, 14)).is_none());
    }

    #[test]
    fn test_trail_stop_fires_while_in_profit() {
        let ladder = ExitLadder::new(&LadderConfig::default());
        let mut state = PositionRiskState::new(100.0);

        assert!(ladder.tick(&mut state, 110.0, Duration::from_secs(10)).is_none());
        let exit = ladder.tick(&mut state, 106.0, Duration::from_secs(20)).unwrap();

        assert_eq!(exit.reason, ExitReason::TrailStop);
        assert!((exit.pnl_pct - 6.0).abs() < 1e-9);
        assert!(exit.drawdown_pct < -3.6);
    }

    #[test]
    fn test_hard_stop_wins_over_trail() {
        let ladder = ExitLadder::new(&LadderConfig::default());
        let mut state = PositionRiskState::new(100.0);

        let exit = ladder.tick(&mut state, 95.0, Duration::ZERO).unwrap();
        assert_eq!(exit.reason, ExitReason::HardStop);
    }

    #[test]
    fn test_time_decay_spares_winners() {
        let ladder = ExitLadder::new(&LadderConfig::default());
        let late = Duration::from_secs(180);

        let mut flat_position = PositionRiskState::new(100.0);
        let exit = ladder.tick(&mut flat_position, 100.5, late).unwrap();
        assert_eq!(exit.reason, ExitReason::TimeDecay);

        let mut winner = PositionRiskState::new(100.0);
        assert!(ladder.tick(&mut winner, 101.5, late).is_none());

        let mut early = PositionRiskState::new(100.0);
        assert!(ladder.tick(&mut early, 100.5, Duration::from_secs(179)).is_none());
    }
}
