use crate::config::StrategySettings;
use crate::indicators::{breakout_bars_required, build_breakout_snapshot, IndicatorSnapshot};
use crate::models::{Bar, Direction, Signal, SignalKind, SignalMeta};
use crate::strategy::SignalEngine;

/// Donchian-channel breakout engine (turtle rules with a volatility filter).
///
/// Entries trigger when the close clears the previous bar's entry channel
/// with the volatility and trend filters passing; exits trigger when the
/// close crosses back through the tighter exit channel.
#[derive(Debug, Clone)]
pub struct BreakoutEngine {
    settings: StrategySettings,
}

impl BreakoutEngine {
    pub fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }
}

impl SignalEngine for BreakoutEngine {
    fn name(&self) -> &str {
        "breakout"
    }

    fn min_bars_required(&self) -> usize {
        breakout_bars_required(&self.settings)
    }

    fn compute_snapshot(&self, bars: &[Bar]) -> Option<IndicatorSnapshot> {
        build_breakout_snapshot(bars, &self.settings).map(IndicatorSnapshot::Breakout)
    }

    fn evaluate(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        direction: Direction,
    ) -> Signal {
        let s = match snapshot {
            IndicatorSnapshot::Breakout(s) => s,
            _ => return Signal::none(symbol, "insufficient_data", snapshot.timestamp()),
        };

        match direction {
            Direction::Flat => {
                // The volatility filter gates entries only; an open position
                // can always exit through its channel.
                if !s.vol_filter_passed {
                    return Signal::none(symbol, "insufficient_volatility", s.timestamp);
                }
                if s.close > s.prev_entry_high && s.trend_up {
                    let entry_price = s.prev_entry_high;
                    return Signal {
                        symbol: symbol.to_string(),
                        kind: SignalKind::EnterLong,
                        meta: SignalMeta {
                            entry_price: Some(entry_price),
                            stop_loss: Some(entry_price - 2.0 * s.atr),
                            take_profit: None,
                            atr: Some(s.atr),
                            reason: "long_entry_breakout".to_string(),
                        },
                        timestamp: s.timestamp,
                    };
                }
                if s.close < s.prev_entry_low && s.trend_down {
                    let entry_price = s.prev_entry_low;
                    return Signal {
                        symbol: symbol.to_string(),
                        kind: SignalKind::EnterShort,
                        meta: SignalMeta {
                            entry_price: Some(entry_price),
                            stop_loss: Some(entry_price + 2.0 * s.atr),
                            take_profit: None,
                            atr: Some(s.atr),
                            reason: "short_entry_breakout".to_string(),
                        },
                        timestamp: s.timestamp,
                    };
                }
                Signal::none(symbol, "no_breakout", s.timestamp)
            }
            Direction::Long => {
                if s.close < s.prev_exit_low {
                    let mut signal = Signal::none(symbol, "long_exit_breakout", s.timestamp);
                    signal.kind = SignalKind::CloseLong;
                    signal
                } else {
                    Signal::none(symbol, "holding_long", s.timestamp)
                }
            }
            Direction::Short => {
                if s.close > s.prev_exit_high {
                    let mut signal = Signal::none(symbol, "short_exit_breakout", s.timestamp);
                    signal.kind = SignalKind::CloseShort;
                    signal
                } else {
                    Signal::none(symbol, "holding_short", s.timestamp)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::BreakoutSnapshot;
    use chrono::Utc;

    fn snapshot(close: f64) -> BreakoutSnapshot {
        BreakoutSnapshot {
            timestamp: Utc::now(),
            close,
            prev_entry_high: 1.2000,
            prev_entry_low: 1.1000,
            prev_exit_high: 1.1900,
            prev_exit_low: 1.1100,
            atr: 0.0050,
            vol_filter_passed: true,
            trend_up: true,
            trend_down: false,
        }
    }

    fn engine() -> BreakoutEngine {
        BreakoutEngine::new(StrategySettings::default())
    }

    #[test]
    fn test_flat_enters_long_above_entry_high() {
        let snap = IndicatorSnapshot::Breakout(snapshot(1.2050));
        let signal = engine().evaluate("EURUSD", &snap, Direction::Flat);
        assert_eq!(signal.kind, SignalKind::EnterLong);
        assert_eq!(signal.meta.entry_price, Some(1.2000));
        // stop sits two ATRs under the entry
        assert!((signal.meta.stop_loss.unwrap() - 1.1900).abs() < 1e-9);
        assert!(signal.meta.stop_loss.unwrap() < signal.meta.entry_price.unwrap());
        assert_eq!(signal.meta.reason, "long_entry_breakout");
    }

    #[test]
    fn test_flat_enters_short_below_entry_low() {
        let mut s = snapshot(1.0950);
        s.trend_up = false;
        s.trend_down = true;
        let snap = IndicatorSnapshot::Breakout(s);
        let signal = engine().evaluate("EURUSD", &snap, Direction::Flat);
        assert_eq!(signal.kind, SignalKind::EnterShort);
        assert!((signal.meta.stop_loss.unwrap() - 1.1100).abs() < 1e-9);
        assert_eq!(signal.meta.reason, "short_entry_breakout");
    }

    #[test]
    fn test_vol_filter_blocks_entry() {
        let mut s = snapshot(1.2050);
        s.vol_filter_passed = false;
        let snap = IndicatorSnapshot::Breakout(s);
        let signal = engine().evaluate("EURUSD", &snap, Direction::Flat);
        assert_eq!(signal.kind, SignalKind::None);
        assert_eq!(signal.meta.reason, "insufficient_volatility");
    }

    #[test]
    fn test_trend_filter_blocks_counter_trend_entry() {
        let mut s = snapshot(1.2050);
        s.trend_up = false;
        let snap = IndicatorSnapshot::Breakout(s);
        let signal = engine().evaluate("EURUSD", &snap, Direction::Flat);
        assert_eq!(signal.kind, SignalKind::None);
    }

    #[test]
    fn test_long_exits_below_exit_low() {
        let snap = IndicatorSnapshot::Breakout(snapshot(1.1050));
        let signal = engine().evaluate("EURUSD", &snap, Direction::Long);
        assert_eq!(signal.kind, SignalKind::CloseLong);
        assert_eq!(signal.meta.reason, "long_exit_breakout");
    }

    #[test]
    fn test_short_exits_above_exit_high() {
        let snap = IndicatorSnapshot::Breakout(snapshot(1.1950));
        let signal = engine().evaluate("EURUSD", &snap, Direction::Short);
        assert_eq!(signal.kind, SignalKind::CloseShort);
    }

    #[test]
    fn test_vol_filter_does_not_trap_open_position() {
        let mut s = snapshot(1.1050);
        s.vol_filter_passed = false;
        let snap = IndicatorSnapshot::Breakout(s);
        let signal = engine().evaluate("EURUSD", &snap, Direction::Long);
        assert_eq!(signal.kind, SignalKind::CloseLong);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let snap = IndicatorSnapshot::Breakout(snapshot(1.2050));
        let first = engine().evaluate("EURUSD", &snap, Direction::Flat);
        let second = engine().evaluate("EURUSD", &snap, Direction::Flat);
        assert_eq!(first, second);
    }

    #[test]
    fn test_wrong_snapshot_variant_yields_no_signal() {
        let snap = IndicatorSnapshot::Crossover(crate::indicators::CrossoverSnapshot {
            timestamp: Utc::now(),
            close: 1.2,
            fast_ema: 0.0,
            slow_ema: 0.0,
            macd: 0.0,
            signal_line: 0.0,
            macd_hist: 0.0,
            prev_macd_hist: 0.0,
            rsi: 50.0,
            momentum: 0.0,
            atr: 0.001,
            bollinger_mid: 1.2,
            bollinger_upper: 1.21,
            bollinger_lower: 1.19,
        });
        let signal = engine().evaluate("EURUSD", &snap, Direction::Flat);
        assert_eq!(signal.kind, SignalKind::None);
        assert_eq!(signal.meta.reason, "insufficient_data");
    }
}
