use crate::config::StrategySettings;
use crate::indicators::{build_crossover_snapshot, crossover_bars_required, IndicatorSnapshot};
use crate::models::{Bar, Direction, Signal, SignalKind, SignalMeta};
use crate::strategy::SignalEngine;

/// EMA crossover engine with MACD, RSI, momentum and Bollinger filters.
///
/// Entries require a fresh MACD-histogram zero-cross on top of trend and
/// momentum confirmation; exits fire on the opposite zero-cross or when the
/// fast EMA flips back through the slow one (the trend flip overrides the
/// oscillator).
#[derive(Debug, Clone)]
pub struct CrossoverEngine {
    settings: StrategySettings,
}

impl CrossoverEngine {
    pub fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }
}

impl SignalEngine for CrossoverEngine {
    fn name(&self) -> &str {
        "crossover"
    }

    fn min_bars_required(&self) -> usize {
        crossover_bars_required(&self.settings)
    }

    fn compute_snapshot(&self, bars: &[Bar]) -> Option<IndicatorSnapshot> {
        build_crossover_snapshot(bars, &self.settings).map(IndicatorSnapshot::Crossover)
    }

    fn evaluate(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        direction: Direction,
    ) -> Signal {
        let s = match snapshot {
            IndicatorSnapshot::Crossover(s) => s,
            _ => return Signal::none(symbol, "insufficient_data", snapshot.timestamp()),
        };

        match direction {
            Direction::Flat => {
                let long_cross = s.macd > s.signal_line && s.macd_hist > 0.0 && s.prev_macd_hist <= 0.0;
                if s.fast_ema > s.slow_ema
                    && long_cross
                    && s.rsi > 50.0
                    && s.momentum > 0.0
                    && s.close > s.bollinger_mid
                {
                    return self.entry(symbol, s, SignalKind::EnterLong);
                }

                let short_cross =
                    s.macd < s.signal_line && s.macd_hist < 0.0 && s.prev_macd_hist >= 0.0;
                if s.fast_ema < s.slow_ema
                    && short_cross
                    && s.rsi < 50.0
                    && s.momentum < 0.0
                    && s.close < s.bollinger_mid
                {
                    return self.entry(symbol, s, SignalKind::EnterShort);
                }

                Signal::none(symbol, "no_crossover", s.timestamp)
            }
            Direction::Long => {
                let oscillator_exit =
                    s.macd < s.signal_line && s.macd_hist < 0.0 && s.prev_macd_hist >= 0.0;
                if oscillator_exit || s.fast_ema < s.slow_ema {
                    let mut signal = Signal::none(symbol, "ema_macd_long_exit", s.timestamp);
                    signal.kind = SignalKind::CloseLong;
                    signal
                } else {
                    Signal::none(symbol, "holding_long", s.timestamp)
                }
            }
            Direction::Short => {
                let oscillator_exit =
                    s.macd > s.signal_line && s.macd_hist > 0.0 && s.prev_macd_hist <= 0.0;
                if oscillator_exit || s.fast_ema > s.slow_ema {
                    let mut signal = Signal::none(symbol, "ema_macd_short_exit", s.timestamp);
                    signal.kind = SignalKind::CloseShort;
                    signal
                } else {
                    Signal::none(symbol, "holding_short", s.timestamp)
                }
            }
        }
    }
}

impl CrossoverEngine {
    fn entry(
        &self,
        symbol: &str,
        s: &crate::indicators::CrossoverSnapshot,
        kind: SignalKind,
    ) -> Signal {
        let entry_price = s.close;
        let risk = self.settings.atr_multiplier * s.atr;
        let reward = risk * self.settings.profit_multiplier;
        let (stop_loss, take_profit, reason) = match kind {
            SignalKind::EnterLong => (
                entry_price - risk,
                entry_price + reward,
                "ema_macd_long_entry",
            ),
            _ => (
                entry_price + risk,
                entry_price - reward,
                "ema_macd_short_entry",
            ),
        };
        Signal {
            symbol: symbol.to_string(),
            kind,
            meta: SignalMeta {
                entry_price: Some(entry_price),
                stop_loss: Some(stop_loss),
                take_profit: Some(take_profit),
                atr: Some(s.atr),
                reason: reason.to_string(),
            },
            timestamp: s.timestamp,
        }
    }
}
