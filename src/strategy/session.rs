use chrono::Timelike;

use crate::config::SessionSettings;
use crate::indicators::IndicatorSnapshot;
use crate::models::{Bar, Direction, Signal, SignalKind};
use crate::strategy::SignalEngine;

/// Trading-hours policy wrapper around any signal engine.
///
/// Outside the configured window no entries are produced, and an open
/// position is force-closed regardless of what the inner engine would say.
/// The close also fires during the final hour of the session so positions
/// are not carried past the end.
pub struct SessionFilter {
    inner: Box<dyn SignalEngine>,
    start_hour: u32,
    end_hour: u32,
}

impl SessionFilter {
    pub fn new(inner: Box<dyn SignalEngine>, settings: &SessionSettings) -> Self {
        Self {
            inner,
            start_hour: settings.start_hour,
            end_hour: settings.end_hour,
        }
    }

    fn in_session(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }

    fn close_imminent(&self, hour: u32) -> bool {
        hour + 1 >= self.end_hour || hour < self.start_hour
    }
}

impl SignalEngine for SessionFilter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn min_bars_required(&self) -> usize {
        self.inner.min_bars_required()
    }

    fn compute_snapshot(&self, bars: &[Bar]) -> Option<IndicatorSnapshot> {
        self.inner.compute_snapshot(bars)
    }

    fn evaluate(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        direction: Direction,
    ) -> Signal {
        let hour = snapshot.timestamp().hour();

        if direction != Direction::Flat && self.close_imminent(hour) {
            let mut signal = Signal::none(symbol, "session_close", snapshot.timestamp());
            signal.kind = match direction {
                Direction::Long => SignalKind::CloseLong,
                _ => SignalKind::CloseShort,
            };
            return signal;
        }

        if direction == Direction::Flat && !self.in_session(hour) {
            return Signal::none(symbol, "outside_trading_hours", snapshot.timestamp());
        }

        self.inner.evaluate(symbol, snapshot, direction)
    }
}
