use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A single OHLC price bar. Bars are chronological and immutable once
/// observed; one bar per timeframe step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Reject windows whose bars are out of order or duplicated. Indicator
/// math assumes strictly chronological input.
pub fn validate_bar_window(bars: &[Bar]) -> Result<()> {
    for pair in bars.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(Error::InvalidBars(format!(
                "bars out of order at {}",
                pair[1].timestamp
            )));
        }
    }
    Ok(())
}

/// Chart timeframe of a bar series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Timeframe {
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }

    /// Duration of one bar at this timeframe.
    pub fn step(&self) -> chrono::Duration {
        match self {
            Timeframe::M5 => chrono::Duration::minutes(5),
            Timeframe::M15 => chrono::Duration::minutes(15),
            Timeframe::H1 => chrono::Duration::hours(1),
            Timeframe::H4 => chrono::Duration::hours(4),
            Timeframe::D1 => chrono::Duration::days(1),
        }
    }
}

/// Direction of the current per-symbol position.
///
/// Transitions only ever go Flat <-> Long or Flat <-> Short; a reversal
/// passes through Flat via a confirmed close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Flat,
    Long,
    Short,
}

/// What the signal engine decided for one evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalKind {
    None,
    EnterLong,
    EnterShort,
    CloseLong,
    CloseShort,
}

/// Price levels and traceability attached to a signal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalMeta {
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub atr: Option<f64>,
    pub reason: String,
}

/// Trading signal: an immutable value produced fresh on every evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub kind: SignalKind,
    pub meta: SignalMeta,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// A no-trade signal with a reason tag for traceability.
    pub fn none(symbol: &str, reason: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            kind: SignalKind::None,
            meta: SignalMeta {
                reason: reason.to_string(),
                ..Default::default()
            },
            timestamp,
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self.kind, SignalKind::EnterLong | SignalKind::EnterShort)
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.kind, SignalKind::CloseLong | SignalKind::CloseShort)
    }
}

/// Per-symbol position state, owned exclusively by the coordinator.
///
/// Created on a confirmed entry, reset to Flat on a confirmed close.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionState {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub size: f64,
    pub entry_time: Option<DateTime<Utc>>,
    pub order_id: Option<Uuid>,
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        self.direction != Direction::Flat
    }
}

/// Realized result of one closed trade, fed to the daily-loss ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeOutcome {
    pub symbol: String,
    pub profit: f64,
    pub timestamp: DateTime<Utc>,
}

/// Which way an order trades.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order intent handed to the execution gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub size: f64,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub comment: String,
}

/// Gateway acknowledgement of a filled entry order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub fill_price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Gateway acknowledgement of a closed position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloseConfirmation {
    pub symbol: String,
    pub exit_price: f64,
    pub profit: f64,
    pub timestamp: DateTime<Utc>,
}

/// Account state as reported by the broker collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    pub balance: f64,
    pub equity: f64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_openness_follows_direction() {
        let mut position = PositionState {
            direction: Direction::Flat,
            entry_price: 0.0,
            stop_loss: 0.0,
            take_profit: None,
            size: 0.0,
            entry_time: None,
            order_id: None,
        };
        assert!(!position.is_open());
        position.direction = Direction::Long;
        assert!(position.is_open());
    }

    #[test]
    fn test_signal_none_carries_reason() {
        let signal = Signal::none("EURUSD", "insufficient_data", Utc::now());
        assert_eq!(signal.kind, SignalKind::None);
        assert_eq!(signal.meta.reason, "insufficient_data");
        assert!(!signal.is_entry());
        assert!(!signal.is_exit());
    }

    #[test]
    fn test_signal_kind_predicates() {
        let mut signal = Signal::none("EURUSD", "test", Utc::now());
        signal.kind = SignalKind::EnterShort;
        assert!(signal.is_entry());
        signal.kind = SignalKind::CloseShort;
        assert!(signal.is_exit());
    }

    #[test]
    fn test_timeframe_step() {
        assert_eq!(Timeframe::H4.step(), chrono::Duration::hours(4));
        assert_eq!(Timeframe::H4.as_str(), "H4");
    }

    #[test]
    fn test_bar_window_validation() {
        let bar = |h: i64| Bar {
            symbol: "EURUSD".to_string(),
            timestamp: Utc::now() + chrono::Duration::hours(h),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        };
        assert!(validate_bar_window(&[bar(0), bar(4), bar(8)]).is_ok());
        assert!(validate_bar_window(&[bar(0), bar(8), bar(4)]).is_err());
        // duplicated timestamp
        let dup = bar(0);
        assert!(validate_bar_window(&[dup.clone(), dup]).is_err());
    }
}
