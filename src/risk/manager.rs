use chrono::{NaiveDate, Utc};

use crate::config::RiskSettings;
use crate::error::Result;
use crate::models::TradeOutcome;

/// Smallest tradable lot size.
pub const MIN_LOT: f64 = 0.01;

/// Hard ceiling on lot size before the balance-scaled cap applies.
const MAX_LOT: f64 = 10.0;

/// Default pip value per standard lot when a symbol has no type mapping.
const DEFAULT_PIP_VALUE: f64 = 10.0;

/// Append-only record of trade outcomes for the current calendar day.
///
/// Cleared atomically when the date rolls over; only the loss sum is ever
/// consulted, winning trades do not offset the breaker.
#[derive(Debug, Clone)]
pub struct DailyLossLedger {
    day: NaiveDate,
    outcomes: Vec<TradeOutcome>,
}

impl DailyLossLedger {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            outcomes: Vec::new(),
        }
    }

    /// Clear the ledger if `today` is a new calendar day.
    fn roll_over(&mut self, today: NaiveDate) {
        if today != self.day {
            self.outcomes.clear();
            self.day = today;
        }
    }

    fn record(&mut self, outcome: TradeOutcome) {
        self.roll_over(outcome.timestamp.date_naive());
        self.outcomes.push(outcome);
    }

    /// Sum of losing trades for the day, as a negative number.
    fn realized_loss(&self) -> f64 {
        self.outcomes
            .iter()
            .map(|o| o.profit)
            .filter(|p| *p < 0.0)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Position sizing and trade-policy gates.
///
/// Sizing is a pure computation; `is_trading_allowed` owns the daily-loss
/// ledger and is the only method that mutates state besides `record_trade`.
#[derive(Debug, Clone)]
pub struct RiskManager {
    settings: RiskSettings,
    ledger: DailyLossLedger,
}

impl RiskManager {
    /// Build a manager, rejecting degenerate settings up front.
    pub fn new(settings: RiskSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            ledger: DailyLossLedger::new(Utc::now().date_naive()),
        })
    }

    pub fn max_positions(&self) -> usize {
        self.settings.max_positions
    }

    /// Lots to trade for a given balance, entry and protective stop.
    ///
    /// Degenerate stop distances clamp to the minimum lot instead of
    /// dividing by zero. The result is monotone: non-decreasing in
    /// risk_per_trade, non-increasing in stop distance.
    pub fn calculate_position_size(
        &self,
        balance: f64,
        entry_price: f64,
        stop_price: f64,
        symbol: &str,
    ) -> f64 {
        let price_diff = (entry_price - stop_price).abs();
        if price_diff < 1e-10 {
            return MIN_LOT;
        }

        let risk_amount = balance * self.settings.risk_per_trade;
        let pip_multiplier = if symbol.ends_with("JPY") { 0.01 } else { 0.0001 };
        let pips_at_risk = price_diff / pip_multiplier;
        let pip_value = self.pip_value(symbol);

        let raw_lots = risk_amount / (pips_at_risk * pip_value);

        // cap exposure relative to balance as well as the broker maximum
        let max_lot = MAX_LOT
            .min(balance * 0.1 / (1000.0 * pip_value))
            .max(MIN_LOT);
        let lots = raw_lots.clamp(MIN_LOT, max_lot);

        (lots * 100.0).round() / 100.0
    }

    /// Circuit breaker consulted before any new entry. Never blocks sizing
    /// calls themselves.
    pub fn is_trading_allowed(&mut self, balance: f64) -> bool {
        self.is_trading_allowed_at(balance, Utc::now().date_naive())
    }

    /// Date-injectable variant so rollover behavior is testable.
    pub fn is_trading_allowed_at(&mut self, balance: f64, today: NaiveDate) -> bool {
        self.ledger.roll_over(today);
        let realized_loss = self.ledger.realized_loss();
        let limit = -balance * self.settings.max_daily_loss;
        if realized_loss <= limit {
            tracing::warn!(
                realized_loss,
                limit,
                "daily loss breaker tripped, suppressing new entries"
            );
            return false;
        }
        true
    }

    /// False once `max_correlated` symbols of this symbol's correlation
    /// group are already open. Symbols outside any group are unconstrained.
    pub fn check_correlation_limit(&self, symbol: &str, open_symbols: &[String]) -> bool {
        let group = self
            .settings
            .correlation_groups
            .values()
            .find(|members| members.iter().any(|m| m == symbol));
        let Some(group) = group else {
            return true;
        };

        let open_in_group = open_symbols
            .iter()
            .filter(|open| group.iter().any(|m| m == *open))
            .count();
        open_in_group < self.settings.max_correlated
    }

    /// Append a trade outcome to the daily ledger. The caller is
    /// responsible for the correctness of the recorded P&L.
    pub fn record_trade(&mut self, outcome: TradeOutcome) {
        tracing::debug!(
            symbol = %outcome.symbol,
            profit = outcome.profit,
            "recording trade outcome"
        );
        self.ledger.record(outcome);
    }

    pub fn ledger(&self) -> &DailyLossLedger {
        &self.ledger
    }

    fn pip_value(&self, symbol: &str) -> f64 {
        self.settings
            .symbol_type_by_symbol
            .get(symbol)
            .and_then(|symbol_type| self.settings.pip_value_by_symbol_type.get(symbol_type))
            .copied()
            .unwrap_or(DEFAULT_PIP_VALUE)
    }
}
