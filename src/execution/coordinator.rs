use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::execution::gateway::{MarketDataSource, OrderExecutionGateway};
use crate::models::{
    validate_bar_window, Direction, OrderRequest, OrderSide, PositionState, Signal, SignalKind,
    Timeframe, TradeOutcome,
};
use crate::risk::RiskManager;
use crate::strategy::SignalEngine;

/// Drives the decision cycle: fetch bars, evaluate, gate, execute.
///
/// Owns all per-symbol position state. State only changes after the
/// gateway confirms an order, so a rejected or failed call leaves the book
/// exactly as it was.
pub struct Coordinator<D, G> {
    symbols: Vec<String>,
    timeframe: Timeframe,
    engine: Box<dyn SignalEngine>,
    risk: RiskManager,
    data: D,
    gateway: G,
    positions: HashMap<String, PositionState>,
}

impl<D: MarketDataSource, G: OrderExecutionGateway> Coordinator<D, G> {
    pub fn new(
        symbols: Vec<String>,
        timeframe: Timeframe,
        engine: Box<dyn SignalEngine>,
        risk: RiskManager,
        data: D,
        gateway: G,
    ) -> Self {
        Self {
            symbols,
            timeframe,
            engine,
            risk,
            data,
            gateway,
            positions: HashMap::new(),
        }
    }

    /// Evaluate every symbol once. A failure on one symbol is logged and
    /// does not stop the others.
    pub fn run_cycle(&mut self) -> Result<()> {
        let balance = self.gateway.account_snapshot()?.balance;
        let symbols = self.symbols.clone();
        for symbol in &symbols {
            if let Err(e) = self.process_symbol(symbol, balance) {
                warn!(symbol = %symbol, error = %e, "symbol evaluation failed");
            }
        }
        Ok(())
    }

    fn process_symbol(&mut self, symbol: &str, balance: f64) -> Result<()> {
        let needed = self.engine.min_bars_required();
        let bars = self.data.get_bars(symbol, self.timeframe, needed)?;
        if bars.len() < needed {
            debug!(
                symbol,
                have = bars.len(),
                needed,
                "not enough history, skipping"
            );
            return Ok(());
        }
        validate_bar_window(&bars)?;

        let Some(snapshot) = self.engine.compute_snapshot(&bars) else {
            debug!(symbol, "indicator window incomplete, skipping");
            return Ok(());
        };

        let direction = self
            .positions
            .get(symbol)
            .map(|p| p.direction)
            .unwrap_or(Direction::Flat);
        let signal = self.engine.evaluate(symbol, &snapshot, direction);
        debug!(
            symbol,
            kind = ?signal.kind,
            reason = %signal.meta.reason,
            "evaluated"
        );

        // bars is non-empty here, needed is at least 1
        let last_close = bars[bars.len() - 1].close;

        if signal.is_entry() && direction == Direction::Flat {
            self.handle_entry(balance, &signal)?;
        } else if signal.is_exit() && direction != Direction::Flat {
            self.handle_exit(&signal, last_close);
        }
        Ok(())
    }

    /// Run the policy gates, size the order, and open the position if the
    /// gateway confirms. Gates run before sizing so a blocked trade never
    /// computes a lot size.
    fn handle_entry(&mut self, balance: f64, signal: &Signal) -> Result<()> {
        let open_symbols = self.open_symbols();

        if open_symbols.len() >= self.risk.max_positions() {
            info!(
                symbol = %signal.symbol,
                open = open_symbols.len(),
                "entry skipped: position limit reached"
            );
            return Ok(());
        }
        if !self.risk.is_trading_allowed(balance) {
            info!(symbol = %signal.symbol, "entry skipped: daily loss limit reached");
            return Ok(());
        }
        if !self.risk.check_correlation_limit(&signal.symbol, &open_symbols) {
            info!(symbol = %signal.symbol, "entry skipped: correlation limit reached");
            return Ok(());
        }

        let (Some(entry_price), Some(stop_loss)) =
            (signal.meta.entry_price, signal.meta.stop_loss)
        else {
            return Err(Error::ExecutionFailure {
                reason: format!("entry signal for {} is missing price levels", signal.symbol),
            });
        };

        let size = self
            .risk
            .calculate_position_size(balance, entry_price, stop_loss, &signal.symbol);
        let side = match signal.kind {
            SignalKind::EnterLong => OrderSide::Buy,
            _ => OrderSide::Sell,
        };
        let request = OrderRequest {
            symbol: signal.symbol.clone(),
            side,
            size,
            price: entry_price,
            stop_loss,
            take_profit: signal.meta.take_profit,
            comment: signal.meta.reason.clone(),
        };

        match self.gateway.place_order(&request) {
            Ok(confirmation) => {
                let direction = match side {
                    OrderSide::Buy => Direction::Long,
                    OrderSide::Sell => Direction::Short,
                };
                self.positions.insert(
                    signal.symbol.clone(),
                    PositionState {
                        direction,
                        entry_price: confirmation.fill_price,
                        stop_loss,
                        take_profit: signal.meta.take_profit,
                        size,
                        entry_time: Some(confirmation.timestamp),
                        order_id: Some(confirmation.order_id),
                    },
                );
                info!(
                    symbol = %signal.symbol,
                    ?direction,
                    size,
                    fill = confirmation.fill_price,
                    reason = %signal.meta.reason,
                    "position opened"
                );
            }
            Err(e) => {
                warn!(symbol = %signal.symbol, error = %e, "order rejected, staying flat");
            }
        }
        Ok(())
    }

    /// Close through the gateway; only a confirmed close resets the state
    /// and feeds the daily-loss ledger.
    fn handle_exit(&mut self, signal: &Signal, price: f64) {
        match self.gateway.close_position(&signal.symbol, price) {
            Ok(confirmation) => {
                self.positions.remove(&signal.symbol);
                info!(
                    symbol = %signal.symbol,
                    exit = confirmation.exit_price,
                    profit = confirmation.profit,
                    reason = %signal.meta.reason,
                    "position closed"
                );
                self.risk.record_trade(TradeOutcome {
                    symbol: signal.symbol.clone(),
                    profit: confirmation.profit,
                    timestamp: confirmation.timestamp,
                });
            }
            Err(e) => {
                warn!(
                    symbol = %signal.symbol,
                    error = %e,
                    "close failed, position kept"
                );
            }
        }
    }

    fn open_symbols(&self) -> Vec<String> {
        self.positions
            .iter()
            .filter(|(_, p)| p.is_open())
            .map(|(s, _)| s.clone())
            .collect()
    }

    pub fn position(&self, symbol: &str) -> Option<&PositionState> {
        self.positions.get(symbol)
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.values().filter(|p| p.is_open()).count()
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// One-line portfolio status for the periodic log.
    pub fn log_summary(&self) {
        let open: Vec<String> = self
            .positions
            .iter()
            .filter(|(_, p)| p.is_open())
            .map(|(s, p)| format!("{s}:{:?}@{}", p.direction, p.entry_price))
            .collect();
        match self.gateway.account_snapshot() {
            Ok(account) => info!(
                balance = account.balance,
                equity = account.equity,
                open_positions = open.len(),
                positions = ?open,
                "portfolio"
            ),
            Err(e) => warn!(error = %e, "account snapshot unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskSettings, StrategySettings};
    use crate::execution::simulated::{SimulatedGateway, StaticDataSource};
    use crate::models::Bar;
    use crate::strategy::BreakoutEngine;
    use chrono::Utc;

    fn settings() -> StrategySettings {
        StrategySettings {
            entry_period: 5,
            exit_period: 3,
            trend_period: 3,
            atr_period: 3,
            vol_filter: false,
            ..StrategySettings::default()
        }
    }

    fn bar(symbol: &str, i: usize, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            symbol: symbol.to_string(),
            timestamp: Utc::now() + chrono::Duration::hours(4 * i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    /// Ten quiet bars, a two-bar breakout, then a collapse through the
    /// exit channel.
    fn breakout_series(symbol: &str) -> Vec<Bar> {
        let mut bars: Vec<Bar> = (0..10).map(|i| bar(symbol, i, 1.05, 0.95, 1.00)).collect();
        bars.push(bar(symbol, 10, 1.25, 1.15, 1.20));
        bars.push(bar(symbol, 11, 1.25, 1.15, 1.20));
        bars.push(bar(symbol, 12, 0.92, 0.85, 0.90));
        bars
    }

    fn coordinator(
        symbols: &[&str],
        risk_settings: RiskSettings,
        visible: usize,
    ) -> Coordinator<StaticDataSource, SimulatedGateway> {
        let mut series = HashMap::new();
        for symbol in symbols {
            series.insert(symbol.to_string(), breakout_series(symbol));
        }
        Coordinator::new(
            symbols.iter().map(|s| s.to_string()).collect(),
            Timeframe::H4,
            Box::new(BreakoutEngine::new(settings())),
            RiskManager::new(risk_settings).unwrap(),
            StaticDataSource::with_cursor(series, visible),
            SimulatedGateway::new(10_000.0),
        )
    }

    #[test]
    fn test_breakout_entry_opens_long() {
        let mut c = coordinator(&["EURUSD"], RiskSettings::default(), 12);
        c.run_cycle().unwrap();

        let position = c.position("EURUSD").unwrap();
        assert_eq!(position.direction, Direction::Long);
        // filled at the breached channel level, not the close
        assert!((position.entry_price - 1.05).abs() < 1e-9);
        assert!(position.size > 0.0);
        assert!(position.order_id.is_some());
    }

    #[test]
    fn test_no_entry_before_breakout_bar() {
        let mut c = coordinator(&["EURUSD"], RiskSettings::default(), 10);
        c.run_cycle().unwrap();
        assert_eq!(c.open_position_count(), 0);
    }

    #[test]
    fn test_gateway_rejection_leaves_flat_then_recovers() {
        let mut c = coordinator(&["EURUSD"], RiskSettings::default(), 12);
        c.gateway_mut().set_reject_orders(true);
        c.run_cycle().unwrap();
        assert_eq!(c.open_position_count(), 0);

        // next cycle with a healthy gateway retries the same entry
        c.gateway_mut().set_reject_orders(false);
        c.run_cycle().unwrap();
        assert_eq!(c.open_position_count(), 1);
    }

    #[test]
    fn test_exit_closes_and_records_outcome() {
        let mut c = coordinator(&["EURUSD"], RiskSettings::default(), 12);
        c.run_cycle().unwrap();
        assert_eq!(c.open_position_count(), 1);

        c.data_mut().advance();
        c.run_cycle().unwrap();

        assert_eq!(c.open_position_count(), 0);
        assert_eq!(c.risk().ledger().len(), 1);
        // long closed below entry realized a loss
        assert!(c.gateway_mut().balance() < 10_000.0);
    }

    #[test]
    fn test_position_not_reentered_while_open() {
        let mut c = coordinator(&["EURUSD"], RiskSettings::default(), 12);
        c.run_cycle().unwrap();
        let first = c.position("EURUSD").unwrap().order_id;
        c.run_cycle().unwrap();
        assert_eq!(c.position("EURUSD").unwrap().order_id, first);
    }

    #[test]
    fn test_max_positions_gate() {
        let mut risk = RiskSettings::default();
        risk.max_positions = 1;
        let mut c = coordinator(&["EURUSD", "USDJPY"], risk, 12);
        c.run_cycle().unwrap();
        assert_eq!(c.open_position_count(), 1);
        assert!(c.position("EURUSD").is_some());
        assert!(c.position("USDJPY").is_none());
    }

    #[test]
    fn test_correlation_gate_caps_group() {
        // all three symbols sit in the usd_majors group, cap is 2
        let mut c = coordinator(&["EURUSD", "GBPUSD", "AUDUSD"], RiskSettings::default(), 12);
        c.run_cycle().unwrap();
        assert_eq!(c.open_position_count(), 2);
        assert!(c.position("AUDUSD").is_none());
    }

    #[test]
    fn test_daily_loss_breaker_blocks_entries() {
        let mut c = coordinator(&["EURUSD"], RiskSettings::default(), 12);
        // pre-recorded loss beyond 5% of the 10k balance
        let mut risk = RiskManager::new(RiskSettings::default()).unwrap();
        risk.record_trade(TradeOutcome {
            symbol: "GBPUSD".to_string(),
            profit: -600.0,
            timestamp: Utc::now(),
        });
        c.risk = risk;

        c.run_cycle().unwrap();
        assert_eq!(c.open_position_count(), 0);
    }

    #[test]
    fn test_missing_symbol_does_not_stop_cycle() {
        let mut series = HashMap::new();
        series.insert("EURUSD".to_string(), breakout_series("EURUSD"));
        let mut c = Coordinator::new(
            vec!["GBPUSD".to_string(), "EURUSD".to_string()],
            Timeframe::H4,
            Box::new(BreakoutEngine::new(settings())),
            RiskManager::new(RiskSettings::default()).unwrap(),
            StaticDataSource::with_cursor(series, 12),
            SimulatedGateway::new(10_000.0),
        );
        c.run_cycle().unwrap();
        assert!(c.position("EURUSD").is_some());
    }
}
