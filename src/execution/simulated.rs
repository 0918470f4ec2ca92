use std::collections::HashMap;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::execution::gateway::{MarketDataSource, OrderExecutionGateway};
use crate::models::{
    AccountSnapshot, Bar, CloseConfirmation, OrderConfirmation, OrderRequest, OrderSide,
    Timeframe,
};

/// Units per standard lot.
const LOT_UNITS: f64 = 100_000.0;

#[derive(Debug, Clone)]
struct SimulatedPosition {
    side: OrderSide,
    entry_price: f64,
    size: f64,
}

/// In-memory gateway that fills every order at the requested price.
///
/// Realized P&L is quoted in account currency assuming one standard lot
/// per 1.0 of size. Used for paper trading and tests.
pub struct SimulatedGateway {
    balance: f64,
    open: HashMap<String, SimulatedPosition>,
    reject_orders: bool,
}

impl SimulatedGateway {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            balance: starting_balance,
            open: HashMap::new(),
            reject_orders: false,
        }
    }

    /// Make every subsequent `place_order` fail, simulating a broker
    /// rejection.
    pub fn set_reject_orders(&mut self, reject: bool) {
        self.reject_orders = reject;
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

impl OrderExecutionGateway for SimulatedGateway {
    fn place_order(&mut self, request: &OrderRequest) -> Result<OrderConfirmation> {
        if self.reject_orders {
            return Err(Error::ExecutionFailure {
                reason: format!("order rejected for {}", request.symbol),
            });
        }
        if self.open.contains_key(&request.symbol) {
            return Err(Error::ExecutionFailure {
                reason: format!("position already open on {}", request.symbol),
            });
        }

        self.open.insert(
            request.symbol.clone(),
            SimulatedPosition {
                side: request.side,
                entry_price: request.price,
                size: request.size,
            },
        );
        Ok(OrderConfirmation {
            order_id: Uuid::new_v4(),
            fill_price: request.price,
            timestamp: Utc::now(),
        })
    }

    fn close_position(&mut self, symbol: &str, price: f64) -> Result<CloseConfirmation> {
        let position = self
            .open
            .remove(symbol)
            .ok_or_else(|| Error::ExecutionFailure {
                reason: format!("no open position on {symbol}"),
            })?;

        let sign = match position.side {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        };
        let profit = sign * (price - position.entry_price) * position.size * LOT_UNITS;
        self.balance += profit;

        Ok(CloseConfirmation {
            symbol: symbol.to_string(),
            exit_price: price,
            profit,
            timestamp: Utc::now(),
        })
    }

    fn account_snapshot(&self) -> Result<AccountSnapshot> {
        Ok(AccountSnapshot {
            balance: self.balance,
            equity: self.balance,
            currency: "USD".to_string(),
        })
    }
}

/// Fixed bar series with a moving visibility cursor.
///
/// `get_bars` only sees bars up to the cursor, so tests can replay history
/// one bar at a time by calling `advance` between cycles.
pub struct StaticDataSource {
    series: HashMap<String, Vec<Bar>>,
    visible: usize,
}

impl StaticDataSource {
    pub fn new(series: HashMap<String, Vec<Bar>>) -> Self {
        let visible = series.values().map(Vec::len).max().unwrap_or(0);
        Self { series, visible }
    }

    /// Start with only `visible` bars revealed.
    pub fn with_cursor(series: HashMap<String, Vec<Bar>>, visible: usize) -> Self {
        Self { series, visible }
    }

    pub fn advance(&mut self) {
        self.visible += 1;
    }

    pub fn visible(&self) -> usize {
        self.visible
    }
}

impl MarketDataSource for StaticDataSource {
    fn get_bars(&self, symbol: &str, _timeframe: Timeframe, count: usize) -> Result<Vec<Bar>> {
        let series = self.series.get(symbol).ok_or_else(|| Error::NoData {
            symbol: symbol.to_string(),
        })?;
        let end = self.visible.min(series.len());
        let start = end.saturating_sub(count);
        Ok(series[start..end].to_vec())
    }
}

/// Seeded random-walk feed for paper trading without a broker connection.
///
/// Each symbol walks around a plausible base price with mild drift noise;
/// `advance` appends one bar per symbol.
pub struct SyntheticFeed {
    rng: StdRng,
    series: HashMap<String, Vec<Bar>>,
}

impl SyntheticFeed {
    pub fn new(symbols: &[String], timeframe: Timeframe, warmup: usize, seed: u64) -> Self {
        let mut feed = Self {
            rng: StdRng::seed_from_u64(seed),
            series: HashMap::new(),
        };
        let step = timeframe.step();
        for symbol in symbols {
            let base = if symbol.contains("JPY") { 150.0 } else { 1.2 };
            let start = Utc::now() - step * warmup as i32;
            let mut bars = Vec::with_capacity(warmup);
            let mut price = base;
            for i in 0..warmup {
                let timestamp = start + step * i as i32;
                price += price * feed.rng.gen_range(-0.002..0.002);
                bars.push(Self::bar(&mut feed.rng, symbol, timestamp, price));
            }
            feed.series.insert(symbol.clone(), bars);
        }
        feed
    }

    /// Append the next bar for every symbol.
    pub fn advance(&mut self, timeframe: Timeframe) {
        for bars in self.series.values_mut() {
            let Some(last) = bars.last() else { continue };
            let timestamp = last.timestamp + timeframe.step();
            let symbol = last.symbol.clone();
            let mut price = last.close;
            price += price * self.rng.gen_range(-0.002..0.002);
            bars.push(Self::bar(&mut self.rng, &symbol, timestamp, price));
        }
    }

    fn bar(
        rng: &mut StdRng,
        symbol: &str,
        timestamp: chrono::DateTime<Utc>,
        close: f64,
    ) -> Bar {
        let spread = 0.001;
        let high = close * (1.0 + rng.gen_range(0.0..spread));
        let low = close * (1.0 - rng.gen_range(0.0..spread));
        let open = (close * (1.0 + rng.gen_range(-spread..spread))).clamp(low, high);
        Bar {
            symbol: symbol.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(700.0..1300.0),
        }
    }
}

impl MarketDataSource for SyntheticFeed {
    fn get_bars(&self, symbol: &str, _timeframe: Timeframe, count: usize) -> Result<Vec<Bar>> {
        let series = self.series.get(symbol).ok_or_else(|| Error::NoData {
            symbol: symbol.to_string(),
        })?;
        let start = series.len().saturating_sub(count);
        Ok(series[start..].to_vec())
    }
}
