use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Timeframe;
use crate::strategy::StrategyKind;

/// Parameters shared by both signal engines.
///
/// Defaults mirror the values the system was tuned with: Donchian 20/10,
/// ATR 14, EMA 9/21/5, RSI 14.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub kind: StrategyKind,
    // Breakout
    pub entry_period: usize,
    pub exit_period: usize,
    pub vol_filter: bool,
    pub vol_lookback: usize,
    pub vol_threshold: f64,
    pub trend_period: usize,
    // Crossover
    pub fast_ema: usize,
    pub slow_ema: usize,
    pub signal_ema: usize,
    pub rsi_period: usize,
    pub momentum_period: usize,
    pub bollinger_period: usize,
    // Shared
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub profit_multiplier: f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Breakout,
            entry_period: 20,
            exit_period: 10,
            vol_filter: true,
            vol_lookback: 100,
            vol_threshold: 1.2,
            trend_period: 20,
            fast_ema: 9,
            slow_ema: 21,
            signal_ema: 5,
            rsi_period: 14,
            momentum_period: 12,
            bollinger_period: 20,
            atr_period: 14,
            atr_multiplier: 2.0,
            profit_multiplier: 3.0,
        }
    }
}

impl StrategySettings {
    /// Reject degenerate parameters before any evaluation runs.
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("entry_period", self.entry_period),
            ("exit_period", self.exit_period),
            ("vol_lookback", self.vol_lookback),
            ("trend_period", self.trend_period),
            ("fast_ema", self.fast_ema),
            ("slow_ema", self.slow_ema),
            ("signal_ema", self.signal_ema),
            ("rsi_period", self.rsi_period),
            ("momentum_period", self.momentum_period),
            ("bollinger_period", self.bollinger_period),
            ("atr_period", self.atr_period),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be positive")));
            }
        }
        if self.fast_ema >= self.slow_ema {
            return Err(Error::InvalidConfig(format!(
                "fast_ema ({}) must be shorter than slow_ema ({})",
                self.fast_ema, self.slow_ema
            )));
        }
        if self.atr_multiplier <= 0.0 || self.profit_multiplier <= 0.0 {
            return Err(Error::InvalidConfig(
                "atr_multiplier and profit_multiplier must be positive".to_string(),
            ));
        }
        if self.vol_threshold <= 0.0 {
            return Err(Error::InvalidConfig(
                "vol_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Risk budget and policy limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// Fraction of balance risked per trade.
    pub risk_per_trade: f64,
    /// Fraction of balance that, once lost in one day, halts new entries.
    pub max_daily_loss: f64,
    pub max_positions: usize,
    /// Max simultaneously open symbols within one correlation group.
    pub max_correlated: usize,
    /// Pip value per standard lot, keyed by symbol type.
    pub pip_value_by_symbol_type: HashMap<String, f64>,
    /// Symbol -> symbol type lookup for pip values.
    pub symbol_type_by_symbol: HashMap<String, String>,
    /// Named groups of symbols assumed to co-move.
    pub correlation_groups: HashMap<String, Vec<String>>,
}

impl Default for RiskSettings {
    fn default() -> Self {
        let mut pip_value_by_symbol_type = HashMap::new();
        pip_value_by_symbol_type.insert("forex_standard".to_string(), 10.0);
        pip_value_by_symbol_type.insert("forex_jpy".to_string(), 9.0);

        let mut symbol_type_by_symbol = HashMap::new();
        for symbol in ["EURUSD", "GBPUSD", "AUDUSD", "USDCHF", "USDCAD"] {
            symbol_type_by_symbol.insert(symbol.to_string(), "forex_standard".to_string());
        }
        for symbol in ["USDJPY", "EURJPY", "GBPJPY"] {
            symbol_type_by_symbol.insert(symbol.to_string(), "forex_jpy".to_string());
        }

        let mut correlation_groups = HashMap::new();
        correlation_groups.insert(
            "usd_majors".to_string(),
            vec![
                "EURUSD".to_string(),
                "GBPUSD".to_string(),
                "AUDUSD".to_string(),
            ],
        );
        correlation_groups.insert(
            "jpy_crosses".to_string(),
            vec![
                "USDJPY".to_string(),
                "EURJPY".to_string(),
                "GBPJPY".to_string(),
            ],
        );

        Self {
            risk_per_trade: 0.01,
            max_daily_loss: 0.05,
            max_positions: 5,
            max_correlated: 2,
            pip_value_by_symbol_type,
            symbol_type_by_symbol,
            correlation_groups,
        }
    }
}

impl RiskSettings {
    pub fn validate(&self) -> Result<()> {
        if self.risk_per_trade <= 0.0 || self.risk_per_trade >= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "risk_per_trade must be in (0, 1), got {}",
                self.risk_per_trade
            )));
        }
        if self.max_daily_loss <= 0.0 || self.max_daily_loss >= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "max_daily_loss must be in (0, 1), got {}",
                self.max_daily_loss
            )));
        }
        if self.max_positions == 0 {
            return Err(Error::InvalidConfig(
                "max_positions must be positive".to_string(),
            ));
        }
        if self.max_correlated == 0 {
            return Err(Error::InvalidConfig(
                "max_correlated must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional intraday trading-hours gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub enabled: bool,
    /// First hour (UTC, inclusive) of the trading window.
    pub start_hour: u32,
    /// End hour (UTC, exclusive) of the trading window.
    pub end_hour: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 8,
            end_hour: 16,
        }
    }
}

impl SessionSettings {
    pub fn validate(&self) -> Result<()> {
        if self.start_hour >= 24 || self.end_hour > 24 {
            return Err(Error::InvalidConfig(format!(
                "session hours must be within a day, got {}..{}",
                self.start_hour, self.end_hour
            )));
        }
        if self.enabled && self.start_hour >= self.end_hour {
            return Err(Error::InvalidConfig(format!(
                "session_start ({}) must precede session_end ({})",
                self.start_hour, self.end_hour
            )));
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    /// Polling interval between evaluation cycles, in seconds.
    pub interval_secs: u64,
    pub strategy: StrategySettings,
    pub risk: RiskSettings,
    pub session: SessionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["EURUSD".to_string(), "USDJPY".to_string()],
            timeframe: Timeframe::H4,
            interval_secs: 300,
            strategy: StrategySettings::default(),
            risk: RiskSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file plus `FXBOT_`-prefixed
    /// environment overrides (e.g. `FXBOT_RISK__RISK_PER_TRADE=0.02`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("FXBOT")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one symbol is required".to_string(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "interval_secs must be positive".to_string(),
            ));
        }
        self.strategy.validate()?;
        self.risk.validate()?;
        self.session.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy.entry_period, 20);
        assert_eq!(config.risk.max_correlated, 2);
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut settings = StrategySettings::default();
        settings.atr_period = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("atr_period"));
    }

    #[test]
    fn test_fast_ema_must_be_shorter() {
        let mut settings = StrategySettings::default();
        settings.fast_ema = 21;
        settings.slow_ema = 9;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_risk_fraction_bounds() {
        let mut risk = RiskSettings::default();
        risk.risk_per_trade = 0.0;
        assert!(risk.validate().is_err());
        risk.risk_per_trade = 1.5;
        assert!(risk.validate().is_err());
        risk.risk_per_trade = 0.02;
        assert!(risk.validate().is_ok());
    }

    #[test]
    fn test_inverted_session_rejected() {
        let session = SessionSettings {
            enabled: true,
            start_hour: 16,
            end_hour: 8,
        };
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_default_symbol_types_cover_jpy() {
        let risk = RiskSettings::default();
        assert_eq!(
            risk.symbol_type_by_symbol.get("USDJPY").map(String::as_str),
            Some("forex_jpy")
        );
    }
}
