// Signal engines: per-symbol state machines turning indicator snapshots
// into entry/exit decisions.

pub mod breakout;
pub mod crossover;
pub mod session;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::StrategySettings;
use crate::error::{Error, Result};
use crate::indicators::IndicatorSnapshot;
use crate::models::{Bar, Direction, Signal};

pub use breakout::BreakoutEngine;
pub use crossover::CrossoverEngine;
pub use session::SessionFilter;

/// Common interface for all signal engines.
///
/// `compute_snapshot` and `evaluate` are pure: evaluating the same
/// (snapshot, direction) pair twice yields identical signals.
pub trait SignalEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Minimum bars needed before a snapshot can be computed.
    fn min_bars_required(&self) -> usize;

    /// Derive indicator values from a chronological bar window. Returns
    /// None when history is insufficient; callers must treat that as "no
    /// decision possible", never as zero-valued indicators.
    fn compute_snapshot(&self, bars: &[Bar]) -> Option<IndicatorSnapshot>;

    /// Produce a signal for the symbol given its current position state.
    fn evaluate(&self, symbol: &str, snapshot: &IndicatorSnapshot, direction: Direction)
        -> Signal;
}

/// Which rule variant to run. Selected through the factory below, never
/// through string-keyed reflective lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Breakout,
    Crossover,
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "breakout" => Ok(StrategyKind::Breakout),
            "crossover" => Ok(StrategyKind::Crossover),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

/// Construct the engine for a strategy kind, validating parameters first so
/// a bad configuration fails here rather than mid-evaluation.
pub fn build_engine(
    kind: StrategyKind,
    settings: &StrategySettings,
) -> Result<Box<dyn SignalEngine>> {
    settings.validate()?;
    Ok(match kind {
        StrategyKind::Breakout => Box::new(BreakoutEngine::new(settings.clone())),
        StrategyKind::Crossover => Box::new(CrossoverEngine::new(settings.clone())),
    })
}
