// In crates/strategies/src/lib.rs

use core_types::{Bar, Signal, Symbol};

pub mod error;
pub mod indicators;
pub mod ma_crossover;
pub mod types;

pub use error::{Error, Result};
pub use ma_crossover::MACrossover;
pub use types::MACrossoverSettings;

/// The universal interface for a trading strategy.
///
/// A strategy analyzes a chronological slice of bars and produces a trading
/// `Signal`. Strategies are pure: the same bars always yield the same signal,
/// and assessing never performs I/O.
pub trait Strategy: Send + Sync {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// Assesses the bar history for `symbol`.
    ///
    /// Returns `None` when there is not enough history to compute the
    /// strategy's indicators. This is an expected condition, not an error.
    fn assess(&self, symbol: &Symbol, bars: &[Bar]) -> Option<Signal>;
}
