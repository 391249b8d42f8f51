// In crates/risk/src/lib.rs

use core_types::Signal;
use rust_decimal::Decimal;

pub mod clock;
pub mod error;
pub mod governor;
pub mod state;
pub mod types;

// Re-export public types
pub use clock::{Clock, LocalClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::FixedClock;
pub use error::{Error, Result};
pub use governor::DailyRiskGovernor;
pub use state::{RiskState, StateStore};
pub use types::{DenialReason, RiskSettings, Verdict};

/// The universal interface for a risk management module.
///
/// A `RiskManager` gates every actionable signal against the account's risk
/// budget and decides how much capital a new position may use. It also owns
/// the bookkeeping of how many trades have been made.
pub trait RiskManager: Send {
    /// The name of the risk management strategy.
    fn name(&self) -> &'static str;

    /// Evaluates a signal against the current account equity.
    ///
    /// # Returns
    ///
    /// * `Ok(Verdict::Allowed { .. })`: the signal may be acted on.
    /// * `Ok(Verdict::Denied(..))`: a risk rule blocks the signal. Not an error.
    /// * `Err(_)`: the risk state could not be read or written; the cycle must stop.
    fn evaluate(&mut self, signal: &Signal, current_equity: Decimal) -> Result<Verdict>;

    /// Records one confirmed order against today's budget.
    ///
    /// Must be called exactly once per order the broker has accepted, and
    /// never before the broker confirmed it.
    fn record_trade(&mut self) -> Result<()>;
}
