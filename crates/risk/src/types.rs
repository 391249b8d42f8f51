// In crates/risk/src/types.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RiskSettings {
    /// Maximum number of submitted orders per calendar day.
    pub max_trades_per_day: u32,

    /// Maximum drawdown versus the day's starting balance before trading halts
    /// (e.g., 0.03 for 3%).
    pub daily_stop_loss_percent: f64,

    /// Fraction of current equity allocated to a single position
    /// (e.g., 0.05 for 5%).
    pub max_capital_per_trade_percent: f64,

    /// Where the daily risk state is persisted.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("risk_state.json")
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_trades_per_day: 2,
            daily_stop_loss_percent: 0.03,
            max_capital_per_trade_percent: 0.05,
            state_file: default_state_file(),
        }
    }
}

/// The outcome of a risk evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The signal may be acted on, with at most `max_position_value` of
    /// capital committed to a new position.
    Allowed { max_position_value: Decimal },
    /// The signal must not be acted on this cycle.
    Denied(DenialReason),
}

/// Why a signal was denied. Denials are governance outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DenialReason {
    NoActionableSignal,
    DailyTradeLimitReached { trades_count: u32, max_trades: u32 },
    DailyLossLimitExceeded { loss_percent: Decimal, limit: Decimal },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::NoActionableSignal => f.write_str("no actionable signal"),
            DenialReason::DailyTradeLimitReached {
                trades_count,
                max_trades,
            } => write!(f, "daily trade limit reached ({trades_count}/{max_trades})"),
            DenialReason::DailyLossLimitExceeded {
                loss_percent,
                limit,
            } => write!(
                f,
                "daily loss limit exceeded ({:.2}% > {:.2}%)",
                loss_percent * Decimal::ONE_HUNDRED,
                limit * Decimal::ONE_HUNDRED
            ),
        }
    }
}
