// In crates/execution/src/types.rs

use core_types::{OrderConfirmation, OrderIntent};
use rust_decimal::Decimal;
use std::fmt;

/// The position for one symbol, classified by the sign of the broker's quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat,
    /// Holding `quantity` shares long.
    Long(Decimal),
    /// Holding `quantity` shares short (stored as a positive number).
    Short(Decimal),
}

impl PositionState {
    pub fn from_quantity(quantity: Decimal) -> Self {
        if quantity > Decimal::ZERO {
            PositionState::Long(quantity)
        } else if quantity < Decimal::ZERO {
            PositionState::Short(quantity.abs())
        } else {
            PositionState::Flat
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => f.write_str("FLAT"),
            PositionState::Long(qty) => write!(f, "LONG {qty}"),
            PositionState::Short(qty) => write!(f, "SHORT {qty}"),
        }
    }
}

/// What the position controller did with a signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// An order was accepted by the broker and counted against the risk budget.
    Submitted { confirmation: OrderConfirmation },
    /// A BUY arrived while already long.
    AlreadyLong { quantity: Decimal },
    /// A SELL arrived with no long position to close.
    NothingToClose,
    /// The budget does not cover a single share.
    InsufficientAllocation {
        max_position_value: Decimal,
        current_price: Decimal,
    },
    /// The broker reports a short position, which this controller never manages.
    ShortPositionUnsupported { quantity: Decimal },
    /// The signal was HOLD.
    NoAction,
    /// The broker refused or failed to acknowledge the order. Nothing was recorded.
    SubmissionFailed { intent: OrderIntent, reason: String },
}

impl ExecutionOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ExecutionOutcome::Submitted { .. })
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOutcome::Submitted { confirmation } => write!(
                f,
                "executed {} {} {} (order {}, {})",
                confirmation.side,
                confirmation.quantity,
                confirmation.symbol,
                confirmation.id,
                confirmation.status
            ),
            ExecutionOutcome::AlreadyLong { quantity } => {
                write!(f, "no trade: already long {quantity} shares")
            }
            ExecutionOutcome::NothingToClose => f.write_str("no trade: no long position to sell"),
            ExecutionOutcome::InsufficientAllocation {
                max_position_value,
                current_price,
            } => write!(
                f,
                "skipped: budget {max_position_value:.2} buys zero shares at {current_price:.2}"
            ),
            ExecutionOutcome::ShortPositionUnsupported { quantity } => {
                write!(f, "no trade: short position of {quantity} shares is not managed")
            }
            ExecutionOutcome::NoAction => f.write_str("no trade: hold"),
            ExecutionOutcome::SubmissionFailed { intent, reason } => write!(
                f,
                "order {} {} {} failed: {reason}",
                intent.side, intent.quantity, intent.symbol
            ),
        }
    }
}
