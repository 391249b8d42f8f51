// In crates/execution/src/controller.rs

use crate::types::{ExecutionOutcome, PositionState};
use crate::{Broker, Error, Result};
use core_types::{Direction, OrderIntent, Side, Signal, Symbol};
use num_traits::ToPrimitive;
use risk::RiskManager;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Turns an approved signal into at most one order.
///
/// The controller keeps no position of its own. Every call re-reads the
/// broker's positions and derives FLAT/LONG/SHORT from them, so a repeated
/// call after a confirmed order sees the new position and does nothing.
pub struct PositionController {
    broker: Arc<dyn Broker>,
}

/// The decision for one signal against one position.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Submit(OrderIntent),
    Skip(ExecutionOutcome),
}

impl PositionController {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// The broker's current position in `symbol`.
    pub async fn position(&self, symbol: &Symbol) -> Result<PositionState> {
        let positions = self.broker.positions().await?;
        let quantity = positions
            .iter()
            .filter(|p| &p.symbol == symbol)
            .map(|p| p.quantity)
            .sum();
        Ok(PositionState::from_quantity(quantity))
    }

    /// Applies an approved signal.
    ///
    /// A failed position query is an `Err` and no order is attempted. A
    /// rejected order is reported as `ExecutionOutcome::SubmissionFailed`
    /// without touching the risk budget. A confirmed order is recorded with
    /// `risk.record_trade()` exactly once.
    pub async fn apply(
        &self,
        signal: &Signal,
        max_position_value: Decimal,
        current_price: Decimal,
        risk: &mut dyn RiskManager,
    ) -> Result<ExecutionOutcome> {
        let position = self.position(&signal.symbol).await?;
        tracing::info!(symbol = %signal.symbol, %position, direction = %signal.direction, "Current position.");

        let intent = match plan(&signal.symbol, position, signal.direction, max_position_value, current_price) {
            Plan::Skip(outcome) => {
                log_skip(&outcome);
                return Ok(outcome);
            }
            Plan::Submit(intent) => intent,
        };

        let confirmation = match self.broker.submit_order(&intent).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                tracing::error!(broker = self.broker.name(), ?intent, error = %e, "Order submission failed. No trade recorded.");
                return Ok(ExecutionOutcome::SubmissionFailed {
                    intent,
                    reason: e.to_string(),
                });
            }
        };
        tracing::info!(
            order_id = %confirmation.id,
            side = %confirmation.side,
            quantity = confirmation.quantity,
            symbol = %confirmation.symbol,
            price = %current_price,
            "Order confirmed by broker."
        );

        // The order exists at the broker now. If this write fails the trade
        // goes uncounted, which is surfaced as an error.
        if let Err(e) = risk.record_trade() {
            tracing::error!(order_id = %confirmation.id, error = %e, "Order was placed but could not be recorded in the risk state.");
            return Err(Error::UnrecordedTrade {
                order_id: confirmation.id,
                source: e,
            });
        }

        Ok(ExecutionOutcome::Submitted { confirmation })
    }
}

/// Whole shares affordable with `max_position_value` at `current_price`.
pub fn opening_quantity(max_position_value: Decimal, current_price: Decimal) -> u64 {
    if current_price <= Decimal::ZERO || max_position_value <= Decimal::ZERO {
        return 0;
    }
    (max_position_value / current_price)
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// The transition table.
///
/// | position | signal | result            |
/// |----------|--------|-------------------|
/// | FLAT     | BUY    | buy `qty`         |
/// | LONG     | BUY    | none              |
/// | LONG     | SELL   | sell the position |
/// | FLAT     | SELL   | none              |
/// | SHORT    | any    | none              |
pub fn plan(
    symbol: &Symbol,
    position: PositionState,
    direction: Direction,
    max_position_value: Decimal,
    current_price: Decimal,
) -> Plan {
    match (position, direction) {
        (_, Direction::Hold) => Plan::Skip(ExecutionOutcome::NoAction),
        (PositionState::Short(quantity), _) => {
            Plan::Skip(ExecutionOutcome::ShortPositionUnsupported { quantity })
        }
        (PositionState::Long(quantity), Direction::Buy) => {
            Plan::Skip(ExecutionOutcome::AlreadyLong { quantity })
        }
        (PositionState::Flat, Direction::Sell) => Plan::Skip(ExecutionOutcome::NothingToClose),
        (PositionState::Flat, Direction::Buy) => {
            match opening_quantity(max_position_value, current_price) {
                0 => Plan::Skip(ExecutionOutcome::InsufficientAllocation {
                    max_position_value,
                    current_price,
                }),
                quantity => Plan::Submit(OrderIntent {
                    symbol: symbol.clone(),
                    quantity,
                    side: Side::Buy,
                }),
            }
        }
        (PositionState::Long(quantity), Direction::Sell) => {
            // Only whole shares are ever opened; a fractional remainder is left alone.
            match quantity.trunc().to_u64().unwrap_or(0) {
                0 => Plan::Skip(ExecutionOutcome::NothingToClose),
                quantity => Plan::Submit(OrderIntent {
                    symbol: symbol.clone(),
                    quantity,
                    side: Side::Sell,
                }),
            }
        }
    }
}

fn log_skip(outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::InsufficientAllocation { .. }
        | ExecutionOutcome::ShortPositionUnsupported { .. } => {
            tracing::warn!(%outcome, "No order placed.");
        }
        _ => tracing::info!(%outcome, "No order placed."),
    }
}
