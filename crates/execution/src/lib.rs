// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::{OrderConfirmation, OrderIntent, PositionSnapshot};
use rust_decimal::Decimal;

pub mod controller;
pub mod error;
pub mod live;
pub mod simulated;
pub mod types;

// Re-export public types
pub use controller::PositionController;
pub use error::{Error, Result};
pub use live::LiveBroker;
pub use simulated::SimulatedBroker;
pub use types::{ExecutionOutcome, PositionState};

/// The universal interface for a broker.
///
/// A `Broker` is the authoritative source of account equity and open
/// positions, and the only way orders leave the process. Every call may block
/// on the network; implementations own their own retry and timeout policy.
#[async_trait]
pub trait Broker: Send + Sync {
    /// The name of the broker (e.g., "AlpacaBroker", "SimulatedBroker").
    fn name(&self) -> &'static str;

    /// Current total account equity.
    async fn equity(&self) -> Result<Decimal>;

    /// All open positions as reported by the broker right now.
    async fn positions(&self) -> Result<Vec<PositionSnapshot>>;

    /// Submits a market order and waits for the broker to acknowledge it.
    ///
    /// # Returns
    ///
    /// The broker's confirmation on success, or an `Error` if the order was
    /// not accepted.
    async fn submit_order(&self, order: &OrderIntent) -> Result<OrderConfirmation>;

    /// Cancels a previously submitted order.
    async fn cancel_order(&self, order_id: &str) -> Result<()>;
}
