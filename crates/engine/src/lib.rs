// In crates/engine/src/lib.rs

pub mod cycle;
pub mod schedule;

pub use cycle::{CycleOutcome, TradingCycle};
pub use schedule::DailySchedule;

use anyhow::Result;
use chrono::Local;

/// The id of an order the broker accepted before a cycle failed, if any.
///
/// Every other cycle error happens before an order leaves the process.
pub fn unrecorded_order(err: &anyhow::Error) -> Option<&str> {
    match err.downcast_ref::<execution::Error>() {
        Some(execution::Error::UnrecordedTrade { order_id, .. }) => Some(order_id.as_str()),
        _ => None,
    }
}

/// Drives a `TradingCycle` on a daily schedule.
pub struct Engine {
    cycle: TradingCycle,
    schedule: DailySchedule,
}

impl Engine {
    pub fn new(cycle: TradingCycle, schedule: DailySchedule) -> Self {
        Self { cycle, schedule }
    }

    /// Runs a single cycle and reports its outcome.
    pub async fn run_once(&mut self) -> Result<CycleOutcome> {
        let outcome = self.cycle.run().await?;
        tracing::info!(symbol = %self.cycle.symbol(), %outcome, "Cycle complete.");
        Ok(outcome)
    }

    /// Runs a cycle now, then once a day at the scheduled time until Ctrl-C.
    ///
    /// A failed cycle is logged and the loop carries on with the next day.
    pub async fn run_forever(&mut self) -> Result<()> {
        tracing::info!(at = %self.schedule.time(), "Starting daily trading loop.");
        loop {
            if let Err(e) = self.run_once().await {
                match unrecorded_order(&e) {
                    Some(order_id) => tracing::error!(
                        order_id,
                        error = ?e,
                        "Cycle failed after the broker accepted an order. The trade is missing from the risk state."
                    ),
                    None => tracing::error!(error = ?e, "Cycle aborted. No order was placed."),
                }
            }

            let now = Local::now();
            let next = self.schedule.next_after(&now);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!(next_run = %next, "Waiting for the next scheduled cycle.");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown requested. Stopping trading loop.");
                    return Ok(());
                }
            }
        }
    }
}
