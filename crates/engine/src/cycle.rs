// In crates/engine/src/cycle.rs

use anyhow::{Context, Result};
use api_client::MarketDataSource;
use app_config::types::TradingSettings;
use core_types::{Symbol, Timeframe};
use execution::{Broker, ExecutionOutcome, PositionController};
use risk::{DenialReason, RiskManager, Verdict};
use std::fmt;
use std::sync::Arc;
use strategies::Strategy;

/// How a completed cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The data source returned no bars at all.
    NoData,
    /// Too few bars for the strategy's indicators.
    InsufficientHistory { bars: usize },
    /// The risk governor blocked the signal.
    Denied(DenialReason),
    /// The signal reached the position controller.
    Position(ExecutionOutcome),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoData => f.write_str("no market data"),
            CycleOutcome::InsufficientHistory { bars } => {
                write!(f, "no signal: only {bars} bars of history")
            }
            CycleOutcome::Denied(reason) => write!(f, "denied: {reason}"),
            CycleOutcome::Position(outcome) => write!(f, "{outcome}"),
        }
    }
}

/// One pass of data -> signal -> risk -> position for a single symbol.
///
/// `run` takes `&mut self`, so a cycle can never overlap with itself.
pub struct TradingCycle {
    symbol: Symbol,
    timeframe: Timeframe,
    bar_limit: usize,
    strategy: Box<dyn Strategy>,
    risk_manager: Box<dyn RiskManager>,
    data: Arc<dyn MarketDataSource>,
    broker: Arc<dyn Broker>,
    controller: PositionController,
}

impl TradingCycle {
    pub fn new(
        trading: &TradingSettings,
        strategy: Box<dyn Strategy>,
        risk_manager: Box<dyn RiskManager>,
        data: Arc<dyn MarketDataSource>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        let controller = PositionController::new(broker.clone());
        Self {
            symbol: Symbol(trading.symbol.clone()),
            timeframe: trading.timeframe,
            bar_limit: trading.bar_limit,
            strategy,
            risk_manager,
            data,
            broker,
            controller,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Runs one cycle to completion.
    ///
    /// Any `Err` means the cycle stopped before an order could be placed,
    /// except when the broker confirmed an order whose trade could not then
    /// be recorded. That case is recognised by `crate::unrecorded_order`.
    pub async fn run(&mut self) -> Result<CycleOutcome> {
        tracing::info!(
            symbol = %self.symbol,
            timeframe = %self.timeframe,
            strategy = self.strategy.name(),
            risk = self.risk_manager.name(),
            broker = self.broker.name(),
            "Starting trading cycle."
        );

        let bars = self
            .data
            .get_bars(&self.symbol, self.timeframe, self.bar_limit)
            .await
            .with_context(|| format!("failed to fetch bars for {}", self.symbol))?;
        let Some(last_bar) = bars.last() else {
            tracing::warn!(symbol = %self.symbol, source = self.data.name(), "No bars available. Ending cycle.");
            return Ok(CycleOutcome::NoData);
        };
        tracing::debug!(count = bars.len(), last_close = %last_bar.close, "Fetched bars.");

        let Some(signal) = self.strategy.assess(&self.symbol, &bars) else {
            tracing::info!(symbol = %self.symbol, bars = bars.len(), "Not enough history for a signal. Ending cycle.");
            return Ok(CycleOutcome::InsufficientHistory { bars: bars.len() });
        };
        tracing::info!(symbol = %signal.symbol, direction = %signal.direction, confidence = signal.confidence, "Signal generated.");

        let equity = self
            .broker
            .equity()
            .await
            .context("failed to fetch account equity")?;

        let max_position_value = match self
            .risk_manager
            .evaluate(&signal, equity)
            .context("risk evaluation failed")?
        {
            Verdict::Allowed { max_position_value } => max_position_value,
            Verdict::Denied(reason) => {
                tracing::warn!(symbol = %self.symbol, %reason, "Signal denied by risk governor.");
                return Ok(CycleOutcome::Denied(reason));
            }
        };
        tracing::info!(%equity, %max_position_value, "Signal approved by risk governor.");

        let outcome = self
            .controller
            .apply(
                &signal,
                max_position_value,
                last_bar.close,
                self.risk_manager.as_mut(),
            )
            .await
            .context("position update failed")?;
        Ok(CycleOutcome::Position(outcome))
    }
}
