// In crates/strategies/src/ma_crossover.rs

use crate::indicators::sma;
use crate::types::MACrossoverSettings;
use crate::{Error, Result, Strategy};
use core_types::{Bar, Direction, Signal, Symbol};
use rust_decimal::Decimal;

/// Simple moving average crossover on closing prices.
///
/// Emits BUY when the short SMA crosses above the long SMA between the last
/// two bars, SELL on the opposite cross, and HOLD otherwise.
#[derive(Debug, Clone)]
pub struct MACrossover {
    settings: MACrossoverSettings,
}

impl MACrossover {
    /// Creates a new `MACrossover` strategy instance from its settings.
    pub fn new(settings: MACrossoverSettings) -> Result<Self> {
        if settings.short_window == 0 {
            return Err(Error::InvalidParameters(
                "short_window must be at least 1".to_string(),
            ));
        }
        if settings.short_window >= settings.long_window {
            return Err(Error::InvalidParameters(format!(
                "short_window ({}) must be smaller than long_window ({})",
                settings.short_window, settings.long_window
            )));
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &MACrossoverSettings {
        &self.settings
    }

    /// The minimum number of bars `assess` needs to return a signal.
    pub fn required_history(&self) -> usize {
        self.settings.long_window as usize
    }
}

/// Classifies the short/long relationship at the previous and current bar.
fn crossover(prev_short: Decimal, prev_long: Decimal, short: Decimal, long: Decimal) -> Direction {
    if prev_short <= prev_long && short > long {
        Direction::Buy
    } else if prev_short >= prev_long && short < long {
        Direction::Sell
    } else {
        Direction::Hold
    }
}

impl Strategy for MACrossover {
    fn name(&self) -> &'static str {
        "MACrossover"
    }

    fn assess(&self, symbol: &Symbol, bars: &[Bar]) -> Option<Signal> {
        if bars.len() < self.required_history() {
            tracing::debug!(
                bars = bars.len(),
                required = self.required_history(),
                "Not enough data to calculate SMAs."
            );
            return None;
        }

        let closes: Vec<Decimal> = bars.iter().map(|bar| bar.close).collect();
        let short_sma = sma(&closes, self.settings.short_window as usize);
        let long_sma = sma(&closes, self.settings.long_window as usize);

        // long_window > short_window >= 1, so there are at least two bars here.
        let last = bars.len() - 1;
        let prev = last - 1;

        // When the history is exactly `long_window` bars the previous long SMA
        // is undefined, so no cross can be observed.
        let direction = match (short_sma[prev], long_sma[prev], short_sma[last], long_sma[last]) {
            (Some(prev_short), Some(prev_long), Some(short), Some(long)) => {
                crossover(prev_short, prev_long, short, long)
            }
            _ => Direction::Hold,
        };

        Some(Signal::new(symbol.clone(), direction, bars[last].timestamp))
    }
}
