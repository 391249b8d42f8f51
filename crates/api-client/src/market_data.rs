// In crates/api-client/src/market_data.rs

use crate::{ApiClient, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use core_types::{Bar, Symbol, Timeframe};

/// A source of historical OHLCV bars.
///
/// Implementations return at most `limit` bars in chronological order. An
/// empty vector means "no data" and is not an error.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// The name of the data source (e.g., "alpaca", "yahoo").
    fn name(&self) -> &'static str;

    async fn get_bars(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize)
    -> Result<Vec<Bar>>;
}

#[async_trait]
impl MarketDataSource for ApiClient {
    fn name(&self) -> &'static str {
        "alpaca"
    }

    async fn get_bars(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        self.get_historical_bars(symbol, timeframe, limit).await
    }
}

/// Tries a primary source and falls back to a secondary one when the primary
/// fails or comes back empty.
pub struct FallbackMarketData {
    primary: Box<dyn MarketDataSource>,
    fallback: Option<Box<dyn MarketDataSource>>,
}

impl FallbackMarketData {
    pub fn new(
        primary: Box<dyn MarketDataSource>,
        fallback: Option<Box<dyn MarketDataSource>>,
    ) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl MarketDataSource for FallbackMarketData {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn get_bars(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        let primary_error = match self.primary.get_bars(symbol, timeframe, limit).await {
            Ok(bars) if !bars.is_empty() => return Ok(bars),
            Ok(_) => {
                tracing::warn!(source = self.primary.name(), symbol = %symbol, "Primary data source returned no bars.");
                None
            }
            Err(e) => {
                tracing::warn!(source = self.primary.name(), symbol = %symbol, error = %e, "Primary data source failed.");
                Some(e)
            }
        };

        let Some(fallback) = &self.fallback else {
            return match primary_error {
                Some(e) => Err(e),
                None => Ok(Vec::new()),
            };
        };

        tracing::info!(source = fallback.name(), symbol = %symbol, "Using fallback data source.");
        let bars = fallback.get_bars(symbol, timeframe, limit).await?;
        if bars.is_empty() {
            tracing::error!(source = fallback.name(), symbol = %symbol, "No data found via the fallback source either.");
        }
        Ok(bars)
    }
}

/// Start of a request window wide enough to hold `limit` trading periods,
/// allowing for weekends, holidays and closed sessions.
pub fn lookback_start(timeframe: Timeframe, limit: usize, now: DateTime<Utc>) -> DateTime<Utc> {
    let periods = i32::try_from(limit).unwrap_or(i32::MAX).saturating_mul(3);
    let span = timeframe
        .duration()
        .checked_mul(periods)
        .unwrap_or_else(|| Duration::days(3650));
    now - span - Duration::days(7)
}

/// Sorts bars chronologically, drops duplicate timestamps and keeps the most
/// recent `limit`.
pub fn normalize(mut bars: Vec<Bar>, limit: usize) -> Vec<Bar> {
    bars.sort_by_key(|bar| bar.timestamp);
    bars.dedup_by_key(|bar| bar.timestamp);
    if bars.len() > limit {
        bars.drain(..bars.len() - limit);
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn bar(day: u32) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: dec!(1),
            high: dec!(1),
            low: dec!(1),
            close: dec!(1),
            volume: dec!(1),
        }
    }

    enum Reply {
        Bars(Vec<Bar>),
        Fail,
    }

    struct StubSource {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn get_bars(&self, _: &Symbol, _: Timeframe, _: usize) -> Result<Vec<Bar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Bars(bars) => Ok(bars.clone()),
                Reply::Fail => Err(Error::UnexpectedResponse("boom".to_string())),
            }
        }
    }

    fn stub(reply: Reply) -> (Box<dyn MarketDataSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = StubSource {
            reply,
            calls: calls.clone(),
        };
        (Box::new(source), calls)
    }

    #[tokio::test]
    async fn primary_bars_skip_the_fallback() {
        let (primary, _) = stub(Reply::Bars(vec![bar(2)]));
        let (fallback, fallback_calls) = stub(Reply::Bars(vec![bar(3)]));
        let source = FallbackMarketData::new(primary, Some(fallback));

        let bars = source.get_bars(&Symbol::from("SPY"), Timeframe::Day, 10).await.unwrap();

        assert_eq!(bars, vec![bar(2)]);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_or_empty_primary_uses_the_fallback() {
        for reply in [Reply::Fail, Reply::Bars(Vec::new())] {
            let (primary, _) = stub(reply);
            let (fallback, fallback_calls) = stub(Reply::Bars(vec![bar(3)]));
            let source = FallbackMarketData::new(primary, Some(fallback));

            let bars = source.get_bars(&Symbol::from("SPY"), Timeframe::Day, 10).await.unwrap();

            assert_eq!(bars, vec![bar(3)]);
            assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn primary_error_without_fallback_is_returned() {
        let (primary, _) = stub(Reply::Fail);
        let source = FallbackMarketData::new(primary, None);

        let result = source.get_bars(&Symbol::from("SPY"), Timeframe::Day, 10).await;
        assert!(result.is_err());
    }

    #[test]
    fn normalize_sorts_dedups_and_truncates() {
        let bars = normalize(vec![bar(4), bar(2), bar(3), bar(3), bar(5)], 3);
        let days: Vec<_> = bars.iter().map(|b| b.timestamp).collect();
        assert_eq!(days, vec![bar(3).timestamp, bar(4).timestamp, bar(5).timestamp]);
    }

    #[test]
    fn lookback_covers_three_periods_per_bar_plus_a_week() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            lookback_start(Timeframe::Day, 100, now),
            now - Duration::days(307)
        );
    }
}
