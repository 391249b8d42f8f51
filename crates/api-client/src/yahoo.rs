// In crates/api-client/src/yahoo.rs

use crate::market_data::{MarketDataSource, lookback_start, normalize};
use crate::types::{YahooChartResponse, YahooChartResult};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Bar, Symbol, Timeframe};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) trader/0.1";

/// A keyless client for the Yahoo Finance chart endpoint, used as the
/// fallback bar source.
#[derive(Debug, Clone)]
pub struct YahooClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn get_bars(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        let interval = timeframe.yahoo_interval().ok_or_else(|| {
            Error::UnexpectedResponse(format!("timeframe {timeframe} is not offered by Yahoo"))
        })?;
        let now = Utc::now();
        let start = lookback_start(timeframe, limit, now);

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol.0);
        let query = [
            ("interval", interval.to_string()),
            ("period1", start.timestamp().to_string()),
            ("period2", now.timestamp().to_string()),
        ];
        let response = self.http_client.get(&url).query(&query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Yahoo reports unknown symbols with a 404 and a chart.error body.
        let body: YahooChartResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(Error::ApiError {
                    status: status.as_u16(),
                    msg: text,
                });
            }
            Err(e) => return Err(Error::DeserializationFailed(e)),
        };

        if let Some(err) = body.chart.error {
            return Err(Error::ApiError {
                status: status.as_u16(),
                msg: format!("{}: {}", err.code, err.description),
            });
        }

        let bars = body
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(chart_to_bars)
            .unwrap_or_default();
        Ok(normalize(bars, limit))
    }
}

/// Zips Yahoo's column arrays into bars, skipping periods with any missing field.
fn chart_to_bars(result: YahooChartResult) -> Vec<Bar> {
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Vec::new();
    };
    let price = |column: &[Option<f64>], i: usize| {
        column
            .get(i)
            .copied()
            .flatten()
            .and_then(Decimal::from_f64)
            .map(|d| d.round_dp(4))
    };

    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            Some(Bar {
                timestamp: DateTime::<Utc>::from_timestamp(*ts, 0)?,
                open: price(&quote.open, i)?,
                high: price(&quote.high, i)?,
                low: price(&quote.low, i)?,
                close: price(&quote.close, i)?,
                volume: price(&quote.volume, i).unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn chart_rows_with_nulls_are_dropped() {
        let json = r#"{"chart": {"result": [{
            "meta": {"symbol": "SPY"},
            "timestamp": [1704205800, 1704292200, 1704378600],
            "indicators": {"quote": [{
                "open":   [472.16, null, 468.3],
                "high":   [473.67, null, 470.96],
                "low":    [470.49, null, 467.05],
                "close":  [472.65, null, 467.28],
                "volume": [123623700, null, 103585800]
            }]}
        }], "error": null}}"#;
        let body: YahooChartResponse = serde_json::from_str(json).unwrap();
        let result = body.chart.result.unwrap().into_iter().next().unwrap();

        let bars = chart_to_bars(result);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, dec!(472.65));
        assert_eq!(bars[1].open, dec!(468.3));
        assert_eq!(bars[1].timestamp.timestamp(), 1704378600);
    }

    #[test]
    fn chart_error_body_parses() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let body: YahooChartResponse = serde_json::from_str(json).unwrap();
        assert!(body.chart.result.is_none());
        assert_eq!(body.chart.error.unwrap().code, "Not Found");
    }
}
