// In crates/api-client/src/types.rs

use chrono::{DateTime, Utc};
use core_types::{Bar, OrderConfirmation, Side, Symbol};
use num_traits::ToPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The main client for interacting with the Alpaca trading and market data APIs.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The Alpaca API key id.
    pub api_key: String,
    /// The Alpaca secret key.
    pub secret_key: String,
    /// The trading API base URL (paper or live).
    pub base_url: String,
    /// The market data API base URL.
    pub data_url: String,
    /// The market data feed to request bars from (e.g., "iex", "sip").
    pub feed: String,
}

/// The subset of the account object the bot relies on.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountInfo {
    pub id: String,
    /// Account status (e.g., "ACTIVE").
    pub status: String,
    pub currency: String,
    /// Total account equity, reported as a decimal string.
    pub equity: Decimal,
    pub cash: Decimal,
    pub buying_power: Decimal,
}

/// Represents a single open position as returned by the positions endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct PositionInfo {
    pub symbol: String,
    /// Signed quantity: negative for short positions.
    pub qty: Decimal,
    /// "long" or "short".
    pub side: String,
    pub avg_entry_price: Decimal,
    pub market_value: Option<Decimal>,
    pub unrealized_pl: Option<Decimal>,
}

impl PositionInfo {
    /// The quantity signed by side. Alpaca already signs `qty` for shorts,
    /// but older responses carry a positive quantity with `side = "short"`.
    pub fn signed_qty(&self) -> Decimal {
        if self.side.eq_ignore_ascii_case("short") && self.qty > Decimal::ZERO {
            -self.qty
        } else {
            self.qty
        }
    }
}

/// Body of `POST /v2/orders` for a plain market order.
#[derive(Debug, Serialize)]
pub struct NewOrderRequest<'a> {
    pub symbol: &'a str,
    /// Sent as a string, as the API expects.
    pub qty: String,
    pub side: &'a str,
    pub r#type: &'a str,
    pub time_in_force: &'a str,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewOrderResponse {
    pub id: String,
    pub client_order_id: Option<String>,
    pub status: String,
    pub symbol: String,
    pub qty: Option<Decimal>,
    pub side: String,
    pub r#type: Option<String>,
}

impl NewOrderResponse {
    /// Converts the broker response into the domain confirmation, falling
    /// back to the requested quantity when the response omits it.
    pub fn into_confirmation(self, requested_qty: u64) -> Result<OrderConfirmation> {
        let side: Side = self
            .side
            .parse()
            .map_err(|e: core_types::Error| Error::UnexpectedResponse(e.to_string()))?;
        let quantity = self
            .qty
            .and_then(|q| q.trunc().to_u64())
            .unwrap_or(requested_qty);

        Ok(OrderConfirmation {
            id: self.id,
            symbol: Symbol(self.symbol),
            quantity,
            side,
            status: self.status,
        })
    }
}

/// The error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<i64>,
    pub message: String,
}

/// Response of `GET /v2/stocks/{symbol}/bars`.
#[derive(Debug, Deserialize)]
pub struct BarsResponse {
    /// `null` when there is no data in the requested window.
    pub bars: Option<Vec<RawBar>>,
    pub symbol: Option<String>,
    pub next_page_token: Option<String>,
}

/// A single bar in Alpaca's compact notation.
#[derive(Debug, Deserialize, Clone)]
pub struct RawBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: Decimal,
    #[serde(rename = "h")]
    pub high: Decimal,
    #[serde(rename = "l")]
    pub low: Decimal,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "v")]
    pub volume: Decimal,
}

impl From<RawBar> for Bar {
    fn from(raw: RawBar) -> Self {
        Bar {
            timestamp: raw.timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        }
    }
}

/// Response of the Yahoo Finance `v8/finance/chart` endpoint.
#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

#[derive(Debug, Deserialize)]
pub struct YahooChart {
    pub result: Option<Vec<YahooChartResult>>,
    pub error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    /// Unix seconds, one per bar. Absent when the range holds no bars.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
pub struct YahooIndicators {
    pub quote: Vec<YahooQuote>,
}

/// Column-oriented OHLCV arrays. Individual entries are `null` for
/// periods without trades.
#[derive(Debug, Deserialize, Default)]
pub struct YahooQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}
