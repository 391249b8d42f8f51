// In crates/api-client/src/lib.rs

use app_config::types::AlpacaSettings;
use chrono::Utc;
use core_types::{Bar, OrderConfirmation, Side, Symbol, Timeframe};
use serde::de::DeserializeOwned;

pub mod error;
pub mod market_data;
pub mod types;
pub mod yahoo;

// Re-export public types
pub use error::{Error, Result};
pub use market_data::{FallbackMarketData, MarketDataSource};
pub use types::*;
pub use yahoo::YahooClient;

const API_KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";

impl ApiClient {
    /// Constructs a new ApiClient from AlpacaSettings.
    pub fn new(settings: &AlpacaSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            api_key: settings.api_key.clone(),
            secret_key: settings.secret_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            data_url: settings.data_url.trim_end_matches('/').to_string(),
            feed: settings.feed.clone(),
        })
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(SECRET_KEY_HEADER, &self.secret_key)
    }

    /// Fetches the trading account.
    ///
    /// This corresponds to the `GET /v2/account` endpoint.
    pub async fn get_account(&self) -> Result<AccountInfo> {
        let url = format!("{}/v2/account", self.base_url);
        let response = self.authed(self.http_client.get(&url)).send().await?;
        decode(response).await
    }

    /// Lists all open positions.
    ///
    /// This corresponds to the `GET /v2/positions` endpoint.
    pub async fn list_positions(&self) -> Result<Vec<PositionInfo>> {
        let url = format!("{}/v2/positions", self.base_url);
        let response = self.authed(self.http_client.get(&url)).send().await?;
        let positions: Vec<PositionInfo> = decode(response).await?;
        tracing::debug!(count = positions.len(), "Fetched open positions.");
        Ok(positions)
    }

    /// Places a new day market order.
    ///
    /// This corresponds to `POST /v2/orders`.
    pub async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: Side,
        quantity: u64,
    ) -> Result<OrderConfirmation> {
        let url = format!("{}/v2/orders", self.base_url);
        let body = NewOrderRequest {
            symbol: &symbol.0,
            qty: quantity.to_string(),
            side: side.as_str(),
            r#type: "market",
            time_in_force: "day",
        };

        let response = self
            .authed(self.http_client.post(&url))
            .json(&body)
            .send()
            .await?;
        let order: NewOrderResponse = decode(response).await?;
        tracing::info!(order_id = %order.id, status = %order.status, %side, quantity, symbol = %symbol, "Order submitted.");

        order.into_confirmation(quantity)
    }

    /// Cancels an open order.
    ///
    /// This corresponds to `DELETE /v2/orders/{order_id}`.
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let url = format!("{}/v2/orders/{}", self.base_url, order_id);
        let response = self.authed(self.http_client.delete(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(api_error(status, text));
        }
        tracing::info!(order_id, "Order cancelled.");
        Ok(())
    }

    /// Fetches the most recent `limit` bars for `symbol`, oldest first.
    ///
    /// This corresponds to `GET /v2/stocks/{symbol}/bars` on the data API.
    /// Bars are requested newest-first inside a lookback window wide enough
    /// to contain `limit` trading periods, then reversed.
    pub async fn get_historical_bars(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        let start = market_data::lookback_start(timeframe, limit, Utc::now());
        let url = format!("{}/v2/stocks/{}/bars", self.data_url, symbol.0);
        let query = [
            ("timeframe", timeframe.to_string()),
            ("limit", limit.to_string()),
            ("start", start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            ("sort", "desc".to_string()),
            ("adjustment", "raw".to_string()),
            ("feed", self.feed.clone()),
        ];

        let response = self
            .authed(self.http_client.get(&url))
            .query(&query)
            .send()
            .await?;
        let body: BarsResponse = decode(response).await?;

        let bars: Vec<Bar> = body
            .bars
            .unwrap_or_default()
            .into_iter()
            .map(Bar::from)
            .collect();
        if bars.is_empty() {
            tracing::warn!(symbol = %symbol, "No bars returned by Alpaca.");
        }
        Ok(market_data::normalize(bars, limit))
    }
}

/// Decodes a JSON response, mapping non-2xx statuses to `Error::ApiError`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status, text));
    }
    serde_json::from_str(&text).map_err(Error::DeserializationFailed)
}

fn api_error(status: reqwest::StatusCode, text: String) -> Error {
    let msg = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| match body.code {
            Some(code) => format!("{} (code {})", body.message, code),
            None => body.message,
        })
        .unwrap_or(text);
    Error::ApiError {
        status: status.as_u16(),
        msg,
    }
}

// Free function to allow api_client::new usage
pub fn new(settings: &AlpacaSettings) -> Result<ApiClient> {
    ApiClient::new(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_account_decimal_strings() {
        let json = r#"{
            "id": "904837e3", "status": "ACTIVE", "currency": "USD",
            "equity": "10234.56", "cash": "5000", "buying_power": "20000",
            "pattern_day_trader": false
        }"#;
        let account: AccountInfo = serde_json::from_str(json).unwrap();
        assert_eq!(account.equity, dec!(10234.56));
        assert_eq!(account.status, "ACTIVE");
    }

    #[test]
    fn short_positions_are_signed() {
        let json = r#"[
            {"symbol": "SPY", "qty": "5", "side": "long", "avg_entry_price": "98.0"},
            {"symbol": "QQQ", "qty": "3", "side": "short", "avg_entry_price": "400.0"}
        ]"#;
        let positions: Vec<PositionInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(positions[0].signed_qty(), dec!(5));
        assert_eq!(positions[1].signed_qty(), dec!(-3));
    }

    #[test]
    fn order_response_becomes_confirmation() {
        let json = r#"{
            "id": "61e69015", "client_order_id": "eb9e2aaa", "status": "accepted",
            "symbol": "SPY", "qty": "5", "side": "buy", "type": "market"
        }"#;
        let order: NewOrderResponse = serde_json::from_str(json).unwrap();
        let confirmation = order.into_confirmation(5).unwrap();

        assert_eq!(confirmation.id, "61e69015");
        assert_eq!(confirmation.quantity, 5);
        assert_eq!(confirmation.side, Side::Buy);
    }

    #[test]
    fn bars_payload_converts_to_domain_bars() {
        let json = r#"{
            "bars": [
                {"t": "2024-01-03T05:00:00Z", "o": 470.4, "h": 471.2, "l": 468.2, "c": 468.8, "v": 103585800, "n": 1, "vw": 469.5},
                {"t": "2024-01-02T05:00:00Z", "o": 472.2, "h": 473.7, "l": 470.5, "c": 472.6, "v": 123623700, "n": 1, "vw": 472.1}
            ],
            "symbol": "SPY",
            "next_page_token": null
        }"#;
        let body: BarsResponse = serde_json::from_str(json).unwrap();
        let bars: Vec<Bar> = body.bars.unwrap().into_iter().map(Bar::from).collect();
        let bars = market_data::normalize(bars, 10);

        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[1].close, dec!(468.8));
    }

    #[test]
    fn empty_window_has_null_bars() {
        let body: BarsResponse =
            serde_json::from_str(r#"{"bars": null, "symbol": "SPY", "next_page_token": null}"#)
                .unwrap();
        assert!(body.bars.is_none());
    }

    #[test]
    fn error_body_is_surfaced() {
        let err = api_error(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"code": 40310000, "message": "insufficient buying power"}"#.to_string(),
        );
        match err {
            Error::ApiError { status, msg } => {
                assert_eq!(status, 403);
                assert!(msg.contains("insufficient buying power"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
