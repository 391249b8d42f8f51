// In crates/app-config/src/types.rs

use core_types::Timeframe;
use risk::types::RiskSettings;
use serde::Deserialize;
use std::path::PathBuf;
use strategies::types::MACrossoverSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the Alpaca API.
    pub alpaca: AlpacaSettings,
    /// Settings for the bar sources.
    #[serde(default)]
    pub market_data: MarketDataSettings,
    /// The instrument and bar series being traded.
    #[serde(default)]
    pub trading: TradingSettings,
    /// Moving average windows.
    #[serde(default)]
    pub strategy: MACrossoverSettings,
    /// Daily risk budget.
    #[serde(default)]
    pub risk: RiskSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Optional file receiving a copy of the log output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Must be set to point `alpaca.base_url` at a live (non-paper) account.
    #[serde(default)]
    pub live_trading_enabled: bool,
    /// Local wall-clock time ("HH:MM") of the daily cycle in loop mode.
    #[serde(default = "default_schedule_time")]
    pub schedule_time: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AlpacaSettings {
    /// The API key id for Alpaca.
    pub api_key: String,
    /// The secret key for Alpaca.
    pub secret_key: String,
    /// The trading API base URL (paper or live).
    #[serde(default = "default_alpaca_base_url")]
    pub base_url: String,
    /// The market data API base URL.
    #[serde(default = "default_alpaca_data_url")]
    pub data_url: String,
    /// The bar feed ("iex" for free accounts, "sip" for paid).
    #[serde(default = "default_feed")]
    pub feed: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AlpacaSettings {
    /// True when orders go to Alpaca's paper trading environment.
    pub fn is_paper(&self) -> bool {
        self.base_url.contains("paper-api.")
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketDataSettings {
    /// Fall back to Yahoo Finance when Alpaca has no bars or fails.
    #[serde(default = "default_enabled")]
    pub fallback_enabled: bool,
    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            fallback_enabled: default_enabled(),
            yahoo_base_url: default_yahoo_base_url(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TradingSettings {
    pub symbol: String,
    /// Bar period in broker notation (e.g., "1Day", "15Min").
    pub timeframe: Timeframe,
    /// Number of bars fetched per cycle.
    pub bar_limit: usize,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            timeframe: Timeframe::Day,
            bar_limit: 100,
        }
    }
}

/// Helper functions for serde defaults
fn default_log_level() -> String { "info".to_string() }
fn default_schedule_time() -> String { "09:30".to_string() }
fn default_alpaca_base_url() -> String { "https://paper-api.alpaca.markets".to_string() }
fn default_alpaca_data_url() -> String { "https://data.alpaca.markets".to_string() }
fn default_feed() -> String { "iex".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_yahoo_base_url() -> String { "https://query1.finance.yahoo.com".to_string() }
fn default_enabled() -> bool { true }
