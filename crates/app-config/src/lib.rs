// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AlpacaSettings, AppSettings, MarketDataSettings, Settings, TradingSettings};

/// Loads the application settings from the `config/` directory.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(Path::new("config"))
}

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables (e.g., `APP_ALPACA__API_KEY=...`).
/// 4. Honours the conventional `ALPACA_API_KEY` / `ALPACA_SECRET_KEY` /
///    `ALPACA_BASE_URL` variables last.
pub fn load_settings_from(config_dir: &Path) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let base = config_dir.join("base");
    let env_specific = config_dir.join(&environment);

    let settings = Config::builder()
        .add_source(File::with_name(&base.to_string_lossy()))
        .add_source(File::with_name(&env_specific.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("alpaca.api_key", std::env::var("ALPACA_API_KEY").ok())?
        .set_override_option("alpaca.secret_key", std::env::var("ALPACA_SECRET_KEY").ok())?
        .set_override_option("alpaca.base_url", std::env::var("ALPACA_BASE_URL").ok())?
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;

    if settings.trading.bar_limit < settings.strategy.long_window as usize {
        return Err(Error::Invalid(format!(
            "trading.bar_limit ({}) is smaller than strategy.long_window ({}); no signal could ever be produced",
            settings.trading.bar_limit, settings.strategy.long_window
        )));
    }

    if !settings.alpaca.is_paper() && !settings.app.live_trading_enabled {
        return Err(Error::Invalid(format!(
            "alpaca.base_url ({}) is a live trading endpoint but app.live_trading_enabled is false",
            settings.alpaca.base_url
        )));
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Timeframe;
    use std::fs;

    const BASE: &str = r#"
[app]
environment = "test"
log_level = "debug"

[alpaca]
api_key = "key"
secret_key = "secret"

[trading]
symbol = "QQQ"
timeframe = "15Min"
bar_limit = 120

[strategy]
short_window = 10
long_window = 30

[risk]
max_trades_per_day = 3
daily_stop_loss_percent = 0.02
max_capital_per_trade_percent = 0.1
"#;

    #[test]
    fn loads_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.toml"), BASE).unwrap();

        let settings = load_settings_from(dir.path()).unwrap();

        assert_eq!(settings.trading.symbol, "QQQ");
        assert_eq!(settings.trading.timeframe, Timeframe::Minute(15));
        assert_eq!(settings.strategy.long_window, 30);
        assert_eq!(settings.risk.max_trades_per_day, 3);
        assert_eq!(settings.risk.state_file, Path::new("risk_state.json"));
        assert_eq!(settings.app.schedule_time, "09:30");
        assert!(!settings.app.live_trading_enabled);
        assert!(settings.alpaca.is_paper());
        assert!(settings.market_data.fallback_enabled);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            "[app]\nenvironment = \"test\"\n[alpaca]\napi_key = \"k\"\nsecret_key = \"s\"\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path()).unwrap();

        assert_eq!(settings.trading.symbol, "SPY");
        assert_eq!(settings.trading.timeframe, Timeframe::Day);
        assert_eq!(settings.strategy.short_window, 20);
        assert_eq!(settings.strategy.long_window, 50);
        assert_eq!(settings.risk.max_trades_per_day, 2);
    }

    #[test]
    fn bar_limit_below_long_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = BASE.replace("bar_limit = 120", "bar_limit = 20");
        fs::write(dir.path().join("base.toml"), config).unwrap();

        assert!(matches!(
            load_settings_from(dir.path()),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn live_endpoint_requires_explicit_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let live = BASE.replace(
            "secret_key = \"secret\"",
            "secret_key = \"secret\"\nbase_url = \"https://api.alpaca.markets\"",
        );
        fs::write(dir.path().join("base.toml"), &live).unwrap();
        assert!(matches!(
            load_settings_from(dir.path()),
            Err(Error::Invalid(_))
        ));

        let enabled = live.replace("log_level = \"debug\"", "log_level = \"debug\"\nlive_trading_enabled = true");
        fs::write(dir.path().join("base.toml"), enabled).unwrap();
        let settings = load_settings_from(dir.path()).unwrap();
        assert!(!settings.alpaca.is_paper());
        assert!(settings.app.live_trading_enabled);
    }

    #[test]
    fn unknown_timeframe_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = BASE.replace("15Min", "1Fortnight");
        fs::write(dir.path().join("base.toml"), config).unwrap();

        assert!(load_settings_from(dir.path()).is_err());
    }
}
