// In crates/core-types/src/types.rs

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tradable instrument ticker (e.g., "SPY").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(value.to_string())
    }
}

/// A single OHLCV bar. Bars are handed around as chronological slices,
/// one entry per period, and are never mutated after being fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The opening time of the period.
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The direction a strategy recommends for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// A trading signal produced fresh each cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: Symbol,
    pub direction: Direction,
    /// Binary: 1.0 for BUY/SELL, 0.0 for HOLD.
    pub confidence: f64,
    /// Timestamp of the bar the signal was computed on.
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// Creates a signal, deriving the confidence from the direction.
    pub fn new(symbol: Symbol, direction: Direction, timestamp: DateTime<Utc>) -> Self {
        let confidence = match direction {
            Direction::Buy | Direction::Sell => 1.0,
            Direction::Hold => 0.0,
        };
        Self {
            symbol,
            direction,
            confidence,
            timestamp,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.direction != Direction::Hold
    }
}

/// The side of an order sent to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(Error::InvalidSide(s.to_string())),
        }
    }
}

/// The broker's view of a holding. Positive quantity is long, negative is
/// short, zero is flat. Always re-fetched from the broker; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: Symbol,
    pub quantity: Decimal,
}

/// A market order about to be submitted. Ephemeral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: Symbol,
    /// Whole shares, always positive.
    pub quantity: u64,
    pub side: Side,
}

/// The broker's acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// The broker-assigned order id.
    pub id: String,
    pub symbol: Symbol,
    pub quantity: u64,
    pub side: Side,
    /// Raw status string as reported by the broker (e.g., "accepted", "filled").
    pub status: String,
}

/// The bar period, in the broker's notation ("15Min", "1Hour", "1Day", "1Week").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    Minute(u32),
    Hour(u32),
    Day,
    Week,
}

impl Timeframe {
    /// The approximate wall-clock length of one bar.
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Minute(n) => Duration::minutes(i64::from(*n)),
            Timeframe::Hour(n) => Duration::hours(i64::from(*n)),
            Timeframe::Day => Duration::days(1),
            Timeframe::Week => Duration::weeks(1),
        }
    }

    /// The interval code understood by the Yahoo chart endpoint, if any.
    pub fn yahoo_interval(&self) -> Option<&'static str> {
        match self {
            Timeframe::Minute(1) => Some("1m"),
            Timeframe::Minute(5) => Some("5m"),
            Timeframe::Minute(15) => Some("15m"),
            Timeframe::Minute(30) => Some("30m"),
            Timeframe::Hour(1) => Some("60m"),
            Timeframe::Day => Some("1d"),
            Timeframe::Week => Some("1wk"),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Minute(n) => write!(f, "{n}Min"),
            Timeframe::Hour(n) => write!(f, "{n}Hour"),
            Timeframe::Day => f.write_str("1Day"),
            Timeframe::Week => f.write_str("1Week"),
        }
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTimeframe(s.to_string());
        let split = s.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        let (amount, unit) = s.split_at(split);
        let amount: u32 = amount.parse().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }

        match (unit, amount) {
            ("Min" | "T", n) if n <= 59 => Ok(Timeframe::Minute(n)),
            ("Hour" | "H", n) if n <= 23 => Ok(Timeframe::Hour(n)),
            ("Day" | "D", 1) => Ok(Timeframe::Day),
            ("Week" | "W", 1) => Ok(Timeframe::Week),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(value: Timeframe) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_confidence_is_binary() {
        let now = Utc::now();
        let buy = Signal::new(Symbol::from("SPY"), Direction::Buy, now);
        let sell = Signal::new(Symbol::from("SPY"), Direction::Sell, now);
        let hold = Signal::new(Symbol::from("SPY"), Direction::Hold, now);

        assert_eq!(buy.confidence, 1.0);
        assert_eq!(sell.confidence, 1.0);
        assert_eq!(hold.confidence, 0.0);
        assert!(!hold.is_actionable());
    }

    #[test]
    fn timeframe_parses_broker_notation() {
        assert_eq!("1Day".parse::<Timeframe>().unwrap(), Timeframe::Day);
        assert_eq!("15Min".parse::<Timeframe>().unwrap(), Timeframe::Minute(15));
        assert_eq!("1Hour".parse::<Timeframe>().unwrap(), Timeframe::Hour(1));
        assert_eq!(Timeframe::Minute(15).to_string(), "15Min");
        assert_eq!(Timeframe::Day.yahoo_interval(), Some("1d"));
    }

    #[test]
    fn timeframe_rejects_garbage() {
        assert!("Day".parse::<Timeframe>().is_err());
        assert!("0Min".parse::<Timeframe>().is_err());
        assert!("2Day".parse::<Timeframe>().is_err());
        assert!("1Fortnight".parse::<Timeframe>().is_err());
    }

    #[test]
    fn side_round_trips_through_broker_strings() {
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!(Side::Sell.to_string(), "sell");
        assert_eq!(
            "short".parse::<Side>(),
            Err(Error::InvalidSide("short".to_string()))
        );
    }
}
