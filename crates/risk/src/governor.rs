// In crates/risk/src/governor.rs

use crate::clock::Clock;
use crate::state::{RiskState, StateStore};
use crate::types::{DenialReason, RiskSettings, Verdict};
use crate::{Error, Result, RiskManager};
use core_types::Signal;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

/// A risk manager enforcing a per-day trade count, a per-day drawdown limit
/// and a fixed fraction of equity per position.
///
/// The day's state lives in a JSON file and is reloaded on every evaluation,
/// so restarts within a day keep counting where they left off.
pub struct DailyRiskGovernor {
    max_trades_per_day: u32,
    daily_stop_loss: Decimal,
    max_capital_per_trade: Decimal,
    store: StateStore,
    clock: Arc<dyn Clock>,
    /// The state as of the latest evaluation, used by `record_trade`.
    state: Option<RiskState>,
}

impl DailyRiskGovernor {
    /// Creates a new governor from its settings, validating the limits.
    pub fn new(settings: &RiskSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        let daily_stop_loss = fraction(
            "daily_stop_loss_percent",
            settings.daily_stop_loss_percent,
        )?;
        let max_capital_per_trade = fraction(
            "max_capital_per_trade_percent",
            settings.max_capital_per_trade_percent,
        )?;

        Ok(Self {
            max_trades_per_day: settings.max_trades_per_day,
            daily_stop_loss,
            max_capital_per_trade,
            store: StateStore::new(settings.state_file.clone()),
            clock,
            state: None,
        })
    }

    /// The state as of the latest evaluation, if any.
    pub fn state(&self) -> Option<&RiskState> {
        self.state.as_ref()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Loads the persisted state, resetting and persisting it first if it
    /// belongs to another day or does not exist yet.
    fn state_for_today(&self, current_equity: Decimal) -> Result<RiskState> {
        let today = self.clock.today();

        match self.store.load()? {
            Some(state) if state.date == today => Ok(state),
            previous => {
                if let Some(stale) = &previous {
                    tracing::info!(
                        previous_date = %stale.date,
                        previous_trades = stale.trades_count,
                        %today,
                        "New trading day. Resetting daily risk state."
                    );
                } else {
                    tracing::info!(%today, path = %self.store.path().display(), "No risk state on disk. Starting a new day.");
                }
                let fresh = RiskState::new_day(today, current_equity);
                self.store.save(&fresh)?;
                Ok(fresh)
            }
        }
    }
}

/// Converts a configured fraction into a `Decimal`, rejecting values outside [0, 1].
fn fraction(name: &str, value: f64) -> Result<Decimal> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidParameters(format!(
            "{name} must be a fraction between 0 and 1, got {value}"
        )));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        Error::InvalidParameters(format!("{name} cannot be represented as a decimal: {value}"))
    })
}

impl RiskManager for DailyRiskGovernor {
    fn name(&self) -> &'static str {
        "DailyRiskGovernor"
    }

    fn evaluate(&mut self, signal: &Signal, current_equity: Decimal) -> Result<Verdict> {
        // Rule: a HOLD never touches the risk state.
        if !signal.is_actionable() {
            return Ok(Verdict::Denied(DenialReason::NoActionableSignal));
        }

        let mut state = self.state_for_today(current_equity)?;

        // Rule: cap the number of trades per day.
        if state.trades_count >= self.max_trades_per_day {
            let reason = DenialReason::DailyTradeLimitReached {
                trades_count: state.trades_count,
                max_trades: self.max_trades_per_day,
            };
            self.state = Some(state);
            return Ok(Verdict::Denied(reason));
        }

        // Rule: halt once the day's drawdown exceeds the stop-loss.
        let loss = state.loss_fraction(current_equity);
        if loss != state.daily_loss {
            state.daily_loss = loss;
            self.store.save(&state)?;
        }
        if loss > self.daily_stop_loss {
            self.state = Some(state);
            return Ok(Verdict::Denied(DenialReason::DailyLossLimitExceeded {
                loss_percent: loss,
                limit: self.daily_stop_loss,
            }));
        }

        self.state = Some(state);
        Ok(Verdict::Allowed {
            max_position_value: current_equity * self.max_capital_per_trade,
        })
    }

    fn record_trade(&mut self) -> Result<()> {
        let state = self.state.as_mut().ok_or(Error::StateNotLoaded)?;
        state.trades_count = state.trades_count.saturating_add(1);
        self.store.save(state)?;

        tracing::info!(
            date = %state.date,
            trades_count = state.trades_count,
            max_trades = self.max_trades_per_day,
            "Trade recorded against the daily risk budget."
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{NaiveDate, Utc};
    use core_types::{Direction, Symbol};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn signal(direction: Direction) -> Signal {
        Signal::new(Symbol::from("SPY"), direction, Utc::now())
    }

    fn setup(max_trades_per_day: u32) -> (TempDir, Arc<FixedClock>, DailyRiskGovernor) {
        let dir = tempfile::tempdir().unwrap();
        let settings = RiskSettings {
            max_trades_per_day,
            daily_stop_loss_percent: 0.03,
            max_capital_per_trade_percent: 0.05,
            state_file: dir.path().join("risk_state.json"),
        };
        let clock = Arc::new(FixedClock::new(day(4)));
        let governor = DailyRiskGovernor::new(&settings, clock.clone()).unwrap();
        (dir, clock, governor)
    }

    #[test]
    fn rejects_out_of_range_fractions() {
        let clock = Arc::new(FixedClock::new(day(4)));
        let settings = RiskSettings {
            max_capital_per_trade_percent: 5.0,
            ..RiskSettings::default()
        };
        assert!(matches!(
            DailyRiskGovernor::new(&settings, clock.clone()),
            Err(Error::InvalidParameters(_))
        ));

        let settings = RiskSettings {
            daily_stop_loss_percent: f64::NAN,
            ..RiskSettings::default()
        };
        assert!(DailyRiskGovernor::new(&settings, clock).is_err());
    }

    #[test]
    fn hold_is_denied_without_touching_state() {
        let (_dir, _clock, mut governor) = setup(2);

        let verdict = governor.evaluate(&signal(Direction::Hold), dec!(10000)).unwrap();

        assert_eq!(verdict, Verdict::Denied(DenialReason::NoActionableSignal));
        assert!(governor.store().load().unwrap().is_none());
        assert!(governor.state().is_none());
    }

    #[test]
    fn fresh_day_allows_and_sizes_by_equity() {
        let (_dir, _clock, mut governor) = setup(2);

        for direction in [Direction::Buy, Direction::Sell] {
            let verdict = governor.evaluate(&signal(direction), dec!(10000)).unwrap();
            assert_eq!(
                verdict,
                Verdict::Allowed {
                    max_position_value: dec!(10000) * dec!(0.05)
                }
            );
        }

        let persisted = governor.store().load().unwrap().unwrap();
        assert_eq!(persisted, RiskState::new_day(day(4), dec!(10000)));
    }

    #[test]
    fn trade_limit_denies_after_max_trades() {
        let (_dir, _clock, mut governor) = setup(2);

        for _ in 0..2 {
            let verdict = governor.evaluate(&signal(Direction::Buy), dec!(10000)).unwrap();
            assert!(matches!(verdict, Verdict::Allowed { .. }));
            governor.record_trade().unwrap();
        }

        for (direction, equity) in [(Direction::Buy, dec!(10000)), (Direction::Sell, dec!(20000))] {
            let verdict = governor.evaluate(&signal(direction), equity).unwrap();
            assert_eq!(
                verdict,
                Verdict::Denied(DenialReason::DailyTradeLimitReached {
                    trades_count: 2,
                    max_trades: 2
                })
            );
            assert_eq!(verdict_reason(&verdict), "daily trade limit reached (2/2)");
        }
    }

    fn verdict_reason(verdict: &Verdict) -> String {
        match verdict {
            Verdict::Denied(reason) => reason.to_string(),
            Verdict::Allowed { .. } => String::new(),
        }
    }

    #[test]
    fn drawdown_beyond_stop_loss_denies_with_no_trades() {
        let (_dir, _clock, mut governor) = setup(2);
        governor.evaluate(&signal(Direction::Buy), dec!(10000)).unwrap();

        let verdict = governor.evaluate(&signal(Direction::Buy), dec!(9600)).unwrap();

        assert_eq!(
            verdict,
            Verdict::Denied(DenialReason::DailyLossLimitExceeded {
                loss_percent: dec!(0.04),
                limit: dec!(0.03)
            })
        );
        let persisted = governor.store().load().unwrap().unwrap();
        assert_eq!(persisted.trades_count, 0);
        assert_eq!(persisted.daily_loss, dec!(0.04));
        assert_eq!(persisted.starting_balance, dec!(10000));
    }

    #[test]
    fn drawdown_at_the_limit_is_still_allowed() {
        let (_dir, _clock, mut governor) = setup(2);
        governor.evaluate(&signal(Direction::Buy), dec!(10000)).unwrap();

        let verdict = governor.evaluate(&signal(Direction::Sell), dec!(9700)).unwrap();
        assert!(matches!(verdict, Verdict::Allowed { .. }));
    }

    #[test]
    fn starting_balance_is_frozen_within_the_day() {
        let (_dir, _clock, mut governor) = setup(5);
        governor.evaluate(&signal(Direction::Buy), dec!(10000)).unwrap();
        governor.evaluate(&signal(Direction::Buy), dec!(12000)).unwrap();

        assert_eq!(governor.state().unwrap().starting_balance, dec!(10000));
    }

    #[test]
    fn stale_state_is_reset_on_a_new_day() {
        let (_dir, clock, mut governor) = setup(2);
        governor.evaluate(&signal(Direction::Buy), dec!(10000)).unwrap();
        governor.record_trade().unwrap();
        governor.record_trade().unwrap();

        clock.set(day(5));
        let verdict = governor.evaluate(&signal(Direction::Buy), dec!(8000)).unwrap();

        assert_eq!(
            verdict,
            Verdict::Allowed {
                max_position_value: dec!(8000) * dec!(0.05)
            }
        );
        let persisted = governor.store().load().unwrap().unwrap();
        assert_eq!(persisted, RiskState::new_day(day(5), dec!(8000)));
    }

    #[test]
    fn counts_survive_a_restart() {
        let (dir, clock, mut governor) = setup(2);
        governor.evaluate(&signal(Direction::Buy), dec!(10000)).unwrap();
        governor.record_trade().unwrap();
        governor.record_trade().unwrap();
        drop(governor);

        let settings = RiskSettings {
            max_trades_per_day: 2,
            daily_stop_loss_percent: 0.03,
            max_capital_per_trade_percent: 0.05,
            state_file: dir.path().join("risk_state.json"),
        };
        let mut restarted = DailyRiskGovernor::new(&settings, clock).unwrap();
        let verdict = restarted.evaluate(&signal(Direction::Buy), dec!(10000)).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Denied(DenialReason::DailyTradeLimitReached { .. })
        ));
    }

    #[test]
    fn corrupt_state_fails_the_evaluation() {
        let (_dir, _clock, mut governor) = setup(2);
        std::fs::write(governor.store().path(), "not json").unwrap();

        let err = governor
            .evaluate(&signal(Direction::Buy), dec!(10000))
            .unwrap_err();
        assert!(matches!(err, Error::CorruptState { .. }));
        assert_eq!(
            std::fs::read_to_string(governor.store().path()).unwrap(),
            "not json"
        );
    }

    #[test]
    fn recording_before_evaluating_is_an_error() {
        let (_dir, _clock, mut governor) = setup(2);
        assert!(matches!(governor.record_trade(), Err(Error::StateNotLoaded)));
    }
}
