// In crates/risk/src/state.rs

use crate::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// The durable per-day risk budget.
///
/// `daily_loss` is an observation: it holds the loss fraction most recently
/// computed from `starting_balance` and live equity, and is never read back
/// for decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    /// Calendar day the state belongs to, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub trades_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_loss: Decimal,
    /// Equity captured at the first read of the day. Frozen until rollover.
    #[serde(with = "rust_decimal::serde::float")]
    pub starting_balance: Decimal,
}

impl RiskState {
    /// A fresh state for `date` with no trades.
    pub fn new_day(date: NaiveDate, starting_balance: Decimal) -> Self {
        Self {
            date,
            trades_count: 0,
            daily_loss: Decimal::ZERO,
            starting_balance,
        }
    }

    /// Loss versus the starting balance as a fraction; gains are negative.
    /// Zero when the starting balance is not positive.
    pub fn loss_fraction(&self, current_equity: Decimal) -> Decimal {
        if self.starting_balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        -(current_equity - self.starting_balance) / self.starting_balance
    }
}

/// Persists `RiskState` as a single JSON object.
///
/// Writes go to a sibling temporary file which is flushed and then renamed
/// over the target, so a crash leaves either the old or the new state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted state. A missing file is `Ok(None)`; a file that
    /// exists but does not parse is `Error::CorruptState`.
    pub fn load(&self) -> Result<Option<RiskState>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::StateIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let state = serde_json::from_slice(&bytes).map_err(|source| Error::CorruptState {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(state))
    }

    /// Atomically replaces the persisted state.
    pub fn save(&self, state: &RiskState) -> Result<()> {
        let io_err = |source| Error::StateIo {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(state).map_err(Error::Serialize)?;
        let tmp_path = self.tmp_path();

        let write_tmp = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()
        };
        if let Err(e) = write_tmp() {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(e));
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            // Clean up temp file on rename failure
            let _ = fs::remove_file(&tmp_path);
            io_err(e)
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
