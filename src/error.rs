//! Typed skip-class failures collected over a run.
//!
//! Per-row and per-game problems never abort the pipeline; they are recorded
//! here so the run ends with an explicit report instead of a trail of silently
//! swallowed errors.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// Non-success response or transport error for one game's detail page.
    #[error("network failure for {game_name} ({appid}): {reason}")]
    Network {
        appid: u32,
        game_name: String,
        reason: String,
    },

    /// A history row with an unexpected cell count or a non-numeric value.
    #[error("bad row for {game_name} ({appid}): {reason}")]
    Row {
        appid: u32,
        game_name: String,
        reason: String,
    },

    /// A month label no calendar month could be derived from.
    #[error("unrecognized month label {label:?}")]
    Date { label: String },
}

/// All skip-class failures from one pipeline run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn record(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = Failure>) {
        self.failures.extend(failures);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }
}
