// Race classification: finish outcomes, the fastest-lap holder, and the
// finalization freeze.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResultsError {
    #[error("classification is finalized and can no longer be edited")]
    Finalized,

    #[error("finish position must be at least 1, got {position}")]
    InvalidPosition { position: u32 },

    #[error("cannot finalize: no outcome recorded for {missing} driver(s): {ids:?}")]
    Incomplete { missing: usize, ids: Vec<String> },
}

/// How one driver's race ended.
///
/// DNF is an explicit variant rather than a sentinel position; conversion
/// from feeds that encode DNF as "beyond the field" goes through
/// [`FinishOutcome::from_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "position", rename_all = "snake_case")]
pub enum FinishOutcome {
    Classified(u32),
    Dnf,
}

impl FinishOutcome {
    /// Interpret a raw position from a results feed: anything at or beyond
    /// `field_size + 1` means the driver did not finish.
    pub fn from_position(position: u32, field_size: u32) -> Self {
        if position > field_size {
            FinishOutcome::Dnf
        } else {
            FinishOutcome::Classified(position)
        }
    }

    pub fn is_dnf(&self) -> bool {
        matches!(self, FinishOutcome::Dnf)
    }
}

impl std::fmt::Display for FinishOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishOutcome::Classified(pos) => write!(f, "P{pos}"),
            FinishOutcome::Dnf => write!(f, "DNF"),
        }
    }
}

/// Post-race results for one event: finish outcome per driver plus the
/// single event-wide fastest-lap holder.
///
/// Mutable while results trickle in (manual entry or a feed); frozen once
/// finalized. Holding the fastest lap as one `Option` makes the
/// at-most-one invariant structural. Duplicate finish positions are
/// tolerated -- manual override entry is allowed to be briefly
/// inconsistent -- only basic shape validation is enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceClassification {
    finishes: HashMap<String, FinishOutcome>,
    fastest_lap: Option<String>,
    finalized: bool,
}

impl RaceClassification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) a driver's outcome.
    pub fn set_outcome(&mut self, driver_id: &str, outcome: FinishOutcome) -> Result<(), ResultsError> {
        if self.finalized {
            return Err(ResultsError::Finalized);
        }
        if let FinishOutcome::Classified(position) = outcome {
            if position < 1 {
                return Err(ResultsError::InvalidPosition { position });
            }
        }
        self.finishes.insert(driver_id.to_string(), outcome);
        Ok(())
    }

    /// Set (or clear) the fastest-lap holder. Setting a new holder
    /// replaces the previous one.
    pub fn set_fastest_lap(&mut self, driver_id: Option<&str>) -> Result<(), ResultsError> {
        if self.finalized {
            return Err(ResultsError::Finalized);
        }
        self.fastest_lap = driver_id.map(str::to_string);
        Ok(())
    }

    pub fn outcome(&self, driver_id: &str) -> Option<FinishOutcome> {
        self.finishes.get(driver_id).copied()
    }

    pub fn has_fastest_lap(&self, driver_id: &str) -> bool {
        self.fastest_lap.as_deref() == Some(driver_id)
    }

    pub fn fastest_lap(&self) -> Option<&str> {
        self.fastest_lap.as_deref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Freeze the classification. Requires an outcome for every driver in
    /// `required_drivers` (typically the set of drafted drivers): a
    /// missing result stays an explicit gap, it is never silently scored.
    pub fn finalize<'a>(
        &mut self,
        required_drivers: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ResultsError> {
        if self.finalized {
            return Err(ResultsError::Finalized);
        }
        let mut missing: Vec<String> = required_drivers
            .into_iter()
            .filter(|id| !self.finishes.contains_key(*id))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(ResultsError::Incomplete {
                missing: missing.len(),
                ids: missing,
            });
        }
        self.finalized = true;
        Ok(())
    }
}
