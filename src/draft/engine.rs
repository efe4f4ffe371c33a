// The pick state machine: validates and commits picks against a shared
// pick log, and undoes the most recent pick.
//
// The engine holds no mutable pick state of its own. Every query and every
// precondition is evaluated against the log as read from the store, so any
// number of clients observing the same log compute the same answers.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::grid::Driver;
use crate::tiers::tier_for_position;

use super::order::{current_pick, snake_order, PickInfo};
use super::pick::DraftPick;
use super::roster::Roster;

/// Typed outcomes for rejected draft operations. All of these are
/// expected, recoverable conditions in multi-client use, not crashes;
/// losing a commit race in particular is routine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("draft is already complete")]
    DraftComplete,

    #[error("driver `{driver_id}` has already been picked")]
    DriverTaken { driver_id: String },

    #[error("not your turn: `{on_clock}` is on the clock, not `{claimed}`")]
    NotYourTurn { on_clock: String, claimed: String },

    #[error("stale pick number: claimed {claimed}, next is {expected}")]
    StalePickNumber { claimed: u32, expected: u32 },

    #[error("tier {tier} already filled for player `{player_id}`")]
    TierFilled { tier: u8, player_id: String },

    #[error("unknown driver `{driver_id}`")]
    UnknownDriver { driver_id: String },

    #[error("unknown player `{player_id}`")]
    UnknownPlayer { player_id: String },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("pick log error: {0}")]
    Store(String),
}

/// Result of a conditional append against the pick log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The pick landed.
    Appended,
    /// Another pick with the same pick number or driver already landed
    /// between validation and append. The log is unchanged.
    Conflict,
}

/// The storage boundary for the append-only pick log.
///
/// `append` must be conditional: if a pick with the same pick number (or
/// the same driver) already exists it must report `Conflict` rather than
/// overwrite. That check is what makes "at most one commit succeeds per
/// pick number" hold across independent processes; the engine adds no lock
/// of its own.
pub trait PickLog {
    /// All committed picks in increasing pick-number order, gapless.
    fn picks(&self) -> Result<Vec<DraftPick>, DraftError>;

    /// Conditionally append one pick.
    fn append(&self, pick: &DraftPick) -> Result<AppendOutcome, DraftError>;

    /// Remove and return the pick with the highest pick number, if any.
    fn remove_last(&self) -> Result<Option<DraftPick>, DraftError>;
}

/// In-memory pick log for hosts that don't need persistence, and for
/// tests. The mutex makes append-check-then-insert atomic within one
/// process; cross-process deployments use the SQLite log instead.
#[derive(Debug, Default)]
pub struct MemoryPickLog {
    picks: Mutex<Vec<DraftPick>>,
}

impl MemoryPickLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PickLog for MemoryPickLog {
    fn picks(&self) -> Result<Vec<DraftPick>, DraftError> {
        Ok(self.picks.lock().expect("pick log mutex poisoned").clone())
    }

    fn append(&self, pick: &DraftPick) -> Result<AppendOutcome, DraftError> {
        let mut picks = self.picks.lock().expect("pick log mutex poisoned");
        let taken = picks
            .iter()
            .any(|p| p.pick_number == pick.pick_number || p.driver_id == pick.driver_id);
        if taken {
            return Ok(AppendOutcome::Conflict);
        }
        picks.push(pick.clone());
        Ok(AppendOutcome::Appended)
    }

    fn remove_last(&self) -> Result<Option<DraftPick>, DraftError> {
        Ok(self.picks.lock().expect("pick log mutex poisoned").pop())
    }
}

/// Draft lifecycle, derived from the log length. There is no stored flag
/// to fall out of sync with the log: undoing the final pick moves the
/// draft straight back to `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    InProgress,
    Complete,
}

/// A pick attempt as claimed by a client. The claimed pick number is the
/// guard against two clients racing for the same turn.
#[derive(Debug, Clone)]
pub struct PickRequest {
    pub player_id: String,
    pub driver_id: String,
    pub pick_number: u32,
}

/// The draft turn-order engine for one draft: static roster, grid, and
/// round count, plus the validation rules. All pick state lives in the
/// `PickLog` passed to each operation.
pub struct DraftEngine {
    roster: Roster,
    grid: Vec<Driver>,
    rounds: usize,
    /// Variant rule: a player may not hold two drivers from the same tier.
    one_per_tier: bool,
}

impl DraftEngine {
    pub fn new(roster: Roster, grid: Vec<Driver>, rounds: usize, one_per_tier: bool) -> Self {
        DraftEngine {
            roster,
            grid,
            rounds,
            one_per_tier,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn grid(&self) -> &[Driver] {
        &self.grid
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Total picks in this draft.
    pub fn total_picks(&self) -> usize {
        self.roster.len() * self.rounds
    }

    /// The full snake order for this draft, as 0-based roster slot indices.
    pub fn pick_order(&self) -> Vec<usize> {
        snake_order(self.roster.len(), self.rounds)
    }

    /// Who is on the clock, derived from the given log.
    pub fn current_pick(&self, picks: &[DraftPick]) -> Option<PickInfo> {
        current_pick(&self.roster, picks, self.rounds)
    }

    /// Draft phase, derived from the given log.
    pub fn phase(&self, picks: &[DraftPick]) -> DraftPhase {
        if picks.len() >= self.total_picks() {
            DraftPhase::Complete
        } else {
            DraftPhase::InProgress
        }
    }

    /// Drivers not yet claimed by any pick, ordered by start position.
    pub fn available<'a>(&'a self, picks: &[DraftPick]) -> Vec<&'a Driver> {
        let taken: HashSet<&str> = picks.iter().map(|p| p.driver_id.as_str()).collect();
        // Grid is kept sorted by start position at load time.
        self.grid
            .iter()
            .filter(|d| !taken.contains(d.id.as_str()))
            .collect()
    }

    /// Picks belonging to one player, in pick order.
    pub fn player_picks<'a>(&self, picks: &'a [DraftPick], player_id: &str) -> Vec<&'a DraftPick> {
        picks.iter().filter(|p| p.player_id == player_id).collect()
    }

    /// Validate a pick attempt against the given log and, if legal, build
    /// the pick record that would be committed. Does not touch any store.
    ///
    /// Preconditions, checked in order, each a distinct failure mode:
    /// draft not complete, driver untaken, claimant on the clock, claimed
    /// pick number current, and (variant) tier not already filled.
    pub fn validate_pick(
        &self,
        picks: &[DraftPick],
        request: &PickRequest,
    ) -> Result<DraftPick, DraftError> {
        let info = self
            .current_pick(picks)
            .ok_or(DraftError::DraftComplete)?;

        let driver = self
            .grid
            .iter()
            .find(|d| d.id == request.driver_id)
            .ok_or_else(|| DraftError::UnknownDriver {
                driver_id: request.driver_id.clone(),
            })?;

        if picks.iter().any(|p| p.driver_id == driver.id) {
            return Err(DraftError::DriverTaken {
                driver_id: driver.id.clone(),
            });
        }

        if self.roster.player(&request.player_id).is_none() {
            return Err(DraftError::UnknownPlayer {
                player_id: request.player_id.clone(),
            });
        }

        let on_clock = self.roster.player_at(info.slot_index);
        if on_clock.id != request.player_id {
            return Err(DraftError::NotYourTurn {
                on_clock: on_clock.id.clone(),
                claimed: request.player_id.clone(),
            });
        }

        if request.pick_number != info.pick_number {
            return Err(DraftError::StalePickNumber {
                claimed: request.pick_number,
                expected: info.pick_number,
            });
        }

        if self.one_per_tier {
            let tier = driver.tier;
            let held = picks
                .iter()
                .filter(|p| p.player_id == request.player_id)
                .any(|p| tier_for_position(p.start_position) == tier);
            if held {
                return Err(DraftError::TierFilled {
                    tier,
                    player_id: request.player_id.clone(),
                });
            }
        }

        Ok(DraftPick {
            pick_number: info.pick_number,
            player_id: request.player_id.clone(),
            driver_id: driver.id.clone(),
            driver_name: driver.name.clone(),
            start_position: driver.start_position,
            picked_at: Utc::now(),
        })
    }

    /// Validate and commit a pick through the store's conditional append.
    ///
    /// On an append conflict (another client landed first between our read
    /// and our append) the log is re-read to report the precise loss:
    /// `DriverTaken` if the driver went, otherwise `StalePickNumber`. The
    /// caller should refresh its view and, if still on the clock, retry.
    pub fn commit_pick(
        &self,
        log: &dyn PickLog,
        request: &PickRequest,
    ) -> Result<DraftPick, DraftError> {
        let picks = log.picks()?;
        let pick = self.validate_pick(&picks, request)?;

        match log.append(&pick)? {
            AppendOutcome::Appended => {
                debug!(
                    pick_number = pick.pick_number,
                    player = %pick.player_id,
                    driver = %pick.driver_id,
                    "pick committed"
                );
                Ok(pick)
            }
            AppendOutcome::Conflict => {
                let latest = log.picks()?;
                warn!(
                    pick_number = pick.pick_number,
                    player = %pick.player_id,
                    "lost commit race"
                );
                if latest.iter().any(|p| p.driver_id == pick.driver_id) {
                    Err(DraftError::DriverTaken {
                        driver_id: pick.driver_id,
                    })
                } else {
                    Err(DraftError::StalePickNumber {
                        claimed: pick.pick_number,
                        expected: latest.len() as u32 + 1,
                    })
                }
            }
        }
    }

    /// Remove the most recent pick. Only the highest-numbered pick is ever
    /// undoable, so the gapless 1..k numbering is preserved without any
    /// renumbering.
    pub fn undo_last(&self, log: &dyn PickLog) -> Result<DraftPick, DraftError> {
        match log.remove_last()? {
            Some(pick) => {
                debug!(pick_number = pick.pick_number, driver = %pick.driver_id, "pick undone");
                Ok(pick)
            }
            None => Err(DraftError::NothingToUndo),
        }
    }
}
