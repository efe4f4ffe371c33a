// Draft domain: participants, snake ordering, pick records, and the
// commit/undo state machine.

pub mod engine;
pub mod order;
pub mod pick;
pub mod roster;

pub use engine::{
    AppendOutcome, DraftEngine, DraftError, DraftPhase, MemoryPickLog, PickLog, PickRequest,
};
pub use order::{current_pick, current_player, draft_progress, snake_order, PickInfo};
pub use pick::DraftPick;
pub use roster::{Player, Roster, RosterError};
