// Draft participants and the slot-ordered roster.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster has no players")]
    Empty,

    #[error("duplicate draft slot {slot} (held by `{first}` and `{second}`)")]
    DuplicateSlot {
        slot: u32,
        first: String,
        second: String,
    },

    #[error("draft slots must form 1..={expected}, got slot {slot} for `{player}`")]
    SlotOutOfRange {
        slot: u32,
        expected: u32,
        player: String,
    },

    #[error("duplicate player id `{id}`")]
    DuplicatePlayer { id: String },
}

/// A team/player competing in the draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier.
    pub id: String,
    /// Display name shown on the draft board.
    pub display_name: String,
    /// Team color (hex string), carried through to standings.
    pub color: String,
    /// Position in the pick rotation, 1-based. Assigned once before the
    /// draft starts and immutable for its duration.
    pub draft_slot: u32,
}

/// All participants for one draft, sorted by `draft_slot`.
///
/// Construction validates that slots are a permutation of 1..=N with no
/// duplicates and no gaps; a roster that fails here never reaches the
/// engine, so slot errors are setup-time failures only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(mut players: Vec<Player>) -> Result<Self, RosterError> {
        if players.is_empty() {
            return Err(RosterError::Empty);
        }

        players.sort_by_key(|p| p.draft_slot);

        // N slots, all in 1..=N and pairwise distinct, is exactly the
        // permutation 1..=N; no separate gap check is needed.
        let n = players.len() as u32;
        let mut holders: HashMap<u32, &str> = HashMap::new();
        for player in &players {
            if player.draft_slot < 1 || player.draft_slot > n {
                return Err(RosterError::SlotOutOfRange {
                    slot: player.draft_slot,
                    expected: n,
                    player: player.id.clone(),
                });
            }
            if let Some(first) = holders.insert(player.draft_slot, player.id.as_str()) {
                return Err(RosterError::DuplicateSlot {
                    slot: player.draft_slot,
                    first: first.to_string(),
                    second: player.id.clone(),
                });
            }
        }

        for (idx, player) in players.iter().enumerate() {
            if players[..idx].iter().any(|p| p.id == player.id) {
                return Err(RosterError::DuplicatePlayer {
                    id: player.id.clone(),
                });
            }
        }

        Ok(Roster { players })
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player at a 0-based slot index (the index space the snake order
    /// speaks in).
    pub fn player_at(&self, slot_index: usize) -> &Player {
        &self.players[slot_index]
    }

    /// Look up a player by id.
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Players in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, slot: u32) -> Player {
        Player {
            id: id.to_string(),
            display_name: format!("Team {id}"),
            color: "#4CAF50".to_string(),
            draft_slot: slot,
        }
    }

    #[test]
    fn sorts_by_slot() {
        let roster = Roster::new(vec![player("c", 3), player("a", 1), player("b", 2)]).unwrap();
        assert_eq!(roster.player_at(0).id, "a");
        assert_eq!(roster.player_at(1).id, "b");
        assert_eq!(roster.player_at(2).id, "c");
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(Roster::new(vec![]), Err(RosterError::Empty)));
    }

    #[test]
    fn rejects_duplicate_slots() {
        let err = Roster::new(vec![player("a", 1), player("b", 1), player("c", 2)]).unwrap_err();
        assert!(matches!(err, RosterError::DuplicateSlot { slot: 1, .. }));
    }

    #[test]
    fn rejects_gapped_slots() {
        let err = Roster::new(vec![player("a", 1), player("b", 4)]).unwrap_err();
        assert!(matches!(err, RosterError::SlotOutOfRange { slot: 4, .. }));
    }

    #[test]
    fn rejects_missing_first_slot() {
        // Slots in range but slot 1 never assigned: both shapes must come
        // back as typed errors, not a crash.
        let err = Roster::new(vec![player("a", 2), player("b", 2)]).unwrap_err();
        assert!(matches!(err, RosterError::DuplicateSlot { slot: 2, .. }));

        let err = Roster::new(vec![player("a", 2), player("b", 3)]).unwrap_err();
        assert!(matches!(err, RosterError::SlotOutOfRange { slot: 3, .. }));
    }

    #[test]
    fn duplicate_slot_names_the_actual_holders() {
        let err = Roster::new(vec![player("a", 1), player("b", 3), player("c", 3)]).unwrap_err();
        match err {
            RosterError::DuplicateSlot {
                slot,
                first,
                second,
            } => {
                assert_eq!(slot, 3);
                assert_eq!(first, "b");
                assert_eq!(second, "c");
            }
            other => panic!("expected DuplicateSlot, got {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_slot() {
        let err = Roster::new(vec![player("a", 0), player("b", 1)]).unwrap_err();
        assert!(matches!(err, RosterError::SlotOutOfRange { slot: 0, .. }));
    }

    #[test]
    fn rejects_duplicate_player_ids() {
        let err = Roster::new(vec![player("a", 1), player("a", 2)]).unwrap_err();
        assert!(matches!(err, RosterError::DuplicatePlayer { .. }));
    }

    #[test]
    fn lookup_by_id() {
        let roster = Roster::new(vec![player("a", 1), player("b", 2)]).unwrap();
        assert_eq!(roster.player("b").unwrap().draft_slot, 2);
        assert!(roster.player("z").is_none());
    }
}
