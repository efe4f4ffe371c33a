// Snake pick-order generation and current-pick lookup.
//
// Both functions are pure: the draft's state is entirely reconstructible
// from the committed pick log plus the static roster and round count, which
// is what makes undo and multi-client reconciliation tractable. Nothing
// here caches "whose turn it is".

use super::pick::DraftPick;
use super::roster::{Player, Roster};

/// Information about the next pick to be made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickInfo {
    /// 1-based number of the next pick.
    pub pick_number: u32,
    /// 0-based slot index into the roster of the player on the clock.
    pub slot_index: usize,
    /// Total picks in the draft (`players * rounds`).
    pub total_picks: usize,
}

/// Generate the full snake pick order for `num_players` participants over
/// `rounds` rounds.
///
/// Each entry is a 0-based slot index into the slot-sorted roster. Even
/// rounds (0-indexed) run ascending, odd rounds descending; the reversal
/// happens every round, not every pick. Deterministic: the same inputs
/// always yield the same sequence.
pub fn snake_order(num_players: usize, rounds: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(num_players * rounds);
    for round in 0..rounds {
        if round % 2 == 0 {
            order.extend(0..num_players);
        } else {
            order.extend((0..num_players).rev());
        }
    }
    order
}

/// Compute who is on the clock given the committed pick log.
///
/// Returns `None` once the draft is complete (`picks.len() >= players *
/// rounds`). The pick log must be gapless and in commit order; the answer
/// is undefined otherwise, which is why the event feed applies picks in
/// strictly increasing pick-number order.
pub fn current_pick(roster: &Roster, picks: &[DraftPick], rounds: usize) -> Option<PickInfo> {
    let order = snake_order(roster.len(), rounds);
    let next_index = picks.len();
    if next_index >= order.len() {
        return None;
    }
    Some(PickInfo {
        pick_number: next_index as u32 + 1,
        slot_index: order[next_index],
        total_picks: order.len(),
    })
}

/// The player on the clock, or `None` if the draft is complete.
pub fn current_player<'a>(
    roster: &'a Roster,
    picks: &[DraftPick],
    rounds: usize,
) -> Option<&'a Player> {
    current_pick(roster, picks, rounds).map(|info| roster.player_at(info.slot_index))
}

/// Integer percentage of the draft completed, for progress display.
pub fn draft_progress(picks_made: usize, total_picks: usize) -> u32 {
    if total_picks == 0 {
        return 0;
    }
    ((picks_made as f64 / total_picks as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::roster::Player;
    use chrono::Utc;

    fn roster(n: usize) -> Roster {
        let players = (1..=n)
            .map(|i| Player {
                id: format!("p{i}"),
                display_name: format!("Player {i}"),
                color: "#2196F3".to_string(),
                draft_slot: i as u32,
            })
            .collect();
        Roster::new(players).unwrap()
    }

    fn pick(n: u32) -> DraftPick {
        DraftPick {
            pick_number: n,
            player_id: "p1".to_string(),
            driver_id: format!("D{n}"),
            driver_name: format!("Driver {n}"),
            start_position: n,
            picked_at: Utc::now(),
        }
    }

    #[test]
    fn three_players_two_rounds() {
        assert_eq!(snake_order(3, 2), vec![0, 1, 2, 2, 1, 0]);
    }

    #[test]
    fn reverses_every_round_not_every_pick() {
        // 3 players, 6 rounds: the worked example from the draft rules.
        let expected = vec![
            0, 1, 2, 2, 1, 0, 0, 1, 2, 2, 1, 0, 0, 1, 2, 2, 1, 0,
        ];
        assert_eq!(snake_order(3, 6), expected);
    }

    #[test]
    fn single_player() {
        assert_eq!(snake_order(1, 4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn each_round_is_a_permutation() {
        let n = 5;
        let rounds = 7;
        let order = snake_order(n, rounds);
        assert_eq!(order.len(), n * rounds);
        for round in 0..rounds {
            let mut chunk: Vec<usize> = order[round * n..(round + 1) * n].to_vec();
            if round % 2 == 1 {
                chunk.reverse();
            }
            assert_eq!(chunk, (0..n).collect::<Vec<_>>(), "round {round}");
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(snake_order(4, 5), snake_order(4, 5));
    }

    #[test]
    fn current_pick_walks_the_order() {
        let roster = roster(3);
        let rounds = 2;
        let order = snake_order(3, rounds);
        let mut picks = Vec::new();
        for (k, expected_slot) in order.iter().enumerate() {
            let info = current_pick(&roster, &picks, rounds).unwrap();
            assert_eq!(info.pick_number, k as u32 + 1);
            assert_eq!(info.slot_index, *expected_slot);
            assert_eq!(info.total_picks, 6);
            picks.push(pick(info.pick_number));
        }
        assert!(current_pick(&roster, &picks, rounds).is_none());
    }

    #[test]
    fn current_player_resolves_roster_entry() {
        let roster = roster(3);
        // First pick of round 2 (0-indexed round 1) belongs to slot 3.
        let picks: Vec<DraftPick> = (1..=3).map(pick).collect();
        let player = current_player(&roster, &picks, 2).unwrap();
        assert_eq!(player.id, "p3");
    }

    #[test]
    fn progress_percentage() {
        assert_eq!(draft_progress(0, 6), 0);
        assert_eq!(draft_progress(3, 6), 50);
        assert_eq!(draft_progress(6, 6), 100);
        assert_eq!(draft_progress(1, 3), 33);
        assert_eq!(draft_progress(0, 0), 0);
    }
}
