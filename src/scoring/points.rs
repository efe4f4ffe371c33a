// The points formula: movement, finish bonus, and fastest lap, evaluated
// as independent additive components.
//
// The tuning constants (asymmetric movement, flat DNF penalty, bonus
// ladder, fastest-lap cutoff) are product decisions with no deeper
// derivation; keep them named so they can be revisited without touching
// the algorithm shape.

use serde::{Deserialize, Serialize};

use crate::draft::DraftPick;
use crate::results::{FinishOutcome, RaceClassification};

/// Points per position gained.
pub const GAIN_POINTS_PER_PLACE: i32 = 2;
/// Points per position lost (applied as a negative movement).
pub const LOSS_POINTS_PER_PLACE: i32 = 1;
/// Flat penalty for a DNF, regardless of how far the driver fell.
pub const DNF_PENALTY: i32 = -8;
/// Finish bonus ladder: P1 through P4. P5 and below score no bonus.
pub const FINISH_BONUS: [i32; 4] = [8, 4, 2, 1];
/// Bonus for holding the event's fastest lap.
pub const FASTEST_LAP_BONUS: i32 = 3;
/// Worst classified finish that still earns the fastest-lap bonus. A
/// fastest lap from a backmarker does not score.
pub const FASTEST_LAP_CUTOFF: u32 = 10;

/// Point breakdown for one driver, kept component-by-component for
/// display and audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverScore {
    pub movement_points: i32,
    pub finish_bonus: i32,
    pub fastest_lap_points: i32,
    pub total: i32,
    pub is_dnf: bool,
}

/// Score one driver's race. Pure: no floor or ceiling is applied, so the
/// total can be negative (a bare DNF is -8).
pub fn score_driver(
    start_position: u32,
    outcome: FinishOutcome,
    has_fastest_lap: bool,
) -> DriverScore {
    match outcome {
        FinishOutcome::Dnf => DriverScore {
            movement_points: DNF_PENALTY,
            finish_bonus: 0,
            // A DNF has no classified finish inside the cutoff.
            fastest_lap_points: 0,
            total: DNF_PENALTY,
            is_dnf: true,
        },
        FinishOutcome::Classified(finish_position) => {
            let movement = start_position as i32 - finish_position as i32;
            let movement_points = if movement > 0 {
                movement * GAIN_POINTS_PER_PLACE
            } else {
                movement * LOSS_POINTS_PER_PLACE
            };

            let finish_bonus = match finish_position {
                1..=4 => FINISH_BONUS[finish_position as usize - 1],
                _ => 0,
            };

            let fastest_lap_points = if has_fastest_lap && finish_position <= FASTEST_LAP_CUTOFF {
                FASTEST_LAP_BONUS
            } else {
                0
            };

            DriverScore {
                movement_points,
                finish_bonus,
                fastest_lap_points,
                total: movement_points + finish_bonus + fastest_lap_points,
                is_dnf: false,
            }
        }
    }
}

/// One drafted driver's scored line within a player's race result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverResult {
    pub driver_id: String,
    pub driver_name: String,
    pub start_position: u32,
    /// `None` while no outcome has been recorded for this driver. A
    /// pending driver contributes zero points; it is never silently
    /// treated as "finished where it started".
    pub outcome: Option<FinishOutcome>,
    pub score: Option<DriverScore>,
}

impl DriverResult {
    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}

/// A player's full race result: one line per drafted driver plus the
/// total over scored lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRaceScore {
    pub player_id: String,
    pub driver_results: Vec<DriverResult>,
    pub total: i32,
    /// Number of drafted drivers still without an outcome. Zero once the
    /// classification covers the whole team; a nonzero value marks the
    /// total as provisional.
    pub pending: usize,
}

/// Score all of one player's picks against a classification.
pub fn score_player(
    player_id: &str,
    picks: &[DraftPick],
    classification: &RaceClassification,
) -> PlayerRaceScore {
    let mut driver_results = Vec::new();
    let mut total = 0;
    let mut pending = 0;

    for pick in picks.iter().filter(|p| p.player_id == player_id) {
        let outcome = classification.outcome(&pick.driver_id);
        let score = outcome.map(|outcome| {
            score_driver(
                pick.start_position,
                outcome,
                classification.has_fastest_lap(&pick.driver_id),
            )
        });
        match score {
            Some(s) => total += s.total,
            None => pending += 1,
        }
        driver_results.push(DriverResult {
            driver_id: pick.driver_id.clone(),
            driver_name: pick.driver_name.clone(),
            start_position: pick.start_position,
            outcome,
            score,
        });
    }

    PlayerRaceScore {
        player_id: player_id.to_string(),
        driver_results,
        total,
        pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn classified(pos: u32) -> FinishOutcome {
        FinishOutcome::Classified(pos)
    }

    #[test]
    fn pole_sitter_wins_without_fastest_lap() {
        let score = score_driver(1, classified(1), false);
        assert_eq!(score.movement_points, 0);
        assert_eq!(score.finish_bonus, 8);
        assert_eq!(score.fastest_lap_points, 0);
        assert_eq!(score.total, 8);
    }

    #[test]
    fn charge_from_tenth_to_win_with_fastest_lap() {
        let score = score_driver(10, classified(1), true);
        assert_eq!(score.movement_points, 18);
        assert_eq!(score.finish_bonus, 8);
        assert_eq!(score.fastest_lap_points, 3);
        assert_eq!(score.total, 29);
    }

    #[test]
    fn losing_positions_costs_one_each() {
        let score = score_driver(3, classified(8), false);
        assert_eq!(score.movement_points, -5);
        assert_eq!(score.finish_bonus, 0);
        assert_eq!(score.total, -5);
    }

    #[test]
    fn dnf_is_flat_penalty_regardless_of_start() {
        for start in [1, 5, 20] {
            let score = score_driver(start, FinishOutcome::Dnf, false);
            assert_eq!(score.total, DNF_PENALTY, "start P{start}");
            assert!(score.is_dnf);
            assert_eq!(score.finish_bonus, 0);
            assert_eq!(score.fastest_lap_points, 0);
        }
    }

    #[test]
    fn dnf_never_earns_fastest_lap() {
        let score = score_driver(5, FinishOutcome::Dnf, true);
        assert_eq!(score.total, -8);
    }

    #[test]
    fn fastest_lap_suppressed_outside_top_ten() {
        let score = score_driver(1, classified(11), true);
        assert_eq!(score.movement_points, -10);
        assert_eq!(score.finish_bonus, 0);
        assert_eq!(score.fastest_lap_points, 0);
        assert_eq!(score.total, -10);
    }

    #[test]
    fn fastest_lap_paid_exactly_at_cutoff() {
        assert_eq!(score_driver(10, classified(10), true).fastest_lap_points, 3);
        assert_eq!(score_driver(10, classified(11), true).fastest_lap_points, 0);
    }

    #[test]
    fn bonus_ladder() {
        assert_eq!(score_driver(2, classified(1), false).finish_bonus, 8);
        assert_eq!(score_driver(2, classified(2), false).finish_bonus, 4);
        assert_eq!(score_driver(2, classified(3), false).finish_bonus, 2);
        assert_eq!(score_driver(2, classified(4), false).finish_bonus, 1);
        assert_eq!(score_driver(2, classified(5), false).finish_bonus, 0);
    }

    fn pick(player: &str, driver: &str, number: u32, start: u32) -> DraftPick {
        DraftPick {
            pick_number: number,
            player_id: player.to_string(),
            driver_id: driver.to_string(),
            driver_name: driver.to_string(),
            start_position: start,
            picked_at: Utc::now(),
        }
    }

    #[test]
    fn player_total_sums_drivers() {
        let picks = vec![
            pick("p1", "VER", 1, 1),
            pick("p2", "NOR", 2, 2),
            pick("p1", "HAM", 3, 6),
        ];
        let mut class = RaceClassification::new();
        class.set_outcome("VER", classified(1)).unwrap(); // +8
        class.set_outcome("NOR", classified(2)).unwrap();
        class.set_outcome("HAM", classified(3)).unwrap(); // +6 movement +2 bonus
        class.set_fastest_lap(Some("HAM")).unwrap(); // +3

        let score = score_player("p1", &picks, &class);
        assert_eq!(score.driver_results.len(), 2);
        assert_eq!(score.total, 8 + 11);
        assert_eq!(score.pending, 0);
    }

    #[test]
    fn missing_outcome_is_pending_not_zero_movement() {
        let picks = vec![pick("p1", "VER", 1, 1), pick("p1", "HAM", 2, 6)];
        let mut class = RaceClassification::new();
        class.set_outcome("HAM", classified(4)).unwrap(); // +4 movement +1 bonus

        let score = score_player("p1", &picks, &class);
        assert_eq!(score.total, 5);
        assert_eq!(score.pending, 1);
        let ver = score.driver_results.iter().find(|r| r.driver_id == "VER").unwrap();
        assert!(ver.is_pending());
        // Crucially: a pending P1 starter is NOT paid the win bonus the
        // old "default finish to start" behavior would have granted.
        assert!(ver.score.is_none());
    }

    #[test]
    fn negative_team_total() {
        let picks = vec![pick("p1", "STR", 1, 13), pick("p1", "OCO", 2, 15)];
        let mut class = RaceClassification::new();
        class.set_outcome("STR", FinishOutcome::Dnf).unwrap();
        class.set_outcome("OCO", classified(18)).unwrap(); // -3
        let score = score_player("p1", &picks, &class);
        assert_eq!(score.total, -11);
    }
}
