// Season standings: per-race player totals rolled up across the season.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::draft::Roster;

/// One race's contribution to a player's season total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceScore {
    pub race_id: String,
    pub race_name: String,
    pub race_number: u32,
    pub player_id: String,
    pub points: i32,
}

/// A player's season standing with the per-race breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonStanding {
    pub player_id: String,
    pub player_name: String,
    pub color: String,
    pub total_points: i32,
    pub races_completed: usize,
    pub breakdown: Vec<RaceScore>,
}

/// Roll per-race scores up into season standings, sorted by total points
/// descending (ties keep roster slot order, so the table is stable).
///
/// Players with no scored races yet still appear, at zero.
pub fn season_standings(roster: &Roster, race_scores: &[RaceScore]) -> Vec<SeasonStanding> {
    let mut by_player: HashMap<&str, Vec<&RaceScore>> = HashMap::new();
    for score in race_scores {
        by_player.entry(score.player_id.as_str()).or_default().push(score);
    }

    let mut standings: Vec<SeasonStanding> = roster
        .iter()
        .map(|player| {
            let mut breakdown: Vec<RaceScore> = by_player
                .get(player.id.as_str())
                .map(|scores| scores.iter().map(|s| (*s).clone()).collect())
                .unwrap_or_default();
            breakdown.sort_by_key(|s| s.race_number);
            SeasonStanding {
                player_id: player.id.clone(),
                player_name: player.display_name.clone(),
                color: player.color.clone(),
                total_points: breakdown.iter().map(|s| s.points).sum(),
                races_completed: breakdown.len(),
                breakdown,
            }
        })
        .collect();

    standings.sort_by_key(|s| std::cmp::Reverse(s.total_points));
    standings
}
