// Post-race scoring: per-driver point breakdowns, per-player race totals,
// and the season standings rollup.

pub mod points;
pub mod standings;

pub use points::{score_driver, score_player, DriverResult, DriverScore, PlayerRaceScore};
pub use standings::{season_standings, RaceScore, SeasonStanding};
