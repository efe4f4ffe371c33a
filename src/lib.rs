// gridpick: snake-draft engine and post-race scoring for a small
// fantasy Formula 1 league.

pub mod config;
pub mod db;
pub mod draft;
pub mod feed;
pub mod grid;
pub mod results;
pub mod scoring;
pub mod tiers;
