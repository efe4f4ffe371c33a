// Pick records: one committed claim of one driver by one player.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single committed draft pick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPick {
    /// Sequential pick number, 1-based, gapless, assigned at commit time.
    pub pick_number: u32,
    /// Id of the player who made the pick.
    pub player_id: String,
    /// Id of the drafted driver (three-letter code).
    pub driver_id: String,
    /// Display name of the drafted driver.
    pub driver_name: String,
    /// The driver's grid position captured at pick time, so scoring never
    /// needs the original grid again.
    pub start_position: u32,
    /// When the pick was committed.
    pub picked_at: DateTime<Utc>,
}
