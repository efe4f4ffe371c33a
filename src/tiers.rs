// Tier banding: maps a grid position to one of four fixed rank bands.

/// Width of each tier band in grid positions.
pub const TIER_BAND_WIDTH: u32 = 5;

/// Number of tiers. Positions beyond the last full band all land in the
/// final tier.
pub const TIER_COUNT: u8 = 4;

/// Map a starting grid position (1-based) to its tier.
///
/// P1-P5 -> tier 1, P6-P10 -> tier 2, P11-P15 -> tier 3, P16 and beyond
/// -> tier 4. Total over all positive positions and monotonic: a worse
/// grid slot never produces a better tier.
pub fn tier_for_position(start_position: u32) -> u8 {
    debug_assert!(start_position >= 1, "grid positions are 1-based");
    let band = (start_position.saturating_sub(1) / TIER_BAND_WIDTH) + 1;
    band.min(TIER_COUNT as u32) as u8
}

/// Human-readable label for a tier, as shown in the draft board.
pub fn tier_label(tier: u8) -> &'static str {
    match tier {
        1 => "Front Runners (P1-P5)",
        2 => "Midfield (P6-P10)",
        3 => "Back of Grid (P11-P15)",
        _ => "Tail End (P16+)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(tier_for_position(1), 1);
        assert_eq!(tier_for_position(5), 1);
        assert_eq!(tier_for_position(6), 2);
        assert_eq!(tier_for_position(10), 2);
        assert_eq!(tier_for_position(11), 3);
        assert_eq!(tier_for_position(15), 3);
        assert_eq!(tier_for_position(16), 4);
        assert_eq!(tier_for_position(20), 4);
    }

    #[test]
    fn positions_beyond_field_stay_in_last_tier() {
        assert_eq!(tier_for_position(21), 4);
        assert_eq!(tier_for_position(99), 4);
    }

    #[test]
    fn monotonic_non_decreasing() {
        let mut prev = tier_for_position(1);
        for pos in 2..=60 {
            let tier = tier_for_position(pos);
            assert!(tier >= prev, "tier regressed at P{pos}");
            prev = tier;
        }
    }

    #[test]
    fn labels_cover_all_tiers() {
        for tier in 1..=TIER_COUNT {
            assert!(!tier_label(tier).is_empty());
        }
    }
}
