//! The aggressiveness tuning table consulted by the envelope slewer.

/// `(tau_seconds, rmax_deg_per_sec)` for aggressiveness levels 1..=11, indexed
/// `level - 1`. Level 0 is handled separately by the caller (keep current
/// values clamped to the level-0 envelope).
pub const TUNING_TABLE: [(f32, f32); 11] = [
    (1.00, 20.0),
    (0.90, 30.0),
    (0.80, 40.0),
    (0.70, 50.0),
    (0.60, 60.0),
    (0.50, 75.0),
    (0.30, 90.0),
    (0.20, 120.0),
    (0.15, 160.0),
    (0.10, 210.0),
    (0.10, 300.0),
];

/// Look up the tuning table row for a clamped, non-zero aggressiveness
/// level. Returns `None` for level 0, which has no table row.
pub fn tuning_row(level: u8) -> Option<(f32, f32)> {
    if level == 0 {
        return None;
    }
    let idx = (level.min(11) - 1) as usize;
    TUNING_TABLE.get(idx).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_zero_has_no_row() {
        assert_eq!(tuning_row(0), None);
    }

    #[test]
    fn level_one_matches_first_row() {
        assert_eq!(tuning_row(1), Some((1.00, 20.0)));
    }

    #[test]
    fn level_above_eleven_clamps_to_last_row() {
        assert_eq!(tuning_row(200), Some((0.10, 300.0)));
    }
}
