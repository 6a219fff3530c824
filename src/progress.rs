//! Level-unlock and progress aggregation over a caller-supplied snapshot.
//!
//! Everything here is a pure, total function: no state, no I/O, and no error
//! paths. Missing records, unknown levels, and zero-valued thresholds all
//! resolve to the closed outcome (locked / 0 / absent) instead of failing.
//! If a snapshot carries more than one record for a level, the first match
//! wins; the snapshot provider is expected to guarantee uniqueness.

use crate::domain::{LevelInfo, UserProgress};
use crate::levels::level_catalog;

/// Catalog lookup by level number. `None` for anything outside 1..=10.
pub fn get_level_info(level: u32) -> Option<&'static LevelInfo> {
    level_catalog().iter().find(|l| l.level == level)
}

/// Is `level` open for a user with this progress snapshot?
///
/// Level 1 is unconditionally open. Any later level requires the previous
/// level's record to exist and to carry at least the target level's
/// `required_to_unlock` correct answers. A level the catalog doesn't know
/// can never open.
pub fn is_level_unlocked(progress: &[UserProgress], level: u32) -> bool {
    if level == 1 {
        return true;
    }
    let prev = match level.checked_sub(1) {
        Some(p) if p > 0 => p,
        _ => return false,
    };

    let prev_progress = progress.iter().find(|p| p.level == prev);
    let info = get_level_info(level);

    match (prev_progress, info) {
        (Some(p), Some(info)) => p.correct_answers >= info.required_to_unlock,
        _ => false,
    }
}

/// Overall completion percentage, 0..=100.
///
/// Correct answers across the snapshot, measured against the sum of the
/// unlock thresholds of the whole catalog, rounded and capped at 100.
pub fn overall_progress(progress: &[UserProgress]) -> u8 {
    if progress.is_empty() {
        return 0;
    }

    let total_correct: u64 = progress.iter().map(|p| u64::from(p.correct_answers)).sum();
    let total_required: u64 = level_catalog()
        .iter()
        .map(|l| u64::from(l.required_to_unlock))
        .sum();
    if total_required == 0 {
        return 0;
    }

    let pct = total_correct as f64 / total_required as f64 * 100.0;
    pct.round().min(100.0) as u8
}

/// Per-level progress-bar percentage for the dashboard.
///
/// 0 until the user has answered something at the level. A zero threshold
/// (level 1 in the canonical catalog) displays as 100 rather than dividing
/// by zero; the unlock decision itself never consults this value.
pub fn level_progress_percent(record: Option<&UserProgress>, info: &LevelInfo) -> u8 {
    let p = match record {
        Some(p) if p.completed_problems > 0 => p,
        _ => return 0,
    };
    if info.required_to_unlock == 0 {
        return 100;
    }
    let pct = f64::from(p.correct_answers) / f64::from(info.required_to_unlock) * 100.0;
    pct.min(100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rec(level: u32, completed: u32, correct: u32) -> UserProgress {
        UserProgress {
            user_id: "u1".into(),
            level,
            completed_problems: completed,
            correct_answers: correct,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn level_one_is_always_unlocked() {
        assert!(is_level_unlocked(&[], 1));
        assert!(is_level_unlocked(&[rec(5, 3, 1)], 1));
    }

    #[test]
    fn missing_prior_record_locks_every_later_level() {
        for level in 2..=10 {
            assert!(!is_level_unlocked(&[], level), "level {level} should be locked");
        }
        // A record for some other level doesn't help either.
        assert!(!is_level_unlocked(&[rec(1, 7, 7)], 3));
    }

    #[test]
    fn unlock_boundary_is_exactly_the_threshold() {
        for level in 2..=10u32 {
            let required = get_level_info(level).expect("catalog entry").required_to_unlock;
            let at = vec![rec(level - 1, required, required)];
            assert!(is_level_unlocked(&at, level), "level {level} at threshold");
            if required > 0 {
                let below = vec![rec(level - 1, required, required - 1)];
                assert!(!is_level_unlocked(&below, level), "level {level} below threshold");
            }
        }
    }

    #[test]
    fn seven_correct_at_level_one_opens_level_two() {
        assert!(is_level_unlocked(&[rec(1, 7, 7)], 2));
        assert!(!is_level_unlocked(&[rec(1, 6, 6)], 2));
    }

    #[test]
    fn out_of_range_levels_resolve_closed() {
        let progress = vec![rec(1, 7, 7)];
        assert!(!is_level_unlocked(&progress, 0));
        assert!(!is_level_unlocked(&progress, 11));
        assert!(!is_level_unlocked(&progress, 9999));
        // Even a finished level 10 opens nothing beyond the catalog.
        assert!(!is_level_unlocked(&[rec(10, 100, 100)], 11));
    }

    #[test]
    fn duplicate_level_records_use_the_first_match() {
        let progress = vec![rec(1, 3, 3), rec(1, 7, 7)];
        assert!(!is_level_unlocked(&progress, 2));
    }

    #[test]
    fn overall_progress_of_empty_snapshot_is_zero() {
        assert_eq!(overall_progress(&[]), 0);
    }

    #[test]
    fn overall_progress_matches_the_catalog_denominator() {
        // Catalog thresholds are [0, 7×9] = 63 total; 7 + 3 correct → 16%.
        let progress = vec![rec(1, 7, 7), rec(2, 5, 3)];
        assert_eq!(overall_progress(&progress), 16);
    }

    #[test]
    fn overall_progress_is_monotone_in_correct_answers() {
        let mut last = 0u8;
        for correct in 0..=70 {
            let pct = overall_progress(&[rec(1, correct, correct)]);
            assert!(pct >= last, "{correct} correct regressed {last} -> {pct}");
            last = pct;
        }
    }

    #[test]
    fn overall_progress_is_capped_at_one_hundred() {
        assert_eq!(overall_progress(&[rec(1, 10_000, 10_000)]), 100);
    }

    #[test]
    fn overall_progress_survives_extreme_counters() {
        // Several maxed-out records must still cap at 100, not overflow.
        let progress = vec![
            rec(1, u32::MAX, u32::MAX),
            rec(2, u32::MAX, u32::MAX),
            rec(3, u32::MAX, u32::MAX),
        ];
        assert_eq!(overall_progress(&progress), 100);
    }

    #[test]
    fn catalog_lookup_round_trips_and_rejects_unknown_levels() {
        for level in 1..=10 {
            let info = get_level_info(level).expect("catalog entry");
            assert_eq!(info.level, level);
        }
        assert!(get_level_info(0).is_none());
        assert!(get_level_info(11).is_none());
    }

    #[test]
    fn level_percent_is_zero_before_any_answer() {
        let info = get_level_info(2).unwrap();
        assert_eq!(level_progress_percent(None, info), 0);
        assert_eq!(level_progress_percent(Some(&rec(2, 0, 0)), info), 0);
    }

    #[test]
    fn level_percent_tracks_correct_answers_and_clamps() {
        let info = get_level_info(2).unwrap();
        assert_eq!(level_progress_percent(Some(&rec(2, 4, 3)), info), 43);
        assert_eq!(level_progress_percent(Some(&rec(2, 7, 7)), info), 100);
        assert_eq!(level_progress_percent(Some(&rec(2, 30, 30)), info), 100);
    }

    #[test]
    fn zero_threshold_level_displays_as_complete_once_started() {
        let info = get_level_info(1).unwrap();
        assert_eq!(level_progress_percent(Some(&rec(1, 1, 0)), info), 100);
        assert_eq!(level_progress_percent(None, info), 0);
    }
}
