use std::collections::HashSet;

use chrono::{NaiveDate, Utc};

use super::record::CompletedWorkout;

/// Consecutive missed days that end a streak.
const MAX_CONSECUTIVE_GAP_DAYS: u32 = 1;

/// Count workout days walking back from `today`.
///
/// A single missed day is tolerated; two missed days in a row end the
/// streak. Days are UTC calendar days.
///
/// Today and yesterday get no grace of their own: with no workout on either,
/// the streak is already over, even if the two days before were active.
pub fn compute_streak(workouts: &[CompletedWorkout], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = workouts.iter().map(|w| w.date.date_naive()).collect();
    if days.is_empty() {
        return 0;
    }

    let mut streak = 0;
    let mut missed_in_a_row = 0;
    let mut day = today;
    loop {
        if days.contains(&day) {
            streak += 1;
            missed_in_a_row = 0;
        } else {
            missed_in_a_row += 1;
            if missed_in_a_row > MAX_CONSECUTIVE_GAP_DAYS {
                break;
            }
        }
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Streak as of the current UTC day.
pub fn current_streak(workouts: &[CompletedWorkout]) -> u32 {
    compute_streak(workouts, Utc::now().date_naive())
}
