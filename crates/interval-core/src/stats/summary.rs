use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::CompletedWorkout;
use super::streak::compute_streak;

/// Headline numbers for the history screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub last_workout_date: Option<DateTime<Utc>>,
    pub workouts_this_week: usize,
    pub workouts_this_month: usize,
    pub calories_this_week: f64,
    pub calories_this_month: f64,
    pub current_streak: u32,
}

pub fn summarize(workouts: &[CompletedWorkout], today: NaiveDate) -> WorkoutSummary {
    let this_week = today.iso_week();
    let in_week: Vec<_> = workouts
        .iter()
        .filter(|w| w.date.date_naive().iso_week() == this_week)
        .collect();
    let in_month: Vec<_> = workouts
        .iter()
        .filter(|w| {
            let d = w.date.date_naive();
            d.year() == today.year() && d.month() == today.month()
        })
        .collect();

    WorkoutSummary {
        last_workout_date: workouts.iter().map(|w| w.date).max(),
        workouts_this_week: in_week.len(),
        workouts_this_month: in_month.len(),
        calories_this_week: in_week.iter().map(|w| w.calories_burned).sum(),
        calories_this_month: in_month.iter().map(|w| w.calories_burned).sum(),
        current_streak: compute_streak(workouts, today),
    }
}
