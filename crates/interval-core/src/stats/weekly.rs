use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::record::CompletedWorkout;

/// Workouts of one ISO week (Monday start, UTC dates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyWorkouts {
    pub week_start: NaiveDate,
    /// Newest first.
    pub workouts: Vec<CompletedWorkout>,
}

impl WeeklyWorkouts {
    pub fn total_duration_secs(&self) -> f64 {
        self.workouts.iter().map(|w| w.duration_secs).sum()
    }

    pub fn total_calories(&self) -> f64 {
        self.workouts.iter().map(|w| w.calories_burned).sum()
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Group workouts by ISO week, newest week first, newest workout first.
pub fn group_by_week(workouts: &[CompletedWorkout]) -> Vec<WeeklyWorkouts> {
    let mut weeks: BTreeMap<NaiveDate, Vec<CompletedWorkout>> = BTreeMap::new();
    for workout in workouts {
        weeks
            .entry(week_start(workout.date.date_naive()))
            .or_default()
            .push(workout.clone());
    }

    weeks
        .into_iter()
        .rev()
        .map(|(week_start, mut workouts)| {
            workouts.sort_by(|a, b| b.date.cmp(&a.date));
            WeeklyWorkouts {
                week_start,
                workouts,
            }
        })
        .collect()
}
