//! Completed-workout history and the figures derived from it.
//!
//! Everything here is a pure function over already-fetched records.

mod record;
mod streak;
mod summary;
mod weekly;

pub use record::CompletedWorkout;
pub use streak::{compute_streak, current_streak};
pub use summary::{summarize, WorkoutSummary};
pub use weekly::{group_by_week, week_start, WeeklyWorkouts};
