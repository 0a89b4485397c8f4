use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionStatus;
use crate::sync::WorkoutSyncSnapshot;
use crate::workout::IntervalKind;

/// Every state change of a workout session produces an Event.
/// The CLI prints them; the session runtime broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A session screen was opened for a plan.
    SessionOpened {
        plan_id: Uuid,
        plan_name: String,
        at: DateTime<Utc>,
    },
    /// The session was dismissed; background work has been cancelled.
    SessionClosed {
        at: DateTime<Utc>,
    },
    TimerStarted {
        phase_index: usize,
        interval_index: usize,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    Ticked {
        remaining_secs: f64,
        total_elapsed_secs: f64,
    },
    IntervalAdvanced {
        phase_index: usize,
        interval_index: usize,
        interval_name: String,
        kind: IntervalKind,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    IntervalRewound {
        phase_index: usize,
        interval_index: usize,
        total_elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    /// Stopped and reset to the first interval.
    WorkoutStopped {
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        total_elapsed_secs: f64,
        calories_burned: f64,
        at: DateTime<Utc>,
    },
    PlanUpdated {
        plan_id: Uuid,
        at: DateTime<Utc>,
    },
    CaloriesUpdated {
        calories_burned: f64,
        at: DateTime<Utc>,
    },
    /// A peer snapshot overwrote the local position and clock.
    SnapshotApplied {
        snapshot: WorkoutSyncSnapshot,
        at: DateTime<Utc>,
    },
    HealthQueryFailed {
        message: String,
        at: DateTime<Utc>,
    },
    CompletedWorkoutSaved {
        workout_id: Uuid,
        at: DateTime<Utc>,
    },
    CompletedWorkoutSaveFailed {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        phase_index: usize,
        interval_index: usize,
        interval_name: String,
        remaining_secs: f64,
        total_elapsed_secs: f64,
        plan_progress_pct: f64,
        calories_burned: f64,
        at: DateTime<Utc>,
    },
}
