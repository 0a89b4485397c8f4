use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workout::sequencer::{self, Position};
use crate::workout::{Interval, Phase, WorkoutPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Opened but never started.
    Idle,
    Running,
    Paused,
    Completed,
}

/// What `stop` does to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBehavior {
    /// Rewind to the first interval and pause.
    #[default]
    Reset,
    /// Pause and mark the session complete where it stands.
    Complete,
}

/// Mutable runtime state of one workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub plan: WorkoutPlan,
    pub current_phase_index: usize,
    pub current_interval_index: usize,
    pub time_remaining_secs: f64,
    pub is_running: bool,
    pub total_elapsed_secs: f64,
    pub calories_burned: f64,
    pub is_complete: bool,
    /// Set once a snapshot from the paired device has been applied.
    #[serde(default)]
    pub is_synced_with_companion: bool,
    #[serde(default)]
    pub workout_start_time: Option<DateTime<Utc>>,
    /// Whether the clock has ever run since the session was opened or reset.
    #[serde(default)]
    pub has_started: bool,
}

impl SessionState {
    /// Fresh, idle state positioned on the plan's first playable interval.
    pub fn new(plan: WorkoutPlan) -> Self {
        let position = sequencer::first_position(&plan);
        let time_remaining_secs = sequencer::current_interval(&plan, position)
            .map(|i| i.duration_secs)
            .unwrap_or(0.0);
        Self {
            current_phase_index: position.phase_index,
            current_interval_index: position.interval_index,
            is_complete: position.is_terminal(&plan),
            plan,
            time_remaining_secs,
            is_running: false,
            total_elapsed_secs: 0.0,
            calories_burned: 0.0,
            is_synced_with_companion: false,
            workout_start_time: None,
            has_started: false,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.current_phase_index, self.current_interval_index)
    }

    pub fn set_position(&mut self, position: Position) {
        self.current_phase_index = position.phase_index;
        self.current_interval_index = position.interval_index;
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.plan.phases.get(self.current_phase_index)
    }

    pub fn current_interval(&self) -> Option<Interval> {
        sequencer::current_interval(&self.plan, self.position())
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_complete {
            SessionStatus::Completed
        } else if self.is_running {
            SessionStatus::Running
        } else if self.has_started {
            SessionStatus::Paused
        } else {
            SessionStatus::Idle
        }
    }

    /// 0.0 .. 100.0 progress through the plan by position.
    pub fn plan_progress_pct(&self) -> f64 {
        let total = self.plan.total_duration_secs();
        if total <= 0.0 {
            return 0.0;
        }
        if self.position().is_terminal(&self.plan) {
            return 100.0;
        }
        let before_phase = self.plan.cumulative_secs(self.current_phase_index);
        let within_phase = match self.current_phase() {
            Some(Phase::Active(active)) => active
                .intervals
                .iter()
                .take(self.current_interval_index)
                .map(|i| i.duration_secs)
                .sum(),
            _ => 0.0,
        };
        let within_interval = self
            .current_interval()
            .map(|i| (i.duration_secs - self.time_remaining_secs).max(0.0))
            .unwrap_or(0.0);
        ((before_phase + within_phase + within_interval) / total * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_idle_on_first_interval() {
        let state = SessionState::new(WorkoutPlan::sample());
        assert_eq!(state.status(), SessionStatus::Idle);
        assert_eq!(state.position(), Position::START);
        assert_eq!(state.time_remaining_secs, 300.0);
        assert_eq!(state.plan_progress_pct(), 0.0);
    }

    #[test]
    fn empty_plan_is_complete_from_the_start() {
        let state = SessionState::new(WorkoutPlan::new("Nothing", vec![]));
        assert!(state.is_complete);
        assert_eq!(state.time_remaining_secs, 0.0);
        assert_eq!(state.status(), SessionStatus::Completed);
    }

    #[test]
    fn progress_counts_elapsed_part_of_current_interval() {
        let mut state = SessionState::new(WorkoutPlan::sample());
        state.set_position(Position::new(1, 1));
        state.time_remaining_secs = 15.0;
        // 300 (phase 0) + 30 (sprint) + 15 of recover, out of 720.
        let expected = 345.0 / 720.0 * 100.0;
        assert!((state.plan_progress_pct() - expected).abs() < 1e-9);
    }
}
