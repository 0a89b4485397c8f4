//! Workout session engine.
//!
//! The engine owns a [`SessionState`] and applies user intents and clock
//! ticks to it. It has no internal clock or thread: the caller invokes
//! `tick()` once per elapsed second while the session is running. The
//! async [`SessionRuntime`](super::SessionRuntime) does exactly that.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Completed
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = WorkoutSession::new(plan, StopBehavior::Reset);
//! session.toggle_running();
//! // once per second:
//! let events = session.tick();
//! ```

use chrono::{DateTime, Utc};

use super::state::{SessionState, SessionStatus, StopBehavior};
use crate::error::ValidationError;
use crate::events::Event;
use crate::stats::CompletedWorkout;
use crate::sync::WorkoutSyncSnapshot;
use crate::workout::sequencer::{self, Position};
use crate::workout::{Phase, WorkoutPlan};

#[derive(Debug, Clone)]
pub struct WorkoutSession {
    state: SessionState,
    stop_behavior: StopBehavior,
}

impl WorkoutSession {
    /// Open a session for `plan`. The clock does not run until
    /// [`toggle_running`](Self::toggle_running) is called.
    pub fn new(plan: WorkoutPlan, stop_behavior: StopBehavior) -> Self {
        Self {
            state: SessionState::new(plan),
            stop_behavior,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn to_sync_snapshot(&self) -> WorkoutSyncSnapshot {
        WorkoutSyncSnapshot::from_state(&self.state)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.state.status(),
            phase_index: self.state.current_phase_index,
            interval_index: self.state.current_interval_index,
            interval_name: self
                .state
                .current_interval()
                .map(|i| i.name)
                .unwrap_or_default(),
            remaining_secs: self.state.time_remaining_secs,
            total_elapsed_secs: self.state.total_elapsed_secs,
            plan_progress_pct: self.state.plan_progress_pct(),
            calories_burned: self.state.calories_burned,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Record when the workout began, for the energy query window.
    pub fn mark_started(&mut self, at: DateTime<Utc>) {
        self.state.workout_start_time = Some(at);
    }

    /// Flip between running and paused. A completed session cannot run.
    pub fn toggle_running(&mut self) -> Option<Event> {
        if self.state.is_complete {
            return None;
        }
        self.state.is_running = !self.state.is_running;
        if self.state.is_running {
            self.state.has_started = true;
            Some(Event::TimerStarted {
                phase_index: self.state.current_phase_index,
                interval_index: self.state.current_interval_index,
                remaining_secs: self.state.time_remaining_secs,
                at: Utc::now(),
            })
        } else {
            Some(Event::TimerPaused {
                remaining_secs: self.state.time_remaining_secs,
                at: Utc::now(),
            })
        }
    }

    /// One elapsed second. Ignored unless running; exhausting the current
    /// interval advances to the next one.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.state.is_running {
            return Vec::new();
        }
        self.state.time_remaining_secs -= 1.0;
        self.state.total_elapsed_secs += 1.0;

        let mut events = vec![Event::Ticked {
            remaining_secs: self.state.time_remaining_secs,
            total_elapsed_secs: self.state.total_elapsed_secs,
        }];
        if self.state.time_remaining_secs <= 0.0 || self.state.current_interval().is_none() {
            events.push(self.skip());
        }
        events
    }

    pub fn skip(&mut self) -> Event {
        let step = sequencer::advance(&self.state.plan, self.state.position());
        if step.completed {
            return self.complete();
        }

        self.state.set_position(step.position);
        let interval = self.state.current_interval();
        self.state.time_remaining_secs = interval.as_ref().map(|i| i.duration_secs).unwrap_or(0.0);
        match interval {
            Some(interval) => Event::IntervalAdvanced {
                phase_index: step.position.phase_index,
                interval_index: step.position.interval_index,
                interval_name: interval.name,
                kind: interval.kind,
                duration_secs: interval.duration_secs,
                at: Utc::now(),
            },
            None => self.complete(),
        }
    }

    /// Step back one interval, giving back the time spent in the interval
    /// being left.
    pub fn rewind(&mut self) -> Event {
        let spent = self
            .state
            .current_interval()
            .map(|i| (i.duration_secs - self.state.time_remaining_secs).max(0.0))
            .unwrap_or(0.0);
        self.state.total_elapsed_secs = (self.state.total_elapsed_secs - spent).max(0.0);

        let position = sequencer::rewind(&self.state.plan, self.state.position());
        self.state.set_position(position);
        self.state.time_remaining_secs = self
            .state
            .current_interval()
            .map(|i| i.duration_secs)
            .unwrap_or(0.0);
        if !position.is_terminal(&self.state.plan) {
            self.state.is_complete = false;
        }

        Event::IntervalRewound {
            phase_index: position.phase_index,
            interval_index: position.interval_index,
            total_elapsed_secs: self.state.total_elapsed_secs,
            at: Utc::now(),
        }
    }

    pub fn stop(&mut self) -> Event {
        match self.stop_behavior {
            StopBehavior::Reset => {
                self.reset_to_start();
                Event::WorkoutStopped { at: Utc::now() }
            }
            StopBehavior::Complete => {
                self.state.is_running = false;
                self.state.is_complete = true;
                self.completed_event()
            }
        }
    }

    /// Install an edited plan and restart it from its first interval, paused,
    /// with the elapsed clock back at zero.
    pub fn update_plan(&mut self, plan: WorkoutPlan) -> Event {
        let plan_id = plan.id;
        self.state.plan = plan;
        self.state.total_elapsed_secs = 0.0;
        self.reset_to_start();
        Event::PlanUpdated {
            plan_id,
            at: Utc::now(),
        }
    }

    pub fn set_calories(&mut self, calories_burned: f64) -> Event {
        self.state.calories_burned = calories_burned;
        Event::CaloriesUpdated {
            calories_burned,
            at: Utc::now(),
        }
    }

    /// Overwrite position, clock and running flag with a peer's snapshot.
    /// No ordering or conflict check: the last snapshot received wins.
    pub fn apply_snapshot(&mut self, snapshot: WorkoutSyncSnapshot) -> Event {
        self.state.is_running = snapshot.is_running;
        self.state.current_phase_index = snapshot.current_phase_index;
        self.state.current_interval_index = snapshot.current_interval_index;
        self.state.time_remaining_secs = snapshot.time_remaining_secs;
        self.state.total_elapsed_secs = snapshot.total_elapsed_secs;
        self.state.is_synced_with_companion = true;
        if matches!(self.state.current_phase(), Some(Phase::Rest(_))) {
            self.state.current_interval_index = 0;
        }

        if self.state.position().is_terminal(&self.state.plan) {
            // The peer may be playing a longer plan.
            self.state.set_position(Position::terminal(&self.state.plan));
            self.state.time_remaining_secs = 0.0;
            self.state.is_complete = true;
            self.state.is_running = false;
        } else if snapshot.is_running {
            self.state.is_complete = false;
        }
        if snapshot.is_running {
            self.state.has_started = true;
        }

        Event::SnapshotApplied {
            snapshot,
            at: Utc::now(),
        }
    }

    /// Record of the finished session, ready to be persisted.
    pub fn completed_workout(
        &self,
        rating: u8,
        date: DateTime<Utc>,
    ) -> Result<CompletedWorkout, ValidationError> {
        if !self.state.is_complete {
            return Err(ValidationError::InvalidValue {
                field: "session".into(),
                message: "only a completed session can be saved".into(),
            });
        }
        CompletedWorkout::new(
            self.state.plan.name.clone(),
            date,
            self.state.total_elapsed_secs,
            self.state.calories_burned,
            rating,
        )
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        self.state.set_position(Position::terminal(&self.state.plan));
        self.state.time_remaining_secs = 0.0;
        self.state.is_running = false;
        self.state.is_complete = true;
        self.completed_event()
    }

    fn completed_event(&self) -> Event {
        Event::WorkoutCompleted {
            total_elapsed_secs: self.state.total_elapsed_secs,
            calories_burned: self.state.calories_burned,
            at: Utc::now(),
        }
    }

    fn reset_to_start(&mut self) {
        let position = sequencer::first_position(&self.state.plan);
        self.state.set_position(position);
        self.state.is_running = false;
        self.state.has_started = false;
        self.state.is_complete = position.is_terminal(&self.state.plan);
        self.state.time_remaining_secs = self
            .state
            .current_interval()
            .map(|i| i.duration_secs)
            .unwrap_or(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{ActivePhase, Interval, IntervalKind, RestPhase};

    fn scenario_plan() -> WorkoutPlan {
        WorkoutPlan::new(
            "Scenario",
            vec![
                Phase::Active(ActivePhase::new(vec![Interval::new(
                    "A",
                    IntervalKind::Warmup,
                    30.0,
                )])),
                Phase::Rest(RestPhase::new(60.0)),
                Phase::Active(ActivePhase::new(vec![
                    Interval::new("B", IntervalKind::HighIntensity, 20.0),
                    Interval::new("C", IntervalKind::LowIntensity, 20.0),
                ])),
            ],
        )
    }

    fn session() -> WorkoutSession {
        WorkoutSession::new(scenario_plan(), StopBehavior::Reset)
    }

    #[test]
    fn toggle_running_and_pause() {
        let mut s = session();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert!(matches!(s.toggle_running(), Some(Event::TimerStarted { .. })));
        assert_eq!(s.status(), SessionStatus::Running);
        assert!(matches!(s.toggle_running(), Some(Event::TimerPaused { .. })));
        assert_eq!(s.status(), SessionStatus::Paused);
    }

    #[test]
    fn ticks_are_ignored_while_paused() {
        let mut s = session();
        assert!(s.tick().is_empty());
        assert_eq!(s.state().total_elapsed_secs, 0.0);
        assert_eq!(s.state().time_remaining_secs, 30.0);
    }

    #[test]
    fn elapsed_equals_tick_count() {
        let mut s = session();
        s.toggle_running();
        for _ in 0..45 {
            s.tick();
        }
        assert_eq!(s.state().total_elapsed_secs, 45.0);
        // 30s interval exhausted, 15s into the 60s rest.
        assert_eq!(s.state().position(), Position::new(1, 0));
        assert_eq!(s.state().time_remaining_secs, 45.0);
    }

    #[test]
    fn exhausting_an_interval_advances() {
        let mut s = session();
        s.toggle_running();
        let mut events = Vec::new();
        for _ in 0..30 {
            events.extend(s.tick());
        }
        assert!(matches!(
            events.last(),
            Some(Event::IntervalAdvanced { phase_index: 1, .. })
        ));
        assert_eq!(s.state().time_remaining_secs, 60.0);
        assert!(s.is_running());
    }

    #[test]
    fn running_through_the_plan_completes_and_stops_clock() {
        let mut s = session();
        s.toggle_running();
        let mut completed = false;
        for _ in 0..130 {
            if s.tick()
                .iter()
                .any(|e| matches!(e, Event::WorkoutCompleted { .. }))
            {
                completed = true;
            }
        }
        assert!(completed);
        assert_eq!(s.status(), SessionStatus::Completed);
        assert_eq!(s.state().total_elapsed_secs, 130.0);
        assert_eq!(s.state().time_remaining_secs, 0.0);
        assert!(s.state().current_interval().is_none());
        assert!(s.toggle_running().is_none());
    }

    #[test]
    fn skip_walks_the_scenario() {
        let mut s = session();
        s.skip();
        assert_eq!(s.state().position(), Position::new(1, 0));
        assert_eq!(s.state().time_remaining_secs, 60.0);
        s.skip();
        assert_eq!(s.state().position(), Position::new(2, 0));
        assert_eq!(s.state().time_remaining_secs, 20.0);
        s.skip();
        assert_eq!(s.state().position(), Position::new(2, 1));
        assert!(matches!(s.skip(), Event::WorkoutCompleted { .. }));
        assert!(s.state().is_complete);
    }

    #[test]
    fn rewind_gives_back_time_spent_in_current_interval() {
        let mut s = session();
        s.toggle_running();
        for _ in 0..40 {
            s.tick();
        }
        // 30s in A, 10s into rest.
        s.rewind();
        assert_eq!(s.state().position(), Position::START);
        assert_eq!(s.state().total_elapsed_secs, 30.0);
        assert_eq!(s.state().time_remaining_secs, 30.0);
    }

    #[test]
    fn rewind_never_makes_elapsed_negative() {
        let mut s = session();
        s.toggle_running();
        s.tick();
        s.rewind();
        s.rewind();
        assert_eq!(s.state().total_elapsed_secs, 0.0);
        assert_eq!(s.state().position(), Position::START);
    }

    #[test]
    fn stop_resets_to_first_interval() {
        let mut s = session();
        s.toggle_running();
        s.skip();
        s.skip();
        assert!(matches!(s.stop(), Event::WorkoutStopped { .. }));
        assert_eq!(s.state().position(), Position::START);
        assert_eq!(s.state().time_remaining_secs, 30.0);
        assert!(!s.is_running());
        assert_eq!(s.status(), SessionStatus::Idle);
    }

    #[test]
    fn stop_with_complete_behavior_marks_complete_in_place() {
        let mut s = WorkoutSession::new(scenario_plan(), StopBehavior::Complete);
        s.toggle_running();
        s.skip();
        assert!(matches!(s.stop(), Event::WorkoutCompleted { .. }));
        assert_eq!(s.state().position(), Position::new(1, 0));
        assert_eq!(s.status(), SessionStatus::Completed);
    }

    #[test]
    fn snapshot_round_trip_is_identity() {
        let mut s = session();
        s.toggle_running();
        for _ in 0..37 {
            s.tick();
        }
        let before = s.state().clone();
        let snapshot = s.to_sync_snapshot();
        s.apply_snapshot(snapshot);
        let after = s.state();
        assert_eq!(after.position(), before.position());
        assert_eq!(after.time_remaining_secs, before.time_remaining_secs);
        assert_eq!(after.total_elapsed_secs, before.total_elapsed_secs);
        assert_eq!(after.is_running, before.is_running);
        assert_eq!(after.status(), before.status());
        assert!(after.is_synced_with_companion);
    }

    #[test]
    fn applying_peer_snapshot_overwrites_unconditionally() {
        let mut s = session();
        s.toggle_running();
        for _ in 0..5 {
            s.tick();
        }
        // An older snapshot still wins.
        s.apply_snapshot(WorkoutSyncSnapshot {
            is_running: false,
            current_phase_index: 0,
            current_interval_index: 0,
            time_remaining_secs: 29.0,
            total_elapsed_secs: 1.0,
        });
        assert!(!s.is_running());
        assert_eq!(s.state().total_elapsed_secs, 1.0);
        assert_eq!(s.state().time_remaining_secs, 29.0);
        assert_eq!(s.status(), SessionStatus::Paused);
    }

    #[test]
    fn snapshot_past_the_end_of_the_plan_lands_on_terminal_position() {
        let mut s = WorkoutSession::new(
            WorkoutPlan::new(
                "Short",
                vec![Phase::Active(ActivePhase::new(vec![Interval::new(
                    "Only",
                    IntervalKind::HighIntensity,
                    30.0,
                )]))],
            ),
            StopBehavior::Reset,
        );
        s.apply_snapshot(WorkoutSyncSnapshot {
            is_running: true,
            current_phase_index: 7,
            current_interval_index: 3,
            time_remaining_secs: 5.0,
            total_elapsed_secs: 90.0,
        });
        let state = s.state();
        assert!(state.current_phase_index <= state.plan.phases.len());
        assert_eq!(state.position(), Position::terminal(&state.plan));
        assert_eq!(state.time_remaining_secs, 0.0);
        assert_eq!(state.total_elapsed_secs, 90.0);
        assert!(!s.is_running());
        assert_eq!(s.status(), SessionStatus::Completed);
    }

    #[test]
    fn snapshot_inside_rest_phase_uses_interval_zero() {
        let mut s = session();
        s.apply_snapshot(WorkoutSyncSnapshot {
            is_running: false,
            current_phase_index: 1,
            current_interval_index: 4,
            time_remaining_secs: 42.0,
            total_elapsed_secs: 48.0,
        });
        assert_eq!(s.state().position(), Position::new(1, 0));
        assert_eq!(s.state().current_interval().map(|i| i.name), Some("Rest".into()));
        assert_eq!(s.state().time_remaining_secs, 42.0);
    }

    #[test]
    fn completed_workout_requires_completion_and_valid_rating() {
        let mut s = session();
        assert!(s.completed_workout(4, Utc::now()).is_err());
        for _ in 0..4 {
            s.skip();
        }
        assert!(s.completed_workout(0, Utc::now()).is_err());
        let record = s.completed_workout(5, Utc::now()).unwrap();
        assert_eq!(record.name, "Scenario");
        assert_eq!(record.rating, 5);
    }

    #[test]
    fn update_plan_restarts_paused() {
        let mut s = session();
        s.toggle_running();
        s.skip();
        let plan = WorkoutPlan::sample();
        let id = plan.id;
        assert!(matches!(s.update_plan(plan), Event::PlanUpdated { plan_id, .. } if plan_id == id));
        assert_eq!(s.state().position(), Position::START);
        assert_eq!(s.state().time_remaining_secs, 300.0);
        assert!(!s.is_running());
    }
}
