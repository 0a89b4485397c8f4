//! Pure navigation through a plan's phases and intervals.
//!
//! A [`Position`] is a `(phase_index, interval_index)` pair. The position
//! whose `phase_index == plan.phases.len()` is the terminal sentinel. A rest
//! phase is played as one synthetic interval, and an active phase without
//! intervals is stepped over in both directions.

use super::plan::{Interval, Phase, WorkoutPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub phase_index: usize,
    pub interval_index: usize,
}

impl Position {
    pub const START: Position = Position {
        phase_index: 0,
        interval_index: 0,
    };

    pub fn new(phase_index: usize, interval_index: usize) -> Self {
        Self {
            phase_index,
            interval_index,
        }
    }

    pub fn terminal(plan: &WorkoutPlan) -> Self {
        Self::new(plan.phases.len(), 0)
    }

    pub fn is_terminal(&self, plan: &WorkoutPlan) -> bool {
        self.phase_index >= plan.phases.len()
    }
}

/// Result of [`advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub position: Position,
    /// The plan has been played through; `position` is the terminal sentinel.
    pub completed: bool,
}

/// The interval playing at `pos`, or `None` in the terminal state.
///
/// Rest phases yield a synthetic "Rest" interval of the phase's duration.
/// An active phase yields `None` when `interval_index` is out of range,
/// which includes every position inside an empty phase.
pub fn current_interval(plan: &WorkoutPlan, pos: Position) -> Option<Interval> {
    match plan.phases.get(pos.phase_index)? {
        Phase::Active(active) => active.intervals.get(pos.interval_index).cloned(),
        Phase::Rest(rest) => Some(Interval::rest(rest.duration_secs)),
    }
}

/// First playable position of the plan, skipping leading empty phases.
pub fn first_position(plan: &WorkoutPlan) -> Position {
    skip_empty_forward(plan, Position::START)
}

pub fn advance(plan: &WorkoutPlan, pos: Position) -> Advance {
    let Some(phase) = plan.phases.get(pos.phase_index) else {
        return Advance {
            position: Position::terminal(plan),
            completed: true,
        };
    };

    let next = match phase {
        Phase::Active(active) if pos.interval_index + 1 < active.intervals.len() => {
            Position::new(pos.phase_index, pos.interval_index + 1)
        }
        // Exhausted active phase, or a rest phase (always consumed in one step).
        _ => Position::new(pos.phase_index + 1, 0),
    };

    let next = skip_empty_forward(plan, next);
    if next.is_terminal(plan) {
        Advance {
            position: Position::terminal(plan),
            completed: true,
        }
    } else {
        Advance {
            position: next,
            completed: false,
        }
    }
}

/// Step back one interval. Never wraps and never moves before the first
/// playable interval; at that point it is a no-op.
pub fn rewind(plan: &WorkoutPlan, pos: Position) -> Position {
    if pos.interval_index > 0 {
        return Position::new(pos.phase_index, pos.interval_index - 1);
    }

    let upper = pos.phase_index.min(plan.phases.len());
    (0..upper)
        .rev()
        .find_map(|index| match &plan.phases[index] {
            Phase::Active(active) if active.intervals.is_empty() => None,
            phase => Some(Position::new(index, phase.interval_count() - 1)),
        })
        .unwrap_or(pos)
}

fn skip_empty_forward(plan: &WorkoutPlan, mut pos: Position) -> Position {
    while let Some(Phase::Active(active)) = plan.phases.get(pos.phase_index) {
        if !active.intervals.is_empty() {
            break;
        }
        pos = Position::new(pos.phase_index + 1, 0);
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::plan::{ActivePhase, IntervalKind, RestPhase};
    use proptest::prelude::*;

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

    #[test]
    fn scenario_walks_through_rest_and_completes() {
        let plan = scenario_plan();
        let pos = first_position(&plan);
        assert_eq!(pos, Position::START);
        assert_eq!(current_interval(&plan, pos).unwrap().duration_secs, 30.0);

        let step = advance(&plan, pos);
        assert_eq!(step.position, Position::new(1, 0));
        let rest = current_interval(&plan, step.position).unwrap();
        assert_eq!(rest.name, "Rest");
        assert_eq!(rest.kind, IntervalKind::LowIntensity);
        assert_eq!(rest.duration_secs, 60.0);

        let step = advance(&plan, step.position);
        assert_eq!(step.position, Position::new(2, 0));
        assert_eq!(current_interval(&plan, step.position).unwrap().name, "B");

        let step = advance(&plan, step.position);
        assert_eq!(step.position, Position::new(2, 1));
        assert_eq!(current_interval(&plan, step.position).unwrap().name, "C");

        let step = advance(&plan, step.position);
        assert!(step.completed);
        assert!(current_interval(&plan, step.position).is_none());
    }

    #[test]
    fn advance_from_terminal_stays_completed() {
        let plan = scenario_plan();
        let step = advance(&plan, Position::terminal(&plan));
        assert!(step.completed);
        assert_eq!(step.position, Position::terminal(&plan));
    }

    #[test]
    fn rewind_crosses_into_previous_active_phase_last_interval() {
        let plan = WorkoutPlan::new(
            "Two",
            vec![
                Phase::Active(ActivePhase::new(vec![
                    Interval::new("A", IntervalKind::Warmup, 10.0),
                    Interval::new("B", IntervalKind::Warmup, 10.0),
                ])),
                Phase::Rest(RestPhase::new(5.0)),
            ],
        );
        assert_eq!(rewind(&plan, Position::new(1, 0)), Position::new(0, 1));
        assert_eq!(rewind(&plan, Position::new(0, 1)), Position::new(0, 0));
    }

    #[test]
    fn rewind_into_rest_phase_lands_on_zero() {
        let plan = scenario_plan();
        assert_eq!(rewind(&plan, Position::new(2, 0)), Position::new(1, 0));
    }

    #[test]
    fn rewind_at_start_is_idempotent() {
        let plan = scenario_plan();
        let mut pos = Position::START;
        for _ in 0..3 {
            pos = rewind(&plan, pos);
            assert_eq!(pos, Position::START);
        }
    }

    #[test]
    fn empty_active_phases_are_stepped_over() {
        let plan = WorkoutPlan::new(
            "Gappy",
            vec![
                Phase::Active(ActivePhase::new(vec![])),
                Phase::Active(ActivePhase::new(vec![Interval::new(
                    "A",
                    IntervalKind::Warmup,
                    10.0,
                )])),
                Phase::Active(ActivePhase::new(vec![])),
                Phase::Rest(RestPhase::new(5.0)),
                Phase::Active(ActivePhase::new(vec![])),
            ],
        );
        let start = first_position(&plan);
        assert_eq!(start, Position::new(1, 0));

        let step = advance(&plan, start);
        assert_eq!(step.position, Position::new(3, 0));
        assert!(!step.completed);

        assert_eq!(rewind(&plan, step.position), start);
        assert_eq!(rewind(&plan, start), start);

        assert!(advance(&plan, step.position).completed);
        assert!(current_interval(&plan, Position::new(0, 0)).is_none());
    }

    #[test]
    fn plan_without_playable_phase_starts_terminal() {
        let plan = WorkoutPlan::new("Empty", vec![Phase::Active(ActivePhase::new(vec![]))]);
        assert!(first_position(&plan).is_terminal(&plan));

        let plan = WorkoutPlan::new("Nothing", vec![]);
        assert!(first_position(&plan).is_terminal(&plan));
        assert!(advance(&plan, Position::START).completed);
    }

    fn arb_plan() -> impl Strategy<Value = WorkoutPlan> {
        let phase = prop_oneof![
            prop::collection::vec(1.0f64..600.0, 0..5).prop_map(|durations| {
                Phase::Active(ActivePhase::new(
                    durations
                        .into_iter()
                        .map(|d| Interval::new("i", IntervalKind::HighIntensity, d))
                        .collect(),
                ))
            }),
            (1.0f64..600.0).prop_map(|d| Phase::Rest(RestPhase::new(d))),
        ];
        prop::collection::vec(phase, 1..6).prop_map(|phases| WorkoutPlan::new("p", phases))
    }

    proptest! {
        #[test]
        fn advancing_interval_count_times_completes_exactly(plan in arb_plan()) {
            let total = plan.interval_count();
            let mut pos = first_position(&plan);
            prop_assume!(!pos.is_terminal(&plan));
            for step in 1..=total {
                let next = advance(&plan, pos);
                prop_assert_eq!(next.completed, step == total);
                pos = next.position;
            }
        }

        #[test]
        fn rewind_then_advance_round_trips(plan in arb_plan(), steps in 1usize..20) {
            let mut pos = first_position(&plan);
            prop_assume!(!pos.is_terminal(&plan));
            for _ in 0..steps {
                let next = advance(&plan, pos);
                if next.completed {
                    break;
                }
                pos = next.position;
            }
            prop_assume!(pos != first_position(&plan));
            let back = rewind(&plan, pos);
            prop_assert_eq!(advance(&plan, back).position, pos);
        }
    }
}
