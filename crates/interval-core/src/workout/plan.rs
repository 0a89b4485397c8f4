//! Workout plan value types.
//!
//! A [`WorkoutPlan`] is an ordered list of [`Phase`]s. An active phase holds
//! an ordered list of [`Interval`]s; a rest phase is a single timed block.
//! Plans are replaced wholesale on edit: the editing helpers here return
//! `Result` and leave the plan untouched on error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Warmup,
    HighIntensity,
    LowIntensity,
    CoolDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub id: Uuid,
    pub name: String,
    pub kind: IntervalKind,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl Interval {
    pub fn new(name: impl Into<String>, kind: IntervalKind, duration_secs: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            duration_secs,
        }
    }

    /// The single interval a rest phase is played as.
    pub fn rest(duration_secs: f64) -> Self {
        Self {
            id: Uuid::nil(),
            name: "Rest".into(),
            kind: IntervalKind::LowIntensity,
            duration_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePhase {
    pub id: Uuid,
    pub intervals: Vec<Interval>,
}

impl ActivePhase {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self {
            id: Uuid::new_v4(),
            intervals,
        }
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.intervals.iter().map(|i| i.duration_secs).sum()
    }

    pub fn add_interval(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    /// Replace the interval with the same id, or append it when unknown.
    pub fn upsert_interval(&mut self, interval: Interval) {
        match self.intervals.iter_mut().find(|i| i.id == interval.id) {
            Some(slot) => *slot = interval,
            None => self.intervals.push(interval),
        }
    }

    pub fn remove_interval(&mut self, id: Uuid) -> Result<Interval, ValidationError> {
        let index = self.interval_position(id)?;
        Ok(self.intervals.remove(index))
    }

    /// Copy the interval under a fresh id and insert the copy right after it.
    pub fn duplicate_interval(&mut self, id: Uuid) -> Result<Uuid, ValidationError> {
        let index = self.interval_position(id)?;
        let mut copy = self.intervals[index].clone();
        copy.id = Uuid::new_v4();
        let new_id = copy.id;
        self.intervals.insert(index + 1, copy);
        Ok(new_id)
    }

    fn interval_position(&self, id: Uuid) -> Result<usize, ValidationError> {
        self.intervals
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "interval".into(),
                id,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestPhase {
    pub id: Uuid,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl RestPhase {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    Active(ActivePhase),
    Rest(RestPhase),
}

impl Phase {
    pub fn id(&self) -> Uuid {
        match self {
            Phase::Active(p) => p.id,
            Phase::Rest(p) => p.id,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        match self {
            Phase::Active(p) => p.total_duration_secs(),
            Phase::Rest(p) => p.duration_secs,
        }
    }

    /// Number of playable intervals. A rest phase always counts as one.
    pub fn interval_count(&self) -> usize {
        match self {
            Phase::Active(p) => p.intervals.len(),
            Phase::Rest(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: Uuid,
    pub name: String,
    pub phases: Vec<Phase>,
}

impl WorkoutPlan {
    pub fn new(name: impl Into<String>, phases: Vec<Phase>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phases,
        }
    }

    /// A single active phase holding every interval, for flat interval lists.
    pub fn from_intervals(name: impl Into<String>, intervals: Vec<Interval>) -> Self {
        Self::new(name, vec![Phase::Active(ActivePhase::new(intervals))])
    }

    /// HIIT sample plan: warm up, sprints, rest, cool down.
    pub fn sample() -> Self {
        Self::new(
            "HIIT Workout",
            vec![
                Phase::Active(ActivePhase::new(vec![Interval::new(
                    "Light Jog",
                    IntervalKind::Warmup,
                    300.0,
                )])),
                Phase::Active(ActivePhase::new(vec![
                    Interval::new("Sprint", IntervalKind::HighIntensity, 30.0),
                    Interval::new("Recover", IntervalKind::LowIntensity, 30.0),
                ])),
                Phase::Rest(RestPhase::new(60.0)),
                Phase::Active(ActivePhase::new(vec![Interval::new(
                    "Stretching",
                    IntervalKind::CoolDown,
                    300.0,
                )])),
            ],
        )
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.phases.iter().map(Phase::duration_secs).sum()
    }

    pub fn interval_count(&self) -> usize {
        self.phases.iter().map(Phase::interval_count).sum()
    }

    /// Seconds contained in every phase before `phase_index`.
    pub fn cumulative_secs(&self, phase_index: usize) -> f64 {
        self.phases
            .iter()
            .take(phase_index)
            .map(Phase::duration_secs)
            .sum()
    }

    pub fn add_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    /// Locate a phase by id and swap it for `phase` (which keeps that id).
    pub fn replace_phase(&mut self, phase: Phase) -> Result<(), ValidationError> {
        let index = self.phase_position(phase.id())?;
        self.phases[index] = phase;
        Ok(())
    }

    pub fn remove_phase(&mut self, id: Uuid) -> Result<Phase, ValidationError> {
        let index = self.phase_position(id)?;
        Ok(self.phases.remove(index))
    }

    pub fn move_phase(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        let len = self.phases.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::OutOfBounds {
                    collection: "phases".into(),
                    index,
                    len,
                });
            }
        }
        let phase = self.phases.remove(from);
        self.phases.insert(to, phase);
        Ok(())
    }

    /// Check the plan is well-formed: named, non-empty, positive durations.
    ///
    /// The sequencer never calls this; it copes with malformed plans on its own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "plan name must not be empty".into(),
            });
        }
        if self.phases.is_empty() {
            return Err(ValidationError::EmptyCollection("phases".into()));
        }
        for phase in &self.phases {
            match phase {
                Phase::Active(active) => {
                    if active.intervals.is_empty() {
                        return Err(ValidationError::EmptyCollection(format!(
                            "intervals of phase {}",
                            active.id
                        )));
                    }
                    for interval in &active.intervals {
                        check_duration(&interval.name, interval.duration_secs)?;
                    }
                }
                Phase::Rest(rest) => check_duration("rest", rest.duration_secs)?,
            }
        }
        Ok(())
    }

    fn phase_position(&self, id: Uuid) -> Result<usize, ValidationError> {
        self.phases
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "phase".into(),
                id,
            })
    }
}

fn check_duration(field: &str, secs: f64) -> Result<(), ValidationError> {
    if secs.is_finite() && secs > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("duration must be positive, got {secs}"),
        })
    }
}
