mod plan;
pub mod sequencer;

pub use plan::{ActivePhase, Interval, IntervalKind, Phase, RestPhase, WorkoutPlan};
pub use sequencer::{Advance, Position};
