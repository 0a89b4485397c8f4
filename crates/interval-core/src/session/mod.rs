//! Workout session: the synchronous engine and the async runtime around it.

mod engine;
mod runtime;
mod state;

pub use engine::WorkoutSession;
pub use runtime::{RuntimeOptions, SessionDeps, SessionRuntime};
pub use state::{SessionState, SessionStatus, StopBehavior};
