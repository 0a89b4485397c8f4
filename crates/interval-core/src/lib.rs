//! # Interval Core Library
//!
//! This library provides the core logic of the interval trainer: workout plans,
//! the session clock, and phone/watch state sync. The `interval` CLI binary is
//! a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Workout**: Plans made of active and rest phases, plus the pure sequencer
//!   that walks their intervals
//! - **Session**: A tick-driven state machine ([`WorkoutSession`]) and the async
//!   single-writer actor that drives it ([`SessionRuntime`])
//! - **Sync**: Snapshot projection, the fixed wire payload and the companion transport
//! - **Stats**: Weekly grouping, streaks and summaries over workout history
//! - **Storage**: SQLite plans/history and TOML configuration
//! - **Integrations**: Injected persistence, health and subscription services
//!
//! ## Key Components
//!
//! - [`WorkoutPlan`]: Phases and intervals of a workout
//! - [`SessionRuntime`]: Running session with ticker, sync and collaborators
//! - [`Database`]: Plan and history persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod integrations;
pub mod session;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod workout;

pub use error::{ClientError, ConfigError, CoreError, DatabaseError, PurchaseError, ValidationError};
pub use events::Event;
pub use integrations::{
    ensure_subscribed, EntitlementService, EstimatedHealth, HealthService, HealthSessionHandle,
    MemoryStore, StaticEntitlements, WorkoutStore,
};
pub use session::{
    RuntimeOptions, SessionDeps, SessionRuntime, SessionState, SessionStatus, StopBehavior,
    WorkoutSession,
};
pub use stats::{CompletedWorkout, WeeklyWorkouts, WorkoutSummary};
pub use storage::{Config, Database};
pub use sync::{CompanionTransport, InMemoryTransport, NullTransport, SyncMode, WorkoutSyncSnapshot};
pub use workout::{ActivePhase, Interval, IntervalKind, Phase, RestPhase, WorkoutPlan};
