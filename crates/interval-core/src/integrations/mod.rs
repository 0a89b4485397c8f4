//! External services: persistence, health data, subscriptions.

pub mod health;
pub mod memory;
pub mod traits;

pub use health::EstimatedHealth;
pub use memory::{MemoryStore, StaticEntitlements};
pub use traits::{
    ensure_subscribed, EntitlementService, HealthService, HealthSessionHandle, WorkoutStore,
};
