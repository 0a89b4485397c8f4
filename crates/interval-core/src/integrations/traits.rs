//! Interfaces of the external services the core talks to.
//!
//! Implementations are injected (see [`SessionDeps`](crate::session::SessionDeps))
//! so tests and the CLI can swap in local fakes. Every call may fail with a
//! [`ClientError`]; callers convert failures into events and keep going.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClientError, CoreError};
use crate::stats::CompletedWorkout;
use crate::workout::WorkoutPlan;

/// Saved plans and workout history.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn fetch_workout_plans(&self) -> Result<Vec<WorkoutPlan>, ClientError>;

    /// Insert, or replace the plan with the same id.
    async fn save_workout_plan(&self, plan: &WorkoutPlan) -> Result<(), ClientError>;

    async fn fetch_completed_workouts(&self) -> Result<Vec<CompletedWorkout>, ClientError>;

    async fn save_completed_workout(&self, workout: &CompletedWorkout) -> Result<(), ClientError>;
}

/// Opaque handle of a workout session opened with the health service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthSessionHandle(pub Uuid);

/// Health data: workout sessions and active energy.
#[async_trait]
pub trait HealthService: Send + Sync {
    /// Begin tracking a workout. `None` when the platform has no session concept.
    async fn start_workout_session(&self) -> Result<Option<HealthSessionHandle>, ClientError>;

    /// Finish tracking and return kilocalories burned during the session.
    async fn end_workout_session(&self, handle: HealthSessionHandle) -> Result<f64, ClientError>;

    /// Kilocalories of active energy burned between `start` and `end`.
    async fn active_energy_burned(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, ClientError>;
}

/// Subscription state and store purchases.
#[async_trait]
pub trait EntitlementService: Send + Sync {
    async fn is_subscribed(&self) -> bool;

    async fn purchase(&self, product_id: &str) -> Result<(), ClientError>;

    async fn restore_purchases(&self) -> Result<(), ClientError>;
}

/// Gate a feature behind an active subscription.
pub async fn ensure_subscribed(
    service: &dyn EntitlementService,
    feature: &str,
) -> Result<(), CoreError> {
    if service.is_subscribed().await {
        Ok(())
    } else {
        Err(CoreError::NotSubscribed {
            feature: feature.to_string(),
        })
    }
}
