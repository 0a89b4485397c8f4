//! In-process service fakes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::traits::{EntitlementService, WorkoutStore};
use crate::error::{ClientError, PurchaseError};
use crate::stats::CompletedWorkout;
use crate::workout::WorkoutPlan;

/// Plans and history kept in memory. `set_failing(true)` makes every call fail.
#[derive(Default)]
pub struct MemoryStore {
    plans: Mutex<Vec<WorkoutPlan>>,
    completed: Mutex<Vec<CompletedWorkout>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<WorkoutPlan>) -> Self {
        Self {
            plans: Mutex::new(plans),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ClientError::Persistence("store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

fn poisoned<T>(_: T) -> ClientError {
    ClientError::Persistence("store lock poisoned".into())
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn fetch_workout_plans(&self) -> Result<Vec<WorkoutPlan>, ClientError> {
        self.check()?;
        Ok(self.plans.lock().map_err(poisoned)?.clone())
    }

    async fn save_workout_plan(&self, plan: &WorkoutPlan) -> Result<(), ClientError> {
        self.check()?;
        let mut plans = self.plans.lock().map_err(poisoned)?;
        match plans.iter_mut().find(|p| p.id == plan.id) {
            Some(slot) => *slot = plan.clone(),
            None => plans.push(plan.clone()),
        }
        Ok(())
    }

    async fn fetch_completed_workouts(&self) -> Result<Vec<CompletedWorkout>, ClientError> {
        self.check()?;
        Ok(self.completed.lock().map_err(poisoned)?.clone())
    }

    async fn save_completed_workout(&self, workout: &CompletedWorkout) -> Result<(), ClientError> {
        self.check()?;
        self.completed.lock().map_err(poisoned)?.push(workout.clone());
        Ok(())
    }
}

/// Entitlements with a fixed answer; purchases flip it on or fail as configured.
pub struct StaticEntitlements {
    subscribed: AtomicBool,
    purchase_outcome: Option<PurchaseError>,
}

impl StaticEntitlements {
    pub fn new(subscribed: bool) -> Self {
        Self {
            subscribed: AtomicBool::new(subscribed),
            purchase_outcome: None,
        }
    }

    pub fn failing_purchases(error: PurchaseError) -> Self {
        Self {
            subscribed: AtomicBool::new(false),
            purchase_outcome: Some(error),
        }
    }
}

#[async_trait]
impl EntitlementService for StaticEntitlements {
    async fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    async fn purchase(&self, _product_id: &str) -> Result<(), ClientError> {
        if let Some(error) = self.purchase_outcome {
            return Err(error.into());
        }
        self.subscribed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn restore_purchases(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
