//! Health service that estimates energy from elapsed wall-clock time.
//!
//! Used where no health platform exists (the CLI, tests). Calories are
//! `kcal_per_minute * minutes` between session start and end.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::traits::{HealthService, HealthSessionHandle};
use crate::error::ClientError;

pub struct EstimatedHealth {
    kcal_per_minute: f64,
    sessions: Mutex<HashMap<HealthSessionHandle, DateTime<Utc>>>,
}

impl EstimatedHealth {
    pub fn new(kcal_per_minute: f64) -> Self {
        Self {
            kcal_per_minute,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn estimate(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let secs = (end - start).num_milliseconds().max(0) as f64 / 1000.0;
        secs / 60.0 * self.kcal_per_minute
    }

    fn sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<HealthSessionHandle, DateTime<Utc>>>, ClientError>
    {
        self.sessions
            .lock()
            .map_err(|_| ClientError::Health("session table poisoned".into()))
    }
}

#[async_trait]
impl HealthService for EstimatedHealth {
    async fn start_workout_session(&self) -> Result<Option<HealthSessionHandle>, ClientError> {
        let handle = HealthSessionHandle(Uuid::new_v4());
        self.sessions()?.insert(handle, Utc::now());
        Ok(Some(handle))
    }

    async fn end_workout_session(&self, handle: HealthSessionHandle) -> Result<f64, ClientError> {
        let start = self
            .sessions()?
            .remove(&handle)
            .ok_or_else(|| ClientError::Health(format!("unknown workout session {}", handle.0)))?;
        Ok(self.estimate(start, Utc::now()))
    }

    async fn active_energy_burned(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, ClientError> {
        Ok(self.estimate(start, end))
    }
}
