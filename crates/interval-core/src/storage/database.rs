//! SQLite-based workout storage.
//!
//! Provides persistent storage for:
//! - Saved workout plans (phases stored as JSON)
//! - Completed workout history
//! - Key-value store for application state, including the local subscription record

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use super::data_dir;
use crate::error::{ClientError, DatabaseError, PurchaseError, Result};
use crate::integrations::{EntitlementService, WorkoutStore};
use crate::stats::CompletedWorkout;
use crate::workout::{Phase, WorkoutPlan};

/// Store products that unlock the subscription features.
pub const SUBSCRIPTION_PRODUCTS: &[&str] = &["interval.monthly", "interval.yearly"];

const SUBSCRIPTION_KEY: &str = "subscription.product";

/// SQLite database for plans and history.
///
/// The connection sits behind a mutex so the database can be shared with the
/// session runtime as a [`WorkoutStore`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data dir>/interval.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("interval.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::Locked)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS workout_plans (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                phases      TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS completed_workouts (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                date            TEXT NOT NULL,
                duration_secs   REAL NOT NULL,
                calories_burned REAL NOT NULL,
                rating          INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_completed_workouts_date ON completed_workouts(date);",
        )?;
        Ok(())
    }

    /// Insert a plan, or replace the stored plan with the same id.
    /// Replacing keeps the plan's position in [`list_plans`](Self::list_plans).
    pub fn save_plan(&self, plan: &WorkoutPlan) -> Result<(), DatabaseError> {
        let phases = serde_json::to_string(&plan.phases)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn()?.execute(
            "INSERT INTO workout_plans (id, name, phases, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                phases = excluded.phases,
                updated_at = excluded.updated_at",
            params![
                plan.id.to_string(),
                plan.name,
                phases,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Plans in insertion order.
    pub fn list_plans(&self) -> Result<Vec<WorkoutPlan>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, phases FROM workout_plans ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut plans = Vec::new();
        for row in rows {
            let (id, name, phases) = row?;
            plans.push(decode_plan(&id, name, &phases)?);
        }
        Ok(plans)
    }

    pub fn get_plan(&self, id: Uuid) -> Result<Option<WorkoutPlan>, DatabaseError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, phases FROM workout_plans WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, name, phases)| decode_plan(&id, name, &phases))
            .transpose()
    }

    /// Returns whether a plan was deleted.
    pub fn delete_plan(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let n = self
            .conn()?
            .execute("DELETE FROM workout_plans WHERE id = ?1", params![id.to_string()])?;
        Ok(n > 0)
    }

    pub fn record_completed(&self, workout: &CompletedWorkout) -> Result<(), DatabaseError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO completed_workouts
                (id, name, date, duration_secs, calories_burned, rating)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                workout.id.to_string(),
                workout.name,
                workout.date.to_rfc3339(),
                workout.duration_secs,
                workout.calories_burned,
                workout.rating,
            ],
        )?;
        Ok(())
    }

    /// History, newest first.
    pub fn list_completed(&self) -> Result<Vec<CompletedWorkout>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, date, duration_secs, calories_burned, rating
             FROM completed_workouts
             ORDER BY date DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, u8>(5)?,
            ))
        })?;

        let mut workouts = Vec::new();
        for row in rows {
            let (id, name, date, duration_secs, calories_burned, rating) = row?;
            workouts.push(CompletedWorkout {
                id: parse_id("completed_workouts", &id)?,
                name,
                date: DateTime::parse_from_rfc3339(&date)
                    .map_err(|e| corrupt("completed_workouts", e))?
                    .with_timezone(&Utc),
                duration_secs,
                calories_burned,
                rating,
            });
        }
        Ok(workouts)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Product id of the active subscription, if any.
    pub fn subscription_product(&self) -> Result<Option<String>, DatabaseError> {
        self.kv_get(SUBSCRIPTION_KEY)
    }
}

fn corrupt(table: &str, err: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: table.to_string(),
        message: err.to_string(),
    }
}

fn parse_id(table: &str, id: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(id).map_err(|e| corrupt(table, e))
}

fn decode_plan(id: &str, name: String, phases: &str) -> Result<WorkoutPlan, DatabaseError> {
    let phases: Vec<Phase> =
        serde_json::from_str(phases).map_err(|e| corrupt("workout_plans", e))?;
    Ok(WorkoutPlan {
        id: parse_id("workout_plans", id)?,
        name,
        phases,
    })
}

#[async_trait]
impl WorkoutStore for Database {
    async fn fetch_workout_plans(&self) -> Result<Vec<WorkoutPlan>, ClientError> {
        Ok(self.list_plans()?)
    }

    async fn save_workout_plan(&self, plan: &WorkoutPlan) -> Result<(), ClientError> {
        Ok(self.save_plan(plan)?)
    }

    async fn fetch_completed_workouts(&self) -> Result<Vec<CompletedWorkout>, ClientError> {
        Ok(self.list_completed()?)
    }

    async fn save_completed_workout(&self, workout: &CompletedWorkout) -> Result<(), ClientError> {
        Ok(self.record_completed(workout)?)
    }
}

/// Subscriptions recorded locally. Purchases of known products always verify.
#[async_trait]
impl EntitlementService for Database {
    async fn is_subscribed(&self) -> bool {
        matches!(self.subscription_product(), Ok(Some(_)))
    }

    async fn purchase(&self, product_id: &str) -> Result<(), ClientError> {
        if !SUBSCRIPTION_PRODUCTS.contains(&product_id) {
            return Err(PurchaseError::Unknown.into());
        }
        self.kv_set(SUBSCRIPTION_KEY, product_id)?;
        info!(product_id, "subscription purchased");
        Ok(())
    }

    async fn restore_purchases(&self) -> Result<(), ClientError> {
        match self.subscription_product()? {
            Some(product_id) => info!(%product_id, "subscription restored"),
            None => debug!("no purchases to restore"),
        }
        Ok(())
    }
}
