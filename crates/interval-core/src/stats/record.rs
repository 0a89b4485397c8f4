use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A finished workout, as saved to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorkout {
    pub id: Uuid,
    pub name: String,
    pub date: DateTime<Utc>,
    pub duration_secs: f64,
    pub calories_burned: f64,
    /// User rating, 1 to 5.
    pub rating: u8,
}

impl CompletedWorkout {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    pub fn new(
        name: impl Into<String>,
        date: DateTime<Utc>,
        duration_secs: f64,
        calories_burned: f64,
        rating: u8,
    ) -> Result<Self, ValidationError> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&rating) {
            return Err(ValidationError::InvalidValue {
                field: "rating".into(),
                message: format!("rating must be between 1 and 5, got {rating}"),
            });
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "duration_secs".into(),
                message: format!("duration must be non-negative, got {duration_secs}"),
            });
        }
        if !calories_burned.is_finite() || calories_burned < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "calories_burned".into(),
                message: format!("calories must be non-negative, got {calories_burned}"),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            date,
            duration_secs,
            calories_burned,
            rating,
        })
    }
}
