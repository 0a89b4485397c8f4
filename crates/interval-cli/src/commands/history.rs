use chrono::{NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use interval_core::integrations::ensure_subscribed;
use interval_core::stats::{current_streak, group_by_week, summarize};
use interval_core::storage::Database;
use interval_core::CompletedWorkout;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Completed workouts grouped by week, newest first
    List,
    /// Record a workout done without a session
    Add {
        /// Workout name
        name: String,
        /// Day of the workout, YYYY-MM-DD (today if omitted)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        minutes: f64,
        #[arg(long, default_value = "0")]
        calories: f64,
        /// Rating from 1 to 5
        #[arg(long, default_value = "3")]
        rating: u8,
    },
    /// Current workout streak
    Streak,
    /// Weekly and monthly totals (subscription required)
    Summary,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List => {
            let weeks = group_by_week(&db.list_completed()?);
            println!("{}", serde_json::to_string_pretty(&weeks)?);
        }
        HistoryAction::Add {
            name,
            date,
            minutes,
            calories,
            rating,
        } => {
            let date = match date {
                Some(day) => day
                    .and_hms_opt(12, 0, 0)
                    .map(|dt| Utc.from_utc_datetime(&dt))
                    .ok_or("invalid date")?,
                None => Utc::now(),
            };
            let workout = CompletedWorkout::new(name, date, minutes * 60.0, calories, rating)?;
            db.record_completed(&workout)?;
            println!("{}", serde_json::to_string_pretty(&workout)?);
        }
        HistoryAction::Streak => {
            let streak = current_streak(&db.list_completed()?);
            println!("{}", serde_json::json!({ "streak": streak }));
        }
        HistoryAction::Summary => {
            let rt = tokio::runtime::Builder::new_current_thread().build()?;
            rt.block_on(ensure_subscribed(&db, "Workout summary"))?;
            let summary = summarize(&db.list_completed()?, Utc::now().date_naive());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
