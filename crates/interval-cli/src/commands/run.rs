use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use interval_core::storage::{Config, Database};
use interval_core::{
    CompanionTransport, EstimatedHealth, Event, InMemoryTransport, MemoryStore, NullTransport,
    RuntimeOptions, SessionDeps, SessionRuntime, SessionState, SessionStatus, StopBehavior,
    WorkoutPlan,
};
use tokio::sync::broadcast::{self, error::RecvError};

use super::parse_id;

#[derive(Args)]
pub struct RunArgs {
    /// Plan ID (runs the built-in sample plan if omitted)
    pub plan: Option<String>,
    /// Override the tick period in milliseconds (one tick is one workout second)
    #[arg(long)]
    pub tick_ms: Option<u64>,
    /// Mirror the session on a simulated watch and report its final state
    #[arg(long)]
    pub companion: bool,
    /// Save the finished workout to history with this rating (1-5)
    #[arg(long)]
    pub rating: Option<u8>,
    /// Also print one line per tick
    #[arg(long)]
    pub ticks: bool,
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn state_json(state: &SessionState) -> serde_json::Value {
    serde_json::json!({
        "status": state.status(),
        "phase_index": state.current_phase_index,
        "interval_index": state.current_interval_index,
        "time_remaining_secs": state.time_remaining_secs,
        "total_elapsed_secs": state.total_elapsed_secs,
        "calories_burned": state.calories_burned,
        "plan_progress_pct": state.plan_progress_pct(),
        "synced_with_companion": state.is_synced_with_companion,
    })
}

/// Print events until one matches `done`; returns the matching event.
async fn follow(
    rx: &mut broadcast::Receiver<Event>,
    show_ticks: bool,
    mut done: impl FnMut(&Event) -> bool,
) -> Result<Event, Box<dyn std::error::Error>> {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if show_ticks || !matches!(event, Event::Ticked { .. }) {
                    print_event(&event)?;
                }
                if done(&event) {
                    return Ok(event);
                }
            }
            Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "event output lagged"),
            Err(RecvError::Closed) => return Err("session ended unexpectedly".into()),
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Arc::new(Database::open()?);
    let plan = match &args.plan {
        Some(raw) => {
            let id = parse_id(raw)?;
            db.get_plan(id)?
                .ok_or_else(|| format!("plan not found: {id}"))?
        }
        None => WorkoutPlan::sample(),
    };

    let mut options = RuntimeOptions::from_config(&config);
    if let Some(ms) = args.tick_ms {
        options.tick_interval = Duration::from_millis(ms.max(1));
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(perform(plan, db, &config, options, &args))
}

async fn perform(
    plan: WorkoutPlan,
    db: Arc<Database>,
    config: &Config,
    options: RuntimeOptions,
    args: &RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let health = Arc::new(EstimatedHealth::new(config.health.kcal_per_minute));

    let (phone_link, watch): (Arc<dyn CompanionTransport>, Option<SessionRuntime>) =
        if args.companion {
            let (phone_link, watch_link) = InMemoryTransport::pair();
            let watch = SessionRuntime::spawn(
                plan.clone(),
                SessionDeps {
                    store: Arc::new(MemoryStore::new()),
                    health: health.clone(),
                    transport: Arc::new(watch_link),
                },
                RuntimeOptions {
                    stop_behavior: StopBehavior::Complete,
                    ..options.clone()
                },
            );
            // The watch must be listening before the phone opens.
            watch.state().await?;
            (Arc::new(phone_link), Some(watch))
        } else {
            (Arc::new(NullTransport), None)
        };

    let session = SessionRuntime::spawn(
        plan,
        SessionDeps {
            store: db,
            health,
            transport: phone_link,
        },
        options.clone(),
    );
    let mut rx = session.subscribe();

    session.toggle_running().await?;
    follow(&mut rx, args.ticks, |e| matches!(e, Event::WorkoutCompleted { .. })).await?;

    // Energy for the summary; a failed or slow query only costs the number.
    let energy_wait = options.health_timeout + Duration::from_secs(1);
    let energy = tokio::time::timeout(
        energy_wait,
        follow(&mut rx, args.ticks, |e| {
            matches!(e, Event::CaloriesUpdated { .. } | Event::HealthQueryFailed { .. })
        }),
    )
    .await;
    if energy.is_err() {
        tracing::warn!("no energy reading before timeout");
    }

    if let Some(rating) = args.rating {
        session.save_completed(rating).await?;
        let outcome = follow(&mut rx, args.ticks, |e| {
            matches!(
                e,
                Event::CompletedWorkoutSaved { .. } | Event::CompletedWorkoutSaveFailed { .. }
            )
        })
        .await?;
        if let Event::CompletedWorkoutSaveFailed { message, .. } = outcome {
            return Err(message.into());
        }
    }

    if let Some(watch) = &watch {
        // Let the watch take in the final snapshot.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while watch.state().await?.status() != SessionStatus::Completed
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    let state = session.state().await?;
    let mut report = serde_json::json!({ "type": "FinalState", "phone": state_json(&state) });
    if let Some(watch) = watch {
        report["watch"] = state_json(&watch.state().await?);
        watch.shutdown().await?;
    }
    println!("{report}");

    session.shutdown().await?;
    Ok(())
}
