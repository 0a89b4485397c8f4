use clap::{Subcommand, ValueEnum};
use interval_core::storage::Database;
use interval_core::{ActivePhase, Interval, IntervalKind, Phase, RestPhase, WorkoutPlan};

use super::parse_id;

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Warmup,
    HighIntensity,
    LowIntensity,
    CoolDown,
}

impl From<KindArg> for IntervalKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Warmup => IntervalKind::Warmup,
            KindArg::HighIntensity => IntervalKind::HighIntensity,
            KindArg::LowIntensity => IntervalKind::LowIntensity,
            KindArg::CoolDown => IntervalKind::CoolDown,
        }
    }
}

#[derive(Subcommand)]
pub enum PlanAction {
    /// List saved plans
    List,
    /// Print a plan as JSON
    Show {
        /// Plan ID
        id: String,
    },
    /// Save the built-in HIIT sample plan
    Sample,
    /// Create an empty plan
    Create {
        /// Plan name
        name: String,
    },
    /// Import a plan from a JSON file
    Import {
        /// Path to the plan JSON
        path: std::path::PathBuf,
    },
    /// Delete a plan
    Delete {
        /// Plan ID
        id: String,
    },
    /// Append an interval, to an existing active phase or a new one
    AddInterval {
        /// Plan ID
        plan: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Duration in seconds
        #[arg(long)]
        secs: f64,
        /// Index of the active phase to append to (new phase if omitted)
        #[arg(long)]
        phase: Option<usize>,
    },
    /// Append a rest phase
    AddRest {
        /// Plan ID
        plan: String,
        /// Duration in seconds
        #[arg(long)]
        secs: f64,
    },
    /// Duplicate an interval right after itself
    DuplicateInterval {
        /// Plan ID
        plan: String,
        #[arg(long)]
        phase: usize,
        #[arg(long)]
        interval: usize,
    },
    /// Remove an interval from an active phase
    RemoveInterval {
        /// Plan ID
        plan: String,
        #[arg(long)]
        phase: usize,
        #[arg(long)]
        interval: usize,
    },
    /// Remove a phase
    RemovePhase {
        /// Plan ID
        plan: String,
        #[arg(long)]
        phase: usize,
    },
    /// Move a phase to another position
    MovePhase {
        /// Plan ID
        plan: String,
        from: usize,
        to: usize,
    },
}

fn load_plan(db: &Database, raw_id: &str) -> Result<WorkoutPlan, Box<dyn std::error::Error>> {
    let id = parse_id(raw_id)?;
    db.get_plan(id)?
        .ok_or_else(|| format!("plan not found: {id}").into())
}

fn phase_at(plan: &WorkoutPlan, index: usize) -> Result<&Phase, Box<dyn std::error::Error>> {
    plan.phases
        .get(index)
        .ok_or_else(|| format!("phase {index} out of range (plan has {})", plan.phases.len()).into())
}

fn active_phase_at(
    plan: &mut WorkoutPlan,
    index: usize,
) -> Result<&mut ActivePhase, Box<dyn std::error::Error>> {
    let len = plan.phases.len();
    match plan.phases.get_mut(index) {
        Some(Phase::Active(phase)) => Ok(phase),
        Some(Phase::Rest(_)) => Err(format!("phase {index} is a rest phase").into()),
        None => Err(format!("phase {index} out of range (plan has {len})").into()),
    }
}

fn interval_id_at(phase: &ActivePhase, index: usize) -> Result<uuid::Uuid, Box<dyn std::error::Error>> {
    phase
        .intervals
        .get(index)
        .map(|i| i.id)
        .ok_or_else(|| format!("interval {index} out of range").into())
}

fn print_plan(plan: &WorkoutPlan) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(plan)?);
    Ok(())
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        PlanAction::List => {
            let plans: Vec<_> = db
                .list_plans()?
                .into_iter()
                .map(|p| {
                    serde_json::json!({
                        "id": p.id,
                        "name": p.name,
                        "phases": p.phases.len(),
                        "intervals": p.interval_count(),
                        "total_duration_secs": p.total_duration_secs(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&plans)?);
        }
        PlanAction::Show { id } => print_plan(&load_plan(&db, &id)?)?,
        PlanAction::Sample => {
            let plan = WorkoutPlan::sample();
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::Create { name } => {
            let plan = WorkoutPlan::new(name, Vec::new());
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::Import { path } => {
            let content = std::fs::read_to_string(&path)?;
            let plan: WorkoutPlan = serde_json::from_str(&content)?;
            plan.validate()?;
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::Delete { id } => {
            let id = parse_id(&id)?;
            if !db.delete_plan(id)? {
                return Err(format!("plan not found: {id}").into());
            }
            println!("{{\"type\": \"plan_deleted\", \"id\": \"{id}\"}}");
        }
        PlanAction::AddInterval {
            plan,
            name,
            kind,
            secs,
            phase,
        } => {
            let mut plan = load_plan(&db, &plan)?;
            let interval = Interval::new(name, kind.into(), secs);
            match phase {
                Some(index) => active_phase_at(&mut plan, index)?.add_interval(interval),
                None => plan.add_phase(Phase::Active(ActivePhase::new(vec![interval]))),
            }
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::AddRest { plan, secs } => {
            let mut plan = load_plan(&db, &plan)?;
            plan.add_phase(Phase::Rest(RestPhase::new(secs)));
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::DuplicateInterval {
            plan,
            phase,
            interval,
        } => {
            let mut plan = load_plan(&db, &plan)?;
            let active = active_phase_at(&mut plan, phase)?;
            let id = interval_id_at(active, interval)?;
            active.duplicate_interval(id)?;
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::RemoveInterval {
            plan,
            phase,
            interval,
        } => {
            let mut plan = load_plan(&db, &plan)?;
            let active = active_phase_at(&mut plan, phase)?;
            let id = interval_id_at(active, interval)?;
            active.remove_interval(id)?;
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::RemovePhase { plan, phase } => {
            let mut plan = load_plan(&db, &plan)?;
            let id = phase_at(&plan, phase)?.id();
            plan.remove_phase(id)?;
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
        PlanAction::MovePhase { plan, from, to } => {
            let mut plan = load_plan(&db, &plan)?;
            plan.move_phase(from, to)?;
            db.save_plan(&plan)?;
            print_plan(&plan)?;
        }
    }
    Ok(())
}
