//! Async session runtime.
//!
//! [`SessionRuntime`] owns one [`WorkoutSession`] inside a single actor task.
//! User intents, clock ticks, peer snapshots and collaborator results all
//! arrive on one mpsc channel and are applied strictly in order, so no tick
//! is ever processed concurrently with an intent.
//!
//! Background work:
//! - a ticker task posting `Tick` every `tick_interval` while running, aborted
//!   and respawned on each running transition;
//! - a receive loop forwarding payloads from the companion transport;
//! - one-shot tasks for health queries and history saves, whose results come
//!   back through the same channel.
//!
//! Everything observable is published as [`Event`]s on a broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::engine::WorkoutSession;
use super::state::{SessionState, StopBehavior};
use crate::error::{ClientError, CoreError, Result};
use crate::events::Event;
use crate::integrations::{HealthService, HealthSessionHandle, WorkoutStore};
use crate::storage::Config;
use crate::sync::event_codec::{decode_or_drop, snapshot_to_payload};
use crate::sync::transport::CompanionTransport;
use crate::sync::types::{SyncMode, SyncPayload};
use crate::workout::WorkoutPlan;

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

/// Collaborators injected into a session.
#[derive(Clone)]
pub struct SessionDeps {
    pub store: Arc<dyn WorkoutStore>,
    pub health: Arc<dyn HealthService>,
    pub transport: Arc<dyn CompanionTransport>,
}

/// Runtime knobs, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub tick_interval: Duration,
    pub stop_behavior: StopBehavior,
    pub health_timeout: Duration,
    pub sync_mode: SyncMode,
    /// Ticks between periodic snapshot pushes in continuous mode. 0 disables them.
    pub push_every_ticks: u64,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RuntimeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            stop_behavior: config.session.stop_behavior,
            health_timeout: config.health_timeout(),
            sync_mode: config.sync.mode,
            push_every_ticks: config.sync.push_every_secs,
        }
    }
}

enum Command {
    Toggle,
    Skip,
    Rewind,
    Stop,
    UpdatePlan(WorkoutPlan),
    EndSession,
    SaveCompleted { rating: u8 },
    GetState(oneshot::Sender<SessionState>),
    Shutdown,
    /// From the ticker started with the given generation.
    Tick(u64),
    Remote(SyncPayload),
    HealthStarted(Result<Option<HealthSessionHandle>, ClientError>),
    CaloriesFetched(Result<f64, ClientError>),
    Saved(Result<Uuid, ClientError>),
}

/// Handle to a running session actor.
///
/// Dropping every handle shuts the session down as if [`shutdown`](Self::shutdown)
/// had been called, minus the wait.
pub struct SessionRuntime {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
    task: JoinHandle<()>,
}

impl SessionRuntime {
    /// Open a session on `plan` and start its actor. The session starts idle.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(plan: WorkoutPlan, deps: SessionDeps, options: RuntimeOptions) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let actor = SessionActor {
            session: WorkoutSession::new(plan, options.stop_behavior),
            deps,
            options,
            mailbox: commands.downgrade(),
            events: events.clone(),
            ticker: None,
            ticker_generation: 0,
            receiver: None,
            health_handle: None,
            ticks_since_push: 0,
            leading: true,
            completion_handled: false,
        };
        let task = tokio::spawn(actor.run(rx));

        Self {
            commands,
            events,
            task,
        }
    }

    /// Subscribe to session events. Only events published after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn toggle_running(&self) -> Result<()> {
        self.send(Command::Toggle).await
    }

    pub async fn skip(&self) -> Result<()> {
        self.send(Command::Skip).await
    }

    pub async fn rewind(&self) -> Result<()> {
        self.send(Command::Rewind).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    /// Replace the plan and restart it from the first interval, paused.
    pub async fn update_plan(&self, plan: WorkoutPlan) -> Result<()> {
        self.send(Command::UpdatePlan(plan)).await
    }

    /// Stop the clock and fetch calories burned since the workout started.
    pub async fn end_session(&self) -> Result<()> {
        self.send(Command::EndSession).await
    }

    /// Save the completed session to history. The outcome is reported as
    /// `CompletedWorkoutSaved` or `CompletedWorkoutSaveFailed`.
    pub async fn save_completed(&self, rating: u8) -> Result<()> {
        self.send(Command::SaveCompleted { rating }).await
    }

    /// Current state, after every command sent before this call has been applied.
    pub async fn state(&self) -> Result<SessionState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::GetState(tx)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    /// Dismiss the session: cancel background tasks and wait for the actor to exit.
    pub async fn shutdown(self) -> Result<()> {
        // Already gone is fine.
        let _ = self.commands.send(Command::Shutdown).await;
        self.task.await.map_err(|_| CoreError::RuntimeClosed)
    }
}

async fn post(mailbox: &mpsc::WeakSender<Command>, command: Command) -> bool {
    match mailbox.upgrade() {
        Some(tx) => tx.send(command).await.is_ok(),
        None => false,
    }
}

struct SessionActor {
    session: WorkoutSession,
    deps: SessionDeps,
    options: RuntimeOptions,
    /// Weak so that background tasks never keep the session alive.
    mailbox: mpsc::WeakSender<Command>,
    events: broadcast::Sender<Event>,
    ticker: Option<JoinHandle<()>>,
    ticker_generation: u64,
    receiver: Option<JoinHandle<()>>,
    health_handle: Option<HealthSessionHandle>,
    ticks_since_push: u64,
    /// Whether this device made the latest change and owns periodic pushes.
    leading: bool,
    /// Energy was already requested for the current completion.
    completion_handled: bool,
}

impl SessionActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        self.open();
        while let Some(command) = rx.recv().await {
            if !self.handle(command) {
                break;
            }
        }
        self.close();
    }

    fn open(&mut self) {
        let plan = &self.session.state().plan;
        info!(plan_id = %plan.id, plan_name = %plan.name, "session opened");
        self.publish(Event::SessionOpened {
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            at: Utc::now(),
        });

        let mut incoming = self.deps.transport.receive();
        let mailbox = self.mailbox.clone();
        self.receiver = Some(tokio::spawn(async move {
            while let Some(payload) = incoming.next().await {
                if !post(&mailbox, Command::Remote(payload)).await {
                    break;
                }
            }
        }));

        self.session.mark_started(Utc::now());
        let health = self.deps.health.clone();
        let limit = self.options.health_timeout;
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = with_timeout(limit, health.start_workout_session()).await;
            post(&mailbox, Command::HealthStarted(result)).await;
        });

        self.push();
    }

    fn close(&mut self) {
        self.cancel_ticker();
        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }
        if let Some(handle) = self.health_handle.take() {
            let health = self.deps.health.clone();
            let limit = self.options.health_timeout;
            tokio::spawn(async move {
                if let Err(e) = with_timeout(limit, health.end_workout_session(handle)).await {
                    warn!(error = %e, "failed to end health session");
                }
            });
        }
        info!("session closed");
        self.publish(Event::SessionClosed { at: Utc::now() });
    }

    /// Returns false when the actor should exit.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Toggle => {
                if let Some(event) = self.session.toggle_running() {
                    self.publish(event);
                }
                self.after_local_intent();
            }
            Command::Skip => {
                let event = self.session.skip();
                self.publish(event);
                self.after_local_intent();
            }
            Command::Rewind => {
                let event = self.session.rewind();
                self.publish(event);
                self.after_local_intent();
            }
            Command::Stop => {
                let event = self.session.stop();
                self.publish(event);
                self.after_local_intent();
            }
            Command::UpdatePlan(plan) => {
                let event = self.session.update_plan(plan);
                self.publish(event);
                self.after_local_intent();
            }
            Command::EndSession => {
                if self.session.is_running() {
                    if let Some(event) = self.session.toggle_running() {
                        self.publish(event);
                    }
                }
                self.after_local_intent();
                if !self.session.state().is_complete {
                    self.request_calories();
                }
            }
            Command::SaveCompleted { rating } => self.save_completed(rating),
            Command::GetState(reply) => {
                let _ = reply.send(self.session.state().clone());
            }
            Command::Shutdown => return false,
            Command::Tick(generation) => self.on_tick(generation),
            Command::Remote(payload) => self.on_remote(payload),
            Command::HealthStarted(Ok(handle)) => {
                debug!(started = handle.is_some(), "health session started");
                self.health_handle = handle;
            }
            Command::HealthStarted(Err(e)) | Command::CaloriesFetched(Err(e)) => {
                warn!(error = %e, "health query failed");
                self.publish(Event::HealthQueryFailed {
                    message: e.to_string(),
                    at: Utc::now(),
                });
            }
            Command::CaloriesFetched(Ok(kcal)) => {
                let event = self.session.set_calories(kcal);
                self.publish(event);
            }
            Command::Saved(Ok(workout_id)) => {
                info!(%workout_id, "completed workout saved");
                self.publish(Event::CompletedWorkoutSaved {
                    workout_id,
                    at: Utc::now(),
                });
            }
            Command::Saved(Err(e)) => self.save_failed(e.to_string()),
        }
        true
    }

    fn on_tick(&mut self, generation: u64) {
        if generation != self.ticker_generation {
            trace!(generation, "dropping tick from cancelled ticker");
            return;
        }
        for event in self.session.tick() {
            self.publish(event);
        }
        self.ticks_since_push += 1;

        if self.session.state().is_complete {
            self.reconcile_ticker();
            self.check_completion();
            if self.options.sync_mode == SyncMode::Continuous {
                self.push();
            }
        } else if self.options.sync_mode == SyncMode::Continuous
            && self.leading
            && self.options.push_every_ticks > 0
            && self.ticks_since_push >= self.options.push_every_ticks
        {
            self.push();
        }
    }

    fn on_remote(&mut self, payload: SyncPayload) {
        let Some(snapshot) = decode_or_drop(&payload) else {
            return;
        };
        debug!(
            running = snapshot.is_running,
            phase = snapshot.current_phase_index,
            interval = snapshot.current_interval_index,
            "applying peer snapshot"
        );
        let event = self.session.apply_snapshot(snapshot);
        self.publish(event);
        self.leading = false;
        self.reconcile_ticker();
        self.check_completion();
    }

    fn after_local_intent(&mut self) {
        self.leading = true;
        self.reconcile_ticker();
        if self.options.sync_mode == SyncMode::Continuous {
            self.push();
        }
        self.check_completion();
    }

    /// Completing the workout closes the energy window once per completion.
    fn check_completion(&mut self) {
        if !self.session.state().is_complete {
            self.completion_handled = false;
        } else if !self.completion_handled {
            self.completion_handled = true;
            self.request_calories();
        }
    }

    fn save_completed(&mut self, rating: u8) {
        let workout = match self.session.completed_workout(rating, Utc::now()) {
            Ok(workout) => workout,
            Err(e) => return self.save_failed(e.to_string()),
        };
        let store = self.deps.store.clone();
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = store
                .save_completed_workout(&workout)
                .await
                .map(|()| workout.id);
            post(&mailbox, Command::Saved(result)).await;
        });
    }

    fn save_failed(&self, message: String) {
        warn!(%message, "failed to save completed workout");
        self.publish(Event::CompletedWorkoutSaveFailed {
            message,
            at: Utc::now(),
        });
    }

    /// Close the health session, if any, and query energy burned since the start.
    fn request_calories(&mut self) {
        let Some(start) = self.session.state().workout_start_time else {
            return;
        };
        let handle = self.health_handle.take();
        let health = self.deps.health.clone();
        let limit = self.options.health_timeout;
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            if let Some(handle) = handle {
                if let Err(e) = with_timeout(limit, health.end_workout_session(handle)).await {
                    warn!(error = %e, "failed to end health session");
                }
            }
            let result = with_timeout(limit, health.active_energy_burned(start, Utc::now())).await;
            post(&mailbox, Command::CaloriesFetched(result)).await;
        });
    }

    // ── Ticker ───────────────────────────────────────────────────────

    fn reconcile_ticker(&mut self) {
        match (self.session.is_running(), self.ticker.is_some()) {
            (true, false) => self.spawn_ticker(),
            (false, true) => self.cancel_ticker(),
            _ => {}
        }
    }

    fn spawn_ticker(&mut self) {
        self.cancel_ticker();
        let generation = self.ticker_generation;
        let period = self.options.tick_interval;
        let mailbox = self.mailbox.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if !post(&mailbox, Command::Tick(generation)).await {
                    break;
                }
            }
        }));
        trace!(generation, "ticker started");
    }

    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        // Ticks already queued by the old ticker are ignored.
        self.ticker_generation = self.ticker_generation.wrapping_add(1);
    }

    // ── Output ───────────────────────────────────────────────────────

    fn push(&mut self) {
        let snapshot = self.session.to_sync_snapshot();
        self.deps.transport.send(snapshot_to_payload(&snapshot));
        self.ticks_since_push = 0;
    }

    fn publish(&self, event: Event) {
        trace!(?event, "session event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn with_timeout<T>(
    limit: Duration,
    query: impl std::future::Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    match time::timeout(limit, query).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::HealthTimeout {
            timeout_secs: limit.as_secs(),
        }),
    }
}
