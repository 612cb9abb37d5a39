use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, TransportError};
use crate::protocol::{
    HatchCompletePayload, HatchRequest, InboundMessage, OutboundMessage, StatsPayload,
};
use crate::shutdown::ShutdownReceiver;
use crate::stats::Report;

use super::context::{GenerationUsers, WorkerContext};
use super::spawner::{Spawner, SpawnerEvent};
use super::user::UserFactory;

const SPAWNER_EVENT_CAPACITY: usize = 4;

/// Lifecycle of a worker as seen by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Ready,
    Hatching,
    Running,
    Stopped,
}

impl WorkerState {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, WorkerState::Hatching | WorkerState::Running)
    }
}

/// Why the controller loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControllerExit {
    MasterQuit,
    LocalShutdown,
}

struct Generation {
    id: u64,
    cancel: CancellationToken,
    tracker: TaskTracker,
    users: GenerationUsers,
}

/// Owns the worker state and the current generation of virtual users.
///
/// All transitions happen here; the spawner and task loops only observe the
/// generation's cancellation token.
pub(crate) struct Controller {
    context: WorkerContext,
    factory: Arc<dyn UserFactory>,
    state: WorkerState,
    generation: Option<Generation>,
    last_generation_id: u64,
    out_tx: mpsc::Sender<OutboundMessage>,
    spawner_tx: mpsc::Sender<SpawnerEvent>,
    spawner_rx: mpsc::Receiver<SpawnerEvent>,
}

impl Controller {
    pub(crate) fn new(
        context: WorkerContext,
        factory: Arc<dyn UserFactory>,
        out_tx: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        let (spawner_tx, spawner_rx) = mpsc::channel(SPAWNER_EVENT_CAPACITY);
        Self {
            context,
            factory,
            state: WorkerState::Ready,
            generation: None,
            last_generation_id: 0,
            out_tx,
            spawner_tx,
            spawner_rx,
        }
    }

    pub(crate) const fn state(&self) -> WorkerState {
        self.state
    }

    /// Drives the state machine until the master quits, a local shutdown is
    /// requested or the connection fails.
    pub(crate) async fn run(
        mut self,
        mut inbound_rx: mpsc::Receiver<AppResult<InboundMessage>>,
        mut reports_rx: mpsc::Receiver<Report>,
        mut shutdown_rx: ShutdownReceiver,
    ) -> AppResult<ControllerExit> {
        self.send(OutboundMessage::ClientReady).await?;
        let exit = loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Local shutdown requested.");
                    break Ok(ControllerExit::LocalShutdown);
                }
                message = inbound_rx.recv() => {
                    let message = match message {
                        Some(Ok(message)) => message,
                        Some(Err(err)) => break Err(err),
                        None => {
                            break Err(AppError::transport(TransportError::InboundChannelClosed));
                        }
                    };
                    debug!(
                        "Received {} from master while {:?}.",
                        message.message_type(),
                        self.state()
                    );
                    let handled = match message {
                        InboundMessage::Hatch(request) => self.on_hatch(request).await,
                        InboundMessage::Stop => self.on_stop().await,
                        InboundMessage::Quit => {
                            info!("Got quit message from master, shutting down.");
                            break Ok(ControllerExit::MasterQuit);
                        }
                    };
                    if let Err(err) = handled {
                        break Err(err);
                    }
                }
                Some(event) = self.spawner_rx.recv() => {
                    if let Err(err) = self.on_spawner_event(event).await {
                        break Err(err);
                    }
                }
                Some(report) = reports_rx.recv() => {
                    if let Err(err) = self.on_report(report).await {
                        break Err(err);
                    }
                }
            }
        };
        self.retire_generation();
        exit
    }

    /// Starts a new generation, superseding the current one.
    ///
    /// Non-positive values are logged and ignored without any reply.
    pub(crate) async fn on_hatch(&mut self, request: HatchRequest) -> AppResult<()> {
        let Some(plan) = request.plan() else {
            warn!(
                "Invalid hatch message from master, num_clients is {}, hatch_rate is {}.",
                request.num_clients, request.hatch_rate
            );
            return Ok(());
        };

        self.send(OutboundMessage::Hatching).await?;
        if !self.state.is_active() {
            self.context.reporter().clear().await;
        }

        self.retire_generation();
        self.last_generation_id = self.last_generation_id.saturating_add(1);
        let generation = Generation {
            id: self.last_generation_id,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            users: self.context.live_users().begin_generation(),
        };

        info!(
            "Hatching and swarming {} clients at the rate {} clients/s.",
            plan.num_clients, plan.hatch_rate
        );
        self.state = WorkerState::Hatching;
        let spawner = Spawner {
            generation: generation.id,
            plan,
            context: self.context.clone(),
            factory: Arc::clone(&self.factory),
            cancel: generation.cancel.clone(),
            tracker: generation.tracker.clone(),
            users: generation.users.clone(),
            events_tx: self.spawner_tx.clone(),
        };
        generation.tracker.spawn(spawner.run());
        self.generation = Some(generation);
        Ok(())
    }

    /// Cancels every user, then tells the master it may hatch again.
    pub(crate) async fn on_stop(&mut self) -> AppResult<()> {
        self.retire_generation();
        if self.state.is_active() {
            self.state = WorkerState::Stopped;
            info!("Received stop message from master, all users are stopped.");
        }
        self.send(OutboundMessage::ClientStopped).await?;
        self.send(OutboundMessage::ClientReady).await
    }

    pub(crate) async fn on_spawner_event(&mut self, event: SpawnerEvent) -> AppResult<()> {
        let SpawnerEvent::Complete { generation, count } = event;
        let current = self.generation.as_ref().map(|current| current.id);
        if current != Some(generation) || self.state != WorkerState::Hatching {
            debug!("Ignoring completion of superseded generation {}.", generation);
            return Ok(());
        }
        info!("Hatching completed, {} users are created.", count);
        self.state = WorkerState::Running;
        self.send(OutboundMessage::HatchComplete(HatchCompletePayload { count }))
            .await
    }

    pub(crate) async fn on_report(&self, report: Report) -> AppResult<()> {
        let user_count = self
            .generation
            .as_ref()
            .map_or(0, |generation| generation.users.count());
        let payload = StatsPayload::from_report(report, user_count);
        self.send(OutboundMessage::Stats(Box::new(payload))).await
    }

    /// Cancels the live generation and stops counting its users. Users still
    /// inside a task body finish it in the background; cancelled tokens are
    /// never reused.
    fn retire_generation(&mut self) {
        if let Some(generation) = self.generation.take() {
            generation.cancel.cancel();
            generation.tracker.close();
            self.context.live_users().detach();
            debug!(
                "Retired generation {} with {} users still winding down.",
                generation.id,
                generation.users.count()
            );
        }
    }

    async fn send(&self, message: OutboundMessage) -> AppResult<()> {
        self.out_tx
            .send(message)
            .await
            .map_err(|_err| AppError::transport(TransportError::OutboundChannelClosed))
    }
}
