use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::protocol::HatchPlan;

use super::context::{GenerationUsers, WorkerContext};
use super::task_loop::TaskLoop;
use super::user::{TaskContext, UserFactory};

const SPAWN_TICK: Duration = Duration::from_secs(1);

/// Reported back to the controller when a generation is fully spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpawnerEvent {
    Complete { generation: u64, count: u64 },
}

/// Spawns one generation of virtual users, `hatch_rate` per second.
pub(crate) struct Spawner {
    pub generation: u64,
    pub plan: HatchPlan,
    pub context: WorkerContext,
    pub factory: Arc<dyn UserFactory>,
    pub cancel: CancellationToken,
    pub tracker: TaskTracker,
    pub users: GenerationUsers,
    pub events_tx: mpsc::Sender<SpawnerEvent>,
}

impl Spawner {
    pub(crate) async fn run(self) {
        let Spawner {
            generation,
            plan,
            context,
            factory,
            cancel,
            tracker,
            users,
            events_tx,
        } = self;

        let mut spawn_tick = interval(SPAWN_TICK);
        spawn_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut spawned = 0_usize;
        while spawned < plan.num_clients {
            tokio::select! {
                () = cancel.cancelled() => return,
                _ = spawn_tick.tick() => {}
            }
            let batch = plan
                .hatch_rate
                .min(plan.num_clients.saturating_sub(spawned));
            for _ in 0..batch {
                if cancel.is_cancelled() {
                    return;
                }
                let user_id = spawned;
                spawned = spawned.saturating_add(1);

                let user = factory.create(user_id);
                let task_loop = TaskLoop {
                    context: TaskContext::new(
                        user_id,
                        context.reporter().clone(),
                        cancel.clone(),
                    ),
                    config: user.config(),
                    tasks: user.tasks(),
                    rate_limiter: context.rate_limiter().cloned(),
                    cancel: cancel.clone(),
                };
                let guard = users.enter();
                tracker.spawn(async move {
                    let _live = guard;
                    task_loop.run().await;
                });
            }
            debug!(
                "Generation {}: {} of {} users spawned.",
                generation, spawned, plan.num_clients
            );
        }

        let count = u64::try_from(spawned).unwrap_or(u64::MAX);
        if events_tx
            .send(SpawnerEvent::Complete { generation, count })
            .await
            .is_err()
        {
            debug!("Controller gone before generation {} completed.", generation);
        }
    }
}
