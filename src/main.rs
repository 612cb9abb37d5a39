use std::time::Duration;

use swarmer::error::AppResult;
use swarmer::{Task, TaskContext, User, UserConfig};

const DEMO_WAIT: Duration = Duration::from_secs(5);
const DEMO_REQUEST_TIME: Duration = Duration::from_millis(100);

/// Built-in user for smoke-testing a master: one succeeding and one failing
/// task, five seconds apart.
struct DemoUser;

impl User for DemoUser {
    fn config(&self) -> UserConfig {
        UserConfig::fixed(DEMO_WAIT)
    }

    fn tasks(&self) -> Vec<Task> {
        vec![Task::new("foo", 10, foo), Task::new("bar", 20, bar)]
    }
}

async fn foo(ctx: TaskContext) {
    let started = swarmer::now_ms();
    tokio::time::sleep(DEMO_REQUEST_TIME).await;
    let elapsed = swarmer::now_ms().saturating_sub(started);
    ctx.reporter().success("http", "foo", elapsed, 10).await;
}

async fn bar(ctx: TaskContext) {
    let started = swarmer::now_ms();
    tokio::time::sleep(DEMO_REQUEST_TIME).await;
    let elapsed = swarmer::now_ms().saturating_sub(started);
    ctx.reporter().failure("udp", "bar", elapsed, "udp error").await;
}

fn main() -> AppResult<()> {
    swarmer::run(|_user_id: usize| DemoUser)
}
