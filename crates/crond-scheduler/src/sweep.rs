use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::debug;

use crate::engine::{Engine, Runnable};

/// Runnable that removes exhausted entries from its engine.
///
/// Registered on a short recurring schedule. It holds only a weak reference,
/// so the entry it lives in does not keep the engine alive.
pub struct Sweeper {
    engine: Weak<Engine>,
}

impl Sweeper {
    pub fn new(engine: &Arc<Engine>) -> Arc<Self> {
        Arc::new(Self {
            engine: Arc::downgrade(engine),
        })
    }
}

#[async_trait]
impl Runnable for Sweeper {
    fn name(&self) -> &str {
        "crond-sweep"
    }

    async fn run(&self) {
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        let spent = engine.sweep_exhausted();
        if !spent.is_empty() {
            debug!(entries = ?spent, "swept exhausted one-shot entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;
    use chrono::Local;

    struct Noop;

    #[async_trait]
    impl Runnable for Noop {
        fn name(&self) -> &str {
            "noop"
        }
        async fn run(&self) {}
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweeper_clears_spent_one_shots_only() {
        let engine = Engine::new();
        let sweep_id = engine.add_expr("@every 1s", Sweeper::new(&engine)).unwrap();
        let recurring = engine.add_expr("@hourly", Arc::new(Noop)).unwrap();
        let once = engine.add(
            Schedule::once(Local::now() + chrono::Duration::milliseconds(100)),
            Arc::new(Noop),
        );
        engine.start();
        tokio::time::sleep(std::time::Duration::from_millis(2300)).await;
        engine.stop();

        assert!(engine.entry(once).is_none());
        assert!(engine.entry(recurring).is_some());
        assert!(engine.entry(sweep_id).is_some());
    }
}
