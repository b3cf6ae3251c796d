use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tracing::{debug, info};

use crate::{error::Result, schedule::Schedule};

/// Opaque handle of a registered entry. IDs are never reused within one
/// engine, so a stale handle can never remove someone else's entry.
pub type EntryId = u64;

/// Idle wake-up when the table is empty or nothing is due soon.
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// A unit of work the engine fires on schedule.
///
/// Every firing runs on a fresh Tokio task, so `run` may be in flight several
/// times at once if a previous firing has not finished yet.
#[async_trait]
pub trait Runnable: Send + Sync + 'static {
    /// Label used in logs and entry listings.
    fn name(&self) -> &str;

    async fn run(&self);
}

struct Entry {
    schedule: Schedule,
    runnable: Arc<dyn Runnable>,
    next: Option<DateTime<Local>>,
    prev: Option<DateTime<Local>>,
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySnapshot {
    pub id: EntryId,
    pub name: String,
    pub schedule: String,
    pub next: Option<DateTime<Local>>,
    pub prev: Option<DateTime<Local>>,
}

impl EntrySnapshot {
    /// True once the schedule has nothing left to fire (a spent one-shot).
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

#[derive(Default)]
struct Table {
    entries: BTreeMap<EntryId, Entry>,
    last_id: EntryId,
}

/// Calendar scheduler: an entry table plus a clock task that fires due
/// entries concurrently.
///
/// Entries may be added and removed whether or not the clock is running; the
/// clock task is woken on every change so it always sleeps until the true
/// earliest deadline.
pub struct Engine {
    table: Mutex<Table>,
    wake: Notify,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl Engine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(Table::default()),
            wake: Notify::new(),
            shutdown: Mutex::new(None),
        })
    }

    /// Register `runnable` under an already-parsed schedule. Cannot fail.
    pub fn add(&self, schedule: Schedule, runnable: Arc<dyn Runnable>) -> EntryId {
        let now = Local::now();
        let id = {
            let mut table = self.table();
            table.last_id += 1;
            let id = table.last_id;
            let next = schedule.first_after(now);
            debug!(
                entry_id = id,
                name = runnable.name(),
                schedule = %schedule,
                ?next,
                "entry added"
            );
            table.entries.insert(
                id,
                Entry {
                    schedule,
                    runnable,
                    next,
                    prev: None,
                },
            );
            id
        };
        self.wake.notify_one();
        id
    }

    /// Parse `expr` and register `runnable` under it.
    pub fn add_expr(&self, expr: &str, runnable: Arc<dyn Runnable>) -> Result<EntryId> {
        let schedule = Schedule::parse(expr)?;
        Ok(self.add(schedule, runnable))
    }

    /// Remove an entry. Returns false if no such entry exists. A firing that
    /// is already in flight is not cancelled.
    pub fn remove(&self, id: EntryId) -> bool {
        let removed = self.table().entries.remove(&id).is_some();
        if removed {
            debug!(entry_id = id, "entry removed");
            self.wake.notify_one();
        }
        removed
    }

    pub fn entry(&self, id: EntryId) -> Option<EntrySnapshot> {
        self.table().entries.get(&id).map(|e| snapshot(id, e))
    }

    /// All entries, ordered by ID.
    pub fn entries(&self) -> Vec<EntrySnapshot> {
        self.table()
            .entries
            .iter()
            .map(|(id, e)| snapshot(*id, e))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry whose schedule reports itself exhausted.
    pub fn sweep_exhausted(&self) -> Vec<EntryId> {
        let mut table = self.table();
        let spent: Vec<EntryId> = table
            .entries
            .iter()
            .filter(|(_, e)| e.next.is_none())
            .map(|(id, _)| *id)
            .collect();
        for id in &spent {
            table.entries.remove(id);
        }
        spent
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let count = {
            let mut table = self.table();
            let count = table.entries.len();
            table.entries.clear();
            count
        };
        info!(count, "scheduler entries cleared");
        self.wake.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_slot().is_some()
    }

    /// Spawn the clock task. No-op if it is already running.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.shutdown_slot();
        if slot.is_some() {
            return;
        }
        let (tx, rx) = watch::channel(false);
        *slot = Some(tx);
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run(rx).await });
    }

    /// Stop the clock task. Entries are kept; in-flight firings finish on
    /// their own.
    pub fn stop(&self) {
        if let Some(tx) = self.shutdown_slot().take() {
            let _ = tx.send(true);
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");
        loop {
            let wait = self.until_next_deadline(Local::now());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.fire_due(Local::now());
                }
                _ = self.wake.notified() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler engine stopped");
                        break;
                    }
                }
            }
        }
    }

    fn until_next_deadline(&self, now: DateTime<Local>) -> Duration {
        self.table()
            .entries
            .values()
            .filter_map(|e| e.next)
            .min()
            .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO))
            .unwrap_or(IDLE_WAIT)
            .min(IDLE_WAIT)
    }

    /// Advance every due entry and spawn its runnable. The table lock is
    /// released before any runnable starts, so runnables may add or remove
    /// entries themselves.
    fn fire_due(&self, now: DateTime<Local>) {
        let due: Vec<(EntryId, Arc<dyn Runnable>)> = {
            let mut table = self.table();
            table
                .entries
                .iter_mut()
                .filter(|(_, e)| e.next.is_some_and(|next| next <= now))
                .map(|(id, e)| {
                    e.prev = e.next;
                    e.next = e.schedule.next_after(now);
                    (*id, Arc::clone(&e.runnable))
                })
                .collect()
        };

        for (id, runnable) in due {
            debug!(entry_id = id, name = runnable.name(), "firing entry");
            tokio::spawn(async move { runnable.run().await });
        }
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn shutdown_slot(&self) -> MutexGuard<'_, Option<watch::Sender<bool>>> {
        self.shutdown.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn snapshot(id: EntryId, e: &Entry) -> EntrySnapshot {
    EntrySnapshot {
        id,
        name: e.runnable.name().to_string(),
        schedule: e.schedule.to_string(),
        next: e.next,
        prev: e.prev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        hits: AtomicUsize,
    }

    #[async_trait]
    impl Runnable for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        async fn run(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counter() -> Arc<Counter> {
        Arc::new(Counter {
            hits: AtomicUsize::new(0),
        })
    }

    #[test]
    fn ids_are_unique_and_removal_is_exact() {
        let engine = Engine::new();
        let a = engine.add_expr("@hourly", counter()).unwrap();
        let b = engine.add_expr("@hourly", counter()).unwrap();
        assert_ne!(a, b);
        assert!(engine.remove(a));
        assert!(!engine.remove(a));
        assert_eq!(engine.len(), 1);
        assert!(engine.entry(b).is_some());
    }

    #[test]
    fn bad_expression_registers_nothing() {
        let engine = Engine::new();
        assert!(engine.add_expr("not a schedule", counter()).is_err());
        assert!(engine.is_empty());
    }

    #[test]
    fn snapshot_reports_next_fire() {
        let engine = Engine::new();
        let id = engine.add_expr("@every 10s", counter()).unwrap();
        let snap = engine.entry(id).unwrap();
        assert_eq!(snap.name, "counter");
        assert!(snap.next.is_some());
        assert!(snap.prev.is_none());
        assert!(!snap.is_exhausted());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn recurring_entry_fires_repeatedly() {
        let engine = Engine::new();
        let c = counter();
        engine.add_expr("@every 1s", c.clone()).unwrap();
        engine.start();
        tokio::time::sleep(Duration::from_millis(2600)).await;
        engine.stop();
        assert!(c.hits.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn one_shot_fires_once_and_is_swept() {
        let engine = Engine::new();
        engine.start();
        let c = counter();
        let at = Local::now() + chrono::Duration::milliseconds(300);
        let id = engine.add(Schedule::once(at), c.clone());
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(c.hits.load(Ordering::SeqCst), 1);
        assert!(engine.entry(id).unwrap().is_exhausted());
        assert_eq!(engine.sweep_exhausted(), vec![id]);
        assert!(engine.is_empty());
        engine.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn removed_entry_stops_firing() {
        let engine = Engine::new();
        engine.start();
        let c = counter();
        let id = engine.add_expr("@every 1s", c.clone()).unwrap();
        engine.remove(id);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(c.hits.load(Ordering::SeqCst), 0);
        engine.stop();
        assert!(!engine.is_running());
    }
}
