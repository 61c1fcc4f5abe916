//! Start/complete worker threads and the partitioned pool built on them.
//!
//! Each [`SyncThread`] owns a bounded(1) start channel and a bounded(1)
//! completion channel. The run loop is: receive a task, check the
//! terminate flag, run the pool's work function on the task exactly
//! once, signal completion. Dropping the start sender wakes a blocked
//! worker so it can observe termination and exit.
//!
//! [`SyncPool`] fans one task per partition out to its workers, runs the
//! last partition on the calling thread, then waits on every worker. If a
//! worker cannot be spawned the pool degrades to single-partition
//! operation for the rest of its life.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::config::{ConfigError, MAX_POOL_SIZE};
use crate::partition;

/// Work function run by every worker of a pool.
pub type WorkFn<T> = Arc<dyn Fn(T) + Send + Sync>;

type Spawner = fn(String, Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>>;

fn spawn_named(name: String, body: Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name).spawn(body)
}

// ── SyncThread ─────────────────────────────────────────────────────

/// One pool worker.
pub struct SyncThread<T: Send + 'static> {
    start_tx: Option<Sender<T>>,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
    pending: bool,
}

impl<T: Send + 'static> SyncThread<T> {
    /// Spawn a worker named `name` that runs `work` once per start signal.
    pub fn spawn(name: String, terminate: Arc<AtomicBool>, work: WorkFn<T>) -> io::Result<Self> {
        Self::spawn_with(spawn_named, name, terminate, work)
    }

    fn spawn_with(
        spawner: Spawner,
        name: String,
        terminate: Arc<AtomicBool>,
        work: WorkFn<T>,
    ) -> io::Result<Self> {
        let (start_tx, start_rx) = bounded::<T>(1);
        let (done_tx, done_rx) = bounded::<()>(1);
        let handle = spawner(
            name,
            Box::new(move || {
                while let Ok(task) = start_rx.recv() {
                    if terminate.load(Ordering::Acquire) {
                        break;
                    }
                    work(task);
                    if done_tx.send(()).is_err() {
                        break;
                    }
                }
            }),
        )?;
        Ok(Self {
            start_tx: Some(start_tx),
            done_rx,
            handle: Some(handle),
            pending: false,
        })
    }

    /// Hand the worker its next task.
    ///
    /// Returns the task back if the worker has exited, so the caller can
    /// run it inline.
    pub fn start(&mut self, task: T) -> Result<(), T> {
        let Some(tx) = &self.start_tx else {
            return Err(task);
        };
        match tx.send(task) {
            Ok(()) => {
                self.pending = true;
                Ok(())
            }
            Err(err) => Err(err.into_inner()),
        }
    }

    /// Block until the worker signals completion of its last start.
    ///
    /// Returns `false` if the worker died instead of completing.
    pub fn wait(&mut self) -> bool {
        if !self.pending {
            return true;
        }
        self.pending = false;
        self.done_rx.recv().is_ok()
    }

    /// Block until every worker in `threads` has completed its last start.
    /// Returns how many completed normally.
    pub fn wait_all(threads: &mut [SyncThread<T>]) -> usize {
        threads.iter_mut().map(|t| t.wait()).filter(|ok| *ok).count()
    }

    /// Whether a start has not yet been matched by a completion.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Wake the worker, let it exit, and join it. Returns whether the
    /// join succeeded.
    pub fn terminate(&mut self) -> bool {
        self.start_tx = None;
        match self.handle.take() {
            Some(h) => h.join().is_ok(),
            None => false,
        }
    }
}

impl<T: Send + 'static> Drop for SyncThread<T> {
    fn drop(&mut self) {
        self.terminate();
    }
}

// ── SyncPool ───────────────────────────────────────────────────────

/// A named pool of [`SyncThread`]s sharing one work function.
pub struct SyncPool<T: Send + 'static> {
    name: String,
    workers: Vec<SyncThread<T>>,
    terminate: Arc<AtomicBool>,
    work: WorkFn<T>,
    degraded: bool,
    spawner: Spawner,
}

impl<T: Send + 'static> SyncPool<T> {
    /// An empty (single-partition) pool. Workers are created by
    /// [`resize()`](SyncPool::resize).
    pub fn new(name: impl Into<String>, work: WorkFn<T>) -> Self {
        Self {
            name: name.into(),
            workers: Vec::new(),
            terminate: Arc::new(AtomicBool::new(false)),
            work,
            degraded: false,
            spawner: spawn_named,
        }
    }

    #[cfg(test)]
    fn with_spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = spawner;
        self
    }

    /// Number of partitions a dispatch is split into (workers + caller).
    pub fn partitions(&self) -> usize {
        self.workers.len() + 1
    }

    /// Whether a spawn failure has pinned this pool to one partition.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Re-size the pool to `partitions` (spawning `partitions - 1` workers).
    ///
    /// A degraded pool stays at one partition and is never retried.
    pub fn resize(&mut self, partitions: usize) -> Result<(), ConfigError> {
        let wanted = partitions.saturating_sub(1).min(MAX_POOL_SIZE);
        if self.degraded || wanted == self.workers.len() {
            return Ok(());
        }
        self.stop_workers();
        self.terminate = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(wanted);
        for i in 0..wanted {
            let name = format!("{}-{i}", self.name);
            match SyncThread::spawn_with(
                self.spawner,
                name,
                Arc::clone(&self.terminate),
                Arc::clone(&self.work),
            ) {
                Ok(w) => workers.push(w),
                Err(e) => {
                    tracing::error!(
                        pool = %self.name,
                        requested = partitions,
                        error = %e,
                        "worker spawn failed; pool degraded to single-threaded"
                    );
                    self.terminate.store(true, Ordering::Release);
                    drop(workers);
                    self.degraded = true;
                    return Err(ConfigError::ThreadSpawnFailed {
                        reason: format!("{} worker {i}: {e}", self.name),
                    });
                }
            }
        }
        self.workers = workers;
        tracing::info!(pool = %self.name, partitions = self.partitions(), "thread pool ready");
        Ok(())
    }

    /// Run one task per partition and wait for all of them.
    ///
    /// `make(index, count)` builds the task for partition `index`. The
    /// caller's own partition runs after the workers have been started.
    pub fn dispatch(&mut self, make: impl Fn(usize, usize) -> T) {
        let count = self.partitions();
        let caller = partition::caller_partition(count);
        for k in 0..caller {
            let task = make(k, count);
            if let Err(task) = self.workers[k].start(task) {
                tracing::warn!(pool = %self.name, worker = k, "worker gone; running partition inline");
                (self.work)(task);
            }
        }
        (self.work)(make(caller, count));
        let completed = SyncThread::wait_all(&mut self.workers);
        if completed != self.workers.len() {
            tracing::error!(
                pool = %self.name,
                completed,
                workers = self.workers.len(),
                "pool worker died during dispatch"
            );
        }
    }

    fn stop_workers(&mut self) -> usize {
        self.terminate.store(true, Ordering::Release);
        let joined = self.workers.iter_mut().map(|w| w.terminate()).filter(|ok| *ok).count();
        self.workers.clear();
        joined
    }

    /// Terminate and join every worker. Returns how many joined cleanly.
    pub fn shutdown(&mut self) -> usize {
        let joined = self.stop_workers();
        if joined > 0 {
            tracing::debug!(pool = %self.name, joined, "thread pool stopped");
        }
        joined
    }
}

impl<T: Send + 'static> Drop for SyncPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn counting_pool(hits: Arc<AtomicUsize>) -> SyncPool<(usize, usize)> {
        SyncPool::new(
            "test-pool",
            Arc::new(move |(_index, _count): (usize, usize)| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    fn failing_spawner(_: String, _: Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>> {
        Err(io::Error::other("no threads"))
    }

    #[test]
    fn dispatch_runs_every_partition_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut pool = counting_pool(Arc::clone(&hits));
        pool.resize(4).unwrap();
        assert_eq!(pool.partitions(), 4);
        for _ in 0..10 {
            pool.dispatch(|i, n| (i, n));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 40);
    }

    #[test]
    fn caller_takes_last_partition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut pool: SyncPool<usize> = SyncPool::new(
            "names",
            Arc::new(move |index: usize| {
                let on_worker = thread::current()
                    .name()
                    .map(|n| n.starts_with("names-"))
                    .unwrap_or(false);
                sink.lock().push((index, on_worker));
            }),
        );
        pool.resize(3).unwrap();
        pool.dispatch(|i, _| i);
        let mut got = seen.lock().clone();
        got.sort();
        assert_eq!(got, vec![(0, true), (1, true), (2, false)]);
    }

    #[test]
    fn single_partition_spawns_nothing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut pool = counting_pool(Arc::clone(&hits));
        pool.resize(1).unwrap();
        assert_eq!(pool.partitions(), 1);
        pool.dispatch(|i, n| (i, n));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn spawn_failure_degrades_permanently() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut pool = counting_pool(Arc::clone(&hits)).with_spawner(failing_spawner);
        assert!(matches!(
            pool.resize(4),
            Err(ConfigError::ThreadSpawnFailed { .. })
        ));
        assert!(pool.is_degraded());
        assert_eq!(pool.partitions(), 1);
        pool.spawner = spawn_named;
        assert!(pool.resize(4).is_ok());
        assert_eq!(pool.partitions(), 1);
        pool.dispatch(|i, n| (i, n));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_joins_blocked_workers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut pool = counting_pool(hits);
        pool.resize(3).unwrap();
        assert_eq!(pool.shutdown(), 2);
        assert_eq!(pool.partitions(), 1);
    }

    #[test]
    fn resize_replaces_workers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut pool = counting_pool(Arc::clone(&hits));
        pool.resize(3).unwrap();
        pool.resize(2).unwrap();
        assert_eq!(pool.partitions(), 2);
        pool.dispatch(|i, n| (i, n));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_worker_does_not_hang_dispatch() {
        let mut pool: SyncPool<usize> = SyncPool::new(
            "panicky",
            Arc::new(|index: usize| {
                if index == 0 {
                    panic!("boom");
                }
            }),
        );
        pool.resize(2).unwrap();
        pool.dispatch(|i, _| i);
        assert_eq!(pool.partitions(), 2);
    }

    #[test]
    fn wait_without_start_returns_immediately() {
        let mut t: SyncThread<()> =
            SyncThread::spawn("idle".into(), Arc::new(AtomicBool::new(false)), Arc::new(|_| {}))
                .unwrap();
        assert!(!t.is_pending());
        assert!(t.wait());
        assert!(t.terminate());
    }
}
