use super::config::{AffinityConfig, ExecutorMode};
use crate::error::ConfigError;
use may::sync::mpsc;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Rust's default stack size for spawned threads
const PLATFORM_THREAD_STACK: usize = 2 * 1024 * 1024;

/// Per-executor counters
#[derive(Debug, Default)]
pub struct ExecutorMetrics {
    /// Jobs submitted to the executor
    pub dispatched_count: AtomicU64,
    /// Jobs that ran to completion, including those that panicked
    pub completed_count: AtomicU64,
    /// Jobs whose handler panicked
    pub panicked_count: AtomicU64,
    /// Jobs queued and not yet started (approximate)
    pub queue_depth: AtomicUsize,
}

impl ExecutorMetrics {
    /// Create new metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dispatch event
    pub fn record_dispatch(&self) {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job leaving the queue
    pub fn record_start(&self) {
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a send that never reached the executor
    pub fn record_undelivered(&self) {
        self.dispatched_count.fetch_sub(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a completion event
    pub fn record_completion(&self) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a handler panic
    pub fn record_panic(&self) {
        self.panicked_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total dispatched count
    pub fn get_dispatched_count(&self) -> u64 {
        self.dispatched_count.load(Ordering::Relaxed)
    }

    /// Get total completed count
    pub fn get_completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }

    /// Get total panicked count
    pub fn get_panicked_count(&self) -> u64 {
        self.panicked_count.load(Ordering::Relaxed)
    }

    /// Get current queue depth
    pub fn get_queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }
}

/// A job that could not be queued because its executor has stopped.
pub struct ExecutorClosed<J> {
    /// Executor the job was meant for
    pub index: usize,
    /// The job, handed back to the caller
    pub job: J,
}

impl<J> fmt::Debug for ExecutorClosed<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorClosed")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl<J> fmt::Display for ExecutorClosed<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "executor {} is not accepting jobs", self.index)
    }
}

impl<J> std::error::Error for ExecutorClosed<J> {}

enum WorkerHandle {
    Thread(std::thread::JoinHandle<()>),
    Coroutine(may::coroutine::JoinHandle<()>),
}

impl WorkerHandle {
    fn join(self) -> bool {
        match self {
            WorkerHandle::Thread(handle) => handle.join().is_ok(),
            WorkerHandle::Coroutine(handle) => handle.join().is_ok(),
        }
    }
}

type JobHandler<J> = Arc<dyn Fn(usize, J) + Send + Sync>;

/// Fixed set of single-consumer executors keyed by affinity.
///
/// Every executor drains its own unbounded FIFO queue on one thread or
/// coroutine, so all jobs submitted with the same key run sequentially in
/// submission order. The pool size is a power of two and the executor for a
/// key is `key & (len - 1)`.
///
/// A panic in the job handler is caught and logged; the executor keeps serving
/// its queue.
pub struct AffinityRouter<J: Send + 'static> {
    config: AffinityConfig,
    size: usize,
    mask: u64,
    senders: Vec<mpsc::Sender<J>>,
    metrics: Vec<Arc<ExecutorMetrics>>,
    workers: Vec<WorkerHandle>,
}

impl<J: Send + 'static> AffinityRouter<J> {
    /// Spawn the executors.
    ///
    /// `handler` receives the executor index and each job taken from that
    /// executor's queue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ExecutorSpawn`] if a thread or coroutine cannot
    /// be created. Executors spawned before the failure are shut down.
    pub fn new<F>(config: AffinityConfig, handler: F) -> Result<Self, ConfigError>
    where
        F: Fn(usize, J) + Send + Sync + 'static,
    {
        let size = config.resolved_executor_count();
        let handler: JobHandler<J> = Arc::new(handler);

        info!(
            executors = size,
            name_prefix = %config.name_prefix,
            mode = ?config.mode,
            detached = config.detached,
            stack_size = config.stack_size,
            "Creating affinity executors"
        );

        let mut router = Self {
            config,
            size,
            mask: (size as u64).saturating_sub(1),
            senders: Vec::with_capacity(size),
            metrics: Vec::with_capacity(size),
            workers: Vec::with_capacity(size),
        };

        for index in 0..size {
            let (tx, rx) = mpsc::channel::<J>();
            let metrics = Arc::new(ExecutorMetrics::new());
            let name = router.config.executor_name(size, index);

            let worker = spawn_worker(
                &router.config,
                name.clone(),
                index,
                rx,
                Arc::clone(&handler),
                Arc::clone(&metrics),
            );

            match worker {
                Ok(handle) => {
                    router.senders.push(tx);
                    router.metrics.push(metrics);
                    router.workers.push(handle);
                }
                Err(e) => {
                    error!(executor = %name, error = %e, "Failed to spawn executor");
                    // joined below regardless of `detached`
                    router.config.detached = false;
                    router.shutdown();
                    return Err(ConfigError::ExecutorSpawn {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(router)
    }

    /// Number of executors (a power of two).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Always false: a router has at least one executor.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Executor index for an affinity key.
    #[inline]
    #[must_use]
    pub fn select(&self, key: i64) -> usize {
        ((key as u64) & self.mask) as usize
    }

    /// Queue `job` on the executor selected by `key`.
    ///
    /// Never blocks. Returns the executor index.
    ///
    /// # Errors
    ///
    /// Hands the job back in [`ExecutorClosed`] if the executor has stopped.
    pub fn execute(&self, key: i64, job: J) -> Result<usize, ExecutorClosed<J>> {
        self.execute_on(self.select(key), job)
    }

    /// Queue `job` on executor `index`.
    ///
    /// # Errors
    ///
    /// Hands the job back in [`ExecutorClosed`] if the index is out of range
    /// or the executor has stopped.
    pub fn execute_on(&self, index: usize, job: J) -> Result<usize, ExecutorClosed<J>> {
        let (Some(sender), Some(metrics)) = (self.senders.get(index), self.metrics.get(index))
        else {
            return Err(ExecutorClosed { index, job });
        };

        metrics.record_dispatch();
        match sender.send(job) {
            Ok(()) => Ok(index),
            Err(e) => {
                let job = e.0;
                metrics.record_undelivered();
                error!(executor = index, "Executor channel disconnected");
                Err(ExecutorClosed { index, job })
            }
        }
    }

    /// Counters for executor `index`.
    #[must_use]
    pub fn metrics(&self, index: usize) -> Option<&Arc<ExecutorMetrics>> {
        self.metrics.get(index)
    }

    /// Get configuration for this router
    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    /// Close every queue. Jobs already queued still run.
    ///
    /// Unless the router is detached, waits for the executors to drain their
    /// queues and exit. Later submissions fail with [`ExecutorClosed`].
    pub fn shutdown(&mut self) {
        let detached = self.config.detached;
        let workers = std::mem::take(&mut self.workers);
        if self.senders.is_empty() && workers.is_empty() {
            return;
        }
        self.senders.clear();

        if detached {
            debug!(executors = workers.len(), "Detaching executors");
            return;
        }

        for (index, worker) in workers.into_iter().enumerate() {
            if !worker.join() {
                warn!(executor = index, "Executor exited abnormally");
            }
        }
        info!(executors = self.size, "Affinity executors stopped");
    }
}

impl<J: Send + 'static> Drop for AffinityRouter<J> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<J: Send + 'static> fmt::Debug for AffinityRouter<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityRouter")
            .field("config", &self.config)
            .field("size", &self.size)
            .field("open", &!self.senders.is_empty())
            .finish()
    }
}

fn spawn_worker<J: Send + 'static>(
    config: &AffinityConfig,
    name: String,
    index: usize,
    rx: mpsc::Receiver<J>,
    handler: JobHandler<J>,
    metrics: Arc<ExecutorMetrics>,
) -> std::io::Result<WorkerHandle> {
    match config.mode {
        ExecutorMode::Thread => {
            let mut builder = std::thread::Builder::new().name(name.clone());
            if config.stack_size > PLATFORM_THREAD_STACK {
                builder = builder.stack_size(config.stack_size);
            }
            builder
                .spawn(move || run_worker(&name, index, &rx, &handler, &metrics))
                .map(WorkerHandle::Thread)
        }
        ExecutorMode::Coroutine => spawn_coroutine(config.stack_size, name, index, rx, handler, metrics),
    }
}

#[allow(unsafe_code)]
fn spawn_coroutine<J: Send + 'static>(
    stack_size: usize,
    name: String,
    index: usize,
    rx: mpsc::Receiver<J>,
    handler: JobHandler<J>,
    metrics: Arc<ExecutorMetrics>,
) -> std::io::Result<WorkerHandle> {
    let builder = may::coroutine::Builder::new()
        .name(name.clone())
        .stack_size(stack_size);
    // SAFETY: the coroutine owns everything it touches and never uses
    // thread-local storage across a yield point.
    let handle = unsafe {
        builder.spawn(move || run_worker(&name, index, &rx, &handler, &metrics))
    }?;
    Ok(WorkerHandle::Coroutine(handle))
}

fn run_worker<J>(
    name: &str,
    index: usize,
    rx: &mpsc::Receiver<J>,
    handler: &JobHandler<J>,
    metrics: &ExecutorMetrics,
) {
    debug!(executor = %name, index = index, "Executor started");

    // Drain until every sender is gone
    while let Ok(job) = rx.recv() {
        metrics.record_start();
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(index, job))) {
            metrics.record_panic();
            error!(
                executor = %name,
                index = index,
                panic_message = %panic_message(panic.as_ref()),
                "Job handler panicked"
            );
        }
        metrics.record_completion();
    }

    debug!(executor = %name, index = index, "Executor exiting");
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
