use rayon::ThreadPool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to build worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),

    #[error("Worker task panicked")]
    Panicked,
}

/// Shared thread pool for CPU-bound tasks such as parsing map sources
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<ThreadPool>,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Result<Self, WorkerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("mapkeeper-worker-{}", i))
            // rayon aborts the process on a spawned panic unless a handler is set
            .panic_handler(|_| tracing::error!("Worker task panicked"))
            .build()?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// One thread per logical CPU
    pub fn with_cpu_count() -> Result<Self, WorkerError> {
        Self::new(num_cpus::get())
    }

    /// Execute a CPU-bound task in the thread pool and return result asynchronously
    pub async fn execute<F, R>(&self, f: F) -> Result<R, WorkerError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            let result = f();
            let _ = tx.send(result);
        });

        rx.await.map_err(|_| WorkerError::Panicked)
    }
}
