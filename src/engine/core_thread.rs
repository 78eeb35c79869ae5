//! The single background executor every engine interaction runs on.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread,
};

use thiserror::Error;
use tokio::{
    runtime::Builder,
    sync::{mpsc, oneshot},
};

pub const CORE_THREAD_NAME: &str = "sipconv-core";

const CORE_THREAD_STARTED: &str = "CORE_THREAD_STARTED";
const CORE_THREAD_STOPPED: &str = "CORE_THREAD_STOPPED";
const CORE_THREAD_POST_REJECTED: &str = "CORE_THREAD_POST_REJECTED";

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum CoreThreadError {
    #[error("failed to build core thread runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn core thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Cloneable handle posting jobs to the core thread.
///
/// Jobs run one at a time, in posting order. The thread exits once every
/// handle is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct CoreThread {
    job_tx: mpsc::UnboundedSender<Job>,
    posted: Arc<AtomicU64>,
}

impl CoreThread {
    pub fn start() -> Result<Self, CoreThreadError> {
        let runtime = Builder::new_current_thread()
            .build()
            .map_err(CoreThreadError::Runtime)?;
        let (job_tx, job_rx) = mpsc::unbounded_channel::<Job>();

        thread::Builder::new()
            .name(CORE_THREAD_NAME.to_owned())
            .spawn(move || runtime.block_on(drain(job_rx)))
            .map_err(CoreThreadError::Spawn)?;

        tracing::debug!(
            code = CORE_THREAD_STARTED,
            thread = CORE_THREAD_NAME,
            "core thread started"
        );

        Ok(Self {
            job_tx,
            posted: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.posted.fetch_add(1, Ordering::AcqRel);
        if self.job_tx.send(Box::new(job)).is_err() {
            tracing::warn!(
                code = CORE_THREAD_POST_REJECTED,
                "core thread is gone; job dropped"
            );
        }
    }

    /// Blocks until every job posted before this call has run.
    ///
    /// Returns `false` if the core thread is gone. Called from the core thread
    /// itself it returns immediately.
    pub fn wait_idle(&self) -> bool {
        if Self::is_current() {
            return true;
        }

        let (done_tx, done_rx) = oneshot::channel();
        self.post(move || {
            let _ = done_tx.send(());
        });

        done_rx.blocking_recv().is_ok()
    }

    /// Like [`CoreThread::wait_idle`], but also waits for the jobs those jobs
    /// posted, until a full round passes without new work.
    pub fn wait_settled(&self) -> bool {
        if Self::is_current() {
            return true;
        }

        loop {
            let before = self.posted.load(Ordering::Acquire);
            if !self.wait_idle() {
                return false;
            }
            // The barrier job itself accounts for one post.
            if self.posted.load(Ordering::Acquire) == before + 1 {
                return true;
            }
        }
    }

    pub fn is_current() -> bool {
        thread::current().name() == Some(CORE_THREAD_NAME)
    }
}

async fn drain(mut job_rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = job_rx.recv().await {
        job();
    }

    tracing::debug!(code = CORE_THREAD_STOPPED, "core thread stopped");
}
