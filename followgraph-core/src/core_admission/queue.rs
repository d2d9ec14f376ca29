//! Semaphore-gated FIFO dispatcher

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The queue has been drained and accepts no more work
    #[error("Admission queue is closed")]
    Closed,

    /// The operation panicked or was cancelled before producing a result
    #[error("Operation aborted before completing")]
    TaskAborted,
}

type Job = Box<dyn FnOnce(OwnedSemaphorePermit) + Send>;

/// Result of one submitted operation
#[must_use = "an AdmissionHandle does nothing unless awaited"]
pub struct AdmissionHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for AdmissionHandle<T> {
    type Output = Result<T, AdmissionError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| AdmissionError::TaskAborted))
    }
}

/// Decrements the in-flight count however the task ends
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(in_flight: Arc<AtomicUsize>, waited: std::time::Duration) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        metrics::admission_started(waited);
        Self { in_flight }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        metrics::admission_finished();
    }
}

/// Runs submitted operations with at most `limit` in flight.
///
/// Excess submissions wait in FIFO order. Every submission runs exactly once
/// and its handle receives its own result; a failing or panicking operation
/// does not affect the others. Must be created inside a Tokio runtime.
pub struct AdmissionQueue {
    limit: usize,
    semaphore: Arc<Semaphore>,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    in_flight: Arc<AtomicUsize>,
    pending: Arc<AtomicUsize>,
}

impl AdmissionQueue {
    /// Largest usable limit; `drain` reclaims every permit in one call
    pub const MAX_LIMIT: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
        Semaphore::MAX_PERMITS
    } else {
        u32::MAX as usize
    };

    /// The limit is clamped to `1..=MAX_LIMIT`
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, Self::MAX_LIMIT);
        let semaphore = Arc::new(Semaphore::new(limit));
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));

        let dispatcher = tokio::spawn(dispatch(receiver, semaphore.clone(), pending.clone()));
        debug!(limit, "Started admission queue");

        Self {
            limit,
            semaphore,
            sender: Mutex::new(Some(sender)),
            dispatcher: Mutex::new(Some(dispatcher)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            pending,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Operations currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Operations submitted but not yet started
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Queue `future`; it starts once a slot frees up
    pub fn submit<F, T>(&self, future: F) -> Result<AdmissionHandle<T>, AdmissionError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let in_flight = self.in_flight.clone();
        let submitted_at = Instant::now();

        let job: Job = Box::new(move |permit| {
            tokio::spawn(async move {
                let _permit = permit;
                let _guard = InFlightGuard::enter(in_flight, submitted_at.elapsed());
                let output = future.await;
                // Receiver gone means the caller stopped waiting.
                let _ = tx.send(output);
            });
        });

        let sender = self.sender.lock().map_err(|_| AdmissionError::Closed)?;
        let sender = sender.as_ref().ok_or(AdmissionError::Closed)?;
        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(AdmissionError::Closed);
        }
        metrics::admission_submitted();

        Ok(AdmissionHandle { rx })
    }

    /// Run `op(args)` under the queue and hand its result to `callback`
    pub fn enqueue<A, Op, Fut, T, C>(&self, op: Op, args: A, callback: C) -> Result<(), AdmissionError>
    where
        A: Send + 'static,
        Op: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(Result<T, AdmissionError>) + Send + 'static,
    {
        let handle = self.submit(async move { op(args).await })?;
        tokio::spawn(async move { callback(handle.await) });
        Ok(())
    }

    /// Stop accepting work and wait for everything already submitted
    pub async fn drain(&self) -> Result<(), AdmissionError> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| AdmissionError::Closed)?
            .take();
        drop(sender);

        let dispatcher = self
            .dispatcher
            .lock()
            .map_err(|_| AdmissionError::Closed)?
            .take();
        if let Some(dispatcher) = dispatcher {
            if let Err(e) = dispatcher.await {
                warn!("Admission dispatcher ended abnormally: {}", e);
            }
        }

        // Every permit back means nothing is still running.
        let permits = u32::try_from(self.limit).map_err(|_| AdmissionError::Closed)?;
        let _all = self
            .semaphore
            .acquire_many(permits)
            .await
            .map_err(|_| AdmissionError::Closed)?;
        debug!(limit = self.limit, "Drained admission queue");
        Ok(())
    }
}

async fn dispatch(
    mut receiver: mpsc::UnboundedReceiver<Job>,
    semaphore: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(job) = receiver.recv().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        pending.fetch_sub(1, Ordering::SeqCst);
        job(permit);
    }
}
