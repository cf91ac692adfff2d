//! Dispatch context: a dedicated owner thread for serialized state.
//!
//! A [`DispatchContext`] owns one thread that drains a queue of jobs in
//! submission order. Components that keep single-owner state (such as a
//! reachability monitor's status fields) post every mutation here instead of
//! taking locks around their hot paths; the queue is the serialization
//! mechanism.
//!
//! # Example
//!
//! ```
//! use reachline_core::DispatchContext;
//!
//! let ctx = DispatchContext::new();
//! ctx.post(|| println!("runs on the dispatch thread"));
//! ctx.flush(); // wait until everything queued so far has executed
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::Mutex;

/// Default thread name for a dispatch context.
const DEFAULT_THREAD_NAME: &str = "reachline-dispatch";

enum Job {
    Run(Box<dyn FnOnce() + Send>),
    Shutdown,
}

/// A dedicated thread that executes posted jobs sequentially.
///
/// Jobs run in the order they were posted. The thread is started by
/// [`new`](Self::new) and stopped (draining remaining jobs) when the context
/// is dropped. `DispatchContext` is `Send + Sync`; any thread may post.
pub struct DispatchContext {
    job_sender: Sender<Job>,
    handle: Mutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
    thread_id: ThreadId,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchContext {
    /// Start a dispatch context with the default thread name.
    pub fn new() -> Self {
        Self::with_name(DEFAULT_THREAD_NAME)
    }

    /// Start a dispatch context with a custom thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        let (sender, receiver) = unbounded();
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                dispatch_loop(receiver);
                thread_running.store(false, Ordering::Release);
            })
            .expect("failed to spawn dispatch thread");

        let thread_id = handle.thread().id();

        Self {
            job_sender: sender,
            handle: Mutex::new(Some(handle)),
            running,
            thread_id,
        }
    }

    /// Whether the dispatch thread is still accepting jobs.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the calling thread *is* the dispatch thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queue a job for execution on the dispatch thread.
    ///
    /// Returns `false` if the context has been stopped, in which case the
    /// job is dropped.
    pub fn post<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            tracing::trace!(target: "reachline_core::dispatch", "context stopped, dropping job");
            return false;
        }
        self.job_sender.send(Job::Run(Box::new(job))).is_ok()
    }

    /// Block until every job posted before this call has executed.
    ///
    /// Calling from the dispatch thread itself returns immediately: jobs are
    /// executed in order, so everything posted before the running job has
    /// already completed.
    pub fn flush(&self) {
        if self.is_current() || !self.is_running() {
            return;
        }
        let (barrier_sender, barrier_receiver) = bounded(1);
        if self.post(move || {
            let _ = barrier_sender.send(());
        }) {
            let _ = barrier_receiver.recv();
        }
    }

    /// Stop accepting jobs and let the thread exit after the queue drains.
    ///
    /// Non-blocking; use [`join`](Self::join) to wait for the thread.
    /// Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let _ = self.job_sender.send(Job::Shutdown);
    }

    /// Wait for the dispatch thread to finish.
    ///
    /// Returns `true` if the thread was joined by this call. Calling from
    /// the dispatch thread itself returns `false` immediately; the thread
    /// cannot join itself.
    pub fn join(&self) -> bool {
        if self.is_current() {
            return false;
        }
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }
}

impl Drop for DispatchContext {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

fn dispatch_loop(receiver: Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        match job {
            Job::Run(job) => job(),
            Job::Shutdown => break,
        }
    }
    tracing::debug!(target: "reachline_core::dispatch", "dispatch thread exiting");
}
