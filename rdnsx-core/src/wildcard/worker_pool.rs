//! Bounded worker pool driving concurrent detection tasks (§5).
//!
//! Grounded on `pkg/threadpool/threadpool.go` and `worker.go`: a fixed pool of
//! workers pulling from one bounded task queue, a submitted/completed counter
//! pair standing in for the donor's `sync.WaitGroup`, and a cooperative cancel
//! signal workers check between tasks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

/// A fixed-size pool of tokio tasks consuming from one bounded async channel.
/// `execute` blocks (async) when the queue is full, giving the same back-pressure
/// the donor's buffered Go channel provides.
pub struct WorkerPool {
    tx: Option<mpsc::Sender<BoxFuture<'static, ()>>>,
    submitted: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
    cancel_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(worker_count: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(AsyncMutex::new(rx));
        let completed = Arc::new(AtomicU64::new(0));
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handles = (0..worker_count.max(1))
            .map(|_| {
                let rx = rx.clone();
                let completed = completed.clone();
                let mut cancel_rx = cancel_rx.clone();
                tokio::spawn(async move {
                    loop {
                        if *cancel_rx.borrow() {
                            break;
                        }
                        let task = {
                            let mut guard = rx.lock().await;
                            tokio::select! {
                                biased;
                                _ = cancel_rx.changed() => None,
                                task = guard.recv() => task,
                            }
                        };
                        match task {
                            Some(task) => {
                                task.await;
                                completed.fetch_add(1, Ordering::SeqCst);
                            }
                            None => {
                                if *cancel_rx.borrow() {
                                    break;
                                }
                                // Channel closed with no cancel requested: no more
                                // work will ever arrive.
                                break;
                            }
                        }
                    }
                })
            })
            .collect();

        Self {
            tx: Some(tx),
            submitted: Arc::new(AtomicU64::new(0)),
            completed,
            cancel_tx,
            handles,
        }
    }

    /// Submits a task, blocking until queue space is available.
    pub async fn execute(&self, task: BoxFuture<'static, ()>) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = &self.tx {
            let _ = tx.send(task).await;
        }
    }

    /// A live counter of completed tasks, usable while the pool is still running
    /// (backs `Wildcarder::current`).
    pub fn completed_counter(&self) -> Arc<AtomicU64> {
        self.completed.clone()
    }

    pub fn current_count(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Blocks until every submitted task has completed.
    pub async fn wait(&self) {
        while self.submitted.load(Ordering::SeqCst) != self.completed.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Waits for outstanding work, then shuts every worker down and joins them.
    pub async fn close(mut self) {
        self.wait().await;
        let _ = self.cancel_tx.send(true);
        self.tx.take();
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }
}
