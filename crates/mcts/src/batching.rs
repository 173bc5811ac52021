use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use alphasnake_nn::Prediction;
use crossbeam_channel::{bounded, Sender};
use tracing::warn;

use crate::evaluation::Evaluator;

/// Monotone counters for observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatcherStats {
    /// Number of predict/predict_many calls accepted
    pub requests: u64,
    /// Number of states enqueued
    pub states: u64,
    /// Number of batches flushed to the model
    pub batches: u64,
}

struct Request {
    state: Vec<f32>,
    resp: Sender<Prediction>,
}

struct Queue {
    items: VecDeque<Request>,
    accepting: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    cv: Condvar,
    requests: AtomicU64,
    states: AtomicU64,
    batches: AtomicU64,
    shape_errors: AtomicU64,
    max_batch: usize,
    wait: Duration,
}

/// Coalesces concurrent predict calls into batched model forward passes.
///
/// A single server thread owns the model. Callers enqueue requests and block
/// on a one-shot channel until the server fulfils them. The server drains up
/// to `max_batch` requests per flush, waiting at most `wait_us` for the queue
/// to fill once work is pending. `stop` wakes the server and fulfils anything
/// still queued with the uniform fallback prediction, so no caller can hang
/// across a shutdown.
pub struct InferenceBatcher<E: Evaluator + Send + 'static> {
    shared: Arc<Shared>,
    model: Mutex<Option<E>>,
    server: Mutex<Option<thread::JoinHandle<()>>>,
}

impl<E: Evaluator + Send + 'static> InferenceBatcher<E> {
    pub fn new(model: E, max_batch: usize, wait_us: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    items: VecDeque::new(),
                    accepting: false,
                }),
                cv: Condvar::new(),
                requests: AtomicU64::new(0),
                states: AtomicU64::new(0),
                batches: AtomicU64::new(0),
                shape_errors: AtomicU64::new(0),
                max_batch: max_batch.max(1),
                wait: Duration::from_micros(wait_us.max(1)),
            }),
            model: Mutex::new(Some(model)),
            server: Mutex::new(None),
        }
    }

    /// Spawn the server thread. A second call is a no-op.
    pub fn start(&self) {
        let mut server = self.server.lock().expect("batcher server lock");
        if server.is_some() {
            return;
        }
        let model = match self.model.lock().expect("batcher model lock").take() {
            Some(m) => m,
            None => return,
        };

        self.shared.queue.lock().expect("batcher queue lock").accepting = true;
        let shared = Arc::clone(&self.shared);
        *server = Some(thread::spawn(move || server_loop(model, shared)));
    }

    /// Stop accepting work, fulfil everything still queued with the fallback
    /// prediction, and join the server thread. Idempotent.
    pub fn stop(&self) {
        {
            let mut queue = self.shared.queue.lock().expect("batcher queue lock");
            queue.accepting = false;
        }
        self.shared.cv.notify_all();

        let handle = self.server.lock().expect("batcher server lock").take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("inference server thread panicked");
            }
        }
    }

    /// Blocking single-state prediction.
    pub fn predict(&self, state: Vec<f32>) -> Prediction {
        let (tx, rx) = bounded(1);
        {
            let mut queue = self.shared.queue.lock().expect("batcher queue lock");
            if !queue.accepting {
                return Prediction::default();
            }
            queue.items.push_back(Request { state, resp: tx });
            self.shared.requests.fetch_add(1, Ordering::Relaxed);
            self.shared.states.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.cv.notify_one();
        rx.recv().unwrap_or_default()
    }

    /// Enqueue several states under one queue lock so they are adjacent in
    /// FIFO order and can share a batch, then block until all are fulfilled.
    pub fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
        if states.is_empty() {
            return Vec::new();
        }

        let mut receivers = Vec::with_capacity(states.len());
        {
            let mut queue = self.shared.queue.lock().expect("batcher queue lock");
            if !queue.accepting {
                return vec![Prediction::default(); states.len()];
            }
            for state in states {
                let (tx, rx) = bounded(1);
                queue.items.push_back(Request {
                    state: state.clone(),
                    resp: tx,
                });
                receivers.push(rx);
            }
            self.shared.requests.fetch_add(1, Ordering::Relaxed);
            self.shared
                .states
                .fetch_add(states.len() as u64, Ordering::Relaxed);
        }
        self.shared.cv.notify_one();

        receivers
            .into_iter()
            .map(|rx| rx.recv().unwrap_or_default())
            .collect()
    }

    pub fn stats(&self) -> BatcherStats {
        BatcherStats {
            requests: self.shared.requests.load(Ordering::Relaxed),
            states: self.shared.states.load(Ordering::Relaxed),
            batches: self.shared.batches.load(Ordering::Relaxed),
        }
    }

    /// Number of batches whose model output had the wrong length.
    pub fn batch_shape_errors(&self) -> u64 {
        self.shared.shape_errors.load(Ordering::Relaxed)
    }
}

impl<E: Evaluator + Send + 'static> Drop for InferenceBatcher<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<E: Evaluator + Send + 'static> Evaluator for InferenceBatcher<E> {
    fn predict(&self, state: &[f32]) -> Prediction {
        InferenceBatcher::predict(self, state.to_vec())
    }

    fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
        InferenceBatcher::predict_many(self, states)
    }
}

fn server_loop<E: Evaluator>(model: E, shared: Arc<Shared>) {
    loop {
        let batch: Vec<Request>;
        {
            let mut queue = shared.queue.lock().expect("batcher queue lock");

            while queue.items.is_empty() && queue.accepting {
                queue = shared.cv.wait(queue).expect("batcher queue lock");
            }

            if !queue.accepting {
                // Shutdown: everything still queued gets the fallback so no
                // caller blocks forever.
                for req in queue.items.drain(..) {
                    let _ = req.resp.send(Prediction::default());
                }
                return;
            }

            // Give stragglers up to the wait window to join this batch.
            let deadline = Instant::now() + shared.wait;
            while queue.items.len() < shared.max_batch && queue.accepting {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                let (q, timeout) = shared
                    .cv
                    .wait_timeout(queue, deadline - now)
                    .expect("batcher queue lock");
                queue = q;
                if timeout.timed_out() {
                    break;
                }
            }

            if !queue.accepting {
                for req in queue.items.drain(..) {
                    let _ = req.resp.send(Prediction::default());
                }
                return;
            }

            let take = queue.items.len().min(shared.max_batch);
            batch = queue.items.drain(..take).collect();
        }

        if batch.is_empty() {
            continue;
        }

        let states: Vec<Vec<f32>> = batch.iter().map(|req| req.state.clone()).collect();
        let preds = model.predict_many(&states);

        if preds.len() != batch.len() {
            warn!(
                got = preds.len(),
                expected = batch.len(),
                "batched prediction returned wrong length, fulfilling with uniform fallback"
            );
            shared.shape_errors.fetch_add(1, Ordering::Relaxed);
            for req in batch {
                let _ = req.resp.send(Prediction::default());
            }
        } else {
            for (req, pred) in batch.into_iter().zip(preds) {
                let _ = req.resp.send(pred);
            }
        }
        shared.batches.fetch_add(1, Ordering::Relaxed);
    }
}
