use std::sync::Mutex;

use alphasnake_nn::TrainingExample;
use rand::rngs::StdRng;
use rand::Rng;

struct Inner {
    data: Vec<TrainingExample>,
    head: usize,
}

/// Bounded pool of training examples with FIFO eviction.
///
/// Grows until `capacity`, then overwrites the oldest entries at the ring
/// head. A single mutex serialises writers and samplers; no lock is held
/// across anything expensive.
pub struct ReplayBuffer {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                data: Vec::new(),
                head: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn add_many(&self, examples: Vec<TrainingExample>) {
        let mut inner = self.inner.lock().expect("replay buffer lock");
        for ex in examples {
            if inner.data.len() < self.capacity {
                inner.data.push(ex);
            } else {
                let head = inner.head;
                inner.data[head] = ex;
                inner.head = (head + 1) % self.capacity;
            }
        }
    }

    pub fn size(&self) -> usize {
        self.inner.lock().expect("replay buffer lock").data.len()
    }

    /// Draw up to `min(n, size)` examples uniformly with replacement.
    pub fn sample(&self, n: usize, rng: &mut StdRng) -> Vec<TrainingExample> {
        let inner = self.inner.lock().expect("replay buffer lock");
        if inner.data.is_empty() {
            return Vec::new();
        }
        let n = n.min(inner.data.len());
        (0..n)
            .map(|_| inner.data[rng.gen_range(0..inner.data.len())].clone())
            .collect()
    }
}
