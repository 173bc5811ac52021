//! Policy/value network for the snake trainer.
//!
//! A linear policy head over the flattened 4-plane state plus a tanh-squashed
//! linear value head, trained with softmax cross-entropy + squared error and a
//! hand-stepped Adam with decoupled weight decay. The whole parameter set
//! (including optimizer moments) round-trips through a little-endian binary
//! checkpoint file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{azip, Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;
use tracing::warn;

mod serialize;

use serialize::{
    read_f32, read_u32, read_u64, read_vec_f32, write_f32, write_u32, write_u64, write_vec_f32,
};

const MAGIC: u32 = 0x315a_5341; // "ASZ1" little-endian
const VERSION: u32 = 1;
const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const ADAM_EPS: f32 = 1e-8;

/// Network output for one state: a distribution over the four actions and a
/// scalar position value in `[-1, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub policy: [f32; 4],
    pub value: f32,
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            policy: [0.25; 4],
            value: 0.0,
        }
    }
}

/// Averaged losses for one training batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LossStats {
    pub total: f32,
    pub policy: f32,
    pub value: f32,
}

/// One supervised example: state tensor, MCTS visit policy, return target.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub state: Vec<f32>,
    pub policy: [f32; 4],
    pub outcome: f32,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model io failed for {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid model file {path}: {reason}")]
    Format { path: String, reason: String },
}

/// Linear policy/value head with its Adam state.
#[derive(Clone)]
pub struct PolicyValueNet {
    board_size: usize,
    input_dim: usize,
    step: u64,
    lr: f32,
    weight_decay: f32,

    wp: Array2<f32>,
    bp: Array1<f32>,
    wv: Array1<f32>,
    bv: f32,

    m_wp: Array2<f32>,
    v_wp: Array2<f32>,
    m_bp: Array1<f32>,
    v_bp: Array1<f32>,
    m_wv: Array1<f32>,
    v_wv: Array1<f32>,
    m_bv: f32,
    v_bv: f32,
}

impl PolicyValueNet {
    pub fn new(board_size: usize, seed: u64) -> Self {
        let input_dim = 4 * board_size * board_size;
        let mut rng = StdRng::seed_from_u64(seed);
        let init = Normal::new(0.0f32, 0.02).expect("finite init stddev");

        let wp = Array2::from_shape_fn((4, input_dim), |_| init.sample(&mut rng));
        let wv = Array1::from_shape_fn(input_dim, |_| init.sample(&mut rng));

        Self {
            board_size,
            input_dim,
            step: 0,
            lr: 1e-3,
            weight_decay: 1e-4,
            wp,
            bp: Array1::zeros(4),
            wv,
            bv: 0.0,
            m_wp: Array2::zeros((4, input_dim)),
            v_wp: Array2::zeros((4, input_dim)),
            m_bp: Array1::zeros(4),
            v_bp: Array1::zeros(4),
            m_wv: Array1::zeros(input_dim),
            v_wv: Array1::zeros(input_dim),
            m_bv: 0.0,
            v_bv: 0.0,
        }
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn logits(&self, state: ArrayView1<f32>) -> [f32; 4] {
        let z = self.wp.dot(&state) + &self.bp;
        [z[0], z[1], z[2], z[3]]
    }

    fn softmax(logits: &[f32; 4]) -> [f32; 4] {
        let mx = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let mut ex = [0.0f32; 4];
        let mut sum = 0.0;
        for (e, &l) in ex.iter_mut().zip(logits.iter()) {
            *e = (l - mx).exp();
            sum += *e;
        }
        if sum <= 0.0 {
            return [0.25; 4];
        }
        for e in ex.iter_mut() {
            *e /= sum;
        }
        ex
    }

    /// Single-state inference. A wrong-length state yields the uniform
    /// fallback prediction rather than an error.
    pub fn predict(&self, state: &[f32]) -> Prediction {
        if state.len() != self.input_dim {
            warn!(
                got = state.len(),
                expected = self.input_dim,
                "state length mismatch, returning uniform prediction"
            );
            return Prediction::default();
        }

        let s = ArrayView1::from(state);
        let policy = Self::softmax(&self.logits(s));
        let value = (self.wv.dot(&s) + self.bv).tanh();
        Prediction { policy, value }
    }

    /// Batched inference; results are in input order.
    pub fn predict_batch(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
        states.iter().map(|s| self.predict(s)).collect()
    }

    /// One optimisation step over `batch`. Returns per-example-averaged losses.
    pub fn train_batch(
        &mut self,
        batch: &[TrainingExample],
        lr: f32,
        weight_decay: f32,
    ) -> LossStats {
        let mut stats = LossStats::default();
        if batch.is_empty() {
            return stats;
        }

        let mut g_wp: Array2<f32> = Array2::zeros((4, self.input_dim));
        let mut g_bp: Array1<f32> = Array1::zeros(4);
        let mut g_wv: Array1<f32> = Array1::zeros(self.input_dim);
        let mut g_bv = 0.0f32;

        for ex in batch {
            if ex.state.len() != self.input_dim {
                continue;
            }
            let s = ArrayView1::from(ex.state.as_slice());

            let lg = self.logits(s);
            let p = Self::softmax(&lg);
            let v = (self.wv.dot(&s) + self.bv).tanh();

            let mut p_loss = 0.0;
            for a in 0..4 {
                p_loss += -ex.policy[a] * p[a].max(1e-8).ln();
            }
            let v_loss = (v - ex.outcome) * (v - ex.outcome);
            stats.policy += p_loss;
            stats.value += v_loss;

            for a in 0..4 {
                let dl = p[a] - ex.policy[a];
                g_bp[a] += dl;
                g_wp.row_mut(a).scaled_add(dl, &s);
            }

            let dvalue = 2.0 * (v - ex.outcome) * (1.0 - v * v);
            g_bv += dvalue;
            g_wv.scaled_add(dvalue, &s);
        }

        let inv_n = 1.0 / batch.len() as f32;
        azip!((g in &mut g_wp, &w in &self.wp) *g = *g * inv_n + weight_decay * w);
        g_bp *= inv_n;
        azip!((g in &mut g_wv, &w in &self.wv) *g = *g * inv_n + weight_decay * w);
        g_bv *= inv_n;

        self.step += 1;
        let t = self.step as f32;
        let b1_corr = 1.0 - BETA1.powf(t);
        let b2_corr = 1.0 - BETA2.powf(t);
        let adam = |w: &mut f32, m: &mut f32, v: &mut f32, g: f32| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            let m_hat = *m / b1_corr;
            let v_hat = *v / b2_corr;
            *w -= lr * m_hat / (v_hat.sqrt() + ADAM_EPS);
        };

        azip!((w in &mut self.wp, m in &mut self.m_wp, v in &mut self.v_wp, &g in &g_wp) adam(w, m, v, g));
        azip!((w in &mut self.bp, m in &mut self.m_bp, v in &mut self.v_bp, &g in &g_bp) adam(w, m, v, g));
        azip!((w in &mut self.wv, m in &mut self.m_wv, v in &mut self.v_wv, &g in &g_wv) adam(w, m, v, g));
        adam(&mut self.bv, &mut self.m_bv, &mut self.v_bv, g_bv);

        stats.policy *= inv_n;
        stats.value *= inv_n;
        stats.total = stats.policy + stats.value;
        stats
    }

    /// Overwrite all parameters and optimizer state with `other`'s.
    pub fn copy_from(&mut self, other: &Self) {
        *self = other.clone();
    }

    /// Discard optimizer moments so freshly copied weights are not stepped
    /// with stale momentum. `lr`/`weight_decay` become the net's defaults.
    pub fn reset_optimizer(&mut self, lr: f32, weight_decay: f32) {
        self.lr = lr;
        self.weight_decay = weight_decay;
        self.step = 0;
        self.m_wp.fill(0.0);
        self.v_wp.fill(0.0);
        self.m_bp.fill(0.0);
        self.v_bp.fill(0.0);
        self.m_wv.fill(0.0);
        self.v_wv.fill(0.0);
        self.m_bv = 0.0;
        self.v_bv = 0.0;
    }

    pub fn lr(&self) -> f32 {
        self.lr
    }

    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path_str = path.as_ref().display().to_string();

        let write = || -> std::io::Result<()> {
            let mut out = BufWriter::new(File::create(path.as_ref())?);
            write_u32(&mut out, MAGIC)?;
            write_u32(&mut out, VERSION)?;
            write_u32(&mut out, self.board_size as u32)?;
            write_u32(&mut out, self.input_dim as u32)?;
            write_u64(&mut out, self.step)?;

            write_vec_f32(&mut out, self.wp.as_slice().expect("standard layout"))?;
            write_vec_f32(&mut out, self.bp.as_slice().expect("standard layout"))?;
            write_vec_f32(&mut out, self.wv.as_slice().expect("standard layout"))?;
            write_f32(&mut out, self.bv)?;

            write_vec_f32(&mut out, self.m_wp.as_slice().expect("standard layout"))?;
            write_vec_f32(&mut out, self.v_wp.as_slice().expect("standard layout"))?;
            write_vec_f32(&mut out, self.m_bp.as_slice().expect("standard layout"))?;
            write_vec_f32(&mut out, self.v_bp.as_slice().expect("standard layout"))?;
            write_vec_f32(&mut out, self.m_wv.as_slice().expect("standard layout"))?;
            write_vec_f32(&mut out, self.v_wv.as_slice().expect("standard layout"))?;
            write_f32(&mut out, self.m_bv)?;
            write_f32(&mut out, self.v_bv)?;
            out.flush()
        };

        write().map_err(|source| ModelError::Io {
            path: path_str,
            source,
        })
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ModelError> {
        let path_str = path.as_ref().display().to_string();

        let read = || -> std::io::Result<Result<Self, String>> {
            let mut input = BufReader::new(File::open(path.as_ref())?);

            if read_u32(&mut input)? != MAGIC {
                return Ok(Err("bad magic".to_string()));
            }
            if read_u32(&mut input)? != VERSION {
                return Ok(Err("unsupported version".to_string()));
            }
            let board_size = read_u32(&mut input)? as usize;
            let input_dim = read_u32(&mut input)? as usize;
            let step = read_u64(&mut input)?;
            if input_dim != 4 * board_size * board_size {
                return Ok(Err("inconsistent dimensions".to_string()));
            }

            let wp = read_vec_f32(&mut input)?;
            let bp = read_vec_f32(&mut input)?;
            let wv = read_vec_f32(&mut input)?;
            let bv = read_f32(&mut input)?;
            let m_wp = read_vec_f32(&mut input)?;
            let v_wp = read_vec_f32(&mut input)?;
            let m_bp = read_vec_f32(&mut input)?;
            let v_bp = read_vec_f32(&mut input)?;
            let m_wv = read_vec_f32(&mut input)?;
            let v_wv = read_vec_f32(&mut input)?;
            let m_bv = read_f32(&mut input)?;
            let v_bv = read_f32(&mut input)?;

            if wp.len() != 4 * input_dim
                || bp.len() != 4
                || wv.len() != input_dim
                || m_wp.len() != 4 * input_dim
                || v_wp.len() != 4 * input_dim
                || m_bp.len() != 4
                || v_bp.len() != 4
                || m_wv.len() != input_dim
                || v_wv.len() != input_dim
            {
                return Ok(Err("parameter block size mismatch".to_string()));
            }

            let shape2 = (4, input_dim);
            Ok(Ok(Self {
                board_size,
                input_dim,
                step,
                lr: self.lr,
                weight_decay: self.weight_decay,
                wp: Array2::from_shape_vec(shape2, wp).expect("checked shape"),
                bp: Array1::from_vec(bp),
                wv: Array1::from_vec(wv),
                bv,
                m_wp: Array2::from_shape_vec(shape2, m_wp).expect("checked shape"),
                v_wp: Array2::from_shape_vec(shape2, v_wp).expect("checked shape"),
                m_bp: Array1::from_vec(m_bp),
                v_bp: Array1::from_vec(v_bp),
                m_wv: Array1::from_vec(m_wv),
                v_wv: Array1::from_vec(v_wv),
                m_bv,
                v_bv,
            }))
        };

        match read().map_err(|source| ModelError::Io {
            path: path_str.clone(),
            source,
        })? {
            Ok(net) => {
                *self = net;
                Ok(())
            }
            Err(reason) => Err(ModelError::Format {
                path: path_str,
                reason,
            }),
        }
    }
}
