//! Self-play and evaluation game generation.
//!
//! This crate provides:
//! - Playing a single MCTS-guided self-play game and converting it into
//!   training examples with discounted-return targets
//! - A fixed pool of worker threads that share one inference batcher and
//!   stream completed games into a common example vector
//! - Greedy evaluation games used for champion/candidate gating
//! - Saving training data to NPY files for offline inspection

mod config;
mod eval;
mod game;
mod pool;
pub mod storage;

// Re-export public API
pub use config::{EvalConfig, SelfPlayConfig};
pub use eval::{evaluate_model, EvalMetrics};
pub use game::play_game;
pub use pool::run_self_play;
pub use storage::save_training_data;
