//! Training orchestration: configuration, the replay buffer, checkpointing,
//! and the champion/candidate iteration loop.

mod checkpoint;
mod config;
mod error;
mod replay_buffer;
mod trainer;

// Public exports
pub use checkpoint::{
    load_checkpoint, save_checkpoint, TrainerState, BEST_MODEL_FILE, CANDIDATE_MODEL_FILE,
    TRAINER_STATE_FILE,
};
pub use config::{load_config_file, TrainConfig};
pub use error::{Result, TrainError};
pub use replay_buffer::ReplayBuffer;
pub use trainer::Trainer;
