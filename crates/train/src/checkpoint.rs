use std::fs;
use std::path::{Path, PathBuf};

use alphasnake_nn::PolicyValueNet;
use chrono::Local;
use tracing::warn;

use crate::error::{Result, TrainError};

pub const BEST_MODEL_FILE: &str = "best_model.bin";
pub const CANDIDATE_MODEL_FILE: &str = "candidate_model.bin";
pub const TRAINER_STATE_FILE: &str = "trainer_state.txt";

/// The restartable part of the trainer's state.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrainerState {
    pub iteration: u32,
    pub best_win_rate: f32,
}

fn checkpoint_err(path: &Path, reason: impl ToString) -> TrainError {
    TrainError::Checkpoint {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Persist both models and the trainer state file into `save_dir`.
pub fn save_checkpoint(
    save_dir: &str,
    best: &PolicyValueNet,
    candidate: &PolicyValueNet,
    state: TrainerState,
    profile: &str,
) -> Result<()> {
    let dir = PathBuf::from(save_dir);
    let best_path = dir.join(BEST_MODEL_FILE);
    let cand_path = dir.join(CANDIDATE_MODEL_FILE);
    let state_path = dir.join(TRAINER_STATE_FILE);

    best.save(&best_path)
        .map_err(|e| checkpoint_err(&best_path, e))?;
    candidate
        .save(&cand_path)
        .map_err(|e| checkpoint_err(&cand_path, e))?;

    let contents = format!(
        "iteration={}\nbest_win_rate={}\nprofile={}\nupdated_at={}\n",
        state.iteration,
        state.best_win_rate,
        profile,
        Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    fs::write(&state_path, contents).map_err(|e| checkpoint_err(&state_path, e))?;
    Ok(())
}

/// Restore a previous run from `save_dir`.
///
/// Returns `Ok(None)` when there is nothing to resume (no best model or no
/// state file). When both exist, the best model and the state are loaded
/// fatally; a missing or unreadable candidate falls back to a copy of best.
/// Unknown state keys are ignored.
pub fn load_checkpoint(
    save_dir: &str,
    best: &mut PolicyValueNet,
    candidate: &mut PolicyValueNet,
) -> Result<Option<TrainerState>> {
    let dir = PathBuf::from(save_dir);
    let best_path = dir.join(BEST_MODEL_FILE);
    let cand_path = dir.join(CANDIDATE_MODEL_FILE);
    let state_path = dir.join(TRAINER_STATE_FILE);

    if !best_path.exists() || !state_path.exists() {
        return Ok(None);
    }

    best.load(&best_path)
        .map_err(|e| checkpoint_err(&best_path, e))?;

    if cand_path.exists() {
        if let Err(e) = candidate.load(&cand_path) {
            warn!(error = %e, "candidate checkpoint unreadable, copying from best");
            candidate.copy_from(best);
        }
    } else {
        candidate.copy_from(best);
    }

    let text = fs::read_to_string(&state_path).map_err(|e| checkpoint_err(&state_path, e))?;
    let mut state = TrainerState::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "iteration" => {
                state.iteration = value
                    .trim()
                    .parse()
                    .map_err(|_| checkpoint_err(&state_path, "bad iteration value"))?;
            }
            "best_win_rate" => {
                state.best_win_rate = value
                    .trim()
                    .parse()
                    .map_err(|_| checkpoint_err(&state_path, "bad best_win_rate value"))?;
            }
            _ => {}
        }
    }

    Ok(Some(state))
}
