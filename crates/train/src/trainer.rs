use std::fs;
use std::path::PathBuf;

use alphasnake_nn::{LossStats, PolicyValueNet};
use alphasnake_selfplay::{evaluate_model, run_self_play, save_training_data};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::checkpoint::{load_checkpoint, save_checkpoint, TrainerState};
use crate::config::TrainConfig;
use crate::error::{Result, TrainError};
use crate::replay_buffer::ReplayBuffer;

/// Champion/candidate training loop.
///
/// Per iteration: generate self-play games with the best net, train the
/// candidate from the replay buffer, evaluate both nets on the same seeds, and
/// promote the candidate when it matches or beats the champion's average
/// length. A checkpoint is written after every iteration, promoted or not.
pub struct Trainer {
    cfg: TrainConfig,
    buffer: ReplayBuffer,
    best: PolicyValueNet,
    candidate: PolicyValueNet,
    start_iteration: u32,
    best_win_rate: f32,
}

impl Trainer {
    pub fn new(cfg: TrainConfig) -> Self {
        let best = PolicyValueNet::new(cfg.board_size, cfg.seed);
        let candidate = PolicyValueNet::new(cfg.board_size, cfg.seed + 1);
        let buffer = ReplayBuffer::new(cfg.buffer_size);
        Self {
            cfg,
            buffer,
            best,
            candidate,
            start_iteration: 0,
            best_win_rate: 0.0,
        }
    }

    pub fn best_model(&self) -> &PolicyValueNet {
        &self.best
    }

    pub fn config(&self) -> &TrainConfig {
        &self.cfg
    }

    pub fn run(&mut self, resume: bool) -> Result<()> {
        fs::create_dir_all(&self.cfg.save_dir).map_err(|e| TrainError::Checkpoint {
            path: self.cfg.save_dir.clone(),
            reason: e.to_string(),
        })?;

        if resume {
            if let Some(state) = load_checkpoint(&self.cfg.save_dir, &mut self.best, &mut self.candidate)? {
                self.start_iteration = state.iteration;
                self.best_win_rate = state.best_win_rate;
                info!(
                    iteration = state.iteration,
                    best_win_rate = state.best_win_rate,
                    "resumed from checkpoint"
                );
            }
        }

        info!(
            profile = %self.cfg.profile,
            board_size = self.cfg.board_size,
            simulations = self.cfg.num_simulations,
            games_per_iter = self.cfg.games_per_iter,
            model_channels = self.cfg.model_channels,
            model_blocks = self.cfg.model_blocks,
            save_dir = %self.cfg.save_dir,
            "training run started"
        );

        let mut rng = StdRng::seed_from_u64(self.cfg.seed + 77);
        let end_iteration = self.start_iteration + self.cfg.iterations;

        for iter in self.start_iteration + 1..=end_iteration {
            info!(iteration = iter, total = end_iteration, "iteration started");

            let selfplay_cfg = self.cfg.selfplay_config();
            let new_examples = run_self_play(&selfplay_cfg, iter, &self.best)
                .map_err(|e| TrainError::Worker(e.to_string()))?;

            if let Some(dump_dir) = &self.cfg.dump_dir {
                fs::create_dir_all(dump_dir).map_err(|e| TrainError::Checkpoint {
                    path: dump_dir.clone(),
                    reason: e.to_string(),
                })?;
                let base = PathBuf::from(dump_dir).join(format!("iter_{iter:04}"));
                save_training_data(&new_examples, self.cfg.board_size, &base.display().to_string())
                    .map_err(|e| TrainError::Checkpoint {
                        path: base.display().to_string(),
                        reason: e.to_string(),
                    })?;
            }

            self.buffer.add_many(new_examples);
            info!(buffer = self.buffer.size(), "replay buffer updated");

            let losses = self.train_candidate(&mut rng);
            info!(
                loss = losses.total,
                policy_loss = losses.policy,
                value_loss = losses.value,
                "candidate trained"
            );

            // Same seeds for both nets, so the comparison is head-to-head.
            let eval_cfg = self.cfg.eval_config();
            let eval_best = evaluate_model(&eval_cfg, &self.best, iter);
            let eval_candidate = evaluate_model(&eval_cfg, &self.candidate, iter);
            info!(
                best_win = eval_best.win_rate,
                best_len = eval_best.avg_length,
                candidate_win = eval_candidate.win_rate,
                candidate_len = eval_candidate.avg_length,
                "evaluation finished"
            );

            if eval_candidate.avg_length >= eval_best.avg_length {
                self.best.copy_from(&self.candidate);
                self.best_win_rate = eval_candidate.win_rate;
                info!(
                    from = eval_best.avg_length,
                    to = eval_candidate.avg_length,
                    "champion promoted"
                );
            } else {
                info!(
                    best = eval_best.avg_length,
                    candidate = eval_candidate.avg_length,
                    "champion retained"
                );
            }

            save_checkpoint(
                &self.cfg.save_dir,
                &self.best,
                &self.candidate,
                TrainerState {
                    iteration: iter,
                    best_win_rate: self.best_win_rate,
                },
                &self.cfg.profile,
            )?;
            info!(iteration = iter, "checkpoint saved");
        }

        Ok(())
    }

    /// Re-seed the candidate from the champion and fit it to the buffer.
    fn train_candidate(&mut self, rng: &mut StdRng) -> LossStats {
        self.candidate.copy_from(&self.best);
        // Fresh moments: Adam state from the previous candidate would be
        // misaligned with the copied weights.
        self.candidate
            .reset_optimizer(self.cfg.lr, self.cfg.weight_decay);

        if self.buffer.size() < self.cfg.batch_size {
            info!(
                buffer = self.buffer.size(),
                batch_size = self.cfg.batch_size,
                "buffer below one batch, skipping training this iteration"
            );
            return LossStats::default();
        }

        let steps_per_epoch = (self.buffer.size() / self.cfg.batch_size).max(1);
        let mut last = LossStats::default();

        for epoch in 1..=self.cfg.epochs_per_iter {
            let mut avg = LossStats::default();
            for _ in 0..steps_per_epoch {
                let batch = self.buffer.sample(self.cfg.batch_size, rng);
                let ls = self
                    .candidate
                    .train_batch(&batch, self.cfg.lr, self.cfg.weight_decay);
                avg.total += ls.total;
                avg.policy += ls.policy;
                avg.value += ls.value;
            }
            avg.total /= steps_per_epoch as f32;
            avg.policy /= steps_per_epoch as f32;
            avg.value /= steps_per_epoch as f32;
            info!(
                epoch,
                epochs = self.cfg.epochs_per_iter,
                loss = avg.total,
                policy_loss = avg.policy,
                value_loss = avg.value,
                "epoch finished"
            );
            last = avg;
        }

        last
    }
}
