use std::fs;
use std::path::Path;

use alphasnake_mcts::MctsConfig;
use alphasnake_selfplay::{EvalConfig, SelfPlayConfig};

use crate::error::{Result, TrainError};

/// Full run configuration. Defaults describe a 10x10 paper-strength run; the
/// profile overlays trade strength for wall-clock.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub board_size: usize,
    pub max_steps: u32,

    pub model_channels: u32,
    pub model_blocks: u32,

    pub num_simulations: u32,
    pub c_puct: f32,
    pub dirichlet_alpha: f32,
    pub dirichlet_eps: f32,
    pub food_samples: u32,

    pub temp_decay_move: u32,
    pub games_per_iter: u32,
    pub selfplay_workers: u32,
    pub inference_batch_size: usize,
    pub inference_wait_us: u64,

    pub lr: f32,
    pub weight_decay: f32,
    pub gamma: f32,
    pub batch_size: usize,
    pub buffer_size: usize,
    pub epochs_per_iter: u32,
    pub iterations: u32,

    pub eval_games: u32,
    pub accept_threshold: f32,

    pub warmup_iterations: u32,
    pub strict_iterations: u32,

    pub seed: u64,
    pub save_dir: String,
    pub profile: String,

    /// Optional directory for per-iteration NPY dumps of the self-play data.
    pub dump_dir: Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            board_size: 10,
            max_steps: 1000,
            model_channels: 64,
            model_blocks: 6,
            num_simulations: 400,
            c_puct: 1.0,
            dirichlet_alpha: 0.03,
            dirichlet_eps: 0.25,
            food_samples: 8,
            temp_decay_move: 30,
            games_per_iter: 1000,
            selfplay_workers: 8,
            inference_batch_size: 256,
            inference_wait_us: 1000,
            lr: 1e-3,
            weight_decay: 1e-4,
            gamma: 0.97,
            batch_size: 128,
            buffer_size: 200_000,
            epochs_per_iter: 10,
            iterations: 200,
            eval_games: 200,
            accept_threshold: 0.55,
            warmup_iterations: 60,
            strict_iterations: 12,
            seed: 42,
            save_dir: "checkpoints/alphasnake_10x10".to_string(),
            profile: "paper_strict".to_string(),
            dump_dir: None,
        }
    }
}

impl TrainConfig {
    /// Apply a named profile overlay on top of this configuration.
    pub fn with_profile(&self, profile: &str) -> TrainConfig {
        let mut cfg = self.clone();
        cfg.profile = profile.to_string();

        match profile {
            "warmup_fast" => {
                cfg.num_simulations = 96;
                cfg.food_samples = 4;
                cfg.games_per_iter = 256;
                cfg.eval_games = 80;
                cfg.selfplay_workers = cfg.selfplay_workers.clamp(2, 8);
                cfg.iterations = cfg.warmup_iterations;
                cfg.temp_decay_move = 20;
            }
            "smoke" => {
                cfg.num_simulations = 32;
                cfg.food_samples = 2;
                cfg.games_per_iter = 16;
                cfg.eval_games = 16;
                cfg.epochs_per_iter = 2;
                cfg.batch_size = 32;
                cfg.selfplay_workers = cfg.selfplay_workers.clamp(1, 4);
                cfg.iterations = 1;
                cfg.temp_decay_move = 8;
            }
            "paper_strict" => {
                cfg.num_simulations = 400;
                cfg.food_samples = 8;
                cfg.games_per_iter = 1000;
                cfg.eval_games = 200;
                if cfg.strict_iterations > 0 {
                    cfg.iterations = cfg.strict_iterations;
                }
                cfg.temp_decay_move = 30;
            }
            _ => {}
        }

        cfg
    }

    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig {
            num_simulations: self.num_simulations,
            c_puct: self.c_puct,
            dirichlet_alpha: self.dirichlet_alpha,
            dirichlet_eps: self.dirichlet_eps,
            food_samples: self.food_samples.max(1),
        }
    }

    pub fn selfplay_config(&self) -> SelfPlayConfig {
        SelfPlayConfig {
            board_size: self.board_size,
            max_steps: self.max_steps,
            games: self.games_per_iter,
            workers: self.selfplay_workers,
            temp_decay_move: self.temp_decay_move,
            gamma: self.gamma,
            seed: self.seed,
            mcts: self.mcts_config(),
            inference_batch_size: self.inference_batch_size,
            inference_wait_us: self.inference_wait_us,
        }
    }

    pub fn eval_config(&self) -> EvalConfig {
        EvalConfig {
            board_size: self.board_size,
            max_steps: self.max_steps,
            games: self.eval_games,
            seed: self.seed,
            mcts: self.mcts_config(),
            inference_batch_size: self.inference_batch_size,
            inference_wait_us: self.inference_wait_us,
        }
    }
}

/// Load a config file on top of the defaults.
///
/// The format is line-based and indentation-insensitive: blank lines and `#`
/// comments are skipped, a line ending in `:` opens a section that prefixes
/// the following keys, and values may be quoted. Both the dotted and the flat
/// spelling of each key are accepted; unknown keys are ignored.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
    let path_str = path.as_ref().display().to_string();
    let text = fs::read_to_string(path.as_ref()).map_err(|source| TrainError::ConfigOpen {
        path: path_str.clone(),
        source,
    })?;

    let mut cfg = TrainConfig::default();
    let mut section = String::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_suffix(':') {
            if !name.contains(' ') && !name.is_empty() {
                section = name.trim().to_string();
                continue;
            }
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = unquote(value.trim());
        if key.is_empty() {
            continue;
        }

        let full = if section.is_empty() {
            key.to_string()
        } else {
            format!("{section}.{key}")
        };

        apply_key(&mut cfg, &full, value).map_err(|_| TrainError::ConfigParse {
            path: path_str.clone(),
            line: lineno + 1,
            key: full.clone(),
        })?;
    }

    Ok(cfg)
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

struct BadValue;

fn apply_key(cfg: &mut TrainConfig, full: &str, value: &str) -> std::result::Result<(), BadValue> {
    fn num<T: std::str::FromStr>(value: &str) -> std::result::Result<T, BadValue> {
        value.parse().map_err(|_| BadValue)
    }

    match full {
        "env.board_size" | "board_size" => cfg.board_size = num(value)?,
        "env.max_steps" | "max_steps" => cfg.max_steps = num(value)?,
        "model.channels" | "model_channels" => cfg.model_channels = num(value)?,
        "model.blocks" | "model_blocks" => cfg.model_blocks = num(value)?,
        "mcts.simulations" | "num_simulations" => cfg.num_simulations = num(value)?,
        "mcts.cpuct" | "c_puct" => cfg.c_puct = num(value)?,
        "mcts.dir_alpha" | "dirichlet_alpha" => cfg.dirichlet_alpha = num(value)?,
        "mcts.dir_eps" | "dirichlet_eps" => cfg.dirichlet_eps = num(value)?,
        "mcts.food_samples" | "food_samples" => cfg.food_samples = num(value)?,
        "selfplay.temp_decay" | "temp_decay_move" => cfg.temp_decay_move = num(value)?,
        "selfplay.games" | "games_per_iter" => cfg.games_per_iter = num(value)?,
        "selfplay.workers" | "selfplay_workers" => cfg.selfplay_workers = num(value)?,
        "selfplay.inference_batch_size" | "inference_batch_size" => {
            cfg.inference_batch_size = num(value)?
        }
        "selfplay.inference_wait_us" | "inference_wait_us" => {
            cfg.inference_wait_us = num(value)?
        }
        "selfplay.dump_dir" | "dump_dir" => cfg.dump_dir = Some(value.to_string()),
        "train.lr" | "lr" => cfg.lr = num(value)?,
        "train.weight_decay" | "weight_decay" => cfg.weight_decay = num(value)?,
        "train.gamma" | "gamma" => cfg.gamma = num(value)?,
        "train.batch_size" | "batch_size" => cfg.batch_size = num(value)?,
        "train.buffer" | "buffer_size" => cfg.buffer_size = num(value)?,
        "train.epochs" | "epochs_per_iter" => cfg.epochs_per_iter = num(value)?,
        "train.iterations" | "iterations" => cfg.iterations = num(value)?,
        "eval.games" | "eval_games" => cfg.eval_games = num(value)?,
        "eval.accept_threshold" | "accept_threshold" => cfg.accept_threshold = num(value)?,
        "schedule.warmup_iterations" | "warmup_iterations" => {
            cfg.warmup_iterations = num(value)?
        }
        "schedule.strict_iterations" | "strict_iterations" => {
            cfg.strict_iterations = num(value)?
        }
        "seed" => cfg.seed = num(value)?,
        "save_dir" => cfg.save_dir = value.to_string(),
        "profile" => cfg.profile = value.to_string(),
        _ => {}
    }
    Ok(())
}
