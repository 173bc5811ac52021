use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::thread;

use alphasnake_env::SnakeEnv;
use alphasnake_mcts::{InferenceBatcher, Mcts};
use alphasnake_nn::PolicyValueNet;
use tracing::warn;

use crate::config::EvalConfig;
use crate::game::argmax4;

/// Aggregate result of an evaluation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalMetrics {
    pub win_rate: f32,
    pub avg_length: f32,
}

/// Play `cfg.games` greedy games (temperature 0, no root noise) and report the
/// win rate and average final snake length.
///
/// Game seeds depend only on `(cfg.seed, iteration, game)`, so evaluating two
/// models with the same config plays them on identical boards. Evaluation is
/// lossy by design: a game that cannot complete counts as a loss and the
/// metrics are still reported.
pub fn evaluate_model(cfg: &EvalConfig, net: &PolicyValueNet, iteration: u32) -> EvalMetrics {
    if cfg.games == 0 {
        return EvalMetrics::default();
    }

    let hw = thread::available_parallelism().map_or(8, |p| p.get() as u32);
    let workers = cfg.games.min((hw * 2).max(16)).max(1);

    let batcher = InferenceBatcher::new(
        net.clone(),
        cfg.inference_batch_size,
        cfg.inference_wait_us,
    );
    batcher.start();

    let next_game = AtomicU32::new(0);
    let wins = AtomicU32::new(0);
    let len_sum = AtomicU64::new(0);

    let panicked = thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers as usize);
        for _ in 0..workers {
            let batcher = &batcher;
            let next_game = &next_game;
            let wins = &wins;
            let len_sum = &len_sum;
            handles.push(s.spawn(move || loop {
                let g = next_game.fetch_add(1, Ordering::SeqCst);
                if g >= cfg.games {
                    break;
                }
                let seed = cfg.seed + iteration as u64 * 100_000 + g as u64 * 97;
                let mut env = SnakeEnv::new(cfg.board_size, cfg.max_steps, seed);

                let mut mv: u32 = 0;
                while !env.is_done() {
                    let mut mcts = Mcts::new(cfg.mcts.clone(), seed + mv as u64 * 17 + 3);
                    let pi = mcts.search(&env, batcher, false, 0.0);
                    env.step(argmax4(&pi));
                    mv += 1;
                    if mv > cfg.max_steps + 8 {
                        break;
                    }
                }

                if env.is_win() {
                    wins.fetch_add(1, Ordering::Relaxed);
                }
                len_sum.fetch_add(env.snake_length() as u64, Ordering::Relaxed);
            }));
        }

        let mut panicked = 0u32;
        for handle in handles {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        panicked
    });

    batcher.stop();

    if panicked > 0 {
        // Unfinished games simply count as losses.
        warn!(panicked, "evaluation worker thread(s) panicked");
    }

    EvalMetrics {
        win_rate: wins.load(Ordering::Relaxed) as f32 / cfg.games as f32,
        avg_length: len_sum.load(Ordering::Relaxed) as f32 / cfg.games as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphasnake_mcts::MctsConfig;

    fn tiny_config() -> EvalConfig {
        EvalConfig {
            board_size: 6,
            max_steps: 40,
            games: 4,
            seed: 900,
            mcts: MctsConfig::default()
                .with_simulations(8)
                .with_food_samples(1),
            inference_batch_size: 8,
            inference_wait_us: 200,
        }
    }

    #[test]
    fn evaluation_reports_metrics_for_all_games() {
        let cfg = tiny_config();
        let net = PolicyValueNet::new(cfg.board_size, 1);
        let metrics = evaluate_model(&cfg, &net, 1);

        assert!((0.0..=1.0).contains(&metrics.win_rate));
        // The snake starts at length 3 and never shrinks.
        assert!(metrics.avg_length >= 3.0);
    }

    #[test]
    fn zero_games_yield_zero_metrics() {
        let mut cfg = tiny_config();
        cfg.games = 0;
        let net = PolicyValueNet::new(cfg.board_size, 1);
        let metrics = evaluate_model(&cfg, &net, 1);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.avg_length, 0.0);
    }

    #[test]
    fn same_seeds_give_identical_metrics() {
        let cfg = tiny_config();
        let net = PolicyValueNet::new(cfg.board_size, 1);
        let a = evaluate_model(&cfg, &net, 3);
        let b = evaluate_model(&cfg, &net, 3);
        assert_eq!(a.win_rate, b.win_rate);
        assert_eq!(a.avg_length, b.avg_length);
    }
}
