use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use alphasnake_mcts::InferenceBatcher;
use alphasnake_nn::{PolicyValueNet, TrainingExample};
use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::config::SelfPlayConfig;
use crate::game::play_game;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);
const HEARTBEAT_TICK: Duration = Duration::from_millis(100);

/// Generate one iteration's worth of self-play games.
///
/// A fixed pool of worker threads pulls game indices from a shared counter.
/// All workers share one inference batcher bound to a copy of `net`, so the
/// model sees fused batches instead of per-worker single states. Each game's
/// seed is derived from `(seed, iteration, game)`, making the whole iteration
/// reproducible for a fixed binary.
///
/// A heartbeat thread reports progress and flags an underfilled batcher while
/// the pool runs. Worker panics are collected and surfaced as an error after
/// every thread has been joined and the batcher stopped.
pub fn run_self_play(
    cfg: &SelfPlayConfig,
    iteration: u32,
    net: &PolicyValueNet,
) -> Result<Vec<TrainingExample>> {
    let workers = cfg.workers.min(cfg.games).max(1);
    info!(
        workers,
        games = cfg.games,
        simulations = cfg.mcts.num_simulations,
        "self-play started"
    );

    let batcher = InferenceBatcher::new(
        net.clone(),
        cfg.inference_batch_size,
        cfg.inference_wait_us,
    );
    batcher.start();

    let next_game = AtomicU32::new(0);
    let completed = AtomicU32::new(0);
    let total_positions = AtomicU64::new(0);
    let all_examples: Mutex<Vec<TrainingExample>> = Mutex::new(Vec::new());
    let pool_done = AtomicBool::new(false);

    let panicked = thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers as usize);
        for _ in 0..workers {
            let batcher = &batcher;
            let next_game = &next_game;
            let completed = &completed;
            let total_positions = &total_positions;
            let all_examples = &all_examples;
            handles.push(s.spawn(move || loop {
                let g = next_game.fetch_add(1, Ordering::SeqCst);
                if g >= cfg.games {
                    break;
                }
                // Seeded by game index, not worker identity: which worker ends
                // up running a game is a race, the game itself must not be.
                let seed = cfg.seed + iteration as u64 * 100_000 + g as u64 * 1000;
                let examples = play_game(cfg, batcher, seed, true);

                total_positions.fetch_add(examples.len() as u64, Ordering::Relaxed);
                all_examples
                    .lock()
                    .expect("self-play examples lock")
                    .extend(examples);
                completed.fetch_add(1, Ordering::Relaxed);
            }));
        }

        {
            let batcher = &batcher;
            let completed = &completed;
            let total_positions = &total_positions;
            let pool_done = &pool_done;
            s.spawn(move || {
                let mut elapsed = Duration::ZERO;
                while !pool_done.load(Ordering::Relaxed) {
                    thread::sleep(HEARTBEAT_TICK);
                    elapsed += HEARTBEAT_TICK;
                    if elapsed < HEARTBEAT_INTERVAL {
                        continue;
                    }
                    elapsed = Duration::ZERO;

                    let stats = batcher.stats();
                    let avg_batch = if stats.batches > 0 {
                        stats.states as f64 / stats.batches as f64
                    } else {
                        0.0
                    };
                    info!(
                        games = completed.load(Ordering::Relaxed),
                        total = cfg.games,
                        positions = total_positions.load(Ordering::Relaxed),
                        batches = stats.batches,
                        avg_batch,
                        "self-play heartbeat"
                    );
                    if avg_batch > 0.0 && avg_batch < cfg.inference_batch_size as f64 * 0.25 {
                        warn!(
                            avg_batch,
                            max_batch = cfg.inference_batch_size,
                            "inference batches are underfilled, the accelerator is idling"
                        );
                    }
                }
            });
        }

        let mut panicked = 0u32;
        for handle in handles {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        pool_done.store(true, Ordering::Relaxed);
        panicked
    });

    batcher.stop();

    if panicked > 0 {
        bail!("{panicked} self-play worker thread(s) panicked");
    }

    let examples = all_examples
        .into_inner()
        .expect("self-play examples lock");
    info!(positions = examples.len(), "self-play finished");
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphasnake_mcts::MctsConfig;

    fn tiny_config() -> SelfPlayConfig {
        SelfPlayConfig {
            board_size: 6,
            max_steps: 40,
            games: 4,
            workers: 2,
            temp_decay_move: 6,
            gamma: 0.97,
            seed: 400,
            mcts: MctsConfig::default()
                .with_simulations(8)
                .with_food_samples(2),
            inference_batch_size: 8,
            inference_wait_us: 200,
        }
    }

    #[test]
    fn pool_generates_examples_for_every_game() {
        let cfg = tiny_config();
        let net = PolicyValueNet::new(cfg.board_size, 1);
        let examples = run_self_play(&cfg, 1, &net).unwrap();
        // Every game lasts at least one move.
        assert!(examples.len() >= cfg.games as usize);
    }

    #[test]
    fn pool_output_is_reproducible_across_runs() {
        let cfg = tiny_config();
        let net = PolicyValueNet::new(cfg.board_size, 1);

        let mut a: Vec<f32> = run_self_play(&cfg, 2, &net)
            .unwrap()
            .iter()
            .map(|ex| ex.outcome)
            .collect();
        let mut b: Vec<f32> = run_self_play(&cfg, 2, &net)
            .unwrap()
            .iter()
            .map(|ex| ex.outcome)
            .collect();

        // Workers race on game indices, so compare as multisets.
        a.sort_by(f32::total_cmp);
        b.sort_by(f32::total_cmp);
        assert_eq!(a, b);
    }
}
