use alphasnake_env::SnakeEnv;
use alphasnake_mcts::{Evaluator, Mcts};
use alphasnake_nn::TrainingExample;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SelfPlayConfig;

/// Play one self-play game and convert it into training examples.
///
/// Each move runs a fresh MCTS search (temperature 1.0 until
/// `temp_decay_move`, then 0.0) and samples the action from the visit policy.
/// Position targets are discounted returns `G_t = r_t + gamma * G_{t+1}`
/// computed backward over the recorded rewards and clamped to `[-1, 1]`, so
/// positions near food get positive value targets and positions near death
/// negative ones.
///
/// The whole game is a pure function of `seed` for a fixed config and
/// evaluator.
pub fn play_game<E: Evaluator>(
    cfg: &SelfPlayConfig,
    evaluator: &E,
    seed: u64,
    add_root_noise: bool,
) -> Vec<TrainingExample> {
    let mut env = SnakeEnv::new(cfg.board_size, cfg.max_steps, seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut states: Vec<Vec<f32>> = Vec::new();
    let mut policies: Vec<[f32; 4]> = Vec::new();
    let mut rewards: Vec<f32> = Vec::new();

    let mut mv: u32 = 0;
    while !env.is_done() {
        let temperature = if mv < cfg.temp_decay_move { 1.0 } else { 0.0 };
        let mut mcts = Mcts::new(cfg.mcts.clone(), seed + mv as u64 * 31 + 7);
        let pi = mcts.search(&env, evaluator, add_root_noise, temperature);

        states.push(env.state_tensor());
        policies.push(pi);

        let action = sample_action(&pi, &mut rng);
        let step = env.step(action);
        rewards.push(step.reward);

        mv += 1;
        if mv > cfg.max_steps + 8 {
            break;
        }
    }

    let returns = discounted_returns(&rewards, cfg.gamma);

    states
        .into_iter()
        .zip(policies)
        .zip(returns)
        .map(|((state, policy), outcome)| TrainingExample {
            state,
            policy,
            outcome,
        })
        .collect()
}

/// Sample an action index from a (possibly degenerate) policy.
pub(crate) fn sample_action(pi: &[f32; 4], rng: &mut StdRng) -> usize {
    let weights: Vec<f32> = pi.iter().map(|&p| p.max(0.0)).collect();
    if weights.iter().sum::<f32>() <= 0.0 {
        return rng.gen_range(0..4);
    }
    match WeightedIndex::new(&weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => rng.gen_range(0..4),
    }
}

fn discounted_returns(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0f32; rewards.len()];
    let mut g = 0.0f32;
    for t in (0..rewards.len()).rev() {
        g = rewards[t] + gamma * g;
        returns[t] = g.clamp(-1.0, 1.0);
    }
    returns
}

pub(crate) fn argmax4(pi: &[f32; 4]) -> usize {
    let mut best = 0;
    for a in 1..4 {
        if pi[a] > pi[best] {
            best = a;
        }
    }
    best
}
