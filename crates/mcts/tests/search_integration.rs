use alphasnake_env::{SnakeEnv, DOWN, LEFT, RIGHT, UP};
use alphasnake_mcts::{Evaluator, InferenceBatcher, Mcts, MctsConfig};
use alphasnake_nn::{PolicyValueNet, Prediction};

struct UniformEvaluator;

impl Evaluator for UniformEvaluator {
    fn predict(&self, _state: &[f32]) -> Prediction {
        Prediction::default()
    }

    fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
        states.iter().map(|s| self.predict(s)).collect()
    }
}

struct FixedEvaluator {
    policy: [f32; 4],
}

impl Evaluator for FixedEvaluator {
    fn predict(&self, _state: &[f32]) -> Prediction {
        Prediction {
            policy: self.policy,
            value: 0.0,
        }
    }

    fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
        states.iter().map(|s| self.predict(s)).collect()
    }
}

#[test]
fn greedy_search_picks_a_legal_action() {
    let env = SnakeEnv::new(10, 1000, 123);
    let mut mcts = Mcts::new(MctsConfig::default().with_simulations(32), 1);
    let pi = mcts.search(&env, &UniformEvaluator, false, 0.0);

    let argmax = pi
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(a, _)| a)
        .unwrap();

    // The initial heading is RIGHT, so LEFT is the only illegal action.
    assert!([UP, DOWN, RIGHT].contains(&argmax));
    assert_eq!(pi[argmax], 1.0);
}

#[test]
fn illegal_action_mass_stays_negligible() {
    let env = SnakeEnv::new(10, 1000, 123);
    let mut mcts = Mcts::new(MctsConfig::default().with_simulations(64), 1);
    let pi = mcts.search(&env, &UniformEvaluator, false, 1.0);

    assert!(pi[LEFT] < 1e-4);
    let sum: f32 = pi.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
}

#[test]
fn search_follows_a_dominant_prior() {
    let env = SnakeEnv::new(10, 1000, 123);
    let eval = FixedEvaluator {
        policy: [0.05, 0.05, 0.0, 0.9],
    };
    let mut mcts = Mcts::new(MctsConfig::default().with_simulations(32), 1);
    let pi = mcts.search(&env, &eval, false, 0.0);
    assert_eq!(pi[RIGHT], 1.0);
}

#[test]
fn same_seed_reproduces_the_policy() {
    let env = SnakeEnv::new(10, 1000, 123);
    let cfg = MctsConfig::default()
        .with_simulations(48)
        .with_food_samples(4);

    let mut m1 = Mcts::new(cfg.clone(), 42);
    let pi1 = m1.search(&env, &UniformEvaluator, true, 1.0);

    let mut m2 = Mcts::new(cfg, 42);
    let pi2 = m2.search(&env, &UniformEvaluator, true, 1.0);

    assert_eq!(pi1, pi2);
}

#[test]
fn root_noise_perturbs_the_policy() {
    let env = SnakeEnv::new(10, 1000, 123);
    let cfg = MctsConfig::default()
        .with_simulations(48)
        .with_dirichlet(0.5, 0.5);

    let mut quiet = Mcts::new(cfg.clone(), 3);
    let pi_quiet = quiet.search(&env, &UniformEvaluator, false, 1.0);

    let mut noisy = Mcts::new(cfg, 3);
    let pi_noisy = noisy.search(&env, &UniformEvaluator, true, 1.0);

    assert!(pi_quiet
        .iter()
        .zip(pi_noisy.iter())
        .any(|(a, b)| (a - b).abs() > 1e-4));
}

#[test]
fn search_through_a_batcher_matches_direct_search() {
    let net = PolicyValueNet::new(10, 5);
    let env = SnakeEnv::new(10, 1000, 123);
    let cfg = MctsConfig::default().with_simulations(24);

    let mut direct = Mcts::new(cfg.clone(), 8);
    let pi_direct = direct.search(&env, &net, false, 0.0);

    let batcher = InferenceBatcher::new(net, 8, 500);
    batcher.start();
    let mut batched = Mcts::new(cfg, 8);
    let pi_batched = batched.search(&env, &batcher, false, 0.0);
    batcher.stop();

    assert_eq!(pi_direct, pi_batched);
}
