use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::MctsConfig;
use crate::evaluation::{normalize_masked, Evaluator};
use crate::tree::{NodeId, Tree};

/// Expand a leaf: compute its legal mask and masked priors, and return its
/// value estimate.
///
/// When the arrival transition ate food and `food_samples > 1`, the value is
/// averaged over up to `food_samples - 1` alternative food placements drawn
/// without replacement from the free cells. The alternates go through the
/// many-state predict path so a batching evaluator can fuse them into one
/// forward pass.
pub fn expand_and_evaluate<E: Evaluator>(
    tree: &mut Tree,
    leaf_id: NodeId,
    evaluator: &E,
    config: &MctsConfig,
    rng: &mut StdRng,
) -> f32 {
    let node = &mut tree.nodes[leaf_id];
    node.legal = node.env.legal_mask();

    let pred = evaluator.predict(&node.env.state_tensor());
    node.priors = normalize_masked(&pred.policy, &node.legal);
    node.expanded = true;

    let mut value = pred.value;
    if node.food_eaten && config.food_samples > 1 {
        let mut free = node.env.free_cells();
        if !free.is_empty() {
            let k = ((config.food_samples - 1) as usize).min(free.len());
            let (chosen, _) = free.partial_shuffle(rng, k);

            let states: Vec<Vec<f32>> = chosen
                .iter()
                .map(|&alt| {
                    let mut env = node.env.clone();
                    env.set_food(alt);
                    env.state_tensor()
                })
                .collect();

            let preds = evaluator.predict_many(&states);
            let mut sum = value;
            let mut used = 1;
            for p in &preds {
                sum += p.value;
                used += 1;
            }
            value = sum / used as f32;
        }
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphasnake_env::{Point, SnakeEnv, RIGHT};
    use alphasnake_nn::Prediction;
    use rand::SeedableRng;
    use std::cell::RefCell;

    struct FixedEvaluator {
        policy: [f32; 4],
        value: f32,
        many_states: RefCell<usize>,
    }

    impl FixedEvaluator {
        fn new(policy: [f32; 4], value: f32) -> Self {
            Self {
                policy,
                value,
                many_states: RefCell::new(0),
            }
        }
    }

    impl Evaluator for FixedEvaluator {
        fn predict(&self, _state: &[f32]) -> Prediction {
            Prediction {
                policy: self.policy,
                value: self.value,
            }
        }

        fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
            *self.many_states.borrow_mut() += states.len();
            states.iter().map(|s| self.predict(s)).collect()
        }
    }

    #[test]
    fn expansion_sets_masked_priors() {
        let mut tree = Tree::new();
        tree.initialize_root(SnakeEnv::new(8, 100, 1));

        let eval = FixedEvaluator::new([0.25; 4], 0.5);
        let cfg = MctsConfig::default().with_food_samples(1);
        let mut rng = StdRng::seed_from_u64(0);

        let value = expand_and_evaluate(&mut tree, 0, &eval, &cfg, &mut rng);
        assert_eq!(value, 0.5);

        let root = &tree.nodes[0];
        assert!(root.expanded);
        // LEFT is the reverse of the initial heading; its prior must be zero.
        assert_eq!(root.priors[alphasnake_env::LEFT], 0.0);
        let sum: f32 = root.priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn food_nodes_average_over_alternate_placements() {
        let mut env = SnakeEnv::new(8, 100, 1);
        let h = env.snake()[0];
        env.set_food(Point { x: h.x + 1, y: h.y });
        let step = env.step(RIGHT);
        assert!(step.food_eaten);

        let mut tree = Tree::new();
        tree.initialize_root(SnakeEnv::new(8, 100, 1));
        let child_id = tree.add_node(crate::tree::Node::new_child(env, &step));

        let eval = FixedEvaluator::new([0.25; 4], 0.25);
        let cfg = MctsConfig::default().with_food_samples(4);
        let mut rng = StdRng::seed_from_u64(7);

        let value = expand_and_evaluate(&mut tree, child_id, &eval, &cfg, &mut rng);
        // 3 alternates requested, all returning the same value.
        assert_eq!(*eval.many_states.borrow(), 3);
        assert!((value - 0.25).abs() < 1e-6);
    }

    #[test]
    fn non_food_nodes_skip_the_alternates() {
        let mut tree = Tree::new();
        tree.initialize_root(SnakeEnv::new(8, 100, 1));

        let eval = FixedEvaluator::new([0.25; 4], 0.0);
        let cfg = MctsConfig::default().with_food_samples(8);
        let mut rng = StdRng::seed_from_u64(7);

        expand_and_evaluate(&mut tree, 0, &eval, &cfg, &mut rng);
        assert_eq!(*eval.many_states.borrow(), 0);
    }
}
