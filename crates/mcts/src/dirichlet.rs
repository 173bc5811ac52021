use alphasnake_env::NUM_ACTIONS;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Gamma};

use crate::config::MctsConfig;
use crate::tree::{NodeId, Tree};

/// Mix Dirichlet noise into the root priors for self-play exploration.
///
/// A Dirichlet sample over the legal actions is drawn as independent
/// Gamma(alpha, 1) variates normalised by their sum, then mixed as
/// P' = (1-eps)*P + eps*noise. Illegal actions keep a zero prior and the
/// mixture is not renormalised: it already sums to one over the legal set.
pub fn add_dirichlet_noise_to_root(
    tree: &mut Tree,
    root_id: NodeId,
    config: &MctsConfig,
    rng: &mut StdRng,
) {
    let root = &mut tree.nodes[root_id];
    if !root.expanded {
        return;
    }

    let gamma = match Gamma::new(config.dirichlet_alpha, 1.0) {
        Ok(g) => g,
        Err(_) => return,
    };

    let mut noise = [0.0f32; NUM_ACTIONS];
    let mut sum = 0.0;
    for a in 0..NUM_ACTIONS {
        if root.legal[a] {
            noise[a] = gamma.sample(rng);
            sum += noise[a];
        }
    }
    if sum <= 0.0 {
        return;
    }

    let eps = config.dirichlet_eps;
    for a in 0..NUM_ACTIONS {
        if root.legal[a] {
            root.priors[a] = (1.0 - eps) * root.priors[a] + eps * noise[a] / sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;
    use alphasnake_env::SnakeEnv;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn expanded_root(priors: [f32; 4], legal: [bool; 4]) -> Tree {
        let mut tree = Tree::new();
        let mut root = Node::new_root(SnakeEnv::new(8, 100, 1));
        root.priors = priors;
        root.legal = legal;
        root.expanded = true;
        tree.nodes.push(root);
        tree
    }

    #[test]
    fn noise_changes_priors_but_keeps_a_distribution() {
        let mut tree = expanded_root([0.4, 0.3, 0.0, 0.3], [true, true, false, true]);
        let config = MctsConfig::default().with_dirichlet(0.3, 0.25);
        let mut rng = StdRng::seed_from_u64(5);

        let before = tree.nodes[0].priors;
        add_dirichlet_noise_to_root(&mut tree, 0, &config, &mut rng);
        let after = tree.nodes[0].priors;

        assert!(before
            .iter()
            .zip(after.iter())
            .any(|(b, a)| (b - a).abs() > 1e-6));
        assert_relative_eq!(after.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn illegal_actions_keep_zero_prior() {
        let mut tree = expanded_root([0.4, 0.3, 0.0, 0.3], [true, true, false, true]);
        let config = MctsConfig::default().with_dirichlet(0.3, 0.25);
        let mut rng = StdRng::seed_from_u64(5);

        add_dirichlet_noise_to_root(&mut tree, 0, &config, &mut rng);
        assert_eq!(tree.nodes[0].priors[2], 0.0);
    }

    #[test]
    fn unexpanded_root_is_left_alone() {
        let mut tree = Tree::new();
        tree.initialize_root(SnakeEnv::new(8, 100, 1));
        let config = MctsConfig::default();
        let mut rng = StdRng::seed_from_u64(5);

        add_dirichlet_noise_to_root(&mut tree, 0, &config, &mut rng);
        assert_eq!(tree.nodes[0].priors, [0.0; 4]);
    }

    #[test]
    fn same_seed_gives_identical_noise() {
        let config = MctsConfig::default().with_dirichlet(0.3, 0.25);

        let mut t1 = expanded_root([0.25; 4], [true, true, false, true]);
        let mut r1 = StdRng::seed_from_u64(77);
        add_dirichlet_noise_to_root(&mut t1, 0, &config, &mut r1);

        let mut t2 = expanded_root([0.25; 4], [true, true, false, true]);
        let mut r2 = StdRng::seed_from_u64(77);
        add_dirichlet_noise_to_root(&mut t2, 0, &config, &mut r2);

        assert_eq!(t1.nodes[0].priors, t2.nodes[0].priors);
    }
}
