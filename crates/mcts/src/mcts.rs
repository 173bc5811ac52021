use alphasnake_env::{SnakeEnv, NUM_ACTIONS};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backup::backup;
use crate::config::MctsConfig;
use crate::dirichlet::add_dirichlet_noise_to_root;
use crate::evaluation::Evaluator;
use crate::expansion::expand_and_evaluate;
use crate::selection::select_action;
use crate::tree::{Node, NodeId, Tree};

/// PUCT search over a rooted snake position.
///
/// The tree is rebuilt per call; the arena and the backup-path buffer are
/// reused across simulations.
pub struct Mcts {
    config: MctsConfig,
    tree: Tree,
    path: Vec<NodeId>,
    rng: StdRng,
}

impl Mcts {
    pub fn new(config: MctsConfig, seed: u64) -> Self {
        Self {
            config,
            tree: Tree::new(),
            path: Vec::with_capacity(64),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Run the configured number of simulations from `root_env` and return the
    /// visit-count policy over the four actions.
    pub fn search<E: Evaluator>(
        &mut self,
        root_env: &SnakeEnv,
        evaluator: &E,
        add_root_noise: bool,
        temperature: f32,
    ) -> [f32; NUM_ACTIONS] {
        let root_id = self.tree.initialize_root(root_env.clone());
        let root_value =
            expand_and_evaluate(&mut self.tree, root_id, evaluator, &self.config, &mut self.rng);

        // Bootstrap the root as visited once with its own expansion value so
        // the sqrt(N) term is defined and the first simulation follows priors.
        self.tree.nodes[root_id].visit_count = 1;
        self.tree.nodes[root_id].value_sum = root_value;

        if add_root_noise {
            add_dirichlet_noise_to_root(&mut self.tree, root_id, &self.config, &mut self.rng);
        }

        for _ in 0..self.config.num_simulations {
            self.path.clear();
            let mut node_id = root_id;
            self.path.push(node_id);

            // Selection: descend until an unexpanded or terminal node,
            // materialising child slots on first use.
            while self.tree.nodes[node_id].expanded && !self.tree.nodes[node_id].terminal {
                let action = select_action(&self.tree, node_id, self.config.c_puct);

                if self.tree.nodes[node_id].children[action].is_none() {
                    let mut env = self.tree.nodes[node_id].env.clone();
                    let step = env.step(action);
                    let child_id = self.tree.add_node(Node::new_child(env, &step));
                    self.tree.nodes[node_id].children[action] = Some(child_id);
                }

                node_id = self.tree.nodes[node_id].children[action]
                    .expect("child slot was just filled");
                self.path.push(node_id);
                if self.tree.nodes[node_id].terminal {
                    break;
                }
            }

            let value = if self.tree.nodes[node_id].terminal {
                if self.tree.nodes[node_id].won {
                    1.0
                } else {
                    -1.0
                }
            } else {
                expand_and_evaluate(
                    &mut self.tree,
                    node_id,
                    evaluator,
                    &self.config,
                    &mut self.rng,
                )
            };

            backup(&mut self.tree, &self.path, value);
        }

        self.visit_policy(root_id, temperature)
    }

    /// Convert root child visit counts into the returned policy.
    fn visit_policy(&self, root_id: NodeId, temperature: f32) -> [f32; NUM_ACTIONS] {
        let root = &self.tree.nodes[root_id];
        let mut visits = [0.0f32; NUM_ACTIONS];
        for (a, slot) in root.children.iter().enumerate() {
            if let Some(child_id) = *slot {
                visits[a] = self.tree.nodes[child_id].visit_count as f32;
            }
        }

        let mut pi = [0.0f32; NUM_ACTIONS];
        if temperature <= 1e-6 {
            let mut best = 0;
            for a in 1..NUM_ACTIONS {
                if visits[a] > visits[best] {
                    best = a;
                }
            }
            pi[best] = 1.0;
            return pi;
        }

        let mut sum = 0.0;
        for a in 0..NUM_ACTIONS {
            pi[a] = visits[a].max(1e-6).powf(1.0 / temperature);
            sum += pi[a];
        }
        if sum <= 0.0 {
            return [0.25; NUM_ACTIONS];
        }
        for p in pi.iter_mut() {
            *p /= sum;
        }
        pi
    }

    pub fn tree_size(&self) -> usize {
        self.tree.size()
    }
}
