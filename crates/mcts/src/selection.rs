use alphasnake_env::NUM_ACTIONS;

use crate::tree::{NodeId, Tree};

/// Select the action with the highest PUCT score at `node_id`.
///
/// PUCT(s, a) = Q(s, a) + c_puct * P(s, a) * sqrt(N(s)) / (1 + N(s, a))
///
/// An unallocated child slot contributes Q = 0 and N(s, a) = 0. The parent
/// visit count under the square root is clamped to at least 1 so the root's
/// first pass scores by priors alone. Ties go to the lowest action index.
pub fn select_action(tree: &Tree, node_id: NodeId, c_puct: f32) -> usize {
    let node = &tree.nodes[node_id];
    let sqrt_parent = (node.visit_count.max(1) as f32).sqrt();

    let mut best_action = 0;
    let mut best_score = f32::NEG_INFINITY;
    for a in 0..NUM_ACTIONS {
        if !node.legal[a] {
            continue;
        }

        let (q, n_sa) = match node.children[a] {
            Some(child_id) => {
                let child = &tree.nodes[child_id];
                (child.q_value(), child.visit_count)
            }
            None => (0.0, 0),
        };
        let u = c_puct * node.priors[a] * sqrt_parent / (1.0 + n_sa as f32);
        let score = q + u;
        if score > best_score {
            best_score = score;
            best_action = a;
        }
    }
    best_action
}
