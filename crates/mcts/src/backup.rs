use crate::tree::{NodeId, Tree};

/// Back up a leaf value along the root-to-leaf path.
///
/// Single-agent search: the same value is credited to every node on the path,
/// with no sign alternation between levels.
pub fn backup(tree: &mut Tree, path: &[NodeId], value: f32) {
    for &node_id in path {
        let node = &mut tree.nodes[node_id];
        node.visit_count += 1;
        node.value_sum += value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;
    use alphasnake_env::SnakeEnv;

    fn tree_with_chain(len: usize) -> Tree {
        let mut tree = Tree::new();
        tree.initialize_root(SnakeEnv::new(8, 100, 1));
        let mut prev = 0;
        for _ in 1..len {
            let mut env = SnakeEnv::new(8, 100, 1);
            let step = env.step(alphasnake_env::RIGHT);
            let id = tree.add_node(Node::new_child(env, &step));
            tree.nodes[prev].children[alphasnake_env::RIGHT] = Some(id);
            prev = id;
        }
        tree
    }

    #[test]
    fn backup_single_node() {
        let mut tree = tree_with_chain(1);
        backup(&mut tree, &[0], 0.5);
        assert_eq!(tree.nodes[0].visit_count, 1);
        assert_eq!(tree.nodes[0].value_sum, 0.5);
    }

    #[test]
    fn backup_does_not_negate_along_the_path() {
        let mut tree = tree_with_chain(3);
        backup(&mut tree, &[0, 1, 2], 1.0);

        for id in 0..3 {
            assert_eq!(tree.nodes[id].visit_count, 1);
            assert_eq!(tree.nodes[id].value_sum, 1.0);
        }
    }

    #[test]
    fn backup_accumulates_over_visits() {
        let mut tree = tree_with_chain(1);
        backup(&mut tree, &[0], 0.5);
        backup(&mut tree, &[0], 0.3);

        assert_eq!(tree.nodes[0].visit_count, 2);
        assert!((tree.nodes[0].value_sum - 0.8).abs() < 1e-6);
        assert!((tree.nodes[0].q_value() - 0.4).abs() < 1e-6);
    }
}
