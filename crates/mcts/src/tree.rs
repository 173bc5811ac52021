use alphasnake_env::{SnakeEnv, StepResult, NUM_ACTIONS};

/// Node ID in the arena-style tree
pub type NodeId = usize;

/// A single node in the MCTS tree
pub struct Node {
    /// Game state at this node
    pub env: SnakeEnv,

    /// Child slot per action; `None` until the action is first tried
    pub children: [Option<NodeId>; NUM_ACTIONS],

    /// Masked, normalised priors over actions
    pub priors: [f32; NUM_ACTIONS],

    /// Legal-action mask at this state
    pub legal: [bool; NUM_ACTIONS],

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of values backed up through this node
    pub value_sum: f32,

    /// Whether priors/value have been computed
    pub expanded: bool,

    /// Whether the arrival transition ended the game
    pub terminal: bool,

    /// Whether the arrival transition won the game
    pub won: bool,

    /// Whether the arrival transition ate food (triggers value averaging)
    pub food_eaten: bool,
}

impl Node {
    pub fn new_root(env: SnakeEnv) -> Self {
        let terminal = env.is_done();
        let won = env.is_win();
        Self {
            env,
            children: [None; NUM_ACTIONS],
            priors: [0.0; NUM_ACTIONS],
            legal: [false; NUM_ACTIONS],
            visit_count: 0,
            value_sum: 0.0,
            expanded: false,
            terminal,
            won,
            food_eaten: false,
        }
    }

    pub fn new_child(env: SnakeEnv, step: &StepResult) -> Self {
        Self {
            env,
            children: [None; NUM_ACTIONS],
            priors: [0.0; NUM_ACTIONS],
            legal: [false; NUM_ACTIONS],
            visit_count: 0,
            value_sum: 0.0,
            expanded: false,
            terminal: step.done,
            won: step.won,
            food_eaten: step.food_eaten,
        }
    }

    /// Q-value (average backed-up value)
    pub fn q_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }
}

/// MCTS tree using arena allocation
pub struct Tree {
    /// Arena of all nodes
    pub nodes: Vec<Node>,

    /// Root node ID (always 0 after initialisation)
    pub root_id: NodeId,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024),
            root_id: 0,
        }
    }

    /// Reset the arena around a fresh root.
    pub fn initialize_root(&mut self, env: SnakeEnv) -> NodeId {
        self.nodes.clear();
        self.nodes.push(Node::new_root(env));
        self.root_id = 0;
        self.root_id
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q_value_of_unvisited_node_is_zero() {
        let env = SnakeEnv::new(6, 100, 1);
        let node = Node::new_root(env);
        assert_eq!(node.q_value(), 0.0);
    }

    #[test]
    fn q_value_is_the_average() {
        let env = SnakeEnv::new(6, 100, 1);
        let mut node = Node::new_root(env);
        node.visit_count = 4;
        node.value_sum = 2.0;
        assert_eq!(node.q_value(), 0.5);
    }

    #[test]
    fn initialize_root_resets_the_arena() {
        let mut tree = Tree::new();
        tree.initialize_root(SnakeEnv::new(6, 100, 1));
        let extra = Node::new_root(SnakeEnv::new(6, 100, 2));
        tree.add_node(extra);
        assert_eq!(tree.size(), 2);

        tree.initialize_root(SnakeEnv::new(6, 100, 3));
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.root_id, 0);
    }

    #[test]
    fn child_records_arrival_flags() {
        let mut env = SnakeEnv::new(6, 100, 1);
        let h = env.snake()[0];
        env.set_food(alphasnake_env::Point { x: h.x + 1, y: h.y });
        let step = env.step(alphasnake_env::RIGHT);

        let child = Node::new_child(env, &step);
        assert!(child.food_eaten);
        assert!(!child.terminal);
        assert!(!child.won);
    }
}
