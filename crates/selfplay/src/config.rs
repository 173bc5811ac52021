use alphasnake_mcts::MctsConfig;

/// Parameters for one iteration of self-play generation.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    pub board_size: usize,
    pub max_steps: u32,
    /// Games to generate this iteration
    pub games: u32,
    /// Worker thread count (clamped to the game count)
    pub workers: u32,
    /// Move index at which the sampling temperature drops from 1.0 to 0.0
    pub temp_decay_move: u32,
    /// Discount for the per-position return targets
    pub gamma: f32,
    pub seed: u64,
    pub mcts: MctsConfig,
    pub inference_batch_size: usize,
    pub inference_wait_us: u64,
}

/// Parameters for an evaluation run (greedy play, no exploration noise).
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub board_size: usize,
    pub max_steps: u32,
    pub games: u32,
    pub seed: u64,
    pub mcts: MctsConfig,
    pub inference_batch_size: usize,
    pub inference_wait_us: u64,
}
