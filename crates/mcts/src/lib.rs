// Module declarations
mod backup;
mod batching;
mod config;
mod dirichlet;
mod evaluation;
mod expansion;
mod mcts;
mod selection;
mod tree;

// Public exports
pub use batching::{BatcherStats, InferenceBatcher};
pub use config::MctsConfig;
pub use evaluation::Evaluator;
pub use mcts::Mcts;
