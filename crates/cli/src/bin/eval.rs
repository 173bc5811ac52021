use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use alphasnake_nn::PolicyValueNet;
use alphasnake_selfplay::evaluate_model;
use alphasnake_train::load_config_file;

/// Evaluate a saved checkpoint with greedy MCTS play.
#[derive(Parser, Debug)]
#[command(name = "alphasnake-eval")]
struct Args {
    /// Path to the run config file
    #[arg(long)]
    config: String,

    /// Profile overlay applied before evaluation
    #[arg(long, default_value = "paper_strict")]
    profile: String,

    /// Model checkpoint to evaluate; defaults to save_dir/best_model.bin
    #[arg(long)]
    checkpoint: Option<String>,

    /// Number of evaluation games
    #[arg(long)]
    games: Option<u32>,

    /// MCTS simulations per move
    #[arg(long)]
    simulations: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let base_cfg = load_config_file(&args.config)
        .with_context(|| format!("loading config {}", args.config))?;
    let mut cfg = base_cfg.with_profile(&args.profile);
    if let Some(games) = args.games {
        cfg.eval_games = games.max(1);
    }
    if let Some(simulations) = args.simulations {
        cfg.num_simulations = simulations.max(1);
    }

    let checkpoint = args.checkpoint.map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(&cfg.save_dir).join(alphasnake_train::BEST_MODEL_FILE)
    });

    let mut net = PolicyValueNet::new(cfg.board_size, cfg.seed);
    net.load(&checkpoint)
        .with_context(|| format!("loading checkpoint {}", checkpoint.display()))?;

    println!(
        "evaluating {} | games={} simulations={}",
        checkpoint.display(),
        cfg.eval_games,
        cfg.num_simulations
    );

    let metrics = evaluate_model(&cfg.eval_config(), &net, 0);

    println!("win_rate={:.4}", metrics.win_rate);
    println!("avg_length={:.2}", metrics.avg_length);
    Ok(())
}
