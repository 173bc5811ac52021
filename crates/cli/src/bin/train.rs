use anyhow::Context;
use clap::Parser;
use tracing::info;

use alphasnake_train::{load_config_file, Trainer};

/// AlphaZero-style self-play trainer for single-agent Snake.
#[derive(Parser, Debug)]
#[command(name = "alphasnake-train")]
struct Args {
    /// Path to the run config file
    #[arg(long)]
    config: String,

    /// Profile overlay: warmup_fast, smoke, paper_strict or two_phase
    #[arg(long, default_value = "two_phase")]
    profile: String,

    /// Resume from the checkpoint in save_dir; anything except 0/false/False
    /// counts as yes
    #[arg(long, default_value = "auto")]
    resume: String,

    /// Override the config's save_dir
    #[arg(long)]
    save_dir: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut base_cfg = load_config_file(&args.config)
        .with_context(|| format!("loading config {}", args.config))?;
    if let Some(save_dir) = args.save_dir {
        base_cfg.save_dir = save_dir;
    }

    let resume = !matches!(args.resume.as_str(), "0" | "false" | "False");

    if args.profile == "two_phase" {
        let mut warm = base_cfg.with_profile("warmup_fast");
        warm.iterations = base_cfg.warmup_iterations.max(1);

        let mut strict = base_cfg.with_profile("paper_strict");
        strict.iterations = base_cfg.strict_iterations.max(1);

        info!("phase 1/2: warmup_fast");
        Trainer::new(warm).run(resume)?;

        // Phase two always resumes from the checkpoint phase one just wrote.
        info!("phase 2/2: paper_strict");
        Trainer::new(strict).run(true)?;

        info!("two-phase training finished");
        return Ok(());
    }

    let cfg = base_cfg.with_profile(&args.profile);
    Trainer::new(cfg).run(resume)?;

    info!("training finished");
    Ok(())
}
