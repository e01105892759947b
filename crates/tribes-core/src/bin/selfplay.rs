//! Headless self-play driver.
//!
//! Plays random-agent games on a built-in or user supplied level and prints the results as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use tribes_core::{
    load_rules, run_batch_selfplay, LevelData, RulesSource, SelfPlayConfig, TribeKind, TurnBudget,
    DUEL_LEVEL, SKIRMISH_LEVEL,
};

#[derive(Parser)]
#[command(name = "tribes-selfplay")]
#[command(about = "Run headless random-agent games", version)]
struct Cli {
    /// Level file in the compact text format; defaults to a built-in map sized for the tribes
    #[arg(long)]
    level: Option<PathBuf>,

    /// Rules YAML file; defaults to the embedded rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Tribe kinds in capital order
    #[arg(long, value_delimiter = ',', default_value = "xin-xi,imperius,bardur,oumaji")]
    tribes: Vec<TribeArg>,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of games, with consecutive seeds
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Actions a tribe may attempt per turn before its turn is closed
    #[arg(long, default_value_t = 64)]
    max_actions: usize,

    /// Wall-clock limit per turn in milliseconds
    #[arg(long)]
    turn_millis: Option<u64>,

    /// Override the tick limit from the rules
    #[arg(long)]
    max_ticks: Option<u32>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum TribeArg {
    XinXi,
    Imperius,
    Bardur,
    Oumaji,
}

impl From<TribeArg> for TribeKind {
    fn from(arg: TribeArg) -> Self {
        match arg {
            TribeArg::XinXi => TribeKind::XinXi,
            TribeArg::Imperius => TribeKind::Imperius,
            TribeArg::Bardur => TribeKind::Bardur,
            TribeArg::Oumaji => TribeKind::Oumaji,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();

    let rules = match &cli.rules {
        Some(path) => load_rules(RulesSource::Path(path.clone()))
            .with_context(|| format!("loading rules from {}", path.display()))?,
        None => load_rules(RulesSource::Embedded).context("loading embedded rules")?,
    };

    let level_text = match &cli.level {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading level {}", path.display()))?,
        None => match cli.tribes.len() {
            2 => DUEL_LEVEL.to_string(),
            4 => SKIRMISH_LEVEL.to_string(),
            n => bail!("no built-in level for {n} tribes, pass --level"),
        },
    };
    let level = LevelData::parse(&level_text).context("parsing level")?;

    let config = SelfPlayConfig {
        seed: cli.seed,
        tribes: cli.tribes.iter().map(|&t| t.into()).collect(),
        budget: TurnBudget {
            max_actions: cli.max_actions,
            max_duration: cli.turn_millis.map(Duration::from_millis),
        },
        max_ticks: cli.max_ticks,
    };

    tracing::info!(games = cli.games, seed = cli.seed, "starting self-play");
    let batch = run_batch_selfplay(Arc::new(rules), &level, &config, cli.games)
        .context("setting up game")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&batch).context("serializing results")?
    );
    Ok(())
}
