//! Guardian daemon: simulation and offline verification.

use anyhow::{bail, Context};
use clap::Parser;
use guardian_committee::{CommitteeSelection, CooldownTracker};
use guardian_consensus::ConsensusResult;
use guardian_node::{init_logging, GuardianEngine, NodeConfig, ShutdownController};
use guardian_nullables::{test_pool, NullClock, NullGateway, TestOracle};
use guardian_registry::RegistrySnapshot;
use guardian_types::{DataHash, Seed};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "guardian-daemon", about = "Guardian oracle consensus daemon")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override
    /// the logging settings it contains.
    #[arg(long, env = "GUARDIAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GUARDIAN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GUARDIAN_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run consensus rounds over an in-memory oracle pool.
    Simulate {
        /// Pool size; stakes alternate between 100 and 50.
        #[arg(long, default_value_t = 10)]
        oracles: u32,

        #[arg(long, default_value_t = 5)]
        rounds: u64,

        /// Oracles (lowest indices first) that report a conflicting hash.
        #[arg(long, default_value_t = 0)]
        faulty: u32,

        /// Write the registry plus each round's selection and result as JSON
        /// into this directory.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the Prometheus exposition after the run.
        #[arg(long)]
        metrics: bool,
    },

    /// Check a committee selection against a registry snapshot.
    VerifySelection {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        selection: PathBuf,

        /// Rotation state before the round; enables a full recompute.
        #[arg(long)]
        cooldown: Option<PathBuf>,
    },

    /// Re-derive a round's outcome from its recorded submissions.
    RecomputeTally {
        #[arg(long)]
        result: PathBuf,

        /// Also check recorded weights against this snapshot.
        #[arg(long)]
        registry: Option<PathBuf>,
    },

    /// Print the default configuration as TOML.
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate().context("invalid configuration")?;
    init_logging(config.log_format()?, &config.log_level)?;

    match cli.command {
        Command::Simulate {
            oracles,
            rounds,
            faulty,
            out,
            metrics,
        } => simulate(config, oracles, rounds, faulty, out.as_deref(), metrics).await,
        Command::VerifySelection {
            registry,
            selection,
            cooldown,
        } => verify_selection(&config, &registry, &selection, cooldown.as_deref()),
        Command::RecomputeTally { result, registry } => {
            recompute_tally(&config, &result, registry.as_deref())
        }
        Command::DefaultConfig => {
            print!("{}", NodeConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

async fn simulate(
    mut config: NodeConfig,
    pool_size: u32,
    rounds: u64,
    faulty: u32,
    out: Option<&Path>,
    print_metrics: bool,
) -> anyhow::Result<()> {
    let stakes: Vec<u128> = (0..pool_size)
        .map(|i| if i % 2 == 0 { 100 } else { 50 })
        .collect();
    let (oracles, gateway) = test_pool(&stakes);
    let gateway = Arc::new(gateway);
    let clock = Arc::new(NullClock::new(1));

    // Rounds that cannot agree are closed at the end, not after a real window.
    config.shutdown_grace_secs = 0;
    let engine = GuardianEngine::new(config, gateway.clone(), clock.clone())?;
    let eligible = engine.refresh_registry_with_retry().await?;
    tracing::info!(eligible, rounds, faulty, "simulation starting");

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)?;
        write_json(&dir.join("registry.json"), &*engine.registry_snapshot().await)?;
    }

    let mut results = Vec::new();
    let run = run_rounds(&engine, &gateway, &clock, &oracles, rounds, faulty, out, &mut results);
    tokio::select! {
        outcome = run => outcome?,
        _ = ShutdownController::wait_for_signal() => {
            tracing::info!("simulation interrupted, finalizing open rounds");
        }
    }

    results.extend(engine.shutdown().await);
    results.sort_by_key(|r| r.round_id);

    for result in &results {
        println!("{}", serde_json::to_string(&summary(result))?);
        if let Some(dir) = out {
            write_json(&dir.join(format!("result-{}.json", result.round_id.get())), result)?;
        }
    }
    if print_metrics {
        print!("{}", engine.metrics().gather_text()?);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_rounds(
    engine: &GuardianEngine,
    gateway: &NullGateway,
    clock: &NullClock,
    oracles: &[TestOracle],
    rounds: u64,
    faulty: u32,
    out: Option<&Path>,
    results: &mut Vec<ConsensusResult>,
) -> anyhow::Result<()> {
    let honest = DataHash::new([0xAA; 32]);
    let conflicting = DataHash::new([0xBB; 32]);

    for n in 0..rounds {
        let mut seed = [0u8; 32];
        seed[..8].copy_from_slice(&n.to_be_bytes());
        gateway.set_block_hash(Seed::new(seed));
        clock.advance(1);

        let round_id = match engine.start_round().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "round could not start");
                continue;
            }
        };
        let voters: Vec<&TestOracle> = match engine.selection(round_id).await {
            Some(selection) => {
                if let Some(dir) = out {
                    write_json(&dir.join(format!("selection-{}.json", round_id.get())), &selection)?;
                }
                oracles
                    .iter()
                    .filter(|o| selection.contains(&o.address()))
                    .collect()
            }
            None => oracles.iter().collect(),
        };

        for oracle in voters {
            let data_hash = if oracle.index() < faulty { conflicting } else { honest };
            let signature = oracle.sign(round_id, &data_hash);
            match engine.submit(round_id, oracle.address(), data_hash, signature).await {
                Ok(Some(result)) => {
                    results.push(result);
                    break;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(round_id = %round_id, error = %e, "submission refused"),
            }
        }
    }
    Ok(())
}

fn summary(result: &ConsensusResult) -> serde_json::Value {
    serde_json::json!({
        "round_id": result.round_id,
        "reached": result.reached(),
        "consensus_hash": result.consensus_hash,
        "consensus_weight": result.consensus_weight.map(|w| w.to_string()),
        "leading_weight": result.leading_weight.to_string(),
        "total_weight": result.total_weight.to_string(),
        "submissions": result.submissions.len(),
        "failure": result.failure,
    })
}

fn verify_selection(
    config: &NodeConfig,
    registry: &Path,
    selection: &Path,
    cooldown: Option<&Path>,
) -> anyhow::Result<()> {
    let snapshot: RegistrySnapshot = read_json(registry)?;
    let selection: CommitteeSelection = read_json(selection)?;
    let params = &config.params.committee;

    match cooldown {
        Some(path) => {
            let cooldown: CooldownTracker = read_json(path)?;
            guardian_verification::recompute_selection(&selection, &snapshot, &cooldown, params)
                .with_context(|| format!("selection for round {} failed recompute", selection.round_id))?;
        }
        None => {
            if !guardian_verification::verify_selection(&selection, &snapshot, params) {
                bail!("selection for round {} is invalid", selection.round_id);
            }
        }
    }
    println!("selection for round {} is valid", selection.round_id);
    Ok(())
}

fn recompute_tally(config: &NodeConfig, result: &Path, registry: Option<&Path>) -> anyhow::Result<()> {
    let result: ConsensusResult = read_json(result)?;
    if let Some(path) = registry {
        let snapshot: RegistrySnapshot = read_json(path)?;
        guardian_verification::check_submission_weights(&result, &snapshot)
            .context("recorded weights do not match the registry")?;
    }
    let report = guardian_verification::verify_result(&result, &config.params)
        .with_context(|| format!("result for round {} failed verification", result.round_id))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}
