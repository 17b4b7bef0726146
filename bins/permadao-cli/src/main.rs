//! Command-line driver for the PermaDAO contract.
//!
//! Creates a genesis state, applies interactions to a state file as a host
//! would, and inspects the result. The state file is the only persistence.

mod config;
mod files;

use std::cmp::Reverse;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ordered_float::OrderedFloat;
use serde_json::Value;
use tracing::{debug, info};

use permadao_contract::{Contract, ContractState, GenesisConfig, HandlerOutput, Interaction};
use permadao_conviction::ConvictionEngine;
use permadao_core::host::{FixedBlock, MemoryTagResolver};
use permadao_core::traits::ConvictionCalculator;
use permadao_core::{Address, Proposal};

use config::CliConfig;

/// PermaDAO conviction-voting contract driver.
#[derive(Parser)]
#[command(name = "permadao-cli")]
#[command(version, about = "Apply and inspect PermaDAO contract interactions")]
struct Cli {
    /// Directory holding the state file (default: <data dir>/permadao).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json").
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> CliConfig {
        let defaults = CliConfig::default();
        CliConfig {
            data_dir: self.data_dir.clone().unwrap_or(defaults.data_dir),
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a state file from a genesis allocation.
    Genesis(GenesisArgs),
    /// Apply one interaction to the state file.
    Apply(ApplyArgs),
    /// Summarize the state and rank proposals by conviction.
    Inspect(InspectArgs),
    /// Evaluate the conviction recurrence.
    Conviction(ConvictionArgs),
}

#[derive(Args)]
struct GenesisArgs {
    /// Genesis JSON: {"name", "ticker", "balances": {address: amount}}.
    #[arg(short, long)]
    config: PathBuf,

    /// State file to create (default: <data dir>/state.json).
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Overwrite an existing state file.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ApplyArgs {
    /// Caller address bound to the interaction.
    #[arg(long)]
    caller: String,

    /// Interaction input as JSON, e.g. '{"function":"transfer","to":"…","qty":5}'.
    #[arg(long)]
    input: String,

    /// Current block height.
    #[arg(long)]
    height: u64,

    /// Id of the interaction transaction.
    #[arg(long)]
    txid: String,

    /// Tags JSON: {reference: [{"name", "value"}]}, consulted by createProposal.
    #[arg(long)]
    tags: Option<PathBuf>,

    /// State file (default: <data dir>/state.json).
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Print the new state instead of writing it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// State file (default: <data dir>/state.json).
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Project each proposal's conviction forward to this height.
    #[arg(long)]
    height: Option<u64>,

    /// Number of proposals to list.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

#[derive(Args)]
struct ConvictionArgs {
    /// Steps elapsed since the last update.
    #[arg(long)]
    steps: u64,

    /// Conviction at the last update.
    #[arg(long, default_value_t = 0.0)]
    previous: f64,

    /// Stake held over the interval.
    #[arg(long)]
    old_stake: u64,

    /// Stake after the change.
    #[arg(long)]
    new_stake: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    init_logging(&config.log_level, &config.log_format);
    debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    match cli.command {
        Commands::Genesis(args) => cmd_genesis(&config, args),
        Commands::Apply(args) => cmd_apply(&config, args),
        Commands::Inspect(args) => cmd_inspect(&config, args),
        Commands::Conviction(args) => cmd_conviction(args),
    }
}

fn cmd_genesis(config: &CliConfig, args: GenesisArgs) -> Result<()> {
    let path = args.state.unwrap_or_else(|| config.state_path());
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let genesis: GenesisConfig = files::read_json(&args.config)?;
    let state = ContractState::genesis(&genesis).context("invalid genesis configuration")?;
    files::write_json(&path, &state)?;

    info!(
        path = %path.display(),
        holders = state.balances.len(),
        total_supply = state.total_supply,
        "genesis state written"
    );
    println!("{}", state.fingerprint().context("failed to fingerprint state")?);
    Ok(())
}

fn cmd_apply(config: &CliConfig, args: ApplyArgs) -> Result<()> {
    let path = args.state.unwrap_or_else(|| config.state_path());
    let state: ContractState = files::read_json(&path)?;

    let caller = Address::parse(&args.caller).context("invalid --caller")?;
    let input: Value = serde_json::from_str(&args.input).context("--input is not valid JSON")?;
    let resolver: MemoryTagResolver = match &args.tags {
        Some(tags) => files::read_json(tags)?,
        None => MemoryTagResolver::new(),
    };
    let block = FixedBlock::new(args.height, args.txid);

    let interaction = Interaction { caller, input };
    let output = Contract::new()
        .handle(&state, &interaction, &block, &resolver)
        .context("interaction rejected")?;

    match output {
        HandlerOutput::Result(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        HandlerOutput::State(next) if args.dry_run => {
            println!("{}", serde_json::to_string_pretty(&next)?);
        }
        HandlerOutput::State(next) => {
            files::write_json(&path, &next)?;
            let fingerprint = next.fingerprint().context("failed to fingerprint state")?;
            info!(path = %path.display(), %fingerprint, "state updated");
            println!("{fingerprint}");
        }
    }
    Ok(())
}

fn cmd_inspect(config: &CliConfig, args: InspectArgs) -> Result<()> {
    let path = args.state.unwrap_or_else(|| config.state_path());
    let state: ContractState = files::read_json(&path)?;

    if let Err(violation) = state.check_invariants() {
        bail!("state at {} is inconsistent: {violation}", path.display());
    }

    let staked = state.proposals.total_staked().unwrap_or(0);
    println!("{} ({})", state.name, state.ticker);
    println!("  total supply: {}", state.total_supply);
    println!("  liquid:       {}", state.total_supply - staked);
    println!("  staked:       {staked}");
    println!("  holders:      {}", state.balances.len());
    println!("  proposals:    {}", state.proposal_counter);
    println!("  fingerprint:  {}", state.fingerprint()?);

    let ranking = rank_by_conviction(&state, &ConvictionEngine::new(), args.height);
    if !ranking.is_empty() {
        println!();
        println!("{:>4}  {:<25}  {:>9}  {:>12}  {:>14}", "id", "name", "status", "staked", "conviction");
        for (proposal, conviction) in ranking.into_iter().take(args.top) {
            println!(
                "{:>4}  {:<25}  {:>9}  {:>12}  {:>14.3}",
                proposal.id,
                proposal.name,
                format!("{:?}", proposal.status).to_lowercase(),
                proposal.total_staked,
                conviction
            );
        }
    }
    Ok(())
}

fn cmd_conviction(args: ConvictionArgs) -> Result<()> {
    if !args.previous.is_finite() || args.previous < 0.0 {
        bail!("--previous must be a finite, non-negative number");
    }
    let engine = ConvictionEngine::new();
    let conviction =
        engine.compute_conviction(args.steps, args.previous, args.old_stake, args.new_stake);
    println!("{conviction}");
    println!("steady state at {}: {}", args.new_stake, engine.steady_state(args.new_stake));
    Ok(())
}

/// Proposals ordered by conviction, highest first, ties by id.
///
/// With `height`, each conviction is carried forward from the proposal's last
/// update assuming its stake stays unchanged.
fn rank_by_conviction<'a, C: ConvictionCalculator>(
    state: &'a ContractState,
    calculator: &C,
    height: Option<u64>,
) -> Vec<(&'a Proposal, f64)> {
    let mut ranking: Vec<(&Proposal, f64)> = state
        .proposals
        .iter()
        .map(|p| {
            let conviction = match height {
                Some(h) if p.block_last != 0 && h > p.block_last => calculator.compute_conviction(
                    h - p.block_last,
                    p.conviction_last,
                    p.total_staked,
                    p.total_staked,
                ),
                _ => p.conviction_last,
            };
            (p, conviction)
        })
        .collect();
    ranking.sort_by_key(|(p, c)| (Reverse(OrderedFloat(*c)), p.id));
    ranking
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. `RUST_LOG` overrides `level_str`.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    // Logs go to stderr so stdout stays machine-readable.
    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    const REFERENCE: &str = "rrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrr";

    fn key(c: char) -> String {
        c.to_string().repeat(43)
    }

    fn apply(state: &ContractState, caller: char, input: Value, height: u64) -> ContractState {
        let mut resolver = MemoryTagResolver::new();
        resolver.insert_manifest(REFERENCE);
        let interaction = Interaction {
            caller: Address::parse(&key(caller)).unwrap(),
            input,
        };
        let block = FixedBlock::new(height, format!("tx{height}"));
        match Contract::new().handle(state, &interaction, &block, &resolver).unwrap() {
            HandlerOutput::State(s) => s,
            HandlerOutput::Result(r) => panic!("unexpected result {r:?}"),
        }
    }

    fn two_proposals() -> ContractState {
        let genesis = GenesisConfig {
            name: "PermaDAO".into(),
            ticker: "PDAO".into(),
            balances: [(key('a'), 1_000)].into_iter().collect(),
        };
        let mut state = ContractState::genesis(&genesis).unwrap();
        for name in ["first", "second"] {
            state = apply(
                &state,
                'a',
                json!({
                    "function": "createProposal",
                    "name": name,
                    "version": "1",
                    "url": "https://x.org",
                    "contentReference": REFERENCE,
                }),
                1,
            );
        }
        state
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "permadao-cli",
            "inspect",
            "--data-dir",
            "/tmp/dao",
            "--log-format",
            "json",
        ])
        .unwrap();
        let cfg = cli.config();
        assert_eq!(cfg.state_path(), PathBuf::from("/tmp/dao/state.json"));
        assert_eq!(cfg.log_format, "json");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn ranking_orders_by_conviction_then_id() {
        let state = two_proposals();
        let ranked = rank_by_conviction(&state, &ConvictionEngine::new(), None);
        let ids: Vec<u64> = ranked.iter().map(|(p, _)| p.id).collect();
        assert_eq!(ids, vec![0, 1]);

        let state = apply(&state, 'a', json!({"function": "stake", "id": 1, "qty": 10}), 5);
        let ranked = rank_by_conviction(&state, &ConvictionEngine::new(), None);
        assert_eq!(ranked[0].0.id, 1);
        assert_eq!(ranked[0].1, 10.0);
    }

    #[test]
    fn ranking_projects_forward() {
        let state = apply(&two_proposals(), 'a', json!({"function": "stake", "id": 0, "qty": 100}), 5);
        let ranked = rank_by_conviction(&state, &ConvictionEngine::new(), Some(6));
        assert_eq!(ranked[0].1, 190.0);
        // Height at or before the last update leaves conviction as recorded.
        let ranked = rank_by_conviction(&state, &ConvictionEngine::new(), Some(3));
        assert_eq!(ranked[0].1, 100.0);
    }

    #[test]
    fn apply_round_trip_through_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: dir.path().to_path_buf(),
            ..CliConfig::default()
        };
        files::write_json(&config.state_path(), &two_proposals()).unwrap();

        let args = ApplyArgs {
            caller: key('a'),
            input: json!({"function": "transfer", "to": key('b'), "qty": 5}).to_string(),
            height: 2,
            txid: "tx2".into(),
            tags: None,
            state: None,
            dry_run: false,
        };
        cmd_apply(&config, args).unwrap();

        let state: ContractState = files::read_json(&config.state_path()).unwrap();
        assert_eq!(state.balances.balance_of(&Address::parse(&key('b')).unwrap()), 5);
        state.check_invariants().unwrap();
    }

    #[test]
    fn rejected_interaction_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: dir.path().to_path_buf(),
            ..CliConfig::default()
        };
        let before = two_proposals();
        files::write_json(&config.state_path(), &before).unwrap();

        let args = ApplyArgs {
            caller: key('a'),
            input: json!({"function": "transfer", "to": key('b'), "qty": 5_000}).to_string(),
            height: 2,
            txid: "tx2".into(),
            tags: None,
            state: None,
            dry_run: false,
        };
        assert!(cmd_apply(&config, args).is_err());
        let after: ContractState = files::read_json(&config.state_path()).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn genesis_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: dir.path().to_path_buf(),
            ..CliConfig::default()
        };
        let genesis_path = dir.path().join("genesis.json");
        files::write_json(
            &genesis_path,
            &json!({"name": "PermaDAO", "ticker": "PDAO", "balances": {key('a'): 10}}),
        )
        .unwrap();

        let args = || GenesisArgs {
            config: genesis_path.clone(),
            state: None,
            force: false,
        };
        cmd_genesis(&config, args()).unwrap();
        assert!(cmd_genesis(&config, args()).is_err());

        let state: ContractState = files::read_json(&config.state_path()).unwrap();
        assert_eq!(state.total_supply, 10);
    }
}
