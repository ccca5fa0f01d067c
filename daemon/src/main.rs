//! `councild`: command-line entry point for a council node.

use anyhow::Context;
use clap::Parser;
use council_node::{GovernanceNode, NodeConfig};
use council_types::{Address, ChainId, ElectionId, EpochSchedule, Timestamp};
use council_utils::{format_countdown, LogFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "councild", about = "Council election node")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "COUNCIL_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for election storage.
    #[arg(long, env = "COUNCIL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Local chain id.
    #[arg(long, env = "COUNCIL_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "COUNCIL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "COUNCIL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create the council and first epoch from the configuration.
    Init,
    /// Write a new guardian seed file and print its public key.
    Keygen { out: PathBuf },
    /// Show the current election.
    Status,
    /// Move the boundaries of the current epoch (unix seconds).
    SetSchedule {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        nomination: u64,
        #[arg(long)]
        voting: u64,
        #[arg(long)]
        evaluation: u64,
    },
    /// Enable or disable a snapshot provider.
    SetProvider {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        provider: Address,
        #[arg(long)]
        disable: bool,
    },
    /// Apply the configured guardian sets.
    SetGuardians {
        #[arg(long)]
        caller: Address,
    },
    /// Hand administration to another address.
    TransferAdmin {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        to: Address,
    },
    /// Freeze a provider's balances for the current election.
    Snapshot {
        #[arg(long)]
        provider: Address,
    },
    /// Print the snapshot id for a provider.
    SnapshotId {
        #[arg(long)]
        provider: Address,
        #[arg(long)]
        election: Option<u64>,
    },
    Nominate {
        #[arg(long)]
        candidate: Address,
    },
    Withdraw {
        #[arg(long)]
        candidate: Address,
    },
    /// Record a voter's snapshot balance as local vote power.
    PrepareBallot {
        #[arg(long)]
        provider: Address,
        #[arg(long)]
        voter: Address,
    },
    /// Print a voter's power, in one precinct or across all.
    VotingPower {
        #[arg(long)]
        voter: Address,
        #[arg(long)]
        election: Option<u64>,
        #[arg(long)]
        precinct: Option<u64>,
    },
    /// Cast a vote: --vote <candidate>=<amount>, repeated.
    Cast {
        #[arg(long)]
        voter: Address,
        #[arg(long = "vote", value_parser = parse_vote, required = true)]
        votes: Vec<(Address, u128)>,
    },
    Evaluate,
    Resolve,
    EmitNomination {
        #[arg(long)]
        candidate: Address,
        #[arg(long)]
        destination: u64,
    },
    EmitBallot {
        #[arg(long)]
        voter: Address,
        #[arg(long)]
        destination: u64,
    },
    EmitTally {
        #[arg(long)]
        destination: u64,
    },
    /// Apply a JSON envelope delivered by the transport.
    Receive { file: PathBuf },
    /// Print outbound envelopes after a sequence number as JSON lines.
    Outbox {
        #[arg(long, default_value_t = 0)]
        after: u64,
    },
    /// Follow the outbox until interrupted.
    Watch {
        #[arg(long, default_value_t = 0)]
        after: u64,
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

fn parse_vote(s: &str) -> Result<(Address, u128), String> {
    let (candidate, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <candidate>=<amount>, got {s}"))?;
    let candidate = candidate.parse::<Address>().map_err(|e| e.to_string())?;
    let amount = amount.parse::<u128>().map_err(|e| e.to_string())?;
    Ok((candidate, amount))
}

fn load_config(cli: &Cli) -> anyhow::Result<(NodeConfig, PathBuf)> {
    let (file_config, base_dir) = match &cli.config {
        Some(path) => {
            let config = NodeConfig::from_toml_file(path)?;
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (config, base)
        }
        None => (NodeConfig::default(), PathBuf::from(".")),
    };
    let config = NodeConfig {
        data_dir: cli.data_dir.clone().unwrap_or(file_config.data_dir.clone()),
        chain_id: cli.chain_id.unwrap_or(file_config.chain_id),
        log_level: cli
            .log_level
            .clone()
            .unwrap_or(file_config.log_level.clone()),
        log_format: if cli.log_json {
            LogFormat::Json
        } else {
            file_config.log_format
        },
        ..file_config
    };
    Ok((config, base_dir))
}

fn write_guardian_seed(out: &Path) -> anyhow::Result<()> {
    if out.exists() {
        anyhow::bail!("{} already exists", out.display());
    }
    let (seed, keypair) = council_crypto::generate_keypair();
    std::fs::write(out, hex::encode(seed))
        .with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), "guardian seed written");
    println!("{}", keypair.public);
    Ok(())
}

fn print_schedule(schedule: &EpochSchedule, now: Timestamp) {
    println!("  nomination: {} ({})", schedule.nomination_start, format_countdown(now, schedule.nomination_start));
    println!("  voting:     {} ({})", schedule.voting_start, format_countdown(now, schedule.voting_start));
    println!("  evaluation: {} ({})", schedule.evaluation_start, format_countdown(now, schedule.evaluation_start));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, base_dir) = load_config(&cli)?;
    council_utils::init_logging(config.log_format, &config.log_level);

    // Key generation needs no database.
    if let Command::Keygen { out } = &cli.command {
        return write_guardian_seed(out);
    }

    let poll_interval = config.outbox_poll_interval_secs;
    let node = GovernanceNode::open(config, &base_dir).context("failed to open node")?;
    let engine = node.engine();

    match cli.command {
        Command::Keygen { out } => write_guardian_seed(&out)?,
        Command::Init => {
            let schedule = node.initialize()?;
            println!("council initialized");
            print_schedule(&schedule, engine.now());
        }
        Command::Status => {
            let status = node.status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            print_schedule(&status.schedule, status.now);
            for (name, value) in engine.stats().snapshot() {
                tracing::debug!(name, value, "stat");
            }
        }
        Command::SetSchedule {
            caller,
            nomination,
            voting,
            evaluation,
        } => {
            let current = engine.get_epoch_schedule()?;
            engine.set_epoch_schedule(
                &caller,
                EpochSchedule {
                    administration_start: current.administration_start,
                    nomination_start: Timestamp::new(nomination),
                    voting_start: Timestamp::new(voting),
                    evaluation_start: Timestamp::new(evaluation),
                },
            )?;
            println!("schedule updated");
        }
        Command::SetProvider {
            caller,
            provider,
            disable,
        } => {
            engine.set_snapshot_contract(&caller, provider, !disable)?;
            println!("{provider} enabled: {}", !disable);
        }
        Command::SetGuardians { caller } => {
            let count = node.install_guardian_sets(&caller)?;
            println!("{count} guardian sets installed");
        }
        Command::TransferAdmin { caller, to } => {
            engine.transfer_administration(&caller, to)?;
            println!("administrator is now {to}");
        }
        Command::Snapshot { provider } => {
            let id = engine.take_vote_power_snapshot(&provider)?;
            println!("snapshot {id}");
        }
        Command::SnapshotId { provider, election } => {
            let election = match election {
                Some(id) => ElectionId(id),
                None => engine.current_election_id()?,
            };
            println!("{}", engine.get_vote_power_snapshot_id(&provider, election)?);
        }
        Command::Nominate { candidate } => {
            engine.nominate(&candidate)?;
            println!("{candidate} nominated");
        }
        Command::Withdraw { candidate } => {
            engine.withdraw_nomination(&candidate)?;
            println!("{candidate} withdrawn");
        }
        Command::PrepareBallot { provider, voter } => {
            let power = engine.prepare_ballot_with_snapshot(&provider, &voter)?;
            println!("{voter} voting power from {provider}: {power}");
        }
        Command::VotingPower {
            voter,
            election,
            precinct,
        } => {
            let election = match election {
                Some(id) => ElectionId(id),
                None => engine.current_election_id()?,
            };
            let power = match precinct {
                Some(chain) => engine.ballot_voting_power(election, &voter, ChainId(chain))?,
                None => engine.total_voting_power(election, &voter)?,
            };
            println!("{power}");
        }
        Command::Cast { voter, votes } => {
            let (candidates, amounts): (Vec<Address>, Vec<u128>) = votes.into_iter().unzip();
            engine.cast_vote(&voter, &candidates, &amounts)?;
            println!("vote cast for {} candidates", candidates.len());
        }
        Command::Evaluate => {
            let winners = engine.evaluate()?;
            println!("winners:");
            for winner in winners {
                println!("  {winner}");
            }
        }
        Command::Resolve => {
            let next = engine.resolve()?;
            println!("epoch resolved, election {next} scheduled");
            print_schedule(&engine.get_epoch_schedule()?, engine.now());
        }
        Command::EmitNomination {
            candidate,
            destination,
        } => {
            let record = engine.emit_nomination(&candidate, ChainId(destination))?;
            println!("emitted #{} {}", record.sequence, record.hash);
        }
        Command::EmitBallot { voter, destination } => {
            let record = engine.emit_ballot(&voter, ChainId(destination))?;
            println!("emitted #{} {}", record.sequence, record.hash);
        }
        Command::EmitTally { destination } => {
            let record = engine.emit_tally(ChainId(destination))?;
            println!("emitted #{} {}", record.sequence, record.hash);
        }
        Command::Receive { file } => {
            let hash = node
                .receive_file(&file)
                .with_context(|| format!("rejected {}", file.display()))?;
            println!("applied {hash}");
        }
        Command::Outbox { after } => {
            for envelope in node.signed_outbox(after)? {
                println!("{}", envelope.to_json()?);
            }
        }
        Command::Watch {
            after,
            interval_secs,
        } => {
            let interval = Duration::from_secs(interval_secs.unwrap_or(poll_interval).max(1));
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "failed to listen for ctrl-c");
                }
            };
            let mut failed = None;
            let last = council_node::watch_outbox(&node, interval, after, shutdown, |envelope| {
                match envelope.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => failed = Some(e),
                }
            })
            .await?;
            if let Some(e) = failed {
                return Err(e.into());
            }
            tracing::info!(last, "stopped watching");
        }
    }
    Ok(())
}
