//! Command line entrypoint for the supply monitor.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};

use tetherwatch::config::{generate_commented_config_template, Config, CONFIG_FILE_NAME};
use tetherwatch::engine::SupplyEngine;
use tetherwatch::market_data::CoinGeckoSource;
use tetherwatch::notify::{SlackNotifier, StdoutNotifier};
use tetherwatch::period::Period;
use tetherwatch::persistence::SnapshotStore;
use tetherwatch::report::format;
use tetherwatch::utils::init_logging;
use tetherwatch::MonitorJob;

#[derive(Debug, Parser)]
#[command(name = "tetherwatch", author, version, about = "Stablecoin supply monitor", long_about = None)]
struct Args {
    /// Path to the configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the default configuration to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Log level when TETHERWATCH_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch market data, update the snapshot and send the report
    Run {
        /// Print the report instead of posting it to Slack
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the stored snapshot and its ranking without fetching anything
    Show,
    /// Write a commented configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
        /// Write the bare default configuration without comments
        #[arg(long)]
        plain: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.print_default_config {
        println!("{}", Config::default_toml());
        return Ok(());
    }

    match args.command {
        | Some(Command::Init { force, plain }) => {
            let path = args.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            init_config(&path, force, plain)
        }
        | Some(Command::Completions { shell }) => {
            clap_complete::generate(shell, &mut Args::command(), "tetherwatch", &mut std::io::stdout());
            Ok(())
        }
        | Some(Command::Show) => {
            let config = load_config(args.config.as_deref())?;
            show(&config)
        }
        | Some(Command::Run { dry_run }) => {
            let config = load_config(args.config.as_deref())?;
            run(config, dry_run).await
        }
        | None => {
            let config = load_config(args.config.as_deref())?;
            run(config, false).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        | Some(p) => Config::from_file(p).with_context(|| format!("loading {}", p.display()))?,
        | None => Config::load().context("loading configuration")?,
    };
    config.validate()?;
    Ok(config)
}

fn init_config(path: &Path, force: bool, plain: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Config file {} exists. Use --force to overwrite.", path.display());
    }
    if plain {
        Config::default().save(path)?;
    } else {
        generate_commented_config_template(path)?;
    }
    println!("Wrote configuration to {}", path.display());
    Ok(())
}

async fn run(config: Config, dry_run: bool) -> Result<()> {
    let source = CoinGeckoSource::from_config(&config)?;
    let outcome = if dry_run {
        let job = MonitorJob::new(config, source, StdoutNotifier)?;
        job.run(Utc::now()).await?
    } else {
        let timeout = std::time::Duration::from_secs(config.market.timeout_seconds);
        let notifier = SlackNotifier::new(&config.notify, timeout)?;
        let job = MonitorJob::new(config, source, notifier)?;
        job.run(Utc::now()).await?
    };
    if !outcome.notified {
        log::warn!("Report for {} was not delivered", outcome.period);
    }
    Ok(())
}

fn show(config: &Config) -> Result<()> {
    let tz = config.timezone()?;
    let now = Period::containing(Utc::now().with_timezone(&tz).date_naive());
    let store = SnapshotStore::new(config.snapshot_path());
    let snapshot = store.load();
    let engine = SupplyEngine::new(config.snapshot.persist_policy, config.snapshot.retain_periods);

    println!("Snapshot: {}", store.path().display());
    for (period, supply) in snapshot.iter() {
        println!("  {}  {}", period.key(), format::grouped(supply, config.report.supply_decimals));
    }

    // Without a fresh observation the open period is measured against its own start.
    let observed = snapshot
        .get(&now)
        .or_else(|| snapshot.latest().and_then(|p| snapshot.get(&p)))
        .unwrap_or(0.0);
    let record = engine.generation(&snapshot, now, observed);
    println!("Generated per period:");
    for entry in record.entries() {
        match entry.amount {
            | Some(amount) => println!("  {}: {}", entry.period, format::abbreviated(amount, 2)),
            | None => println!("  {}: no data", entry.period),
        }
    }
    println!("Ranking:");
    for row in engine.rank(&record) {
        println!("  {}. {}: {}", row.rank, row.period, format::abbreviated(row.amount, 2));
    }
    Ok(())
}
