//! init-config – write a commented `tetherwatch.toml`
use anyhow::Result;
use clap::Parser;
use std::{fs, path::PathBuf};

use tetherwatch::config::{generate_commented_config_template, CONFIG_FILE_NAME};

#[derive(Parser, Debug)]
#[command(
    name    = "init-config",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Write a default `tetherwatch.toml`"
)]
struct Args {
    /// Output path (default: ./tetherwatch.toml)
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Overwrite if the file already exists
    #[arg(short, long)]
    force: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.config.exists() && !args.force {
        eprintln!("Config file {} exists. Use --force to overwrite.", args.config.display());
        std::process::exit(1);
    }

    if let Some(parent) = args.config.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    generate_commented_config_template(&args.config)?;
    println!("Wrote default configuration to {}", args.config.display());
    Ok(())
}
