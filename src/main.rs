//! secache - memoized secure element queries
//!
//! CLI entry point that dispatches to subcommands.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::Diagnostic;
use secache::cli::{Cli, Commands};
use secache::{ls, rm, Cache, Device, Oracle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.help() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> secache::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log_filter()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let base = cli.cache_dir.clone().unwrap_or_else(std::env::temp_dir);
    let cache = Cache::for_current_user(base);
    debug!("Using cache directory {}", cache.root().display());

    let connect = || oracle(&cli.device, cli.oracle.as_ref(), &cache);
    let output = match cli.command {
        Commands::ClearCache => {
            rm::all(&cache)?;
            return Ok(());
        }
        Commands::Ls(args) => {
            let entries = ls::all(&cache)?;
            if args.json {
                serde_json::to_string_pretty(&entries)?
            } else {
                entries
                    .iter()
                    .map(|e| {
                        let state = if e.valid { "ok" } else { "invalid" };
                        format!("{}\t{}\t{}", e.key, e.size, state)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Commands::Verify => {
            let report = ls::verify(&cache)?;
            format!(
                "checked {} entries, removed {}",
                report.checked, report.removed
            )
        }
        Commands::Serial => connect()?.serial_number()?,
        Commands::Mac => connect()?.mac_address()?,
        Commands::SignHash(args) => connect()?.sign_hash(&args.hash)?,
        Commands::SignFile(args) => connect()?.sign_file(&args.path)?,
    };

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn oracle<'a>(
    device: &str,
    program: Option<&PathBuf>,
    cache: &'a Cache,
) -> secache::Result<Oracle<'a>> {
    let oracle = Oracle::new(Device::classify(device)?, cache);
    Ok(match program {
        Some(program) => oracle.program(program),
        None => oracle,
    })
}
