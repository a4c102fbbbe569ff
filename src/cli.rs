//! CLI argument definitions using clap derive

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};

/// secache - memoized secure element queries
///
/// Answers from the secure element are cached per user and verified on
/// every read, so each distinct question only reaches the hardware once.
#[derive(Parser, Debug)]
#[command(name = "secache")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Device model of the attached secure element
    #[arg(short, long, global = true, env = "SECACHE_DEVICE", default_value = "atecc608")]
    pub device: String,

    /// Program used to talk to the device, instead of the model's default
    #[arg(long, global = true, env = "SECACHE_ORACLE")]
    pub oracle: Option<PathBuf>,

    /// Directory that holds per-user cache directories
    #[arg(long, global = true, env = "SECACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Emit internal trace messages on stderr
    #[arg(long, global = true, env = "SECACHE_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the device serial number
    Serial,

    /// Print the device MAC address
    Mac,

    /// Sign a hex-encoded digest
    SignHash(SignHashArgs),

    /// Sign the contents of a file
    SignFile(SignFileArgs),

    /// Remove every cached answer
    ClearCache,

    /// List cached entries
    Ls(LsArgs),

    /// Check every cached entry and drop the broken ones
    Verify,
}

/// Arguments for the sign-hash command
#[derive(Parser, Debug)]
pub struct SignHashArgs {
    /// Digest to sign, as hexadecimal
    pub hash: String,
}

/// Arguments for the sign-file command
#[derive(Parser, Debug)]
pub struct SignFileArgs {
    /// File whose contents should be signed
    pub path: PathBuf,
}

/// Arguments for the ls command
#[derive(Parser, Debug)]
pub struct LsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Tracing filter directive for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.debug || self.verbose >= 2 {
            "secache=debug"
        } else if self.verbose == 1 {
            "secache=info"
        } else {
            "secache=warn"
        }
    }
}
