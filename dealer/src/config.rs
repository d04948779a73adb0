//! CLI surface (spec §6): exactly the flags the spec's table names, parsed
//! with `clap`'s derive macro and validated into a `Config`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "holdem-dealer", about = "No-Limit Hold'em tournament dealer server")]
pub struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    #[arg(long, default_value_t = 2)]
    pub players: usize,

    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    #[arg(long, default_value_t = 10)]
    pub blind: u64,

    #[arg(long = "blind-multiplier", default_value_t = 1.0)]
    pub blind_multiplier: f64,

    #[arg(long = "blind-increase-interval", default_value_t = 0)]
    pub blind_increase_interval: u64,

    #[arg(long)]
    pub sim: bool,

    #[arg(long = "sim-rounds", default_value_t = 6)]
    pub sim_rounds: u64,

    #[arg(long)]
    pub debug: bool,

    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Directory for per-hand structured logs and the status file. Not in
    /// spec.md's CLI table (which only names `--log-file` for the
    /// tracing/diagnostic log); kept as a separate flag with a sane default
    /// so the two log streams (operational vs. structured-per-hand) don't
    /// collide on one path.
    #[arg(long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub players: usize,
    pub timeout_secs: u64,
    pub blind: u64,
    pub blind_multiplier: f64,
    pub blind_increase_interval: u64,
    pub sim: bool,
    pub sim_rounds: u64,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub output_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("--players must be at least 2, got {0}")]
    TooFewPlayers(usize),
    #[error("--blind-multiplier must be positive, got {0}")]
    NonPositiveMultiplier(f64),
    #[error("--blind must be at least 2 so the small blind is non-zero, got {0}")]
    BlindTooSmall(u64),
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.players < 2 {
            return Err(ConfigError::TooFewPlayers(cli.players));
        }
        if cli.blind_multiplier <= 0.0 {
            return Err(ConfigError::NonPositiveMultiplier(cli.blind_multiplier));
        }
        if cli.blind < 2 {
            return Err(ConfigError::BlindTooSmall(cli.blind));
        }
        Ok(Config {
            host: cli.host,
            port: cli.port,
            players: cli.players,
            timeout_secs: cli.timeout,
            blind: cli.blind,
            blind_multiplier: cli.blind_multiplier,
            blind_increase_interval: cli.blind_increase_interval,
            sim: cli.sim,
            sim_rounds: cli.sim_rounds,
            debug: cli.debug,
            log_file: cli.log_file,
            output_dir: cli.output_dir,
        })
    }
}
