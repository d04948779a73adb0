//! Entry point: parses the CLI flags (spec §6), accepts seats over TCP, and
//! drives a match on a dedicated blocking thread while the engine's
//! REQUEST_PLAYER_ACTION/PLAYER_ACTION round-trip happens over async I/O.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc as sync_mpsc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use holdem_engine::{BlindSchedule, MatchController, DEFAULT_STARTING_STACK};

use holdem_dealer::arbiter::Arbiter;
use holdem_dealer::config::{Cli, Config};
use holdem_dealer::connection::accept_seats;

fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::new(if cfg.debug { "debug" } else { "info" });
    match &cfg.log_file {
        Some(path) => {
            let file = fs::File::create(path).expect("failed to create --log-file");
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(move || file.try_clone().expect("clone log file handle"))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

fn status_path(cfg: &Config) -> PathBuf {
    let name = if cfg.sim { "sim_result.log" } else { "game_result.log" };
    cfg.output_dir.join(name)
}

fn write_status(path: &Path, text: &str) {
    if let Err(error) = fs::write(path, text) {
        tracing::warn!(?path, %error, "failed to write status file");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config: Config = match cli.try_into() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("invalid configuration: {error}");
            std::process::exit(2);
        }
    };

    init_tracing(&config);
    fs::create_dir_all(&config.output_dir)?;
    let status_path = status_path(&config);
    write_status(&status_path, "RUNNING\n");

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%addr, %error, "failed to bind");
            write_status(&status_path, "DONE\n");
            return Err(error.into());
        }
    };
    tracing::info!(%addr, players = config.players, "listening for seats");

    let (inbound_tx, inbound_rx) = sync_mpsc::channel();
    let seats = accept_seats(&listener, config.players, inbound_tx).await?;
    tracing::info!(count = seats.len(), "all seats connected, starting match");

    let seat_ids: Vec<_> = seats.keys().copied().collect();
    let blind_schedule = BlindSchedule {
        base_big_blind: config.blind,
        multiplier: config.blind_multiplier,
        interval_hands: config.blind_increase_interval,
    };
    let hand_cap = if config.sim { Some(config.sim_rounds) } else { Some(1) };
    let turn_timeout = Duration::from_secs(config.timeout);
    let output_dir = config.output_dir.clone();

    let join_result = tokio::task::spawn_blocking(move || {
        let seats = seats;
        let inbound_rx = inbound_rx;
        let mut controller = MatchController::new(&seat_ids, DEFAULT_STARTING_STACK, blind_schedule, hand_cap);
        let mut arbiter = Arbiter::new(&seats, &inbound_rx, turn_timeout);

        while !controller.is_terminated() {
            match controller.play_next_hand(&mut arbiter) {
                Ok(log) => {
                    arbiter.announce_hand_end(&log);
                    let path = output_dir.join(format!("game_log_{}.json", log.hand_index));
                    match serde_json::to_string_pretty(&log) {
                        Ok(text) => {
                            if let Err(error) = fs::write(&path, text) {
                                tracing::warn!(?path, %error, "failed to write hand log");
                            }
                        }
                        Err(error) => tracing::warn!(%error, "failed to serialize hand log"),
                    }
                    if let Some(diagnostic) = log.fatal {
                        tracing::error!(%diagnostic, "hand aborted on a class-4 engine invariant violation");
                        return Err(diagnostic);
                    }
                }
                Err(error) if error.is_fatal() => {
                    tracing::error!(%error, "hand aborted on a class-4 engine invariant violation");
                    return Err(error.to_string());
                }
                Err(error) => {
                    tracing::info!(%error, "match ended normally");
                    break;
                }
            }
        }
        Ok(controller.summary())
    })
    .await;

    write_status(&status_path, "DONE\n");

    match join_result {
        Ok(Ok(summary)) => {
            tracing::info!(hands_played = summary.hands_played, "match complete");
            Ok(())
        }
        Ok(Err(diagnostic)) => {
            eprintln!("fatal engine invariant violation: {diagnostic}");
            std::process::exit(1);
        }
        Err(join_error) => {
            tracing::error!(%join_error, "match thread panicked");
            Err(anyhow::anyhow!("match thread panicked: {join_error}"))
        }
    }
}
