use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use turborand::SeededCore;
use turborand::rng::Rng;

use engine::engine::{Engine, IncomingUpdate, OutgoingReply};

use crate::{config::Config, ledger::Ledger};

mod config;
mod ledger;

#[derive(Parser)]
#[command(name = "aircontrol")]
struct Cli {
  /// TOML config overlaying the built-in simulation defaults.
  #[arg(short, long)]
  config: Option<PathBuf>,
  /// RNG seed for a reproducible run.
  #[arg(long)]
  seed: Option<u64>,
  /// Simulation ticks per second of wall time.
  #[arg(long)]
  rate: Option<usize>,
  /// Total ticks to simulate before exiting.
  #[arg(long)]
  duration: Option<u64>,
  /// Write a JSON snapshot of the world state every tick.
  #[arg(long)]
  save_to: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt::init();

  let cli = Cli::parse();

  let config = match &cli.config {
    Some(path) => match Config::from_path(path) {
      Ok(config) => config,
      Err(e) => {
        tracing::error!("{e}");
        std::process::exit(1);
      }
    },
    None => Config::default(),
  };

  let seed = cli.seed.or(config.seed);
  let rate = cli
    .rate
    .or(config.rate)
    .unwrap_or(engine::DEFAULT_TICK_RATE_TPS);
  let duration = cli.duration.or(config.duration).unwrap_or(300);
  let save_to = cli.save_to.or(config.save_to.clone());
  let sim_config = config.sim_config();

  let rng = match seed {
    Some(seed) => Rng::with_seed(seed),
    None => Rng::new(),
  };

  let (command_tx, command_rx) = async_channel::unbounded::<IncomingUpdate>();
  let (mut event_tx, event_rx) =
    async_broadcast::broadcast::<OutgoingReply>(512);
  // Slow consumers lose old events rather than stalling the core.
  event_tx.set_overflow(true);

  let mut sim =
    Engine::new(sim_config, rng, command_rx, event_tx, save_to).with_rate(rate);
  let engine_handle = tokio::task::spawn_blocking(move || {
    sim.begin_loop(Some(duration));
  });

  let ledger = Ledger::new(sim_config.fines, command_tx.clone());
  let ledger_handle = tokio::spawn(ledger.run(event_rx.clone()));

  let mut status_rx = event_rx;
  let status_handle = tokio::spawn(async move {
    loop {
      match status_rx.recv().await {
        Ok(OutgoingReply::Status(status)) if status.tick % 30 == 0 => {
          info!(
            "tick {}: {} active, {} completed, {} unpaid notices",
            status.tick, status.active, status.completed, status.unpaid_notices
          );
        }
        Ok(_) | Err(async_broadcast::RecvError::Overflowed(_)) => {}
        Err(async_broadcast::RecvError::Closed) => break,
      }
    }
  });

  let stop_tx = command_tx.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("interrupt received; stopping at the next tick boundary");
      let _ = stop_tx.send(IncomingUpdate::Stop).await;
    }
  });

  tokio::select! {
    _ = engine_handle => info!("engine exit"),
    _ = ledger_handle => info!("ledger exit"),
    _ = status_handle => info!("status exit"),
  };
}
