use std::{
  io::Write,
  path::PathBuf,
  time::{Duration, Instant},
};

use async_channel::TryRecvError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use turborand::rng::Rng;

use crate::{
  DEFAULT_TICK_RATE_TPS, IdSequence,
  allocator::RunwayAllocator,
  config::SimConfig,
  entities::{
    aircraft::{AircraftId, FlightCategory},
    avn::{Avn, AvnId},
    runway::RunwayId,
    world::World,
  },
  generator::FlightGenerator,
};

/// The once-per-violation outbound event consumed by the notice ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeCreated {
  pub id: AvnId,
  pub airline: String,
  pub flight_number: String,
  pub category: FlightCategory,
  pub recorded_speed: f32,
  pub min_speed: f32,
  pub max_speed: f32,
}

impl From<&Avn> for NoticeCreated {
  fn from(avn: &Avn) -> Self {
    Self {
      id: avn.id,
      airline: avn.airline.to_string(),
      flight_number: avn.flight_number.to_string(),
      category: avn.category,
      recorded_speed: avn.recorded_speed,
      min_speed: avn.permissible.min,
      max_speed: avn.permissible.max,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayStatus {
  pub id: RunwayId,
  pub occupant: Option<AircraftId>,
}

/// Per-tick summary for display consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
  pub tick: u64,
  pub active: usize,
  pub completed: usize,
  pub runways: Vec<RunwayStatus>,
  pub unpaid_notices: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type", content = "value")]
pub enum OutgoingReply {
  NoticeCreated(NoticeCreated),
  Status(StatusSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type", content = "value")]
pub enum IncomingUpdate {
  PaymentStatus { notice_id: AvnId, paid: bool },
  Stop,
}

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("notice #{0} not found")]
  NoticeNotFound(AvnId),
}

/// The scheduling core. One `tick` is the atomic unit of work: advance the
/// clock, spawn due flights, run runway assignment, advance every active
/// aircraft, forward any violations, release runways past their checkpoint,
/// and retire completed flights.
#[derive(Debug)]
pub struct Engine {
  pub world: World,
  pub allocator: RunwayAllocator,
  pub generator: FlightGenerator,
  pub config: SimConfig,
  pub rng: Rng,

  pub receiver: async_channel::Receiver<IncomingUpdate>,
  pub sender: async_broadcast::Sender<OutgoingReply>,

  pub save_to: Option<PathBuf>,

  notice_ids: IdSequence,
  clock: u64,
  last_tick: Instant,
  rate: usize,
}

impl Engine {
  pub fn new(
    config: SimConfig,
    rng: Rng,
    receiver: async_channel::Receiver<IncomingUpdate>,
    sender: async_broadcast::Sender<OutgoingReply>,
    save_to: Option<PathBuf>,
  ) -> Self {
    Self {
      world: World::default(),
      allocator: RunwayAllocator::default(),
      generator: FlightGenerator::new(&config),
      config,
      rng,

      receiver,
      sender,

      save_to,

      notice_ids: IdSequence::default(),
      clock: 0,
      last_tick: Instant::now(),
      rate: DEFAULT_TICK_RATE_TPS,
    }
  }

  pub fn with_rate(mut self, rate: usize) -> Self {
    self.rate = rate.max(1);
    self
  }

  pub fn clock(&self) -> u64 {
    self.clock
  }

  /// Runs ticks at the configured rate until stopped, the inbound channel
  /// closes, or `run_for` ticks have elapsed. Commands are drained at tick
  /// boundaries only; a tick is never interrupted.
  pub fn begin_loop(&mut self, run_for: Option<u64>) {
    'main_loop: loop {
      if Instant::now() - self.last_tick
        >= Duration::from_secs_f32(1.0 / self.rate as f32)
      {
        self.last_tick = Instant::now();

        loop {
          let incoming = match self.receiver.try_recv() {
            Ok(incoming) => incoming,
            Err(TryRecvError::Closed) => break 'main_loop,
            Err(TryRecvError::Empty) => break,
          };

          match incoming {
            IncomingUpdate::PaymentStatus { notice_id, paid } => {
              if let Err(err) = self.apply_payment_update(notice_id, paid) {
                warn!("ignoring payment update: {err}");
              }
            }
            IncomingUpdate::Stop => {
              info!("stop requested; halting at tick {}", self.clock);
              break 'main_loop;
            }
          }
        }

        self.tick();
        self.save_world();

        if run_for.is_some_and(|ticks| self.clock >= ticks) {
          info!("simulation complete after {} ticks", self.clock);
          break;
        }
      }
    }
  }

  pub fn tick(&mut self) {
    self.clock += 1;

    let spawned = self.generator.generate(
      self.clock,
      &mut self.world.airlines,
      &mut self.rng,
      &self.config,
    );
    for aircraft in spawned {
      self.allocator.enqueue(&aircraft);
      self.world.active.push(aircraft);
    }

    self.allocator.assign(&mut self.world.active, self.clock);

    let mut notices: Vec<Avn> = Vec::new();
    for aircraft in self.world.active.iter_mut() {
      aircraft.advance(&mut self.rng, &self.config, &mut self.notice_ids);
      if let Some(avn) = aircraft.take_open_violation() {
        notices.push(avn);
      }
    }

    for avn in notices {
      self.world.airlines.record_violation(avn.clone());
      self.forward_notice(&avn);
      self.world.notices.push(avn);
    }

    self.allocator.release_finished(&mut self.world.active, self.clock);
    self.retire_completed();
    self.broadcast_status();
  }

  /// Applies a payment-status update from the ledger boundary.
  pub fn apply_payment_update(
    &mut self,
    notice_id: AvnId,
    paid: bool,
  ) -> Result<(), EngineError> {
    if self.world.set_payment_status(notice_id, paid) {
      info!(
        "notice #{} marked {}",
        notice_id,
        if paid { "paid" } else { "unpaid" }
      );
      Ok(())
    } else {
      Err(EngineError::NoticeNotFound(notice_id))
    }
  }

  /// Violation forwarding must never take the scheduler down: a full or
  /// closed channel is logged and the tick carries on.
  fn forward_notice(&self, avn: &Avn) {
    let _ = self
      .sender
      .try_broadcast(OutgoingReply::NoticeCreated(avn.into()))
      .inspect_err(|e| warn!("failed to forward notice #{}: {}", avn.id, e));
  }

  fn broadcast_status(&self) {
    let runways = self
      .allocator
      .runways()
      .iter()
      .map(|r| RunwayStatus {
        id: r.id,
        occupant: r.occupant,
      })
      .collect();

    let snapshot = StatusSnapshot {
      tick: self.clock,
      active: self.world.active.len(),
      completed: self.world.completed.len(),
      runways,
      unpaid_notices: self.world.unpaid_notices(),
    };

    let _ = self
      .sender
      .try_broadcast(OutgoingReply::Status(snapshot))
      .inspect_err(|e| warn!("failed to broadcast status: {}", e));
  }

  fn retire_completed(&mut self) {
    let mut index = 0;
    while index < self.world.active.len() {
      if self.world.active[index].is_completed() {
        let aircraft = self.world.active.swap_remove(index);
        info!(
          "flight completed: {} ({})",
          aircraft.flight_number, aircraft.airline
        );
        self.world.airlines.record_retired(aircraft.airline);
        self.world.completed.push(aircraft);
      } else {
        index += 1;
      }
    }
  }

  fn save_world(&self) {
    if let Some(path) = &self.save_to {
      match serde_json::ser::to_string(&self.world) {
        Ok(string) => {
          if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
          }
          let written = std::fs::File::create(path)
            .and_then(|mut file| file.write_all(string.as_bytes()));
          if let Err(e) = written {
            error!("failed to save world: {}", e);
          }
        }
        Err(e) => {
          error!("failed to serialize world: {}", e);
        }
      }
    }
  }
}
