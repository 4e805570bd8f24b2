use core::fmt;

use internment::Intern;
use serde::{Deserialize, Serialize};
use turborand::{TurboRand, rng::Rng};

use crate::{
  IdSequence,
  config::{SimConfig, SpeedBand},
  entities::{avn::Avn, runway::RunwayId},
  violation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  North,
  South,
  East,
  West,
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Direction::North => write!(f, "North"),
      Direction::South => write!(f, "South"),
      Direction::East => write!(f, "East"),
      Direction::West => write!(f, "West"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightCategory {
  Commercial,
  Cargo,
  Emergency,
}

impl FlightCategory {
  pub fn priority(&self) -> u8 {
    match self {
      FlightCategory::Emergency => 3,
      FlightCategory::Cargo => 2,
      FlightCategory::Commercial => 1,
    }
  }
}

impl fmt::Display for FlightCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FlightCategory::Commercial => write!(f, "Commercial"),
      FlightCategory::Cargo => write!(f, "Cargo"),
      FlightCategory::Emergency => write!(f, "Emergency"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrivalPhase {
  Holding,
  Approach,
  Landing,
  Taxi,
  AtGate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeparturePhase {
  AtGate,
  Taxi,
  TakeoffRoll,
  Climb,
  Cruise,
}

/// The closed set of flight phases. Arrivals and departures share one
/// envelope struct; behavior is dispatched with exhaustive matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type", content = "value")]
pub enum FlightPhase {
  Arrival(ArrivalPhase),
  Departure(DeparturePhase),
}

impl FlightPhase {
  /// Terminal phases retire the aircraft at the end of the tick.
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      FlightPhase::Arrival(ArrivalPhase::AtGate)
        | FlightPhase::Departure(DeparturePhase::Cruise)
    )
  }

  /// Phases past the runway: an arrival is done with its runway once it is
  /// taxiing in, a departure once it is climbing out.
  pub fn releases_runway(&self) -> bool {
    matches!(
      self,
      FlightPhase::Arrival(ArrivalPhase::Taxi)
        | FlightPhase::Arrival(ArrivalPhase::AtGate)
        | FlightPhase::Departure(DeparturePhase::Climb)
        | FlightPhase::Departure(DeparturePhase::Cruise)
    )
  }
}

impl fmt::Display for FlightPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FlightPhase::Arrival(ArrivalPhase::Holding) => "Holding",
      FlightPhase::Arrival(ArrivalPhase::Approach) => "Approach",
      FlightPhase::Arrival(ArrivalPhase::Landing) => "Landing",
      FlightPhase::Arrival(ArrivalPhase::Taxi) => "Taxi",
      FlightPhase::Arrival(ArrivalPhase::AtGate) => "At Gate",
      FlightPhase::Departure(DeparturePhase::AtGate) => "At Gate",
      FlightPhase::Departure(DeparturePhase::Taxi) => "Taxi",
      FlightPhase::Departure(DeparturePhase::TakeoffRoll) => "Takeoff Roll",
      FlightPhase::Departure(DeparturePhase::Climb) => "Climb",
      FlightPhase::Departure(DeparturePhase::Cruise) => "Cruise",
    };

    write!(f, "{name}")
  }
}

pub type AircraftId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
  pub id: AircraftId,
  pub flight_number: Intern<String>,
  pub airline: Intern<String>,
  pub category: FlightCategory,
  pub direction: Direction,
  pub priority: u8,
  pub scheduled_at: u64,

  pub phase: FlightPhase,
  pub ticks_in_phase: u32,
  pub speed: f32,

  pub runway: Option<RunwayId>,

  /// Once an overspeed is injected it is re-asserted every tick until the
  /// phase changes.
  pub pinned_speed: Option<f32>,
  /// Phases that have already produced a notice; a phase is billed at most
  /// once over the aircraft's lifetime.
  pub violated_phases: Vec<FlightPhase>,
  pub open_violation: Option<Avn>,
}

impl Aircraft {
  pub fn arrival(
    id: AircraftId,
    flight_number: Intern<String>,
    airline: Intern<String>,
    category: FlightCategory,
    direction: Direction,
    scheduled_at: u64,
    rng: &mut Rng,
    config: &SimConfig,
  ) -> Self {
    Self {
      id,
      flight_number,
      airline,
      category,
      direction,
      priority: category.priority(),
      scheduled_at,

      phase: FlightPhase::Arrival(ArrivalPhase::Holding),
      ticks_in_phase: 0,
      speed: sample_band(rng, config.speeds.holding),

      runway: None,

      pinned_speed: None,
      violated_phases: Vec::new(),
      open_violation: None,
    }
  }

  pub fn departure(
    id: AircraftId,
    flight_number: Intern<String>,
    airline: Intern<String>,
    category: FlightCategory,
    direction: Direction,
    scheduled_at: u64,
  ) -> Self {
    Self {
      id,
      flight_number,
      airline,
      category,
      direction,
      priority: category.priority(),
      scheduled_at,

      phase: FlightPhase::Departure(DeparturePhase::AtGate),
      ticks_in_phase: 0,
      speed: 0.0,

      runway: None,

      pinned_speed: None,
      violated_phases: Vec::new(),
      open_violation: None,
    }
  }

  pub fn is_completed(&self) -> bool {
    self.phase.is_terminal()
  }

  pub fn take_open_violation(&mut self) -> Option<Avn> {
    self.open_violation.take()
  }

  /// Advances the state machine one tick: dwell-gated phase transitions,
  /// the per-phase speed rule, stochastic overspeed injection, and the
  /// violation check.
  pub fn advance(
    &mut self,
    rng: &mut Rng,
    config: &SimConfig,
    notice_ids: &mut IdSequence,
  ) {
    self.ticks_in_phase += 1;
    let previous = self.phase;

    match self.phase {
      FlightPhase::Arrival(phase) => {
        self.advance_arrival(phase, rng, config);
      }
      FlightPhase::Departure(phase) => {
        self.advance_departure(phase, rng, config);
      }
    }

    if self.phase != previous {
      self.ticks_in_phase = 0;
      self.pinned_speed = None;
    }

    if let Some(pinned) = self.pinned_speed {
      self.speed = pinned;
    } else {
      self.maybe_inject_overspeed(rng, config);
    }

    self.check_violation(config, notice_ids);
  }

  fn advance_arrival(
    &mut self,
    phase: ArrivalPhase,
    rng: &mut Rng,
    config: &SimConfig,
  ) {
    let dwell = &config.arrival_dwell;
    match phase {
      ArrivalPhase::Holding => {
        // Cannot leave the stack until a runway has been assigned.
        if self.ticks_in_phase >= dwell.holding && self.runway.is_some() {
          self.phase = FlightPhase::Arrival(ArrivalPhase::Approach);
          self.speed = sample_band(rng, config.speeds.approach);
        }
      }
      ArrivalPhase::Approach => {
        if self.ticks_in_phase >= dwell.approach {
          self.phase = FlightPhase::Arrival(ArrivalPhase::Landing);
          self.speed = config.speeds.landing_start;
        }
      }
      ArrivalPhase::Landing => {
        if self.pinned_speed.is_none() {
          self.speed = violation::landing_ceiling(self.ticks_in_phase, config);
        }

        if self.ticks_in_phase >= dwell.landing {
          self.phase = FlightPhase::Arrival(ArrivalPhase::Taxi);
          self.speed = sample_band(rng, config.speeds.taxi);
        }
      }
      ArrivalPhase::Taxi => {
        if self.ticks_in_phase >= dwell.taxi {
          self.phase = FlightPhase::Arrival(ArrivalPhase::AtGate);
          self.speed = 0.0;
        }
      }
      ArrivalPhase::AtGate => {
        self.pinned_speed = None;
        self.speed = 0.0;
      }
    }
  }

  fn advance_departure(
    &mut self,
    phase: DeparturePhase,
    rng: &mut Rng,
    config: &SimConfig,
  ) {
    let dwell = &config.departure_dwell;
    match phase {
      DeparturePhase::AtGate => {
        // Pushback waits on a runway assignment.
        if self.runway.is_some() {
          self.phase = FlightPhase::Departure(DeparturePhase::Taxi);
          self.speed = sample_band(rng, config.speeds.taxi);
        } else {
          self.speed = 0.0;
        }
      }
      DeparturePhase::Taxi => {
        if self.ticks_in_phase >= dwell.taxi {
          self.phase = FlightPhase::Departure(DeparturePhase::TakeoffRoll);
          self.speed = 0.0;
        }
      }
      DeparturePhase::TakeoffRoll => {
        if self.pinned_speed.is_none() {
          self.speed = (config.speeds.takeoff_max * self.ticks_in_phase as f32
            / dwell.takeoff_roll as f32)
            .min(config.speeds.takeoff_max);
        }

        if self.ticks_in_phase >= dwell.takeoff_roll {
          self.phase = FlightPhase::Departure(DeparturePhase::Climb);
          self.speed = sample_band(rng, config.speeds.climb);
        }
      }
      DeparturePhase::Climb => {
        if self.ticks_in_phase >= dwell.climb {
          self.phase = FlightPhase::Departure(DeparturePhase::Cruise);
          self.speed = sample_band(rng, config.speeds.cruise);
        }
      }
      DeparturePhase::Cruise => {
        // Cruise speed is held from the entry draw.
      }
    }
  }

  /// Rolls the two-stage injection gate and, on a hit, overrides the speed
  /// past the phase's legal band and pins it there.
  fn maybe_inject_overspeed(&mut self, rng: &mut Rng, config: &SimConfig) {
    if self.category == FlightCategory::Emergency
      || self.open_violation.is_some()
    {
      return;
    }

    let probability = config.violation.probability;
    if percent_roll(rng) > probability / 3 {
      return;
    }
    if percent_roll(rng) > probability {
      return;
    }

    let excess = sample_band(
      rng,
      SpeedBand::new(config.violation.min_excess, config.violation.max_excess),
    );
    let speeds = &config.speeds;

    let injected = match self.phase {
      FlightPhase::Arrival(ArrivalPhase::Holding) => {
        Some(speeds.holding.max + excess)
      }
      FlightPhase::Arrival(ArrivalPhase::Approach) => {
        Some(speeds.approach.max + excess)
      }
      FlightPhase::Arrival(ArrivalPhase::Landing) => {
        // Only meaningful once the ramp has brought the speed down.
        (self.ticks_in_phase > config.arrival_dwell.landing / 2)
          .then(|| self.speed + excess)
      }
      FlightPhase::Arrival(ArrivalPhase::Taxi)
      | FlightPhase::Departure(DeparturePhase::Taxi) => {
        Some(speeds.taxi.max + excess / 2.0)
      }
      FlightPhase::Arrival(ArrivalPhase::AtGate)
      | FlightPhase::Departure(DeparturePhase::AtGate) => None,
      FlightPhase::Departure(DeparturePhase::TakeoffRoll) => {
        (self.ticks_in_phase > config.departure_dwell.takeoff_roll / 2)
          .then(|| speeds.takeoff_max + excess)
      }
      FlightPhase::Departure(DeparturePhase::Climb) => {
        Some(speeds.climb.max + excess)
      }
      FlightPhase::Departure(DeparturePhase::Cruise) => {
        Some(if percent_roll(rng) > 50 {
          speeds.cruise.max + excess
        } else {
          speeds.cruise.min - excess
        })
      }
    };

    if let Some(speed) = injected {
      self.speed = speed;
      self.pinned_speed = Some(speed);
    }
  }

  fn check_violation(&mut self, config: &SimConfig, notice_ids: &mut IdSequence) {
    if self.category == FlightCategory::Emergency {
      return;
    }
    if self.violated_phases.contains(&self.phase) {
      return;
    }

    let Some(band) =
      violation::check(self.phase, self.speed, self.ticks_in_phase, config)
    else {
      return;
    };

    let avn = Avn::issue(
      notice_ids.next_id(),
      self.airline,
      self.flight_number,
      self.category,
      self.speed,
      band,
      &config.fines,
    );

    self.violated_phases.push(self.phase);
    tracing::warn!(
      "violation detected: flight {} ({}) at {} km/h in {}",
      self.flight_number,
      self.airline,
      self.speed,
      self.phase
    );
    self.open_violation = Some(avn);
  }
}

fn sample_band(rng: &mut Rng, band: SpeedBand) -> f32 {
  rng.sample_iter(band.min as i32..=band.max as i32).unwrap() as f32
}

fn percent_roll(rng: &mut Rng) -> u32 {
  rng.sample_iter(1..=100u32).unwrap()
}
