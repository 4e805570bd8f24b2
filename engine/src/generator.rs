use internment::Intern;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use turborand::{TurboRand, rng::Rng};

use crate::{
  IdSequence,
  config::{SimConfig, StreamConfig},
  entities::{
    aircraft::{Aircraft, Direction, FlightCategory},
    airline::{AirlineKind, AirlineRegistry},
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
  Arrival,
  Departure,
}

impl StreamKind {
  /// Flight-number series base: arrivals are the 1000s, departures the
  /// 2000s.
  fn series(&self) -> usize {
    match self {
      StreamKind::Arrival => 1000,
      StreamKind::Departure => 2000,
    }
  }
}

/// One of the four fixed traffic cadences. Fires on its designated
/// first-activation tick and every `interval` ticks after its last spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStream {
  pub kind: StreamKind,
  pub direction: Direction,
  pub interval: u64,
  pub emergency_chance: u32,
  pub first_at: u64,
  last_spawn: u64,
}

impl TrafficStream {
  fn new(kind: StreamKind, direction: Direction, config: &StreamConfig) -> Self {
    Self {
      kind,
      direction,
      interval: config.interval,
      emergency_chance: config.emergency_chance,
      first_at: config.first_at,
      last_spawn: 0,
    }
  }

  fn due(&self, now: u64) -> bool {
    now == self.first_at || now.saturating_sub(self.last_spawn) >= self.interval
  }
}

/// Spawns flights on the four stream cadences and owns the aircraft id
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightGenerator {
  streams: Vec<TrafficStream>,
  aircraft_ids: IdSequence,
  total_spawned: usize,
}

impl FlightGenerator {
  pub fn new(config: &SimConfig) -> Self {
    let streams = &config.streams;

    Self {
      streams: vec![
        TrafficStream::new(
          StreamKind::Arrival,
          Direction::North,
          &streams.north_arrivals,
        ),
        TrafficStream::new(
          StreamKind::Arrival,
          Direction::South,
          &streams.south_arrivals,
        ),
        TrafficStream::new(
          StreamKind::Departure,
          Direction::East,
          &streams.east_departures,
        ),
        TrafficStream::new(
          StreamKind::Departure,
          Direction::West,
          &streams.west_departures,
        ),
      ],
      aircraft_ids: IdSequence::default(),
      total_spawned: 0,
    }
  }

  pub fn total_spawned(&self) -> usize {
    self.total_spawned
  }

  /// Runs every due stream once, returning the newly created aircraft. A
  /// stream with no eligible airline skips its spawn and retries next
  /// cadence.
  pub fn generate(
    &mut self,
    now: u64,
    airlines: &mut AirlineRegistry,
    rng: &mut Rng,
    config: &SimConfig,
  ) -> Vec<Aircraft> {
    let mut spawned = Vec::new();

    for index in 0..self.streams.len() {
      if !self.streams[index].due(now) {
        continue;
      }
      self.streams[index].last_spawn = now;

      let stream = self.streams[index];
      let emergency_draw =
        rng.sample_iter(1..=100u32).unwrap() <= stream.emergency_chance;

      let Some(airline) = airlines.sample_eligible(rng) else {
        debug!(
          "no airline has capacity; skipping {} {:?} spawn",
          stream.direction, stream.kind
        );
        continue;
      };
      let airline_name = airline.name;
      let airline_kind = airline.kind;

      let category = if emergency_draw
        || airline_kind == AirlineKind::EmergencyService
      {
        FlightCategory::Emergency
      } else if airline_kind == AirlineKind::Cargo {
        FlightCategory::Cargo
      } else {
        FlightCategory::Commercial
      };

      let prefix: String = airline_name.chars().take(2).collect();
      let flight_number = Intern::from(format!(
        "{}-{}",
        prefix,
        stream.kind.series() + self.total_spawned
      ));

      let id = self.aircraft_ids.next_id();
      let aircraft = match stream.kind {
        StreamKind::Arrival => Aircraft::arrival(
          id,
          flight_number,
          airline_name,
          category,
          stream.direction,
          now,
          rng,
          config,
        ),
        StreamKind::Departure => Aircraft::departure(
          id,
          flight_number,
          airline_name,
          category,
          stream.direction,
          now,
        ),
      };

      airlines.record_spawn(airline_name);
      self.total_spawned += 1;
      info!(
        "new {} {:?}: {} ({}) {}",
        stream.direction, stream.kind, flight_number, airline_name, category
      );

      spawned.push(aircraft);
    }

    spawned
  }
}

#[cfg(test)]
mod tests {
  use turborand::SeededCore;

  use super::*;
  use crate::entities::{
    aircraft::{ArrivalPhase, DeparturePhase, FlightPhase},
    airline::Airline,
  };

  fn short_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.streams.north_arrivals = StreamConfig {
      interval: 10,
      emergency_chance: 0,
      first_at: 1,
    };
    config.streams.south_arrivals = StreamConfig {
      interval: 10,
      emergency_chance: 0,
      first_at: 2,
    };
    config.streams.east_departures = StreamConfig {
      interval: 10,
      emergency_chance: 0,
      first_at: 3,
    };
    config.streams.west_departures = StreamConfig {
      interval: 10,
      emergency_chance: 0,
      first_at: 4,
    };
    config
  }

  #[test]
  fn test_first_activation_ticks() {
    let config = short_config();
    let mut generator = FlightGenerator::new(&config);
    let mut airlines = AirlineRegistry::default();
    let mut rng = Rng::with_seed(1);

    let tick1 = generator.generate(1, &mut airlines, &mut rng, &config);
    assert_eq!(tick1.len(), 1);
    assert_eq!(tick1[0].direction, Direction::North);
    assert_eq!(tick1[0].phase, FlightPhase::Arrival(ArrivalPhase::Holding));

    let tick2 = generator.generate(2, &mut airlines, &mut rng, &config);
    assert_eq!(tick2.len(), 1);
    assert_eq!(tick2[0].direction, Direction::South);

    let tick3 = generator.generate(3, &mut airlines, &mut rng, &config);
    assert_eq!(tick3[0].direction, Direction::East);
    assert_eq!(tick3[0].phase, FlightPhase::Departure(DeparturePhase::AtGate));

    let tick4 = generator.generate(4, &mut airlines, &mut rng, &config);
    assert_eq!(tick4[0].direction, Direction::West);
  }

  #[test]
  fn test_interval_cadence() {
    let config = short_config();
    let mut generator = FlightGenerator::new(&config);
    let mut airlines = AirlineRegistry::default();
    let mut rng = Rng::with_seed(2);

    assert_eq!(generator.generate(1, &mut airlines, &mut rng, &config).len(), 1);

    // Nothing further from the north stream until its interval elapses.
    for now in 5..11 {
      let spawned = generator.generate(now, &mut airlines, &mut rng, &config);
      assert!(spawned.iter().all(|a| a.direction != Direction::North));
    }

    let spawned = generator.generate(11, &mut airlines, &mut rng, &config);
    assert!(spawned.iter().any(|a| a.direction == Direction::North));
  }

  #[test]
  fn test_saturated_registry_skips_spawn() {
    let config = short_config();
    let mut generator = FlightGenerator::new(&config);
    let mut airlines = AirlineRegistry::with_airlines(vec![Airline::new(
      "PIA",
      AirlineKind::Commercial,
      6,
      0,
    )]);
    let mut rng = Rng::with_seed(3);

    let spawned = generator.generate(1, &mut airlines, &mut rng, &config);
    assert!(spawned.is_empty());
    assert_eq!(generator.total_spawned(), 0);
  }

  #[test]
  fn test_category_follows_airline_kind() {
    let config = short_config();
    let mut generator = FlightGenerator::new(&config);
    let mut rng = Rng::with_seed(4);

    let mut cargo_only = AirlineRegistry::with_airlines(vec![Airline::new(
      "FedEx",
      AirlineKind::Cargo,
      3,
      2,
    )]);
    let spawned = generator.generate(1, &mut cargo_only, &mut rng, &config);
    assert_eq!(spawned[0].category, FlightCategory::Cargo);
    assert_eq!(spawned[0].priority, 2);

    let mut military = AirlineRegistry::with_airlines(vec![Airline::new(
      "Pakistan Airforce",
      AirlineKind::EmergencyService,
      2,
      1,
    )]);
    let spawned = generator.generate(2, &mut military, &mut rng, &config);
    assert_eq!(spawned[0].category, FlightCategory::Emergency);
    assert_eq!(spawned[0].priority, 3);
  }

  #[test]
  fn test_flight_number_format_and_series() {
    let config = short_config();
    let mut generator = FlightGenerator::new(&config);
    let mut airlines = AirlineRegistry::with_airlines(vec![Airline::new(
      "AirBlue",
      AirlineKind::Commercial,
      4,
      10,
    )]);
    let mut rng = Rng::with_seed(5);

    let arrival = generator
      .generate(1, &mut airlines, &mut rng, &config)
      .remove(0);
    assert_eq!(arrival.flight_number.as_str(), "Ai-1000");

    let _south = generator.generate(2, &mut airlines, &mut rng, &config);
    let east = generator
      .generate(3, &mut airlines, &mut rng, &config)
      .remove(0);
    assert_eq!(east.flight_number.as_str(), "Ai-2002");
  }

  #[test]
  fn test_spawn_counts_against_airline_capacity() {
    let config = short_config();
    let mut generator = FlightGenerator::new(&config);
    let mut airlines = AirlineRegistry::with_airlines(vec![Airline::new(
      "PIA",
      AirlineKind::Commercial,
      6,
      1,
    )]);
    let mut rng = Rng::with_seed(6);

    let spawned = generator.generate(1, &mut airlines, &mut rng, &config);
    assert_eq!(spawned.len(), 1);

    // The only airline is now at its cap: the south stream's spawn skips.
    let spawned = generator.generate(2, &mut airlines, &mut rng, &config);
    assert!(spawned.is_empty());
  }
}
