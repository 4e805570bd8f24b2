use serde::{Deserialize, Serialize};

/// An inclusive range of permissible speeds, in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
  pub min: f32,
  pub max: f32,
}

impl SpeedBand {
  pub fn new(min: f32, max: f32) -> Self {
    Self { min, max }
  }

  pub fn contains(&self, speed: f32) -> bool {
    speed >= self.min && speed <= self.max
  }
}

/// Per-phase speed rules. Bands are checked two-sided where noted in the
/// detector; the rest are ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimits {
  pub holding: SpeedBand,
  pub approach: SpeedBand,
  pub landing_start: f32,
  pub landing_end: f32,
  pub taxi: SpeedBand,
  pub gate_max: f32,
  pub takeoff_max: f32,
  pub climb: SpeedBand,
  pub cruise: SpeedBand,
}

impl Default for SpeedLimits {
  fn default() -> Self {
    Self {
      holding: SpeedBand::new(400.0, 600.0),
      approach: SpeedBand::new(240.0, 290.0),
      landing_start: 240.0,
      landing_end: 30.0,
      taxi: SpeedBand::new(15.0, 30.0),
      gate_max: 5.0,
      takeoff_max: 290.0,
      climb: SpeedBand::new(250.0, 463.0),
      cruise: SpeedBand::new(800.0, 900.0),
    }
  }
}

/// Dwell times for arrival phases, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalDwell {
  pub holding: u32,
  pub approach: u32,
  pub landing: u32,
  pub taxi: u32,
}

impl Default for ArrivalDwell {
  fn default() -> Self {
    Self {
      holding: 20,
      approach: 15,
      landing: 10,
      taxi: 15,
    }
  }
}

/// Dwell times for departure phases, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureDwell {
  pub taxi: u32,
  pub takeoff_roll: u32,
  pub climb: u32,
}

impl Default for DepartureDwell {
  fn default() -> Self {
    Self {
      taxi: 15,
      takeoff_roll: 10,
      climb: 20,
    }
  }
}

/// Stochastic overspeed injection. The injection gate rolls twice: first
/// against `probability / 3`, then against `probability`, both out of 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViolationConfig {
  pub probability: u32,
  pub min_excess: f32,
  pub max_excess: f32,
}

impl Default for ViolationConfig {
  fn default() -> Self {
    Self {
      probability: 15,
      min_excess: 5.0,
      max_excess: 40.0,
    }
  }
}

/// Fines in PKR, plus the service fee fraction and the payment deadline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FineSchedule {
  pub commercial: f64,
  pub cargo: f64,
  pub service_fee: f64,
  pub due_days: u64,
}

impl Default for FineSchedule {
  fn default() -> Self {
    Self {
      commercial: 500_000.0,
      cargo: 700_000.0,
      service_fee: 0.15,
      due_days: 3,
    }
  }
}

/// A single traffic stream's cadence: how often it fires (in ticks), the
/// chance out of 100 that a spawned flight is an emergency, and the tick at
/// which the stream first activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
  pub interval: u64,
  pub emergency_chance: u32,
  pub first_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSchedule {
  pub north_arrivals: StreamConfig,
  pub south_arrivals: StreamConfig,
  pub east_departures: StreamConfig,
  pub west_departures: StreamConfig,
}

impl Default for StreamSchedule {
  fn default() -> Self {
    Self {
      north_arrivals: StreamConfig {
        interval: 180,
        emergency_chance: 10,
        first_at: 1,
      },
      south_arrivals: StreamConfig {
        interval: 120,
        emergency_chance: 5,
        first_at: 2,
      },
      east_departures: StreamConfig {
        interval: 150,
        emergency_chance: 15,
        first_at: 3,
      },
      west_departures: StreamConfig {
        interval: 240,
        emergency_chance: 20,
        first_at: 4,
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimConfig {
  #[serde(default)]
  pub speeds: SpeedLimits,
  #[serde(default)]
  pub arrival_dwell: ArrivalDwell,
  #[serde(default)]
  pub departure_dwell: DepartureDwell,
  #[serde(default)]
  pub violation: ViolationConfig,
  #[serde(default)]
  pub fines: FineSchedule,
  #[serde(default)]
  pub streams: StreamSchedule,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_speed_band_contains() {
    let band = SpeedBand::new(240.0, 290.0);
    assert!(band.contains(240.0));
    assert!(band.contains(290.0));
    assert!(!band.contains(239.9));
    assert!(!band.contains(290.1));
  }

  #[test]
  fn test_defaults_are_consistent() {
    let config = SimConfig::default();
    assert!(config.speeds.holding.min < config.speeds.holding.max);
    assert!(config.speeds.landing_end < config.speeds.landing_start);
    assert!(config.violation.min_excess <= config.violation.max_excess);
    assert_eq!(config.streams.north_arrivals.first_at, 1);
    assert_eq!(config.streams.west_departures.interval, 240);
  }
}
