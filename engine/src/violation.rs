use crate::{
  config::{SimConfig, SpeedBand},
  entities::aircraft::{ArrivalPhase, DeparturePhase, FlightPhase},
};

/// The highest legal speed while landing, which ramps down linearly from
/// the touchdown speed to the rollout floor over the phase's dwell time and
/// clamps at the floor once the dwell has elapsed.
pub fn landing_ceiling(ticks_in_phase: u32, config: &SimConfig) -> f32 {
  let start = config.speeds.landing_start;
  let end = config.speeds.landing_end;
  let dwell = config.arrival_dwell.landing;

  (start - (start - end) * ticks_in_phase as f32 / dwell as f32).max(end)
}

/// Checks the speed against the phase's legal band. Returns the permissible
/// band when the speed falls outside it, `None` otherwise. Pure: the caller
/// owns the once-per-phase bookkeeping.
pub fn check(
  phase: FlightPhase,
  speed: f32,
  ticks_in_phase: u32,
  config: &SimConfig,
) -> Option<SpeedBand> {
  let speeds = &config.speeds;

  match phase {
    FlightPhase::Arrival(ArrivalPhase::Holding) => {
      (speed > speeds.holding.max).then_some(speeds.holding)
    }
    FlightPhase::Arrival(ArrivalPhase::Approach) => {
      (!speeds.approach.contains(speed)).then_some(speeds.approach)
    }
    FlightPhase::Arrival(ArrivalPhase::Landing) => {
      let ceiling = landing_ceiling(ticks_in_phase, config);
      (speed > ceiling).then_some(SpeedBand::new(0.0, ceiling))
    }
    FlightPhase::Arrival(ArrivalPhase::Taxi)
    | FlightPhase::Departure(DeparturePhase::Taxi) => {
      (speed > speeds.taxi.max).then_some(speeds.taxi)
    }
    FlightPhase::Arrival(ArrivalPhase::AtGate)
    | FlightPhase::Departure(DeparturePhase::AtGate) => (speed
      > speeds.gate_max)
      .then_some(SpeedBand::new(0.0, speeds.gate_max)),
    FlightPhase::Departure(DeparturePhase::TakeoffRoll) => (speed
      > speeds.takeoff_max)
      .then_some(SpeedBand::new(0.0, speeds.takeoff_max)),
    FlightPhase::Departure(DeparturePhase::Climb) => {
      (speed > speeds.climb.max).then_some(speeds.climb)
    }
    FlightPhase::Departure(DeparturePhase::Cruise) => {
      (!speeds.cruise.contains(speed)).then_some(speeds.cruise)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> SimConfig {
    SimConfig::default()
  }

  #[test]
  fn test_holding_is_a_ceiling() {
    let config = config();
    let phase = FlightPhase::Arrival(ArrivalPhase::Holding);
    assert_eq!(check(phase, 600.0, 1, &config), None);
    // Slow holding is legal; only the ceiling is enforced.
    assert_eq!(check(phase, 350.0, 1, &config), None);

    let band = check(phase, 601.0, 1, &config).unwrap();
    assert_eq!((band.min, band.max), (400.0, 600.0));
  }

  #[test]
  fn test_approach_is_two_sided() {
    let config = config();
    let phase = FlightPhase::Arrival(ArrivalPhase::Approach);
    assert_eq!(check(phase, 240.0, 1, &config), None);
    assert_eq!(check(phase, 290.0, 1, &config), None);
    assert!(check(phase, 239.0, 1, &config).is_some());
    assert!(check(phase, 291.0, 1, &config).is_some());
  }

  #[test]
  fn test_landing_ceiling_decreases() {
    let config = config();
    let phase = FlightPhase::Arrival(ArrivalPhase::Landing);

    // At the start of the ramp, the full touchdown speed is legal.
    assert_eq!(check(phase, 240.0, 0, &config), None);
    assert!(check(phase, 241.0, 0, &config).is_some());

    // Halfway through the ramp, the old touchdown speed is a violation.
    assert_eq!(landing_ceiling(5, &config), 135.0);
    assert_eq!(check(phase, 135.0, 5, &config), None);
    let band = check(phase, 200.0, 5, &config).unwrap();
    assert_eq!(band.max, 135.0);
  }

  #[test]
  fn test_landing_terminal_floor() {
    let config = config();
    let phase = FlightPhase::Arrival(ArrivalPhase::Landing);
    let dwell = config.arrival_dwell.landing;

    // Once the dwell has elapsed, only the rollout floor is legal.
    assert_eq!(check(phase, 30.0, dwell, &config), None);
    assert_eq!(check(phase, 30.0, dwell + 3, &config), None);
    let band = check(phase, 31.0, dwell + 1, &config).unwrap();
    assert_eq!(band.max, 30.0);
  }

  #[test]
  fn test_taxi_and_gate_ceilings() {
    let config = config();
    assert_eq!(
      check(FlightPhase::Arrival(ArrivalPhase::Taxi), 30.0, 1, &config),
      None
    );
    assert!(
      check(FlightPhase::Departure(DeparturePhase::Taxi), 35.0, 1, &config)
        .is_some()
    );
    assert_eq!(
      check(FlightPhase::Departure(DeparturePhase::AtGate), 0.0, 1, &config),
      None
    );
    let band =
      check(FlightPhase::Arrival(ArrivalPhase::AtGate), 12.0, 1, &config)
        .unwrap();
    assert_eq!((band.min, band.max), (0.0, 5.0));
  }

  #[test]
  fn test_takeoff_and_climb_ceilings() {
    let config = config();
    assert_eq!(
      check(
        FlightPhase::Departure(DeparturePhase::TakeoffRoll),
        290.0,
        5,
        &config
      ),
      None
    );
    assert!(
      check(
        FlightPhase::Departure(DeparturePhase::TakeoffRoll),
        300.0,
        5,
        &config
      )
      .is_some()
    );
    assert_eq!(
      check(FlightPhase::Departure(DeparturePhase::Climb), 463.0, 1, &config),
      None
    );
    assert!(
      check(FlightPhase::Departure(DeparturePhase::Climb), 470.0, 1, &config)
        .is_some()
    );
  }

  #[test]
  fn test_cruise_is_two_sided() {
    let config = config();
    let phase = FlightPhase::Departure(DeparturePhase::Cruise);
    assert_eq!(check(phase, 800.0, 1, &config), None);
    assert_eq!(check(phase, 900.0, 1, &config), None);
    assert!(check(phase, 799.0, 1, &config).is_some());
    assert!(check(phase, 901.0, 1, &config).is_some());
  }
}
