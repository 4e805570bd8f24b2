use internment::Intern;
use serde::{Deserialize, Serialize};
use turborand::{TurboRand, rng::Rng};

use crate::entities::avn::{Avn, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AirlineKind {
  Commercial,
  Cargo,
  EmergencyService,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airline {
  pub name: Intern<String>,
  pub kind: AirlineKind,
  pub fleet_size: usize,
  /// How many flights the airline may have in the air at once.
  pub max_active: usize,
  pub active: usize,
  pub violations: Vec<Avn>,
}

impl Airline {
  pub fn new(
    name: &str,
    kind: AirlineKind,
    fleet_size: usize,
    max_active: usize,
  ) -> Self {
    Self {
      name: Intern::from_ref(name),
      kind,
      fleet_size,
      max_active,
      active: 0,
      violations: Vec::new(),
    }
  }

  pub fn has_capacity(&self) -> bool {
    self.active < self.max_active
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirlineRegistry {
  airlines: Vec<Airline>,
}

impl Default for AirlineRegistry {
  fn default() -> Self {
    Self {
      airlines: vec![
        Airline::new("PIA", AirlineKind::Commercial, 6, 4),
        Airline::new("AirBlue", AirlineKind::Commercial, 4, 4),
        Airline::new("FedEx", AirlineKind::Cargo, 3, 2),
        Airline::new("Pakistan Airforce", AirlineKind::EmergencyService, 2, 1),
        Airline::new("Blue Dart", AirlineKind::Cargo, 2, 2),
        Airline::new("AghaKhan Air Ambulance", AirlineKind::EmergencyService, 2, 1),
      ],
    }
  }
}

impl AirlineRegistry {
  pub fn with_airlines(airlines: Vec<Airline>) -> Self {
    Self { airlines }
  }

  pub fn iter(&self) -> impl Iterator<Item = &Airline> {
    self.airlines.iter()
  }

  pub fn get(&self, name: Intern<String>) -> Option<&Airline> {
    self.airlines.iter().find(|a| a.name == name)
  }

  fn get_mut(&mut self, name: Intern<String>) -> Option<&mut Airline> {
    self.airlines.iter_mut().find(|a| a.name == name)
  }

  /// Uniform pick among airlines that still have concurrent-flight
  /// capacity. `None` when the whole registry is saturated.
  pub fn sample_eligible(&self, rng: &mut Rng) -> Option<&Airline> {
    let eligible: Vec<&Airline> =
      self.airlines.iter().filter(|a| a.has_capacity()).collect();

    rng.sample(&eligible).copied()
  }

  pub fn record_spawn(&mut self, name: Intern<String>) {
    if let Some(airline) = self.get_mut(name) {
      airline.active += 1;
    }
  }

  pub fn record_retired(&mut self, name: Intern<String>) {
    if let Some(airline) = self.get_mut(name) {
      airline.active = airline.active.saturating_sub(1);
    }
  }

  /// Appends the notice to the issuing airline's record.
  pub fn record_violation(&mut self, avn: Avn) {
    if let Some(airline) = self.get_mut(avn.airline) {
      airline.violations.push(avn);
    } else {
      tracing::warn!("notice #{} for unknown airline {}", avn.id, avn.airline);
    }
  }

  pub fn set_payment_status(&mut self, notice_id: u32, paid: bool) {
    for airline in self.airlines.iter_mut() {
      for avn in airline.violations.iter_mut() {
        if avn.id == notice_id {
          avn.status = if paid {
            PaymentStatus::Paid
          } else {
            PaymentStatus::Unpaid
          };
          return;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use turborand::SeededCore;

  use super::*;

  #[test]
  fn test_default_registry() {
    let registry = AirlineRegistry::default();
    assert_eq!(registry.iter().count(), 6);
    assert_eq!(
      registry.get(Intern::from_ref("FedEx")).unwrap().kind,
      AirlineKind::Cargo
    );
    assert_eq!(
      registry
        .get(Intern::from_ref("Pakistan Airforce"))
        .unwrap()
        .kind,
      AirlineKind::EmergencyService
    );
  }

  #[test]
  fn test_capacity_tracking() {
    let mut registry = AirlineRegistry::with_airlines(vec![Airline::new(
      "PIA",
      AirlineKind::Commercial,
      6,
      1,
    )]);
    let name = Intern::from_ref("PIA");

    assert!(registry.get(name).unwrap().has_capacity());
    registry.record_spawn(name);
    assert!(!registry.get(name).unwrap().has_capacity());
    registry.record_retired(name);
    assert!(registry.get(name).unwrap().has_capacity());
  }

  #[test]
  fn test_sample_skips_saturated_airlines() {
    let mut registry = AirlineRegistry::with_airlines(vec![
      Airline::new("PIA", AirlineKind::Commercial, 6, 1),
      Airline::new("AirBlue", AirlineKind::Commercial, 4, 1),
    ]);
    let mut rng = Rng::with_seed(1);

    registry.record_spawn(Intern::from_ref("PIA"));
    for _ in 0..20 {
      let picked = registry.sample_eligible(&mut rng).unwrap();
      assert_eq!(picked.name, Intern::from_ref("AirBlue"));
    }

    registry.record_spawn(Intern::from_ref("AirBlue"));
    assert!(registry.sample_eligible(&mut rng).is_none());
  }
}
