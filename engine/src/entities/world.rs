use serde::{Deserialize, Serialize};

use crate::entities::{
  aircraft::{Aircraft, AircraftId},
  airline::AirlineRegistry,
  avn::{Avn, AvnId, PaymentStatus},
};

/// Everything the scheduler mutates over a run: the airline registry, the
/// live and retired aircraft, and the append-only notice list kept for
/// status display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
  pub airlines: AirlineRegistry,
  pub active: Vec<Aircraft>,
  pub completed: Vec<Aircraft>,
  pub notices: Vec<Avn>,
}

impl World {
  pub fn aircraft(&self, id: AircraftId) -> Option<&Aircraft> {
    self.active.iter().find(|a| a.id == id)
  }

  pub fn notice(&self, id: AvnId) -> Option<&Avn> {
    self.notices.iter().find(|n| n.id == id)
  }

  pub fn unpaid_notices(&self) -> usize {
    self
      .notices
      .iter()
      .filter(|n| n.status != PaymentStatus::Paid)
      .count()
  }

  /// Applies a payment-status update to the world's copy of the notice and
  /// to the issuing airline's record. Returns false when the id is unknown.
  pub fn set_payment_status(&mut self, id: AvnId, paid: bool) -> bool {
    let Some(notice) = self.notices.iter_mut().find(|n| n.id == id) else {
      return false;
    };

    notice.status = if paid {
      PaymentStatus::Paid
    } else {
      PaymentStatus::Unpaid
    };
    self.airlines.set_payment_status(id, paid);

    true
  }
}

#[cfg(test)]
mod tests {
  use internment::Intern;

  use super::*;
  use crate::{
    config::{FineSchedule, SpeedBand},
    entities::aircraft::FlightCategory,
  };

  fn notice(id: AvnId) -> Avn {
    Avn::issue(
      id,
      Intern::from_ref("PIA"),
      Intern::from_ref("PI-1000"),
      FlightCategory::Commercial,
      650.0,
      SpeedBand::new(400.0, 600.0),
      &FineSchedule::default(),
    )
  }

  #[test]
  fn test_payment_status_updates_both_copies() {
    let mut world = World::default();
    let avn = notice(1000);
    world.airlines.record_violation(avn.clone());
    world.notices.push(avn);

    assert!(world.set_payment_status(1000, true));
    assert_eq!(world.notice(1000).unwrap().status, PaymentStatus::Paid);
    assert_eq!(world.unpaid_notices(), 0);

    let airline = world.airlines.get(Intern::from_ref("PIA")).unwrap();
    assert_eq!(airline.violations[0].status, PaymentStatus::Paid);
  }

  #[test]
  fn test_unknown_notice_is_reported() {
    let mut world = World::default();
    assert!(!world.set_payment_status(4242, true));
  }
}
