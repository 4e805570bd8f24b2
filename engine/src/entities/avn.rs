use core::fmt;
use std::time::Duration;

use internment::Intern;
use serde::{Deserialize, Serialize};

use crate::{
  SECONDS_PER_DAY,
  config::{FineSchedule, SpeedBand},
  duration_now,
  entities::aircraft::FlightCategory,
};

pub type AvnId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Unpaid,
  Paid,
  Overdue,
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PaymentStatus::Unpaid => write!(f, "Unpaid"),
      PaymentStatus::Paid => write!(f, "Paid"),
      PaymentStatus::Overdue => write!(f, "Overdue"),
    }
  }
}

/// An airspace violation notice: the billable record cut when an aircraft's
/// recorded speed falls outside its phase's permissible band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avn {
  pub id: AvnId,
  pub airline: Intern<String>,
  pub flight_number: Intern<String>,
  pub category: FlightCategory,

  pub recorded_speed: f32,
  pub permissible: SpeedBand,

  pub issued_at: Duration,
  pub due_by: Duration,

  pub fine: f64,
  pub service_fee: f64,
  pub total: f64,

  pub status: PaymentStatus,
}

impl Avn {
  pub fn issue(
    id: AvnId,
    airline: Intern<String>,
    flight_number: Intern<String>,
    category: FlightCategory,
    recorded_speed: f32,
    permissible: SpeedBand,
    fines: &FineSchedule,
  ) -> Self {
    // Emergency flights are never billed, so the non-commercial arm is the
    // cargo fee.
    let fine = match category {
      FlightCategory::Commercial => fines.commercial,
      _ => fines.cargo,
    };
    let service_fee = fine * fines.service_fee;
    let issued_at = duration_now();

    Self {
      id,
      airline,
      flight_number,
      category,

      recorded_speed,
      permissible,

      issued_at,
      due_by: issued_at + Duration::from_secs(fines.due_days * SECONDS_PER_DAY),

      fine,
      service_fee,
      total: fine + service_fee,

      status: PaymentStatus::Unpaid,
    }
  }

  pub fn is_past_due(&self, now: Duration) -> bool {
    self.status == PaymentStatus::Unpaid && now > self.due_by
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn issue(category: FlightCategory) -> Avn {
    Avn::issue(
      1000,
      Intern::from_ref("PIA"),
      Intern::from_ref("PI-1000"),
      category,
      650.0,
      SpeedBand::new(400.0, 600.0),
      &FineSchedule::default(),
    )
  }

  #[test]
  fn test_commercial_fee_arithmetic() {
    let avn = issue(FlightCategory::Commercial);
    assert_eq!(avn.fine, 500_000.0);
    assert_eq!(avn.service_fee, 75_000.0);
    assert_eq!(avn.total, avn.fine + 0.15 * avn.fine);
    assert_eq!(avn.status, PaymentStatus::Unpaid);
  }

  #[test]
  fn test_cargo_fee_arithmetic() {
    let avn = issue(FlightCategory::Cargo);
    assert_eq!(avn.fine, 700_000.0);
    assert_eq!(avn.service_fee, 105_000.0);
    assert_eq!(avn.total, 805_000.0);
  }

  #[test]
  fn test_due_three_days_after_issue() {
    let avn = issue(FlightCategory::Commercial);
    assert_eq!(
      avn.due_by - avn.issued_at,
      Duration::from_secs(3 * SECONDS_PER_DAY)
    );
    assert!(!avn.is_past_due(avn.issued_at));
    assert!(avn.is_past_due(avn.due_by + Duration::from_secs(1)));
  }

  #[test]
  fn test_paid_notice_is_never_past_due() {
    let mut avn = issue(FlightCategory::Commercial);
    avn.status = PaymentStatus::Paid;
    assert!(!avn.is_past_due(avn.due_by + Duration::from_secs(1)));
  }
}
