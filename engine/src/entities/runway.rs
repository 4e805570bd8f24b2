use core::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::aircraft::AircraftId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunwayId {
  A,
  B,
  C,
}

impl RunwayId {
  pub const ALL: [RunwayId; 3] = [RunwayId::A, RunwayId::B, RunwayId::C];
}

impl fmt::Display for RunwayId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunwayId::A => write!(f, "RWY-A"),
      RunwayId::B => write!(f, "RWY-B"),
      RunwayId::C => write!(f, "RWY-C"),
    }
  }
}

/// One of the three shared runways. Only the allocator mutates these; an
/// aircraft's `runway` field is a denormalized copy of the occupancy here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runway {
  pub id: RunwayId,
  pub available: bool,
  pub occupant: Option<AircraftId>,
  /// Tick at which the runway last became free. Assignment requires the
  /// current tick to have reached this stamp.
  pub free_since: u64,
}

impl Runway {
  pub fn new(id: RunwayId) -> Self {
    Self {
      id,
      available: true,
      occupant: None,
      free_since: 0,
    }
  }

  pub fn is_free(&self, now: u64) -> bool {
    self.available && now >= self.free_since
  }

  pub fn occupy(&mut self, aircraft: AircraftId) {
    self.available = false;
    self.occupant = Some(aircraft);
  }

  pub fn release(&mut self, now: u64) {
    self.available = true;
    self.occupant = None;
    self.free_since = now;
  }
}
