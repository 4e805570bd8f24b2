use std::cmp::Reverse;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{
  aircraft::{Aircraft, AircraftId, Direction, FlightCategory},
  runway::{Runway, RunwayId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Pending {
  id: AircraftId,
  priority: u8,
  scheduled_at: u64,
  seq: u64,
}

/// A runway's waiting line. Requests pop highest-priority first; ties go to
/// the earlier scheduled tick, then to the earlier enqueue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayQueue {
  pending: Vec<Pending>,
  next_seq: u64,
}

impl RunwayQueue {
  fn push(&mut self, aircraft: &Aircraft) {
    self.pending.push(Pending {
      id: aircraft.id,
      priority: aircraft.priority,
      scheduled_at: aircraft.scheduled_at,
      seq: self.next_seq,
    });
    self.next_seq += 1;
  }

  fn pop_next(&mut self) -> Option<Pending> {
    let index = self
      .pending
      .iter()
      .position_max_by_key(|p| (p.priority, Reverse(p.scheduled_at), Reverse(p.seq)))?;

    Some(self.pending.remove(index))
  }

  fn requeue(&mut self, pending: Pending) {
    self.pending.push(pending);
  }

  pub fn len(&self) -> usize {
    self.pending.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }
}

/// Owns the three runways and their waiting lines. All runway mutation goes
/// through here; the tick loop is single-threaded, so exclusive ownership
/// stands in for per-runway locks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayAllocator {
  runways: [Runway; 3],
  queues: [RunwayQueue; 3],
}

impl Default for RunwayAllocator {
  fn default() -> Self {
    Self {
      runways: [
        Runway::new(RunwayId::A),
        Runway::new(RunwayId::B),
        Runway::new(RunwayId::C),
      ],
      queues: [
        RunwayQueue::default(),
        RunwayQueue::default(),
        RunwayQueue::default(),
      ],
    }
  }
}

fn index(id: RunwayId) -> usize {
  match id {
    RunwayId::A => 0,
    RunwayId::B => 1,
    RunwayId::C => 2,
  }
}

impl RunwayAllocator {
  pub fn runway(&self, id: RunwayId) -> &Runway {
    &self.runways[index(id)]
  }

  fn runway_mut(&mut self, id: RunwayId) -> &mut Runway {
    &mut self.runways[index(id)]
  }

  pub fn runways(&self) -> &[Runway; 3] {
    &self.runways
  }

  pub fn queue_len(&self, id: RunwayId) -> usize {
    self.queues[index(id)].len()
  }

  /// A serves North/South arrivals, B serves East/West departures.
  pub fn native_runway(direction: Direction) -> RunwayId {
    match direction {
      Direction::North | Direction::South => RunwayId::A,
      Direction::East | Direction::West => RunwayId::B,
    }
  }

  /// Queues a request on the direction-native runway's line.
  pub fn enqueue(&mut self, aircraft: &Aircraft) {
    let native = Self::native_runway(aircraft.direction);
    self.queues[index(native)].push(aircraft);
  }

  /// Queues a request that may only ever be satisfied by runway C.
  pub fn enqueue_overflow(&mut self, aircraft: &Aircraft) {
    self.queues[index(RunwayId::C)].push(aircraft);
  }

  /// Candidate runways in attempt order. Emergency and cargo flights try
  /// the overflow runway first; everyone tries their direction-native
  /// runway; non-cargo flights may fall back to C. Requests queued directly
  /// on C never spill onto the primaries.
  fn preferences(aircraft: &Aircraft, origin: RunwayId) -> Vec<RunwayId> {
    if origin == RunwayId::C {
      return vec![RunwayId::C];
    }

    let mut prefs = Vec::with_capacity(3);
    if matches!(
      aircraft.category,
      FlightCategory::Emergency | FlightCategory::Cargo
    ) {
      prefs.push(RunwayId::C);
    }
    prefs.push(Self::native_runway(aircraft.direction));
    if aircraft.category != FlightCategory::Cargo
      && !prefs.contains(&RunwayId::C)
    {
      prefs.push(RunwayId::C);
    }

    prefs
  }

  /// Runs one assignment pass over the queues (A, then B, then C). Whatever
  /// cannot be placed goes back on its queue for the next tick; assignment
  /// never blocks.
  pub fn assign(&mut self, active: &mut [Aircraft], now: u64) {
    for origin in RunwayId::ALL {
      let mut unassigned: Vec<Pending> = Vec::new();

      while let Some(pending) = self.queues[index(origin)].pop_next() {
        let Some(aircraft) = active.iter_mut().find(|a| a.id == pending.id)
        else {
          // Retired while waiting; drop the request.
          continue;
        };

        if aircraft.runway.is_some() {
          continue;
        }

        let mut assigned = false;
        for candidate in Self::preferences(aircraft, origin) {
          if self.runways[index(candidate)].is_free(now) {
            self.runways[index(candidate)].occupy(aircraft.id);
            aircraft.runway = Some(candidate);
            info!(
              "assigned {} to {} ({})",
              candidate, aircraft.flight_number, aircraft.airline
            );
            assigned = true;
            break;
          }
        }

        if !assigned {
          unassigned.push(pending);
        }
      }

      for pending in unassigned {
        self.queues[index(origin)].requeue(pending);
      }
    }
  }

  /// Gives back every runway whose holder has passed its release
  /// checkpoint: arrivals once taxiing in, departures once climbing out.
  pub fn release_finished(&mut self, active: &mut [Aircraft], now: u64) {
    for aircraft in active.iter_mut() {
      let Some(held) = aircraft.runway else {
        continue;
      };

      if aircraft.phase.releases_runway() {
        aircraft.runway = None;
        self.runway_mut(held).release(now);
        info!(
          "released {} from {} ({})",
          held, aircraft.flight_number, aircraft.airline
        );
      }
    }
  }
}
