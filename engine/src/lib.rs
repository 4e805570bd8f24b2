use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub mod allocator;
pub mod config;
pub mod engine;
pub mod entities;
pub mod generator;
pub mod violation;

pub const DEFAULT_TICK_RATE_TPS: usize = 1;

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

pub fn duration_now() -> Duration {
  SystemTime::now().duration_since(UNIX_EPOCH).unwrap()
}

/// Hands out monotonically increasing ids. Each entity family (aircraft,
/// violation notices) owns its own sequence instead of a process-global
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
  next: u32,
}

impl IdSequence {
  pub fn starting_at(next: u32) -> Self {
    Self { next }
  }

  pub fn next_id(&mut self) -> u32 {
    let id = self.next;
    self.next += 1;
    id
  }
}

impl Default for IdSequence {
  fn default() -> Self {
    Self::starting_at(1000)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_id_sequence_monotonic() {
    let mut ids = IdSequence::default();
    assert_eq!(ids.next_id(), 1000);
    assert_eq!(ids.next_id(), 1001);
    assert_eq!(ids.next_id(), 1002);
  }

  #[test]
  fn test_id_sequence_starting_at() {
    let mut ids = IdSequence::starting_at(2000);
    assert_eq!(ids.next_id(), 2000);
    assert_eq!(ids.next_id(), 2001);
  }
}
