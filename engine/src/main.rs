use engine::{
  config::SimConfig,
  engine::{Engine, OutgoingReply},
};
use turborand::rng::Rng;

fn main() {
  tracing_subscriber::fmt::init();

  let (_command_tx, command_rx) = async_channel::unbounded();
  let (event_tx, mut event_rx) = async_broadcast::broadcast(512);

  let mut engine = Engine::new(
    SimConfig::default(),
    Rng::new(),
    command_rx,
    event_tx,
    None,
  );

  for _ in 0..300 {
    engine.tick();

    while let Ok(reply) = event_rx.try_recv() {
      match reply {
        OutgoingReply::NoticeCreated(notice) => {
          println!(
            "notice #{}: {} flight {} at {} km/h (permitted {}-{})",
            notice.id,
            notice.airline,
            notice.flight_number,
            notice.recorded_speed,
            notice.min_speed,
            notice.max_speed
          );
        }
        OutgoingReply::Status(status) => {
          if status.tick % 60 == 0 {
            println!(
              "tick {}: {} active, {} completed, {} unpaid notices",
              status.tick, status.active, status.completed, status.unpaid_notices
            );
          }
        }
      }
    }
  }
}
