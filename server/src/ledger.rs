use internment::Intern;
use thiserror::Error;
use tracing::info;

use engine::{
  config::{FineSchedule, SpeedBand},
  duration_now,
  engine::{IncomingUpdate, NoticeCreated, OutgoingReply},
  entities::avn::{Avn, AvnId, PaymentStatus},
};

#[derive(Debug, Error)]
pub enum LedgerError {
  #[error("notice #{0} not found")]
  NotFound(AvnId),
  #[error("insufficient payment, PKR {required:.2} required")]
  Insufficient { required: f64 },
  #[error("scheduler is no longer listening for payment updates")]
  EngineGone,
}

/// The violation-notice ledger: the external collaborator that consumes
/// `NoticeCreated` events, answers queries, and processes payments. On a
/// successful payment it reports the status change back to the scheduling
/// core over the command channel.
#[derive(Debug)]
pub struct Ledger {
  fines: FineSchedule,
  notices: Vec<Avn>,
  updates: async_channel::Sender<IncomingUpdate>,
}

impl Ledger {
  pub fn new(
    fines: FineSchedule,
    updates: async_channel::Sender<IncomingUpdate>,
  ) -> Self {
    Self {
      fines,
      notices: Vec::new(),
      updates,
    }
  }

  /// Files the event as a full notice record. Fine, fee, and due date are
  /// recomputed here from the category and the ledger's fee schedule.
  pub fn record(&mut self, notice: &NoticeCreated) {
    let avn = Avn::issue(
      notice.id,
      Intern::from(notice.airline.clone()),
      Intern::from(notice.flight_number.clone()),
      notice.category,
      notice.recorded_speed,
      SpeedBand::new(notice.min_speed, notice.max_speed),
      &self.fines,
    );

    info!(
      "recorded notice #{} for {} flight {}: PKR {:.2} due {}s",
      avn.id,
      avn.airline,
      avn.flight_number,
      avn.total,
      avn.due_by.as_secs()
    );
    self.notices.push(avn);
  }

  pub fn get(&mut self, id: AvnId) -> Result<&Avn, LedgerError> {
    self.refresh_overdue();
    self
      .notices
      .iter()
      .find(|n| n.id == id)
      .ok_or(LedgerError::NotFound(id))
  }

  pub fn for_airline(&self, airline: &str) -> Vec<&Avn> {
    self
      .notices
      .iter()
      .filter(|n| n.airline.as_str() == airline)
      .collect()
  }

  /// Settles a notice. The amount must cover the full total (fine plus
  /// service fee); the paid status is reported back to the core.
  pub async fn pay(
    &mut self,
    id: AvnId,
    amount: f64,
  ) -> Result<f64, LedgerError> {
    self.refresh_overdue();

    let total = {
      let notice = self
        .notices
        .iter_mut()
        .find(|n| n.id == id)
        .ok_or(LedgerError::NotFound(id))?;

      if amount < notice.total {
        return Err(LedgerError::Insufficient {
          required: notice.total,
        });
      }

      notice.status = PaymentStatus::Paid;
      notice.total
    };

    self
      .updates
      .send(IncomingUpdate::PaymentStatus {
        notice_id: id,
        paid: true,
      })
      .await
      .map_err(|_| LedgerError::EngineGone)?;

    info!("payment processed for notice #{}: PKR {:.2}", id, amount);
    Ok(total)
  }

  fn refresh_overdue(&mut self) {
    let now = duration_now();
    for notice in self.notices.iter_mut() {
      if notice.is_past_due(now) {
        notice.status = PaymentStatus::Overdue;
      }
    }
  }

  /// Consumes the core's outbound event stream until it closes. A lagging
  /// receiver only loses old events; it keeps running.
  pub async fn run(
    mut self,
    mut events: async_broadcast::Receiver<OutgoingReply>,
  ) {
    loop {
      match events.recv().await {
        Ok(OutgoingReply::NoticeCreated(notice)) => self.record(&notice),
        Ok(_) => {}
        Err(async_broadcast::RecvError::Overflowed(missed)) => {
          tracing::warn!("ledger fell behind; {missed} events dropped");
        }
        Err(async_broadcast::RecvError::Closed) => break,
      }
    }
  }
}
