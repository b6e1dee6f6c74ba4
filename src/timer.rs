//! Session countdown: one tokio task per timed session.
//!
//! The task holds only a weak reference, so dropping the session ends it. It
//! stops after the tick that submits, after any tick that finds the session
//! already submitted, or when aborted by a manual submit.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, instrument};

use crate::live::LiveSession;
use crate::session::Tick;

#[instrument(level = "debug", skip(session))]
pub fn spawn_countdown(session: Weak<LiveSession>, period: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticks.tick().await;
      let Some(live) = session.upgrade() else {
        debug!(target: "quiz", "Session dropped; countdown ends");
        break;
      };
      match live.tick().await {
        Tick::Running { remaining } => {
          debug!(target: "quiz", session_id = %live.id, remaining, "Countdown tick");
        }
        Tick::Expired(_) | Tick::Idle => break,
      }
    }
  })
}
