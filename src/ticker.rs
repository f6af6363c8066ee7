//! One-second scheduler driving an `IntervalTimer`
//!
//! The ticker is the only thing that calls `tick()` in the running app.
//! Dropping it aborts the background task, so a disposed screen can never
//! be ticked by a leaked trigger.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

use crate::timer::{IntervalTimer, TimerEvent};

pub type SharedTimer = Arc<Mutex<IntervalTimer>>;

/// Tick period used by the app
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn the recurring trigger on the current tokio runtime.
    ///
    /// Events produced by ticks are forwarded to `events`; a closed receiver
    /// is not an error, the timer keeps being driven until cancellation.
    pub fn spawn(timer: SharedTimer, period: Duration, events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let event = match timer.lock() {
                    Ok(mut t) => t.tick(),
                    Err(_) => {
                        error!("Timer lock poisoned, stopping ticker");
                        break;
                    }
                };

                if let Some(ev) = event {
                    let _ = events.send(ev);
                }
            }
        });

        debug!("Ticker spawned (period {:?})", period);
        Self { handle }
    }

    /// Cancel the pending trigger. Equivalent to dropping.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Ticker cancelled");
    }
}
