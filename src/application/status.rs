//! Periodic elapsed-time status while a session runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;

use crate::domain::recording::{format_elapsed, is_status_tick};

use super::stop::StopSignal;

/// Status line printed every reporting interval
pub fn status_line(elapsed_secs: u64) -> String {
    format!("{} recording… press Ctrl+C to stop", format_elapsed(elapsed_secs))
}

/// Background ticker owned by the recorder.
///
/// Runs while `running` is set and no stop was requested. It only reads
/// shared state; the pipeline never waits on it.
pub struct StatusReporter {
    handle: JoinHandle<()>,
}

impl StatusReporter {
    /// Spawn the ticker
    pub fn spawn(started_at: Instant, running: Arc<AtomicBool>, stop: StopSignal) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_reported = 0;

            loop {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) || stop.is_requested() {
                    break;
                }

                let elapsed = started_at.elapsed().as_secs();
                if is_status_tick(elapsed) && elapsed != last_reported {
                    last_reported = elapsed;
                    info!("{}", status_line(elapsed));
                }
            }
        });

        Self { handle }
    }

    /// Whether the ticker loop has ended on its own
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the ticker and wait for it to go away
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}
