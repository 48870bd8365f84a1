//! Bridge from OS shutdown signals to the recorder's stop request

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::StopSignal;

/// Forwards SIGINT and SIGTERM to a [`StopSignal`] while alive.
///
/// It only requests the stop; reaping and output checks stay with the
/// recorder's `wait`. Repeated signals after the first are no-ops.
pub struct ShutdownSignal {
    tasks: Vec<JoinHandle<()>>,
}

impl ShutdownSignal {
    /// Register handlers for SIGINT and SIGTERM
    pub fn install(stop: StopSignal) -> Result<Self, std::io::Error> {
        let tasks = [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
        ]
        .into_iter()
        .map(|(kind, name)| -> Result<JoinHandle<()>, std::io::Error> {
            let mut stream = signal(kind)?;
            let stop = stop.clone();
            Ok(tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    if stop.request() {
                        debug!("Received {}, stopping recording", name);
                    } else {
                        debug!("Received {} again, stop already requested", name);
                    }
                }
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { tasks })
    }
}

impl Drop for ShutdownSignal {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
