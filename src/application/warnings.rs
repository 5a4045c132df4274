//! Non-fatal error queue
//!
//! The remote client reports warnings over a channel; the main thread
//! drains it between units of work, so console output stays ordered.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver};

use tracing::warn;

use crate::infrastructure::traits::{NonFatalError, Notifier};

/// Receiving end of the non-fatal error channel.
pub struct WarningQueue {
    rx: Receiver<NonFatalError>,
}

impl WarningQueue {
    /// Create the queue and the notifier handed to the client.
    pub fn channel() -> (Notifier, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    /// Write all pending warnings as `Exception: <message>` lines.
    ///
    /// Returns the number of warnings written.
    pub fn drain_into(&self, err: &mut dyn Write) -> io::Result<usize> {
        let mut count = 0;
        for warning in self.rx.try_iter() {
            warn!("non-fatal error: {}", warning.message);
            writeln!(err, "Exception: {}", warning.message)?;
            count += 1;
        }
        Ok(count)
    }
}
