use chrono::{DateTime, Local};
use log::{debug, info};
use serde::Serialize;

/// One human-readable line of the operator log.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    #[serde(serialize_with = "bc_serde_util::serialize_time")]
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}

/// Sending half of the operator log. Tasks hold a clone and record a line for
/// every state-changing action; whoever owns the receiver is the only writer
/// of the log itself.
#[derive(Clone, Debug)]
pub struct Journal {
    tx: flume::Sender<LogEntry>,
}

impl Journal {
    pub fn channel() -> (Journal, flume::Receiver<LogEntry>) {
        // unbounded so that hardware code never waits on the log reader
        let (tx, rx) = flume::unbounded();
        (Journal { tx }, rx)
    }

    pub fn record(&self, message: impl Into<String>) {
        let entry = LogEntry::new(message);

        info!("{}", entry.message);

        if self.tx.send(entry).is_err() {
            debug!("log reader is gone, dropping entry");
        }
    }
}
