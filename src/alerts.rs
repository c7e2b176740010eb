use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{info, warn, error};

const MAX_PENDING: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level { Success, Warning, Error }

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// User-facing alert channel. The page polls and drains it; the oldest
/// entries fall off once `MAX_PENDING` is reached.
#[derive(Debug, Default)]
pub struct Alerts {
    pending: Mutex<VecDeque<Notification>>,
}

impl Alerts {
    pub fn success(&self, message: impl Into<String>) { self.push(Level::Success, message.into()) }

    pub fn warning(&self, message: impl Into<String>) { self.push(Level::Warning, message.into()) }

    pub fn error(&self, message: impl Into<String>) { self.push(Level::Error, message.into()) }

    fn push(&self, level: Level, message: String) {
        match level {
            Level::Success => info!("🔔 {}", message),
            Level::Warning => warn!("🔔 {}", message),
            Level::Error => error!("🔔 {}", message),
        }
        let mut pending = self.pending.lock();
        if pending.len() == MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(Notification { level, message, at: Utc::now() });
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.pending.lock().drain(..).collect()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<(Level, String)> {
        self.pending.lock().iter().map(|n| (n.level, n.message.clone())).collect()
    }
}
