use parking_lot::RwLock;
use serde::{Serialize, Deserialize};
use std::{str::FromStr, sync::Arc};

use crate::{
    models::{ClothingItem, Size, TryOnResponse, TryOnResult},
    photo::{PersonPhoto, PhotoView},
    selection::{SelectionSet, Toggle},
};

pub type SharedSession = Arc<RwLock<SessionState>>;

const RECOMMENDATION_MARKER: &str = "Gemini recommendation:";
pub const FAILURE_PREFIX: &str = "❌ Error:";

/// How server-reported logs combine with the lines written while preparing
/// the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogPolicy {
    /// Server logs overwrite the preparation lines.
    #[default]
    Replace,
    Append,
}

impl LogPolicy {
    pub fn apply(self, current: &mut Vec<String>, server: Vec<String>) {
        match self {
            LogPolicy::Replace => *current = server,
            LogPolicy::Append => current.extend(server),
        }
    }
}

impl FromStr for LogPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(LogPolicy::Replace),
            "append" => Ok(LogPolicy::Append),
            other => Err(format!("unknown log policy '{other}'")),
        }
    }
}

/// Everything one try-on session knows. Mutated only through the named
/// transitions below; readers get a [`SessionView`].
#[derive(Debug, Default)]
pub struct SessionState {
    photo: Option<PersonPhoto>,
    selection: SelectionSet,
    size: Size,
    busy: bool,
    logs: Vec<String>,
    results: Vec<TryOnResult>,
    recommendation: Option<String>,
    epoch: u64,
}

/// Identifies one submission. Transitions carrying a ticket from before the
/// latest `start_submit` or `reset` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    pub photo: Option<PhotoView>,
    pub selection: Vec<ClothingItem>,
    pub size: Size,
    pub busy: bool,
    pub logs: Vec<String>,
    pub results: Vec<TryOnResult>,
    pub recommendation: Option<String>,
}

/// Inputs captured at the moment a submission starts.
#[derive(Debug, Clone)]
pub struct SubmissionSnapshot {
    pub photo: PersonPhoto,
    pub items: Vec<ClothingItem>,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    MissingPhoto,
    EmptySelection,
}

impl SessionState {
    pub fn shared() -> SharedSession { Arc::new(RwLock::new(Self::default())) }

    pub fn view(&self) -> SessionView {
        SessionView {
            photo: self.photo.as_ref().map(PersonPhoto::view),
            selection: self.selection.items().to_vec(),
            size: self.size,
            busy: self.busy,
            logs: self.logs.clone(),
            results: self.results.clone(),
            recommendation: self.recommendation.clone(),
        }
    }

    pub fn is_busy(&self) -> bool { self.busy }

    pub fn results(&self) -> &[TryOnResult] { &self.results }

    pub fn set_photo(&mut self, photo: PersonPhoto) { self.photo = Some(photo); }

    pub fn clear_photo(&mut self) { self.photo = None; }

    pub fn toggle(&mut self, item: &ClothingItem) -> Toggle { self.selection.toggle(item) }

    pub fn clear_selection(&mut self) { self.selection.clear(); }

    pub fn set_size(&mut self, size: Size) { self.size = size; }

    /// Checks the submission preconditions without touching any state.
    pub fn snapshot(&self) -> Result<SubmissionSnapshot, Precondition> {
        let photo = self.photo.clone().ok_or(Precondition::MissingPhoto)?;
        if self.selection.is_empty() {
            return Err(Precondition::EmptySelection);
        }
        Ok(SubmissionSnapshot { photo, items: self.selection.items().to_vec(), size: self.size })
    }

    pub fn start_submit(&mut self) -> Ticket {
        self.epoch += 1;
        self.busy = true;
        self.logs.clear();
        self.results.clear();
        self.recommendation = None;
        Ticket(self.epoch)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool { ticket.0 == self.epoch }

    pub fn push_log(&mut self, ticket: Ticket, line: impl Into<String>) {
        if self.is_current(ticket) {
            self.logs.push(line.into());
        }
    }

    pub fn apply_success(&mut self, ticket: Ticket, response: TryOnResponse, policy: LogPolicy) {
        if !self.is_current(ticket) {
            return;
        }
        if let Some(logs) = response.logs {
            policy.apply(&mut self.logs, logs);
        }
        if let Some(results) = response.results {
            self.results = results;
        }
        self.recommendation = extract_recommendation(&self.logs);
    }

    pub fn apply_failure(&mut self, ticket: Ticket, message: &str) {
        if self.is_current(ticket) {
            self.logs.push(format!("{FAILURE_PREFIX} {message}"));
        }
    }

    pub fn finish(&mut self, ticket: Ticket) {
        if self.is_current(ticket) {
            self.busy = false;
        }
    }

    /// Back to a fresh session; any submission still in flight becomes stale.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self::default();
        self.epoch = epoch;
    }
}

/// First log line carrying the stylist marker, with its decoration removed.
pub fn extract_recommendation(logs: &[String]) -> Option<String> {
    logs.iter()
        .find_map(|line| line.split_once(RECOMMENDATION_MARKER))
        .map(|(_, rest)| rest.trim().to_string())
}
