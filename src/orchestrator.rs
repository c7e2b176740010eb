use serde_json::Value;
use std::sync::Arc;
use tracing::{info, error};

use crate::{
    alerts::Alerts,
    models::TryOnResponse,
    session::{LogPolicy, Precondition, SharedSession, SubmissionSnapshot, Ticket},
    tryon::{preview, BackendReply, FilePart, SubmissionForm, TryOnBackend, TryOnError},
};

pub const MISSING_PHOTO: &str = "Please upload your photo first!";
pub const EMPTY_SELECTION: &str = "Please select at least one clothing item!";
pub const GENERATED: &str = "Try-on images generated!";
pub const GENERIC_FAILURE: &str = "Try-on generation failed";

const PREPARING: &str = "🚀 Preparing try-on request...";
const SENDING: &str = "📤 Sending images to the AI stylist...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Rejected(Precondition),
    Succeeded,
    Failed(String),
}

/// Runs one try-on submission end to end against a session: precondition
/// check, multipart assembly, the POST, and folding the reply back in.
pub struct Orchestrator {
    backend: Arc<dyn TryOnBackend>,
    alerts: Arc<Alerts>,
    policy: LogPolicy,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn TryOnBackend>, alerts: Arc<Alerts>, policy: LogPolicy) -> Self {
        Self { backend, alerts, policy }
    }

    pub async fn generate(&self, session: &SharedSession) -> Outcome {
        let checked = session.read().snapshot();
        let snapshot = match checked {
            Ok(snapshot) => snapshot,
            Err(missing) => {
                self.alerts.warning(match missing {
                    Precondition::MissingPhoto => MISSING_PHOTO,
                    Precondition::EmptySelection => EMPTY_SELECTION,
                });
                return Outcome::Rejected(missing);
            }
        };

        let ticket = {
            let mut state = session.write();
            let ticket = state.start_submit();
            state.push_log(ticket, PREPARING);
            ticket
        };
        info!("🚀 Starting try-on with {} clothing items, size {}", snapshot.items.len(), snapshot.size);

        let outcome = match self.run(session, ticket, snapshot).await {
            Ok(response) => {
                let count = response.results.as_ref().map_or(0, Vec::len);
                session.write().apply_success(ticket, response, self.policy);
                info!("✅ Try-on finished with {} results", count);
                self.alerts.success(GENERATED);
                Outcome::Succeeded
            }
            Err(e) => {
                let message = e.to_string();
                error!("❌ Try-on failed: {}", message);
                session.write().apply_failure(ticket, &message);
                self.alerts.error(message.clone());
                Outcome::Failed(message)
            }
        };

        session.write().finish(ticket);
        outcome
    }

    async fn run(&self, session: &SharedSession, ticket: Ticket, snapshot: SubmissionSnapshot) -> Result<TryOnResponse, TryOnError> {
        let photo = snapshot.photo;
        let person = FilePart { filename: photo.filename, mime: photo.mime.to_string(), bytes: photo.bytes };

        let mut clothing = Vec::with_capacity(snapshot.items.len());
        for item in &snapshot.items {
            session.write().push_log(ticket, format!("👕 Adding {}...", item.name));
            clothing.push(self.backend.fetch_asset(item).await?);
        }

        session.write().push_log(ticket, SENDING);
        let reply = self.backend.submit(SubmissionForm { person, size: snapshot.size, clothing }).await?;
        interpret(reply)
    }
}

/// Turns the raw reply into a response or the error to surface. Any non-2xx
/// status fails, using the body's `detail` when there is one.
pub fn interpret(reply: BackendReply) -> Result<TryOnResponse, TryOnError> {
    if !reply.is_success() {
        let detail = serde_json::from_slice::<TryOnResponse>(&reply.body)
            .ok()
            .and_then(|body| match body.detail {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
                Some(Value::Null) | Some(Value::String(_)) | None => None,
                Some(other) => Some(other.to_string()),
            });
        error!("❌ Try-on service returned {}: {}", reply.status, preview(&String::from_utf8_lossy(&reply.body)));
        return Err(TryOnError::Service(detail.unwrap_or_else(|| GENERIC_FAILURE.to_string())));
    }
    serde_json::from_slice(&reply.body).map_err(|e| TryOnError::InvalidResponse(e.to_string()))
}
