//! Triage routing: pick the specialist for an incoming query.
//!
//! Classification is the one place the completion service decides branching.
//! The request is structured (answer with a single category word) and the
//! parse is deliberately forgiving; anything malformed, ambiguous, or failed
//! routes to General rather than failing the turn.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::agent::AgentKind;
use crate::completion::CompletionProvider;
use crate::context::Query;
use crate::items::Message;

const CLASSIFIER_PERSONA: &str = "You are the first point of contact for a customer support desk. \
     Classify the user's message into exactly one category. \
     Respond with a single word: billing, technical, or general. No other text.";

/// Routes a query to the specialist whose domain best matches it.
pub struct TriageRouter {
    provider: Arc<dyn CompletionProvider>,
}

impl TriageRouter {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Classify a query. Never fails: degraded or unparsable classifications
    /// land on [`AgentKind::General`].
    pub async fn classify(&self, query: &Query) -> AgentKind {
        let history = [Message::user(query.text())];
        match self
            .provider
            .complete(CLASSIFIER_PERSONA, &history, &[])
            .await
        {
            Ok(completion) => match completion.text.as_deref().and_then(parse_category) {
                Some(kind) => {
                    debug!(user = %query.user().name, specialist = %kind, "triage classified query");
                    kind
                }
                None => {
                    warn!(raw = ?completion.text, "unparsable classification, routing to general");
                    AgentKind::General
                }
            },
            Err(e) => {
                warn!(error = %e, "classification call failed, routing to general");
                AgentKind::General
            }
        }
    }
}

/// Extract a specialist category from classifier output.
///
/// Accepts a bare word, surrounding prose, or a `{"category": "..."}` object.
/// Triage itself is never a valid destination.
fn parse_category(text: &str) -> Option<AgentKind> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(category) = value.get("category").and_then(|v| v.as_str()) {
                return AgentKind::parse(category).filter(|k| *k != AgentKind::Triage);
            }
        }
    }

    trimmed
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .find_map(AgentKind::parse)
        .filter(|k| *k != AgentKind::Triage)
}
