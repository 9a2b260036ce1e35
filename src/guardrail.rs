//! Output guardrails: tone-policy checks applied to agent replies.
//!
//! A reply drafted by an agent is validated by the [`GuardrailEngine`] before
//! it ever reaches the event stream. Rules are a configurable ordered list;
//! the first failing rule produces the verdict. The shipped rule blocks
//! apologetic language ("sorry") with whole-word matching, so text that only
//! embeds the marker inside another word passes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// Outcome of validating one candidate reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub passed: bool,
    pub reason: Option<String>,
}

impl GuardrailVerdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Trait for output guardrails that validate agent replies.
#[async_trait]
pub trait OutputGuardrail: Send + Sync {
    fn name(&self) -> &str;
    fn priority(&self) -> i32 {
        0
    }
    async fn check(&self, output: &str) -> Result<GuardrailVerdict>;
}

/// Runs a rule list against candidate replies in descending priority order.
#[derive(Default)]
pub struct GuardrailEngine {
    rules: Vec<Arc<dyn OutputGuardrail>>,
}

impl GuardrailEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: Arc<dyn OutputGuardrail>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate a candidate reply. The first failing rule wins.
    pub async fn check(&self, candidate: &str) -> Result<GuardrailVerdict> {
        let mut rules = self.rules.clone();
        rules.sort_by_key(|r| -r.priority());
        for rule in rules {
            let verdict = rule.check(candidate).await?;
            if !verdict.passed {
                return Ok(GuardrailVerdict {
                    passed: false,
                    reason: verdict.reason.or_else(|| Some(rule.name().to_string())),
                });
            }
        }
        Ok(GuardrailVerdict::pass())
    }
}

/// Blocks replies containing apologetic markers as whole words.
///
/// Matching is case-insensitive and tokenizes on non-alphanumeric boundaries:
/// "Sorry, that failed" is blocked, "the accessorry shelf" is not.
#[derive(Debug, Clone)]
pub struct ApologyGuardrail {
    name: String,
    markers: Vec<String>,
}

impl Default for ApologyGuardrail {
    fn default() -> Self {
        Self::new()
    }
}

impl ApologyGuardrail {
    pub fn new() -> Self {
        Self {
            name: "NoApology".to_string(),
            markers: vec!["sorry".to_string()],
        }
    }

    /// Replace the default marker set.
    pub fn with_markers(mut self, markers: Vec<String>) -> Self {
        self.markers = markers.into_iter().map(|m| m.to_lowercase()).collect();
        self
    }

    fn find_marker(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if let Some(marker) = self.markers.iter().find(|m| m.as_str() == word) {
                return Some(marker);
            }
        }
        None
    }
}

#[async_trait]
impl OutputGuardrail for ApologyGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, output: &str) -> Result<GuardrailVerdict> {
        match self.find_marker(output) {
            Some(marker) => Ok(GuardrailVerdict::fail(format!(
                "reply contains apologetic marker: {}",
                marker
            ))),
            None => Ok(GuardrailVerdict::pass()),
        }
    }
}
