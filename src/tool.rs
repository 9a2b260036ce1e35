//! Tool system with context-gated activation.
//!
//! Tools are named capabilities behind a stable `(context, args) -> result`
//! contract, registered in a static table built at startup. Every tool carries
//! an activation predicate over the session's [`UserContext`]; the registry
//! evaluates the predicate fresh on every call and never executes a gated
//! action. A failed predicate yields [`ToolOutcome::Rejected`], which the
//! orchestrator surfaces to the agent as a normal outcome rather than a
//! silent no-op.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

use crate::context::UserContext;
use crate::error::{Result, SupportError};
use crate::items::ToolSpec;

/// Outcome of a registry invocation.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// The action ran to completion.
    Completed(Value),
    /// The activation predicate did not hold; the action was never started.
    Rejected { reason: String },
    /// The action started but its function failed.
    Failed { error: String },
}

impl ToolOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ToolOutcome::Completed(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ToolOutcome::Rejected { .. })
    }
}

/// Trait for all tools available to agents.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    /// Whether the tool may run for this user with these arguments.
    ///
    /// Pure and evaluated fresh per call; entitlement flags are fixed for the
    /// session but arguments vary.
    fn is_enabled(&self, _user: &UserContext, _arguments: &Value) -> bool {
        true
    }

    /// The reason reported when `is_enabled` fails.
    fn rejection_reason(&self, _user: &UserContext) -> String {
        format!("the {} action is not available for this request", self.name())
    }

    /// Execute the tool's action. Only called after `is_enabled` passed.
    async fn execute(&self, user: &UserContext, arguments: Value) -> Result<Value>;

    /// Advertisement for the completion backend.
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name(), self.description(), self.parameters_schema())
    }
}

type ActionFn = dyn Fn(&UserContext, Value) -> Result<Value> + Send + Sync;
type PredicateFn = dyn Fn(&UserContext, &Value) -> bool + Send + Sync;

/// A function-based tool with an optional activation predicate.
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters_schema: Value,
    action: Arc<ActionFn>,
    predicate: Option<Arc<PredicateFn>>,
    rejection: Option<String>,
}

impl Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("gated", &self.predicate.is_some())
            .finish()
    }
}

impl FunctionTool {
    /// Create a new function tool. Ungated until a predicate is attached.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: Value,
        action: F,
    ) -> Self
    where
        F: Fn(&UserContext, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
            action: Arc::new(action),
            predicate: None,
            rejection: None,
        }
    }

    /// Create a tool that takes no arguments.
    pub fn simple<F>(name: &str, description: &str, action: F) -> Self
    where
        F: Fn(&UserContext) -> Value + Send + Sync + 'static,
    {
        Self::new(
            name,
            description,
            serde_json::json!({ "type": "object", "properties": {} }),
            move |user, _args| Ok(action(user)),
        )
    }

    /// Attach an activation predicate.
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&UserContext, &Value) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Set the reason surfaced when the predicate rejects a call.
    pub fn with_rejection(mut self, reason: impl Into<String>) -> Self {
        self.rejection = Some(reason.into());
        self
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters_schema.clone()
    }

    fn is_enabled(&self, user: &UserContext, arguments: &Value) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(user, arguments),
            None => true,
        }
    }

    fn rejection_reason(&self, _user: &UserContext) -> String {
        self.rejection
            .clone()
            .unwrap_or_else(|| format!("the {} action is not available for this request", self.name))
    }

    async fn execute(&self, user: &UserContext, arguments: Value) -> Result<Value> {
        (self.action)(user, arguments)
    }
}

/// Static table of tools, shared by reference across agents.
///
/// The registry owns invocation: predicate first, action at most once per
/// successful invocation, no automatic retries.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name on behalf of a user.
    ///
    /// Returns `Rejected` without running the action when the activation
    /// predicate does not hold against the current context.
    pub async fn invoke(
        &self,
        name: &str,
        user: &UserContext,
        arguments: Value,
    ) -> Result<ToolOutcome> {
        let tool = self.get(name).ok_or_else(|| SupportError::UnknownTool {
            name: name.to_string(),
        })?;

        if !tool.is_enabled(user, &arguments) {
            let reason = tool.rejection_reason(user);
            debug!(tool = name, user = %user.name, %reason, "tool call rejected");
            return Ok(ToolOutcome::Rejected { reason });
        }

        match tool.execute(user, arguments).await {
            Ok(output) => Ok(ToolOutcome::Completed(output)),
            Err(e) => Ok(ToolOutcome::Failed {
                error: e.to_string(),
            }),
        }
    }
}
