//! Agent definitions: identity, persona, owned tools, permitted handoffs.
//!
//! An [`AgentDefinition`] is static configuration built at startup and never
//! mutated afterwards; sessions share the roster by reference. Which agent is
//! *active* is session state owned by the orchestrator, not by this module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SupportError};
use crate::items::ToolSpec;
use crate::tool::Tool;

/// Prefix used when a handoff target is advertised to the model as a tool.
pub const HANDOFF_TOOL_PREFIX: &str = "transfer_to_";

/// The fixed set of desk roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Triage,
    Billing,
    Technical,
    General,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Triage => "triage",
            AgentKind::Billing => "billing",
            AgentKind::Technical => "technical",
            AgentKind::General => "general",
        }
    }

    /// Case-insensitive lookup; tolerates an `_agent` suffix as produced by
    /// `transfer_to_billing_agent`-style tool names.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.strip_suffix("_agent").unwrap_or(&normalized);
        match normalized {
            "triage" => Some(AgentKind::Triage),
            "billing" => Some(AgentKind::Billing),
            "technical" => Some(AgentKind::Technical),
            "general" => Some(AgentKind::General),
            _ => None,
        }
    }

    /// The tool name under which a transfer to this agent is advertised.
    pub fn handoff_tool_name(&self) -> String {
        format!("{}{}", HANDOFF_TOOL_PREFIX, self.as_str())
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static configuration for one specialist.
#[derive(Clone)]
pub struct AgentDefinition {
    /// Which role this definition fills.
    pub kind: AgentKind,

    /// Display name, used in events and logs.
    pub name: String,

    /// The persona/instruction text that primes the completion backend.
    pub instructions: String,

    /// Tools this agent may ask for. Shared by reference with the registry.
    pub tools: Vec<Arc<dyn Tool>>,

    /// Agents this one is permitted to hand off to.
    pub handoffs: Vec<AgentKind>,
}

impl AgentDefinition {
    pub fn new(
        kind: AgentKind,
        name: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            instructions: instructions.into(),
            tools: vec![],
            handoffs: vec![],
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn with_handoff(mut self, target: AgentKind) -> Self {
        self.handoffs.push(target);
        self
    }

    pub fn with_handoffs(mut self, targets: Vec<AgentKind>) -> Self {
        self.handoffs.extend(targets);
        self
    }

    /// Whether this agent declared `target` as a permitted handoff.
    pub fn can_hand_off_to(&self, target: AgentKind) -> bool {
        self.handoffs.contains(&target)
    }

    /// The system persona sent to the completion backend: instructions plus
    /// descriptions of the available tools and handoff targets.
    pub fn persona(&self) -> String {
        let mut content = self.instructions.clone();

        if !self.tools.is_empty() {
            content.push_str("\n\nYou have access to the following tools:\n");
            for tool in &self.tools {
                content.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
            }
        }

        if !self.handoffs.is_empty() {
            content.push_str("\n\nYou can transfer the conversation by calling one of:\n");
            for target in &self.handoffs {
                content.push_str(&format!("- {}\n", target.handoff_tool_name()));
            }
        }

        content
    }

    /// Everything advertised to the model: own tools plus handoff transfers.
    pub fn advertised_tools(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.iter().map(|t| t.spec()).collect();
        for target in &self.handoffs {
            specs.push(ToolSpec::new(
                target.handoff_tool_name(),
                format!("Transfer the conversation to the {} specialist", target),
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "reason": { "type": "string", "description": "Reason for the transfer" }
                    }
                }),
            ));
        }
        specs
    }
}

impl fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("tools_count", &self.tools.len())
            .field("handoffs", &self.handoffs)
            .finish()
    }
}

/// The full set of agent definitions, built once at startup.
#[derive(Debug, Default)]
pub struct AgentRoster {
    agents: HashMap<AgentKind, Arc<AgentDefinition>>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent: AgentDefinition) -> Self {
        self.agents.insert(agent.kind, Arc::new(agent));
        self
    }

    pub fn get(&self, kind: AgentKind) -> Result<Arc<AgentDefinition>> {
        self.agents
            .get(&kind)
            .cloned()
            .ok_or_else(|| SupportError::UnknownAgent {
                name: kind.to_string(),
            })
    }

    pub fn contains(&self, kind: AgentKind) -> bool {
        self.agents.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
