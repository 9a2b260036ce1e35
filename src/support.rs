//! The standard support desk: stock tools, specialist roster, and guardrails.
//!
//! This module is plain wiring. Everything here can be rebuilt by an embedder
//! with different personas, tools, or gating; the orchestrator does not care.

use std::sync::Arc;

use crate::agent::{AgentDefinition, AgentKind, AgentRoster};
use crate::guardrail::{ApologyGuardrail, GuardrailEngine};
use crate::tool::{FunctionTool, Tool, ToolRegistry};

/// Refund initiation, available to premium members only.
pub fn refund_tool() -> Arc<dyn Tool> {
    Arc::new(
        FunctionTool::simple(
            "refund",
            "Initiates a refund for the current user (premium members only)",
            |user| {
                serde_json::json!({
                    "message": format!(
                        "Refund for {} has been initiated. The amount will be returned \
                         within 5-7 business days.",
                        user.name
                    )
                })
            },
        )
        .with_predicate(|user, _args| user.premium)
        .with_rejection("not eligible for a refund"),
    )
}

/// Restarts the user's service connection. Ungated.
pub fn restart_service_tool() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::simple(
        "restart_service",
        "Restarts the user's service connection",
        |user| {
            serde_json::json!({
                "message": format!(
                    "Service for {} has been restarted. Please allow up to two minutes \
                     for the connection to come back.",
                    user.name
                )
            })
        },
    ))
}

/// General account and support information. Ungated.
pub fn general_info_tool() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::simple(
        "general_info",
        "Provides general account and support information",
        |_user| {
            serde_json::json!({
                "message": "Support is available around the clock. Billing questions are \
                            handled by the billing team, outages by the technical team."
            })
        },
    ))
}

/// Registry holding every stock tool.
pub fn standard_registry() -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(refund_tool())
        .with_tool(restart_service_tool())
        .with_tool(general_info_tool())
}

const SHARED_STYLE: &str = "Keep replies short and concrete. Never use apologetic language. \
     If a tool reports that an action was rejected, explain the outcome to the user \
     plainly instead of retrying.";

/// The stock specialists. Each owns its tools and may transfer to the other
/// two specialists, never back to triage.
pub fn standard_roster() -> AgentRoster {
    let billing = AgentDefinition::new(
        AgentKind::Billing,
        "Billing Agent",
        format!(
            "You are the billing specialist of a customer support desk. Handle refunds, \
             charges, and invoice questions. {}",
            SHARED_STYLE
        ),
    )
    .with_tool(refund_tool())
    .with_handoffs(vec![AgentKind::Technical, AgentKind::General]);

    let technical = AgentDefinition::new(
        AgentKind::Technical,
        "Technical Agent",
        format!(
            "You are the technical specialist of a customer support desk. Diagnose \
             connectivity and service problems; restart the service when it helps. {}",
            SHARED_STYLE
        ),
    )
    .with_tool(restart_service_tool())
    .with_handoffs(vec![AgentKind::Billing, AgentKind::General]);

    let general = AgentDefinition::new(
        AgentKind::General,
        "General Agent",
        format!(
            "You are the generalist of a customer support desk. Answer anything that is \
             not clearly a billing or technical matter. {}",
            SHARED_STYLE
        ),
    )
    .with_tool(general_info_tool())
    .with_handoffs(vec![AgentKind::Billing, AgentKind::Technical]);

    AgentRoster::new()
        .with_agent(billing)
        .with_agent(technical)
        .with_agent(general)
}

/// The stock guardrail set: no apologetic language in surfaced replies.
pub fn standard_guardrails() -> GuardrailEngine {
    GuardrailEngine::new().with_rule(Arc::new(ApologyGuardrail::new()))
}
