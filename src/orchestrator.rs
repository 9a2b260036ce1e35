//! The turn state machine.
//!
//! [`Orchestrator::handle_turn`] drives one user message to exactly one
//! surfaced reply: triage if no specialist is active, then a loop of
//! completion calls in which the active agent may hand the conversation off,
//! invoke tools, or answer. Every reply passes the guardrail engine before it
//! is surfaced, and every significant step is emitted on the event sink in
//! the order it happened.
//!
//! Per-turn failures never escape as errors. Timeouts, provider outages, hop
//! and cycle limits, and guardrail exhaustion all degrade to a fallback reply
//! so the conversation stays alive.

use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::agent::{AgentDefinition, AgentKind, AgentRoster};
use crate::completion::{Completion, CompletionProvider, HandoffRequest};
use crate::config::DeskConfig;
use crate::context::{Query, UserContext};
use crate::error::{Result, SupportError};
use crate::events::{EventSink, ToolStatus, TurnEvent};
use crate::guardrail::{GuardrailEngine, GuardrailVerdict};
use crate::items::{Message, ToolCall};
use crate::router::TriageRouter;
use crate::tool::{ToolOutcome, ToolRegistry};

/// Last-resort reply used when even the configured fallback text fails the
/// guardrail check.
const SAFE_REPLY: &str =
    "Your request has been received and logged. A member of our team will follow up.";

/// Reply surfaced when a turn bounces between too many specialists.
const HOP_CAP_REPLY: &str =
    "Your request touched several of our teams this turn. You are now with general \
     support. Please restate the main thing you need and we will handle it directly.";

/// The surfaced result of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Display name of the agent that produced the reply.
    pub agent: String,
    /// The reply text, already guardrail-checked.
    pub text: String,
}

/// Per-conversation state: who the user is, which specialist currently owns
/// the conversation, and the full message history. History is carried across
/// handoffs so a specialist sees everything said before the transfer.
#[derive(Debug)]
pub struct Session {
    user: Arc<UserContext>,
    active: Option<AgentKind>,
    history: Vec<Message>,
}

impl Session {
    pub fn new(user: UserContext) -> Self {
        Self {
            user: Arc::new(user),
            active: None,
            history: Vec::new(),
        }
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }

    /// The specialist currently owning the conversation, if any.
    pub fn active_agent(&self) -> Option<AgentKind> {
        self.active
    }

    /// Clear the routing decision so the next turn goes through triage again.
    /// History is kept.
    pub fn reset_routing(&mut self) {
        self.active = None;
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

/// Drives turns against a fixed roster, registry, and guardrail engine.
pub struct Orchestrator {
    roster: Arc<AgentRoster>,
    registry: Arc<ToolRegistry>,
    guardrails: Arc<GuardrailEngine>,
    provider: Arc<dyn CompletionProvider>,
    router: TriageRouter,
    sink: Arc<dyn EventSink>,
    config: DeskConfig,
}

impl Orchestrator {
    pub fn new(
        roster: Arc<AgentRoster>,
        registry: Arc<ToolRegistry>,
        guardrails: Arc<GuardrailEngine>,
        provider: Arc<dyn CompletionProvider>,
        sink: Arc<dyn EventSink>,
        config: DeskConfig,
    ) -> Self {
        let router = TriageRouter::new(provider.clone());
        Self {
            roster,
            registry,
            guardrails,
            provider,
            router,
            sink,
            config,
        }
    }

    /// Process one user message and produce exactly one reply.
    ///
    /// The only errors that escape are construction-level ones (an agent
    /// missing from the roster entirely); everything runtime degrades to a
    /// fallback reply.
    pub async fn handle_turn(
        &self,
        session: &mut Session,
        input: impl Into<String>,
    ) -> Result<TurnOutcome> {
        let text = input.into();
        info!(user = %session.user.name, premium = session.user.premium, "turn started");
        session.history.push(Message::user(&text));

        if session.active.is_none() {
            self.sink.emit(TurnEvent::triage_started(&text));
            let query = Query::new(&text, session.user.clone());
            let kind = match timeout(
                self.config.completion_timeout,
                self.router.classify(&query),
            )
            .await
            {
                Ok(kind) => kind,
                Err(_) => {
                    warn!("classification timed out, routing to general");
                    AgentKind::General
                }
            };
            info!(specialist = %kind, "triage selected specialist");
            session.active = Some(kind);
        }

        let mut hops = 0usize;
        let mut cycles = 0usize;

        loop {
            cycles += 1;
            if cycles > self.config.max_tool_cycles {
                warn!(limit = self.config.max_tool_cycles, "cycle limit reached");
                return self
                    .finish_with(session, self.config.fallback_text.clone())
                    .await;
            }

            let agent = self.active_agent(session)?;
            let mut completion = match self.complete_for(&agent, session.history()).await {
                Ok(completion) => completion,
                Err(e) => {
                    warn!(error = %e, agent = %agent.name, "completion failed, aborting turn");
                    self.sink.emit(TurnEvent::turn_aborted(e.to_string()));
                    return self
                        .finish_with(session, self.config.fallback_text.clone())
                        .await;
                }
            };

            if let Some(handoff) = completion.handoff.take() {
                hops += 1;
                if hops > self.config.max_handoffs {
                    warn!(
                        limit = self.config.max_handoffs,
                        "handoff limit exceeded, falling back to general"
                    );
                    session.active = Some(AgentKind::General);
                    return self.finish_with(session, HOP_CAP_REPLY.to_string()).await;
                }
                self.perform_handoff(session, &agent, &completion, handoff)?;
                continue;
            }

            if !completion.tool_calls.is_empty() {
                session.history.push(Message::assistant_with_tool_calls(
                    completion.text.clone().unwrap_or_default(),
                    completion.tool_calls.clone(),
                ));
                // Sequential on purpose: tool results land in history in call
                // order, and the event stream mirrors it.
                for call in &completion.tool_calls {
                    self.run_tool(session, &agent, call).await;
                }
                continue;
            }

            let draft = completion.text.unwrap_or_default();
            if draft.trim().is_empty() {
                warn!(agent = %agent.name, "completion carried no text and no calls");
                self.sink
                    .emit(TurnEvent::turn_aborted("empty completion".to_string()));
                return self
                    .finish_with(session, self.config.fallback_text.clone())
                    .await;
            }

            return self.finalize(session, &agent, draft).await;
        }
    }

    /// Look up the active agent, repairing the session onto General if the
    /// recorded kind is missing from the roster.
    fn active_agent(&self, session: &mut Session) -> Result<Arc<AgentDefinition>> {
        let kind = session.active.unwrap_or(AgentKind::General);
        match self.roster.get(kind) {
            Ok(agent) => Ok(agent),
            Err(_) => {
                warn!(%kind, "active agent missing from roster, repairing to general");
                session.active = Some(AgentKind::General);
                self.roster.get(AgentKind::General)
            }
        }
    }

    async fn complete_for(
        &self,
        agent: &AgentDefinition,
        history: &[Message],
    ) -> Result<Completion> {
        let persona = agent.persona();
        let tools = agent.advertised_tools();
        let seconds = self.config.completion_timeout.as_secs();
        match timeout(
            self.config.completion_timeout,
            self.provider.complete(&persona, history, &tools),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SupportError::CompletionTimeout { seconds }),
        }
    }

    /// Validate and apply a handoff. An undeclared or unknown target lands on
    /// General instead of failing the turn; either way the wire history stays
    /// coherent (assistant tool call followed by a tool acknowledgement).
    fn perform_handoff(
        &self,
        session: &mut Session,
        agent: &AgentDefinition,
        completion: &Completion,
        handoff: HandoffRequest,
    ) -> Result<()> {
        let target = match AgentKind::parse(&handoff.target) {
            Some(kind) if kind != AgentKind::Triage
                && agent.can_hand_off_to(kind)
                && self.roster.contains(kind) =>
            {
                kind
            }
            Some(kind) => {
                warn!(from = %agent.name, target = %kind, "undeclared handoff target, using general");
                AgentKind::General
            }
            None => {
                warn!(from = %agent.name, target = %handoff.target, "unknown handoff target, using general");
                AgentKind::General
            }
        };

        session.history.push(Message::assistant_with_tool_calls(
            completion.text.clone().unwrap_or_default(),
            vec![handoff.call.clone()],
        ));
        let ack = serde_json::json!({ "transferred_to": target.as_str() });
        session
            .history
            .push(Message::tool(ack.to_string(), &handoff.call.id));

        let target_def = self.roster.get(target)?;
        info!(from = %agent.name, to = %target_def.name, "handoff");
        self.sink.emit(TurnEvent::handoff_occurred(
            &agent.name,
            &target_def.name,
            handoff.reason,
        ));
        session.active = Some(target);
        Ok(())
    }

    /// Run one tool call. Every outcome, including an unknown tool, becomes a
    /// tool message in history and a [`ToolStatus`] on the event stream; the
    /// turn itself never fails here.
    async fn run_tool(&self, session: &mut Session, agent: &AgentDefinition, call: &ToolCall) {
        if !agent.tools.iter().any(|t| t.name() == call.name) {
            warn!(agent = %agent.name, tool = %call.name, "call to a tool this agent does not own");
            self.sink.emit(TurnEvent::tool_invoked(
                &agent.name,
                &call.name,
                ToolStatus::Failed,
                serde_json::json!({ "error": "tool not available to this agent" }),
            ));
            session.history.push(Message::tool(
                format!("Error: tool '{}' is not available", call.name),
                &call.id,
            ));
            return;
        }

        let user = Arc::clone(&session.user);
        let outcome = self
            .registry
            .invoke(&call.name, &user, call.arguments.clone())
            .await;

        match outcome {
            Ok(ToolOutcome::Completed(output)) => {
                debug!(tool = %call.name, "tool completed");
                self.sink.emit(TurnEvent::tool_invoked(
                    &agent.name,
                    &call.name,
                    ToolStatus::Succeeded,
                    output.clone(),
                ));
                session
                    .history
                    .push(Message::tool(output.to_string(), &call.id));
            }
            Ok(ToolOutcome::Rejected { reason }) => {
                info!(tool = %call.name, %reason, "tool rejected");
                self.sink.emit(TurnEvent::tool_invoked(
                    &agent.name,
                    &call.name,
                    ToolStatus::Rejected,
                    serde_json::json!({ "reason": reason }),
                ));
                // The rejection goes back to the agent as a normal result so
                // it can explain rather than retry blindly.
                let body = serde_json::json!({ "rejected": true, "reason": reason });
                session
                    .history
                    .push(Message::tool(body.to_string(), &call.id));
            }
            Ok(ToolOutcome::Failed { error }) => {
                warn!(tool = %call.name, %error, "tool failed");
                self.sink.emit(TurnEvent::tool_invoked(
                    &agent.name,
                    &call.name,
                    ToolStatus::Failed,
                    serde_json::json!({ "error": error }),
                ));
                session
                    .history
                    .push(Message::tool(format!("Error: {}", error), &call.id));
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool lookup failed");
                self.sink.emit(TurnEvent::tool_invoked(
                    &agent.name,
                    &call.name,
                    ToolStatus::Failed,
                    serde_json::json!({ "error": e.to_string() }),
                ));
                session
                    .history
                    .push(Message::tool(format!("Error: {}", e), &call.id));
            }
        }
    }

    /// Guardrail-check a draft and surface it, regenerating once (per config)
    /// on a block. Blocked drafts never enter history.
    async fn finalize(
        &self,
        session: &mut Session,
        agent: &AgentDefinition,
        draft: String,
    ) -> Result<TurnOutcome> {
        let verdict = self.check_guardrails(&draft).await;
        if verdict.passed {
            return Ok(self.surface(session, &agent.name, draft));
        }

        let reason = verdict.reason.unwrap_or_else(|| "policy".to_string());
        info!(agent = %agent.name, %reason, "reply blocked by guardrail");
        self.sink
            .emit(TurnEvent::guardrail_blocked(&agent.name, &reason));

        for attempt in 0..self.config.guardrail_retries {
            let mut retry_history = session.history.clone();
            retry_history.push(Message::system(format!(
                "Your previous draft was rejected by the reply policy ({}). \
                 Rewrite the reply without that language and do not mention the policy.",
                reason
            )));
            match self.complete_for(agent, &retry_history).await {
                Ok(completion) => {
                    let redraft = completion.text.unwrap_or_default();
                    if redraft.trim().is_empty() {
                        continue;
                    }
                    let verdict = self.check_guardrails(&redraft).await;
                    if verdict.passed {
                        debug!(attempt, "regenerated reply passed guardrails");
                        return Ok(self.surface(session, &agent.name, redraft));
                    }
                    self.sink.emit(TurnEvent::guardrail_blocked(
                        &agent.name,
                        verdict.reason.unwrap_or_else(|| "policy".to_string()),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "regeneration call failed");
                    break;
                }
            }
        }

        self.finish_with(session, self.config.fallback_text.clone())
            .await
    }

    /// Surface a substitute reply through the guardrails. If even the
    /// configured text is blocked, a fixed safe reply goes out instead.
    async fn finish_with(&self, session: &mut Session, text: String) -> Result<TurnOutcome> {
        let agent = self.active_agent(session)?;
        let text = if self.check_guardrails(&text).await.passed {
            text
        } else {
            warn!("configured fallback text failed guardrails, using safe reply");
            SAFE_REPLY.to_string()
        };
        Ok(self.surface(session, &agent.name, text))
    }

    fn surface(&self, session: &mut Session, agent_name: &str, text: String) -> TurnOutcome {
        session.history.push(Message::assistant(&text));
        self.sink
            .emit(TurnEvent::agent_replied(agent_name, &text));
        TurnOutcome {
            agent: agent_name.to_string(),
            text,
        }
    }

    async fn check_guardrails(&self, text: &str) -> GuardrailVerdict {
        match self.guardrails.check(text).await {
            Ok(verdict) => verdict,
            Err(e) => {
                // A broken rule blocks rather than letting text through.
                warn!(error = %e, "guardrail check errored");
                GuardrailVerdict::fail(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockProvider;
    use crate::guardrail::ApologyGuardrail;
    use crate::events::CollectingSink;
    use crate::tool::FunctionTool;
    use pretty_assertions::assert_eq;

    fn info_tool() -> Arc<dyn crate::tool::Tool> {
        Arc::new(FunctionTool::simple(
            "general_info",
            "Provides general information",
            |_user| serde_json::json!({ "message": "We are open 24/7." }),
        ))
    }

    fn roster() -> Arc<AgentRoster> {
        Arc::new(
            AgentRoster::new()
                .with_agent(
                    AgentDefinition::new(AgentKind::Billing, "Billing Agent", "Handle billing.")
                        .with_handoff(AgentKind::Technical)
                        .with_handoff(AgentKind::General),
                )
                .with_agent(AgentDefinition::new(
                    AgentKind::Technical,
                    "Technical Agent",
                    "Handle technical issues.",
                ))
                .with_agent(
                    AgentDefinition::new(AgentKind::General, "General Agent", "Answer anything.")
                        .with_tool(info_tool()),
                ),
        )
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new().with_tool(info_tool()))
    }

    fn orchestrator(
        provider: MockProvider,
        sink: Arc<CollectingSink>,
        config: DeskConfig,
    ) -> Orchestrator {
        Orchestrator::new(
            roster(),
            registry(),
            Arc::new(GuardrailEngine::new().with_rule(Arc::new(ApologyGuardrail::new()))),
            Arc::new(provider),
            sink,
            config,
        )
    }

    fn session() -> Session {
        Session::new(UserContext::new("Ali", true))
    }

    #[tokio::test]
    async fn test_plain_reply_after_triage() {
        let provider = MockProvider::new("test-model")
            .with_message("general")
            .with_message("We are open every day.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "When are you open?").await.unwrap();

        assert_eq!(outcome.agent, "General Agent");
        assert_eq!(outcome.text, "We are open every day.");
        assert_eq!(session.active_agent(), Some(AgentKind::General));

        let events = sink.take();
        assert!(matches!(events[0], TurnEvent::TriageStarted(_)));
        assert!(matches!(events.last().unwrap(), TurnEvent::AgentReplied(_)));
    }

    #[tokio::test]
    async fn test_handoff_switches_active_agent() {
        let provider = MockProvider::new("test-model")
            .with_message("billing")
            .with_completion(Completion::transfer("technical", Some("needs diagnostics")))
            .with_message("Restarting your router now.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "My bill doubled and the line is down.")
            .await
            .unwrap();

        assert_eq!(outcome.agent, "Technical Agent");
        assert_eq!(session.active_agent(), Some(AgentKind::Technical));

        let events = sink.take();
        let handoff = events
            .iter()
            .find_map(|e| match e {
                TurnEvent::HandoffOccurred(h) => Some(h),
                _ => None,
            })
            .unwrap();
        assert_eq!(handoff.from_agent, "Billing Agent");
        assert_eq!(handoff.to_agent, "Technical Agent");
        assert_eq!(handoff.reason.as_deref(), Some("needs diagnostics"));
    }

    #[tokio::test]
    async fn test_undeclared_handoff_lands_on_general() {
        // Technical declared no handoffs, so Billing -> Technical -> Billing
        // is not possible; instead have Billing transfer somewhere undeclared.
        let provider = MockProvider::new("test-model")
            .with_message("billing")
            .with_completion(Completion::transfer("triage", None))
            .with_message("Happy to help with anything else.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "hello").await.unwrap();

        assert_eq!(outcome.agent, "General Agent");
        assert_eq!(session.active_agent(), Some(AgentKind::General));
    }

    #[tokio::test]
    async fn test_handoff_limit_falls_back_to_general() {
        let config = DeskConfig::builder().max_handoffs(1).build();
        let provider = MockProvider::new("test-model")
            .with_message("billing")
            .with_transfer("general")
            .with_transfer("general");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), config);

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "round and round").await.unwrap();

        assert_eq!(outcome.agent, "General Agent");
        assert_eq!(outcome.text, HOP_CAP_REPLY);
    }

    #[tokio::test]
    async fn test_tool_call_feeds_back_into_reply() {
        let provider = MockProvider::new("test-model")
            .with_message("general")
            .with_tool_call("general_info", serde_json::json!({}))
            .with_message("We are open 24/7.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "hours?").await.unwrap();

        assert_eq!(outcome.text, "We are open 24/7.");

        let events = sink.take();
        let tool = events
            .iter()
            .find_map(|e| match e {
                TurnEvent::ToolInvoked(t) => Some(t),
                _ => None,
            })
            .unwrap();
        assert_eq!(tool.tool_name, "general_info");
        assert_eq!(tool.status, ToolStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_guardrail_block_triggers_regeneration() {
        let provider = MockProvider::new("test-model")
            .with_message("general")
            .with_message("Sorry, we are closed.")
            .with_message("We are closed on Sundays.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "open sunday?").await.unwrap();

        assert_eq!(outcome.text, "We are closed on Sundays.");

        let events = sink.take();
        assert!(events
            .iter()
            .any(|e| matches!(e, TurnEvent::GuardrailBlocked(_))));
        // The blocked draft never entered history.
        assert!(!session
            .history()
            .iter()
            .any(|m| m.content.contains("Sorry")));
    }

    #[tokio::test]
    async fn test_guardrail_exhaustion_uses_fallback() {
        let provider = MockProvider::new("test-model")
            .with_message("general")
            .with_message("Sorry about that.")
            .with_message("So sorry again.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "ugh").await.unwrap();

        assert_eq!(outcome.text, DeskConfig::default().fallback_text);
        let events = sink.take();
        let blocks = events
            .iter()
            .filter(|e| matches!(e, TurnEvent::GuardrailBlocked(_)))
            .count();
        assert_eq!(blocks, 2);
    }

    #[tokio::test]
    async fn test_provider_outage_aborts_with_fallback() {
        let provider = MockProvider::new("test-model")
            .with_message("general")
            .with_failure("backend down");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "hello").await.unwrap();

        assert_eq!(outcome.text, DeskConfig::default().fallback_text);
        let events = sink.take();
        assert!(events
            .iter()
            .any(|e| matches!(e, TurnEvent::TurnAborted(_))));
        // The turn still surfaced exactly one reply.
        let replies = events
            .iter()
            .filter(|e| matches!(e, TurnEvent::AgentReplied(_)))
            .count();
        assert_eq!(replies, 1);
    }

    #[tokio::test]
    async fn test_second_turn_skips_triage() {
        let provider = MockProvider::new("test-model")
            .with_message("billing")
            .with_message("First answer.")
            .with_message("Second answer.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        orch.handle_turn(&mut session, "bill question").await.unwrap();
        sink.take();

        orch.handle_turn(&mut session, "follow-up").await.unwrap();
        let events = sink.take();
        assert!(!events
            .iter()
            .any(|e| matches!(e, TurnEvent::TriageStarted(_))));
    }

    #[tokio::test]
    async fn test_reset_routing_forces_triage() {
        let provider = MockProvider::new("test-model")
            .with_message("billing")
            .with_message("First answer.")
            .with_message("general")
            .with_message("Second answer.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        orch.handle_turn(&mut session, "bill question").await.unwrap();
        session.reset_routing();
        sink.take();

        orch.handle_turn(&mut session, "new topic").await.unwrap();
        let events = sink.take();
        assert!(matches!(events[0], TurnEvent::TriageStarted(_)));
    }

    #[tokio::test]
    async fn test_cycle_limit_breaks_tool_loops() {
        let config = DeskConfig::builder().max_tool_cycles(2).build();
        let provider = MockProvider::new("test-model")
            .with_message("general")
            .with_tool_call("general_info", serde_json::json!({}))
            .with_tool_call("general_info", serde_json::json!({}))
            .with_tool_call("general_info", serde_json::json!({}));
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), config);

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "loop").await.unwrap();
        assert_eq!(outcome.text, DeskConfig::default().fallback_text);
    }

    #[tokio::test]
    async fn test_tool_not_owned_by_agent_is_failed() {
        // Billing has no tools; a call to general_info must not run it.
        let provider = MockProvider::new("test-model")
            .with_message("billing")
            .with_tool_call("general_info", serde_json::json!({}))
            .with_message("Let me answer directly instead.");
        let sink = Arc::new(CollectingSink::new());
        let orch = orchestrator(provider, sink.clone(), DeskConfig::default());

        let mut session = session();
        let outcome = orch.handle_turn(&mut session, "info please").await.unwrap();

        assert_eq!(outcome.text, "Let me answer directly instead.");
        let events = sink.take();
        let tool = events
            .iter()
            .find_map(|e| match e {
                TurnEvent::ToolInvoked(t) => Some(t),
                _ => None,
            })
            .unwrap();
        assert_eq!(tool.status, ToolStatus::Failed);
    }
}
