//! Lifecycle events emitted while a turn is processed.
//!
//! The orchestrator produces a [`TurnEvent`] for every significant step and
//! pushes it synchronously into an [`EventSink`], so intra-turn ordering is
//! exactly the order things happened. Sinks decide presentation: the console
//! prints lines as they arrive, tests collect them, embedders can consume a
//! channel-backed stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

/// How a tool invocation ended, as reported on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Succeeded,
    Rejected,
    Failed,
}

/// A single step in a turn's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnEvent {
    TriageStarted(TriageStartedEvent),
    HandoffOccurred(HandoffOccurredEvent),
    ToolInvoked(ToolInvokedEvent),
    AgentReplied(AgentRepliedEvent),
    GuardrailBlocked(GuardrailBlockedEvent),
    TurnAborted(TurnAbortedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageStartedEvent {
    pub id: String,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffOccurredEvent {
    pub id: String,
    pub from_agent: String,
    pub to_agent: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokedEvent {
    pub id: String,
    pub agent: String,
    pub tool_name: String,
    pub status: ToolStatus,
    pub detail: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRepliedEvent {
    pub id: String,
    pub agent: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailBlockedEvent {
    pub id: String,
    pub agent: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnAbortedEvent {
    pub id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

fn event_id() -> String {
    Uuid::new_v4().to_string()
}

impl TurnEvent {
    pub fn triage_started(query: impl Into<String>) -> Self {
        TurnEvent::TriageStarted(TriageStartedEvent {
            id: event_id(),
            query: query.into(),
            created_at: Utc::now(),
        })
    }

    pub fn handoff_occurred(
        from_agent: impl Into<String>,
        to_agent: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        TurnEvent::HandoffOccurred(HandoffOccurredEvent {
            id: event_id(),
            from_agent: from_agent.into(),
            to_agent: to_agent.into(),
            reason,
            created_at: Utc::now(),
        })
    }

    pub fn tool_invoked(
        agent: impl Into<String>,
        tool_name: impl Into<String>,
        status: ToolStatus,
        detail: Value,
    ) -> Self {
        TurnEvent::ToolInvoked(ToolInvokedEvent {
            id: event_id(),
            agent: agent.into(),
            tool_name: tool_name.into(),
            status,
            detail,
            created_at: Utc::now(),
        })
    }

    pub fn agent_replied(agent: impl Into<String>, text: impl Into<String>) -> Self {
        TurnEvent::AgentReplied(AgentRepliedEvent {
            id: event_id(),
            agent: agent.into(),
            text: text.into(),
            created_at: Utc::now(),
        })
    }

    pub fn guardrail_blocked(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        TurnEvent::GuardrailBlocked(GuardrailBlockedEvent {
            id: event_id(),
            agent: agent.into(),
            reason: reason.into(),
            created_at: Utc::now(),
        })
    }

    pub fn turn_aborted(reason: impl Into<String>) -> Self {
        TurnEvent::TurnAborted(TurnAbortedEvent {
            id: event_id(),
            reason: reason.into(),
            created_at: Utc::now(),
        })
    }
}

/// Consumer of lifecycle events.
///
/// Emission is synchronous so a sink observes events in exactly the order the
/// orchestrator produced them.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: TurnEvent);
}

/// Sink that forwards events into an unbounded channel.
///
/// Useful for embedders that want an async stream of events rather than a
/// callback.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TurnEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiverStream<TurnEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: TurnEvent) {
        // Receiver dropped means nobody is listening; nothing to do.
        let _ = self.tx.send(event);
    }
}

/// Sink that prints one human-readable line per event.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: TurnEvent) {
        match &event {
            TurnEvent::TriageStarted(e) => {
                println!("[triage] classifying: {}", e.query);
            }
            TurnEvent::HandoffOccurred(e) => match &e.reason {
                Some(reason) => {
                    println!("[handoff] {} -> {} ({})", e.from_agent, e.to_agent, reason)
                }
                None => println!("[handoff] {} -> {}", e.from_agent, e.to_agent),
            },
            TurnEvent::ToolInvoked(e) => {
                let status = match e.status {
                    ToolStatus::Succeeded => "ok",
                    ToolStatus::Rejected => "rejected",
                    ToolStatus::Failed => "failed",
                };
                println!("[tool] {} called {} ({})", e.agent, e.tool_name, status);
            }
            TurnEvent::AgentReplied(e) => {
                println!("[reply] {}", e.agent);
            }
            TurnEvent::GuardrailBlocked(e) => {
                println!("[guardrail] blocked reply from {}: {}", e.agent, e.reason);
            }
            TurnEvent::TurnAborted(e) => {
                println!("[aborted] {}", e.reason);
            }
        }
    }
}

/// Sink that records every event, in order. Intended for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<TurnEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<TurnEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<TurnEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: TurnEvent) {
        self.events.lock().unwrap().push(event);
    }
}
