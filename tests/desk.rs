//! End-to-end turns over the standard desk wiring with a scripted provider.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use support_desk::{
    completion::{Completion, MockProvider},
    config::DeskConfig,
    context::UserContext,
    events::{CollectingSink, ToolStatus, TurnEvent},
    orchestrator::{Orchestrator, Session},
    support,
};

fn desk(provider: MockProvider, sink: Arc<CollectingSink>) -> Orchestrator {
    Orchestrator::new(
        Arc::new(support::standard_roster()),
        Arc::new(support::standard_registry()),
        Arc::new(support::standard_guardrails()),
        Arc::new(provider),
        sink,
        DeskConfig::default(),
    )
}

#[tokio::test]
async fn premium_refund_runs_end_to_end() {
    let provider = MockProvider::new("test-model")
        .with_message("billing")
        .with_tool_call("refund", serde_json::json!({}))
        .with_message("Your refund has been initiated, Ali. Expect it within 5-7 business days.");
    let sink = Arc::new(CollectingSink::new());
    let desk = desk(provider, sink.clone());

    let mut session = Session::new(UserContext::new("Ali", true));
    let outcome = desk
        .handle_turn(&mut session, "I want a refund for my last order.")
        .await
        .unwrap();

    assert_eq!(outcome.agent, "Billing Agent");
    assert!(outcome.text.contains("refund has been initiated"));

    let events = sink.take();
    assert!(matches!(events[0], TurnEvent::TriageStarted(_)));
    let tool = events
        .iter()
        .find_map(|e| match e {
            TurnEvent::ToolInvoked(t) => Some(t),
            _ => None,
        })
        .unwrap();
    assert_eq!(tool.tool_name, "refund");
    assert_eq!(tool.status, ToolStatus::Succeeded);
    assert!(tool.detail["message"].as_str().unwrap().contains("Ali"));
    assert!(matches!(events.last().unwrap(), TurnEvent::AgentReplied(_)));
}

#[tokio::test]
async fn non_premium_refund_is_rejected_not_run() {
    let provider = MockProvider::new("test-model")
        .with_message("billing")
        .with_tool_call("refund", serde_json::json!({}))
        .with_message("A refund is not available on your current plan. An upgrade would unlock it.");
    let sink = Arc::new(CollectingSink::new());
    let desk = desk(provider, sink.clone());

    let mut session = Session::new(UserContext::new("Sam", false));
    let outcome = desk
        .handle_turn(&mut session, "Refund my order please.")
        .await
        .unwrap();

    assert!(outcome.text.contains("not available"));

    let events = sink.take();
    let tool = events
        .iter()
        .find_map(|e| match e {
            TurnEvent::ToolInvoked(t) => Some(t),
            _ => None,
        })
        .unwrap();
    assert_eq!(tool.status, ToolStatus::Rejected);
    assert_eq!(tool.detail["reason"], "not eligible for a refund");
}

#[tokio::test]
async fn apologetic_draft_is_blocked_and_replaced() {
    let provider = MockProvider::new("test-model")
        .with_message("general")
        .with_message("Sorry, that is outside what we support.")
        .with_message("That is outside what we support today.");
    let sink = Arc::new(CollectingSink::new());
    let desk = desk(provider, sink.clone());

    let mut session = Session::new(UserContext::new("Ali", true));
    let outcome = desk
        .handle_turn(&mut session, "Can you repaint my house?")
        .await
        .unwrap();

    // The surfaced text is the regenerated one, not the blocked draft.
    assert_eq!(outcome.text, "That is outside what we support today.");

    let events = sink.take();
    let block_index = events
        .iter()
        .position(|e| matches!(e, TurnEvent::GuardrailBlocked(_)))
        .unwrap();
    let reply_index = events
        .iter()
        .position(|e| matches!(e, TurnEvent::AgentReplied(_)))
        .unwrap();
    assert!(block_index < reply_index);
    match &events[reply_index] {
        TurnEvent::AgentReplied(e) => assert!(!e.text.to_lowercase().contains("sorry")),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn handoff_carries_history_to_the_specialist() {
    let provider = MockProvider::new("test-model")
        .with_message("billing")
        .with_completion(Completion::transfer("technical", Some("connection issue")))
        .with_tool_call("restart_service", serde_json::json!({}))
        .with_message("Your service has been restarted.");
    let sink = Arc::new(CollectingSink::new());
    let desk = desk(provider, sink.clone());

    let mut session = Session::new(UserContext::new("Ali", true));
    let outcome = desk
        .handle_turn(&mut session, "My bill is fine but the line keeps dropping.")
        .await
        .unwrap();

    assert_eq!(outcome.agent, "Technical Agent");

    let events = sink.take();
    let positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter_map(|(i, e)| match e {
            TurnEvent::TriageStarted(_)
            | TurnEvent::HandoffOccurred(_)
            | TurnEvent::ToolInvoked(_)
            | TurnEvent::AgentReplied(_) => Some(i),
            _ => None,
        })
        .collect();
    // Triage, then the handoff, then the tool, then the reply.
    assert_eq!(positions, vec![0, 1, 2, 3]);

    // The user's original message survived the transfer.
    assert!(session
        .history()
        .iter()
        .any(|m| m.content.contains("line keeps dropping")));
}

#[tokio::test]
async fn every_turn_surfaces_exactly_one_reply() {
    // Even a turn where everything goes wrong ends in a single reply.
    let provider = MockProvider::new("test-model")
        .with_message("general")
        .with_failure("backend unreachable");
    let sink = Arc::new(CollectingSink::new());
    let desk = desk(provider, sink.clone());

    let mut session = Session::new(UserContext::new("Ali", false));
    let outcome = desk.handle_turn(&mut session, "hello?").await.unwrap();
    assert!(!outcome.text.is_empty());

    let events = sink.take();
    let replies = events
        .iter()
        .filter(|e| matches!(e, TurnEvent::AgentReplied(_)))
        .count();
    assert_eq!(replies, 1);
    assert!(events
        .iter()
        .any(|e| matches!(e, TurnEvent::TurnAborted(_))));
}

#[tokio::test]
async fn conversation_spans_multiple_turns() {
    let provider = MockProvider::new("test-model")
        .with_message("billing")
        .with_message("Your last invoice was 42 euros.")
        .with_message("It was issued on the first of the month.");
    let sink = Arc::new(CollectingSink::new());
    let desk = desk(provider, sink.clone());

    let mut session = Session::new(UserContext::new("Ali", true));
    let first = desk
        .handle_turn(&mut session, "How much was my last invoice?")
        .await
        .unwrap();
    assert!(first.text.contains("42"));

    // No reset: the second turn stays with billing and skips triage.
    let second = desk.handle_turn(&mut session, "When?").await.unwrap();
    assert!(second.text.contains("issued"));

    let events = sink.take();
    let triages = events
        .iter()
        .filter(|e| matches!(e, TurnEvent::TriageStarted(_)))
        .count();
    assert_eq!(triages, 1);
}
