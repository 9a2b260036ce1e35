//! # Support Desk
//!
//! A console customer-support dispatcher: incoming queries are triaged to a
//! specialist, specialists can hand the conversation off to each other, call
//! context-gated tools, and every surfaced reply passes an output guardrail.
//!
//! ## Core Concepts
//!
//! - **Orchestrator**: drives one user message to exactly one guardrail-checked
//!   reply, emitting lifecycle events along the way
//! - **Router**: classifies a fresh query into a specialist domain
//! - **Agents**: static definitions of the specialists, their personas, owned
//!   tools, and permitted handoff targets
//! - **Tools**: named actions behind activation predicates evaluated fresh on
//!   every call (the stock refund is premium-only)
//! - **Guardrails**: tone-policy rules applied to every reply before it is
//!   surfaced
//!
//! ## Getting Started
//!
//! Set the completion credential in the `GEMINI_API_KEY` environment variable.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use support_desk::{
//!     config::DeskConfig,
//!     completion::OpenAiCompatProvider,
//!     context::UserContext,
//!     events::ConsoleSink,
//!     orchestrator::{Orchestrator, Session},
//!     support,
//! };
//!
//! # async fn example() -> support_desk::error::Result<()> {
//! let config = DeskConfig::from_env()?;
//! let provider = Arc::new(OpenAiCompatProvider::new(&config));
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(support::standard_roster()),
//!     Arc::new(support::standard_registry()),
//!     Arc::new(support::standard_guardrails()),
//!     provider,
//!     Arc::new(ConsoleSink),
//!     config,
//! );
//!
//! let mut session = Session::new(UserContext::new("Ali", true));
//! let outcome = orchestrator
//!     .handle_turn(&mut session, "I want a refund for my last order.")
//!     .await?;
//! println!("{}: {}", outcome.agent, outcome.text);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod guardrail;
pub mod items;
pub mod orchestrator;
pub mod router;
pub mod support;
pub mod tool;

pub use agent::{AgentDefinition, AgentKind, AgentRoster};
pub use completion::{Completion, CompletionProvider, MockProvider, OpenAiCompatProvider};
pub use config::DeskConfig;
pub use context::{Query, UserContext};
pub use error::{Result, SupportError};
pub use events::{ChannelSink, CollectingSink, ConsoleSink, EventSink, ToolStatus, TurnEvent};
pub use guardrail::{ApologyGuardrail, GuardrailEngine, GuardrailVerdict, OutputGuardrail};
pub use items::{Message, Role, ToolCall, ToolSpec};
pub use orchestrator::{Orchestrator, Session, TurnOutcome};
pub use router::TriageRouter;
pub use tool::{FunctionTool, Tool, ToolOutcome, ToolRegistry};
