//! Console entry point for the support desk.
//!
//! Collects the user's name and premium status, then loops: each line is one
//! turn, triaged fresh, with lifecycle events printed as they happen. `exit`
//! or `quit` ends the session.

use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use support_desk::{
    completion::OpenAiCompatProvider,
    config::DeskConfig,
    context::UserContext,
    events::ConsoleSink,
    orchestrator::{Orchestrator, Session},
    support,
};

fn prompt(stdin: &mut impl BufRead, label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("support_desk=warn")),
        )
        .init();

    let config = DeskConfig::from_env().context("loading configuration")?;

    let provider = Arc::new(OpenAiCompatProvider::new(&config));
    let orchestrator = Orchestrator::new(
        Arc::new(support::standard_roster()),
        Arc::new(support::standard_registry()),
        Arc::new(support::standard_guardrails()),
        provider,
        Arc::new(ConsoleSink),
        config,
    );

    let stdin = io::stdin();
    let mut stdin = stdin.lock();

    let name = prompt(&mut stdin, "Your name: ")?;
    let name = if name.is_empty() { "Guest".to_string() } else { name };
    let premium = prompt(&mut stdin, "Premium member? (y/n): ")?
        .to_lowercase()
        .starts_with('y');

    let mut session = Session::new(UserContext::new(name, premium));
    println!("Welcome to the support desk. Type 'exit' or 'quit' to leave.");

    loop {
        let line = prompt(&mut stdin, "> ")?;
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
            println!("Goodbye.");
            break;
        }

        // Each console turn is routed fresh; the transcript still carries over.
        session.reset_routing();
        match orchestrator.handle_turn(&mut session, line).await {
            Ok(outcome) => println!("{}: {}", outcome.agent, outcome.text),
            Err(e) => eprintln!("error: {}", e),
        }
    }

    Ok(())
}
