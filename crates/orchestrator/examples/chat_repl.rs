//! Interactive terminal chat through the full pipeline.
//!
//! Run with: cargo run -p orchestrator --example chat_repl
//!
//! Configuration via .env file or environment variables:
//!   API_GATEWAY_KEY or OPENAI_API_KEY - Model credentials (required)
//!   REVIEW_DB_URL                     - Review index (default: sqlite:data/reviews.db?mode=rwc)
//!   CHAT_PROMPT_FILE                  - System prompt file (default: SYSTEM_PROMPT.md)
//!
//! Type `/reset` to clear the history, `/quit` to exit.

use std::io::{self, BufRead, Write};

use orchestrator::{Conversation, Orchestrator, RunStatus, Turn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_filename(".secrets");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let orchestrator = Orchestrator::from_env().await?;
    let mut history: Vec<Turn> = Vec::new();

    println!("Liner Notes chat. /reset clears history, /quit exits.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        match text {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                history.clear();
                println!("(history cleared)");
                continue;
            }
            _ => {}
        }

        let mut conversation = Conversation::from(history.clone());
        conversation.push(Turn::user(text));
        let outcome = orchestrator.run(conversation).await;

        println!("{}", outcome.answer);
        if outcome.status != RunStatus::Answered {
            println!("[{}]", outcome.status.label());
        }
        history = outcome.conversation.into_turns();
    }

    orchestrator.shutdown().await;
    Ok(())
}
