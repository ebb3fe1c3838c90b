//! Simple test for OpenAiBrain chat completion.
//!
//! Run with: cargo run -p openai-brain --example test_chat
//! Or with a custom message: cargo run -p openai-brain --example test_chat -- "Your message here"
//!
//! Make sure to set environment variables in .env or .secrets:
//!   API_GATEWAY_KEY or OPENAI_API_KEY

use brain_core::{ModelRequest, Turn};
use openai_brain::{Brain, OpenAiBrain};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_filename(".secrets");

    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let message_text = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "Hello! Please respond with a short greeting.".to_string()
    };

    println!("Initializing OpenAiBrain...");
    let brain = OpenAiBrain::from_env()?;

    println!("Brain initialized: {}", brain.name());
    println!("API URL: {}", brain.config().api_url);
    println!("Model: {}", brain.config().model);
    println!();

    let request = ModelRequest {
        system: "You are an AI assistant. Respond concisely.".to_string(),
        turns: vec![Turn::user(&message_text)],
        tools: Vec::new(),
    };

    println!("Sending: \"{}\"", message_text);
    println!("Waiting for response...\n");

    let response = brain.complete(request).await?;

    println!("=== Response ===");
    println!("{}", response.text);
    println!("================");

    Ok(())
}
