//! `switchyard chat`: Interactive question loop.
//!
//! Each question runs in a fresh session, so earlier answers never feed
//! into the routing of later ones.

use std::io::Write;

use switchyard_core::message::SessionId;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_store, load_config};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

fn is_exit(line: &str) -> bool {
    EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w))
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store = build_store(&config)?;

    println!();
    println!("  Switchyard Interactive Mode");
    println!();
    println!("  Backend:  {} ({})", config.backend.name, config.backend.base_url);
    println!("  Model:    {}", config.backend.model);
    println!(
        "  Actors:   {}",
        store.orchestrator().roster().names().collect::<Vec<_>>().join(", ")
    );
    println!();
    println!("  Type your question and press Enter. Type 'quit' to leave.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut asked = 0usize;

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit(question) {
            break;
        }

        asked += 1;
        let session = SessionId::generate();
        eprint!("  ...");
        match store.turn(&session, question).await {
            Ok(outcome) => {
                eprint!("\r     \r");
                println!();
                for line in outcome.reply_or_default().lines() {
                    println!("  Answer > {line}");
                }
                println!("  ({})", outcome.trace.join(" -> "));
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye! ({asked} questions)");
    println!();

    Ok(())
}
