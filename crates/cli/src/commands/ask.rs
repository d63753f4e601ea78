//! `switchyard ask`: Route one question and print the answer.

use switchyard_core::message::SessionId;

use super::{build_store, load_config};

pub async fn run(message: String, session: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store = build_store(&config)?;

    let session = match session {
        Some(s) => SessionId::parse(s)?,
        None => SessionId::generate(),
    };

    eprint!("  Thinking...");
    let outcome = store.turn(&session, &message).await?;
    eprint!("\r              \r");

    println!("{}", outcome.reply_or_default());
    eprintln!();
    eprintln!("  Trace:   {}", outcome.trace.join(" -> "));
    eprintln!("  Session: {}", outcome.session);

    Ok(())
}
