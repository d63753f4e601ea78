//! `switchyard actors`: List the configured roster.

use switchyard_agent::routing::Roster;

use super::load_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let roster = Roster::from_config(&config.actors)?;

    println!("Actors ({}), in keyword priority order:", roster.len());
    println!();
    for entry in roster.entries() {
        let keywords: Vec<&str> = roster
            .rules()
            .iter()
            .filter(|r| r.actor == entry.name)
            .map(|r| r.keyword.as_str())
            .collect();
        println!("  {}", entry.name);
        if !entry.description.is_empty() {
            println!("    {}", entry.description);
        }
        println!("    keywords: {}", keywords.join(", "));
    }

    Ok(())
}
