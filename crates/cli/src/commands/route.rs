//! `switchyard route`: Offline routing dry run.
//!
//! Runs the fallback ladder as if the backend had given no usable answer,
//! so the keyword table can be checked without a model server.

use switchyard_agent::routing::{DecisionSource, Roster, RouteSignal, resolve};
use switchyard_core::message::{ConversationState, SessionId, Turn};
use switchyard_core::route::RouteDecision;

use super::load_config;

/// Decide the first step for a fresh conversation holding only `question`.
pub(crate) fn dry_run(roster: &Roster, question: &str) -> (RouteDecision, DecisionSource) {
    let state = ConversationState::from_turns(SessionId::generate(), vec![Turn::user(question)]);
    resolve(RouteSignal::NoMatch, &state, roster)
}

pub async fn run(message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let roster = Roster::from_config(&config.actors)?;

    let (decision, source) = dry_run(&roster, &message);
    println!("{decision}");
    eprintln!("  (via {source})");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_config::AppConfig;

    #[test]
    fn dry_run_uses_keywords() {
        let roster = Roster::from_config(&AppConfig::default().actors).unwrap();
        let (decision, source) = dry_run(&roster, "Compare food production of India, China, Brazil in 2020");
        assert_eq!(decision, RouteDecision::actor("food_agent"));
        assert_eq!(source, DecisionSource::Keyword);
    }

    #[test]
    fn dry_run_without_match_finishes() {
        let roster = Roster::from_config(&AppConfig::default().actors).unwrap();
        let (decision, _) = dry_run(&roster, "good morning");
        assert!(decision.is_terminal());
    }
}
