//! The roster: the fixed, ordered set of actors the supervisor can pick.
//!
//! Built once at startup and shared read-only. Carries the keyword rule
//! table used when the backend gives no usable answer.

use switchyard_config::ActorConfig;
use switchyard_core::error::RosterError;
use switchyard_core::route::{RouteDecision, TERMINAL};

/// One named actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub description: String,
}

/// A keyword that routes to an actor on a substring match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub actor: String,
    /// Stored lowercased
    pub keyword: String,
}

#[derive(Debug, Clone)]
pub struct Roster {
    actors: Vec<RosterEntry>,
    rules: Vec<KeywordRule>,
    /// Indices into `actors`, longest name first.
    scan_order: Vec<usize>,
}

impl Roster {
    /// Build a roster from bare names, in priority order.
    pub fn new<I, S>(names: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_entries(names.into_iter().map(|n| RosterEntry {
            name: n.into(),
            description: String::new(),
        }))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = RosterEntry>) -> Result<Self, RosterError> {
        let mut actors: Vec<RosterEntry> = Vec::new();
        for entry in entries {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(RosterError::EmptyName);
            }
            if name.eq_ignore_ascii_case(TERMINAL) {
                return Err(RosterError::ReservedName(name.to_string()));
            }
            if actors.iter().any(|a| a.name.eq_ignore_ascii_case(name)) {
                return Err(RosterError::DuplicateActor(name.to_string()));
            }
            actors.push(RosterEntry {
                name: name.to_string(),
                description: entry.description,
            });
        }
        if actors.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut scan_order: Vec<usize> = (0..actors.len()).collect();
        // Stable: equal lengths keep roster order.
        scan_order.sort_by(|&a, &b| actors[b].name.len().cmp(&actors[a].name.len()));

        Ok(Self {
            actors,
            rules: Vec::new(),
            scan_order,
        })
    }

    /// Build the roster and its keyword table from the `[[actors]]` config.
    pub fn from_config(actors: &[ActorConfig]) -> Result<Self, RosterError> {
        let mut roster = Self::from_entries(actors.iter().map(|a| RosterEntry {
            name: a.name.clone(),
            description: a.description.clone(),
        }))?;
        for actor in actors {
            roster = roster.with_rule(&actor.name, &actor.keywords);
        }
        Ok(roster)
    }

    /// Append keyword rules for `actor`. Order is priority: earlier wins.
    ///
    /// Rules for actors not on the roster are kept but never match.
    pub fn with_rule<K: AsRef<str>>(mut self, actor: &str, keywords: &[K]) -> Self {
        self.rules.extend(
            keywords
                .iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .map(|keyword| KeywordRule {
                    actor: actor.to_string(),
                    keyword,
                }),
        );
        self
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.actors
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actors.iter().map(|a| a.name.as_str())
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actors.iter().any(|a| a.name == name)
    }

    /// Every legal decision, terminal first.
    pub fn options(&self) -> Vec<&str> {
        std::iter::once(TERMINAL).chain(self.names()).collect()
    }

    /// Map a reply token to a decision, ignoring case. `None` if illegal.
    pub fn resolve(&self, token: &str) -> Option<RouteDecision> {
        let token = token.trim();
        if token.eq_ignore_ascii_case(TERMINAL) {
            return Some(RouteDecision::Finish);
        }
        self.actors
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(token))
            .map(|a| RouteDecision::actor(a.name.as_str()))
    }

    /// Find an actor name anywhere in free text, longest names first so a
    /// name that contains another wins. Falls back to the terminal token.
    pub fn scan_text(&self, text: &str) -> Option<RouteDecision> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        for &i in &self.scan_order {
            let name = &self.actors[i].name;
            if text.contains(&name.to_lowercase()) {
                return Some(RouteDecision::actor(name.as_str()));
            }
        }
        text.contains("finish").then_some(RouteDecision::Finish)
    }

    /// First rule whose keyword occurs in `query`, case-insensitive.
    pub fn match_keywords(&self, query: &str) -> Option<&str> {
        let text = query.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .filter(|rule| self.contains(&rule.actor))
            .find(|rule| text.contains(&rule.keyword))
            .map(|rule| rule.actor.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_config::AppConfig;

    fn default_roster() -> Roster {
        Roster::from_config(&AppConfig::default().actors).unwrap()
    }

    #[test]
    fn rejects_invalid_rosters() {
        assert_eq!(Roster::new(Vec::<String>::new()).unwrap_err(), RosterError::Empty);
        assert_eq!(Roster::new(["a", " "]).unwrap_err(), RosterError::EmptyName);
        assert_eq!(
            Roster::new(["a", "finish"]).unwrap_err(),
            RosterError::ReservedName("finish".into())
        );
        assert_eq!(
            Roster::new(["alpha", "Alpha"]).unwrap_err(),
            RosterError::DuplicateActor("Alpha".into())
        );
    }

    #[test]
    fn options_lead_with_terminal() {
        let roster = Roster::new(["food_agent", "economy_agent"]).unwrap();
        assert_eq!(roster.options(), vec!["FINISH", "food_agent", "economy_agent"]);
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let roster = Roster::new(["economy_agent"]).unwrap();
        assert_eq!(roster.resolve("ECONOMY_AGENT"), Some(RouteDecision::actor("economy_agent")));
        assert_eq!(roster.resolve(" finish "), Some(RouteDecision::Finish));
        assert_eq!(roster.resolve("weather_agent"), None);
    }

    #[test]
    fn scan_prefers_longer_names() {
        let roster = Roster::new(["news_agent", "economic_news_agent"]).unwrap();
        assert_eq!(
            roster.scan_text("I pick economic_news_agent."),
            Some(RouteDecision::actor("economic_news_agent"))
        );
        assert_eq!(roster.scan_text("news_agent please"), Some(RouteDecision::actor("news_agent")));
    }

    #[test]
    fn scan_falls_back_to_finish() {
        let roster = default_roster();
        assert_eq!(roster.scan_text("We are Finished here"), Some(RouteDecision::Finish));
        assert_eq!(roster.scan_text("no idea"), None);
        assert_eq!(roster.scan_text("   "), None);
    }

    #[test]
    fn scan_actor_beats_finish() {
        let roster = default_roster();
        assert_eq!(
            roster.scan_text("FINISH or economy_agent?"),
            Some(RouteDecision::actor("economy_agent"))
        );
    }

    #[test]
    fn keyword_specificity_follows_rule_order() {
        let roster = Roster::new(["producer", "grocer"])
            .unwrap()
            .with_rule("producer", &["food production"])
            .with_rule("grocer", &["food"]);
        assert_eq!(roster.match_keywords("Food production in Kenya"), Some("producer"));
        assert_eq!(roster.match_keywords("food prices"), Some("grocer"));
    }

    #[test]
    fn keyword_rules_for_absent_actors_are_skipped() {
        let roster = Roster::new(["economy_agent"])
            .unwrap()
            .with_rule("food_agent", &["gdp"])
            .with_rule("economy_agent", &["gdp"]);
        assert_eq!(roster.match_keywords("GDP growth"), Some("economy_agent"));
    }

    #[test]
    fn default_table_routes_typical_questions() {
        let roster = default_roster();
        let cases = [
            ("Compare GDP of India and China in 2020", "economy_agent"),
            ("What is wheat production in Ukraine?", "food_agent"),
            ("Any breaking economic news?", "economic_news_agent"),
            ("Flood risk in Bangladesh", "weather_disaster_agent"),
            ("Covid outbreak numbers", "disease_agent"),
            ("Health expenditure per capita in Chile", "health_agent"),
            ("Political stability in Peru", "political_agent"),
            ("GDELT event data for Sudan", "news_stats_agent"),
        ];
        for (query, expected) in cases {
            assert_eq!(roster.match_keywords(query), Some(expected), "query: {query}");
        }
        assert_eq!(roster.match_keywords("hello there"), None);
        assert_eq!(roster.match_keywords(""), None);
    }
}
