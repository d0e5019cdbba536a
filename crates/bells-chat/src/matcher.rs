//! Keyword-based intent matching.
//!
//! Rules are evaluated in declared order and the first rule whose keyword
//! set hits the normalized query wins. There is no scoring: when two rules
//! could both match, the earlier one is the answer.

use std::fmt;

use crate::normalizer::NormalizedQuery;

/// Identifier of a response template.
///
/// `Default` is reserved for queries no rule matched. `Custom` names
/// templates added on top of the campus set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    LibraryHours,
    Events,
    Registrar,
    Wifi,
    Default,
    Custom(&'static str),
}

impl TemplateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::LibraryHours => "library-hours",
            TemplateId::Events => "events",
            TemplateId::Registrar => "registrar",
            TemplateId::Wifi => "wifi",
            TemplateId::Default => "default",
            TemplateId::Custom(name) => name,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule: "query contains any of `keywords`" selects `template`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    pub template: TemplateId,
    pub keywords: Vec<String>,
}

impl IntentRule {
    pub fn new(template: TemplateId, keywords: &[&str]) -> Self {
        Self {
            template,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Whether this rule's predicate holds for the query.
    pub fn matches(&self, query: &NormalizedQuery) -> bool {
        query.contains_any(&self.keywords)
    }
}

/// Return the template of the first rule that matches, or `Default`.
pub fn match_intent(query: &NormalizedQuery, rules: &[IntentRule]) -> TemplateId {
    rules
        .iter()
        .find(|rule| rule.matches(query))
        .map(|rule| rule.template)
        .unwrap_or(TemplateId::Default)
}

/// Ordered rule table.
#[derive(Debug, Clone)]
pub struct IntentMatcher {
    rules: Vec<IntentRule>,
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::campus()
    }
}

impl IntentMatcher {
    /// Build a matcher over an explicit rule list. Order is precedence.
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// The campus assistant rule table.
    ///
    /// Order matters: "office" sits in the registrar rule, so a query naming
    /// both a wifi term and "office" resolves to registrar.
    pub fn campus() -> Self {
        Self::with_rules(vec![
            IntentRule::new(TemplateId::LibraryHours, &["library", "close", "open"]),
            IntentRule::new(TemplateId::Events, &["event", "happening"]),
            IntentRule::new(TemplateId::Registrar, &["registr", "office"]),
            IntentRule::new(TemplateId::Wifi, &["wifi", "internet"]),
        ])
    }

    /// Append a rule after all existing ones.
    pub fn push_rule(&mut self, rule: IntentRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify a normalized query.
    pub fn classify(&self, query: &NormalizedQuery) -> TemplateId {
        let template = match_intent(query, &self.rules);
        tracing::debug!(query = %query, template = %template, "Intent matched");
        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    fn classify(raw: &str) -> TemplateId {
        IntentMatcher::campus().classify(&normalize(raw))
    }

    #[test]
    fn test_library_keywords() {
        assert_eq!(classify("When does the library close?"), TemplateId::LibraryHours);
        assert_eq!(classify("is it OPEN on sunday"), TemplateId::LibraryHours);
        assert_eq!(classify("what time do you close"), TemplateId::LibraryHours);
    }

    #[test]
    fn test_events_keywords() {
        assert_eq!(classify("Any events this week?"), TemplateId::Events);
        assert_eq!(classify("what's happening on campus"), TemplateId::Events);
    }

    #[test]
    fn test_registrar_keywords() {
        assert_eq!(classify("Where is the registrar?"), TemplateId::Registrar);
        assert_eq!(classify("course registration help"), TemplateId::Registrar);
        assert_eq!(classify("which office handles transcripts"), TemplateId::Registrar);
    }

    #[test]
    fn test_wifi_keywords() {
        assert_eq!(classify("How do I connect to WiFi?"), TemplateId::Wifi);
        assert_eq!(classify("internet is slow"), TemplateId::Wifi);
    }

    #[test]
    fn test_unmatched_is_default() {
        assert_eq!(classify("what's the weather"), TemplateId::Default);
        assert_eq!(classify(""), TemplateId::Default);
        assert_eq!(classify("wi-fi"), TemplateId::Default);
    }

    #[test]
    fn test_earlier_rule_wins_registrar_over_wifi() {
        assert_eq!(classify("wifi in the office"), TemplateId::Registrar);
    }

    #[test]
    fn test_earlier_rule_wins_library_over_events() {
        // "open" (library) is declared before "event"
        assert_eq!(classify("open events tonight"), TemplateId::LibraryHours);
    }

    #[test]
    fn test_substring_semantics() {
        // "close" inside "closet" still counts
        assert_eq!(classify("lost my closet key"), TemplateId::LibraryHours);
        // "event" inside "prevent"
        assert_eq!(classify("how to prevent burnout"), TemplateId::Events);
    }

    #[test]
    fn test_reordered_rules_change_precedence() {
        let matcher = IntentMatcher::with_rules(vec![
            IntentRule::new(TemplateId::Wifi, &["wifi"]),
            IntentRule::new(TemplateId::Registrar, &["office"]),
        ]);
        assert_eq!(matcher.classify(&normalize("wifi in the office")), TemplateId::Wifi);
    }

    #[test]
    fn test_empty_rule_table_is_total() {
        let matcher = IntentMatcher::with_rules(vec![]);
        assert_eq!(matcher.classify(&normalize("library")), TemplateId::Default);
    }

    #[test]
    fn test_push_rule_appends_last() {
        let mut matcher = IntentMatcher::with_rules(vec![IntentRule::new(
            TemplateId::Registrar,
            &["office"],
        )]);
        matcher.push_rule(IntentRule::new(TemplateId::Wifi, &["wifi", "office"]));
        assert_eq!(matcher.rules().len(), 2);
        assert_eq!(matcher.classify(&normalize("office wifi")), TemplateId::Registrar);
        assert_eq!(matcher.classify(&normalize("wifi")), TemplateId::Wifi);
    }

    #[test]
    fn test_rule_keywords_are_lowercased() {
        let rule = IntentRule::new(TemplateId::Wifi, &["WiFi"]);
        assert!(rule.matches(&normalize("campus wifi")));
    }

    #[test]
    fn test_deterministic() {
        let matcher = IntentMatcher::campus();
        let q = normalize("Is the library open during events?");
        let first = matcher.classify(&q);
        for _ in 0..10 {
            assert_eq!(matcher.classify(&q), first);
        }
    }

    #[test]
    fn test_campus_table_order() {
        let order: Vec<TemplateId> = IntentMatcher::campus()
            .rules()
            .iter()
            .map(|r| r.template)
            .collect();
        assert_eq!(
            order,
            vec![
                TemplateId::LibraryHours,
                TemplateId::Events,
                TemplateId::Registrar,
                TemplateId::Wifi
            ]
        );
    }

    #[test]
    fn test_template_id_display() {
        assert_eq!(TemplateId::LibraryHours.to_string(), "library-hours");
        assert_eq!(TemplateId::Default.to_string(), "default");
        assert_eq!(TemplateId::Custom("parking").to_string(), "parking");
    }
}
