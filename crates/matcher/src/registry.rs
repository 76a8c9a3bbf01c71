//! Generation-swapped matching rule registry.
//!
//! The rule set lives in an immutable [`RuleGeneration`] behind an
//! [`ArcSwap`]. Readers load the current generation without locking and keep
//! using it for as long as they hold the `Arc`. Writers build the next
//! generation from the current one and publish it in a single swap, retrying
//! if another writer got there first.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use index::DEFAULT_SUBSTRING_LENGTH;

use crate::error::MatchError;
use crate::types::MatchingRule;

/// One immutable, complete set of rules, together with the substring window
/// length their indexes were built with.
#[derive(Debug, Clone)]
pub struct RuleGeneration {
    number: u64,
    substring_length: usize,
    rules: BTreeMap<String, Arc<MatchingRule>>,
    names: BTreeMap<String, String>,
}

impl Default for RuleGeneration {
    fn default() -> Self {
        Self {
            number: 0,
            substring_length: DEFAULT_SUBSTRING_LENGTH,
            rules: BTreeMap::new(),
            names: BTreeMap::new(),
        }
    }
}

impl RuleGeneration {
    fn from_rules<I>(number: u64, substring_length: usize, rules: I) -> Self
    where
        I: IntoIterator<Item = Arc<MatchingRule>>,
    {
        let mut generation = Self {
            number,
            substring_length,
            ..Self::default()
        };
        for rule in rules {
            generation.insert(rule);
        }
        generation
    }

    fn insert(&mut self, rule: Arc<MatchingRule>) {
        if let Some(old) = self.rules.remove(rule.oid()) {
            for name in old.names() {
                if self.names.get(name).is_some_and(|oid| oid == old.oid()) {
                    self.names.remove(name);
                }
            }
        }
        for name in rule.names() {
            self.names.insert(name.clone(), rule.oid().to_owned());
        }
        self.rules.insert(rule.oid().to_owned(), rule);
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Window length of the substring indexes of this generation.
    pub fn substring_length(&self) -> usize {
        self.substring_length
    }

    pub fn get(&self, oid: &str) -> Option<&Arc<MatchingRule>> {
        self.rules.get(oid)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Arc<MatchingRule>> {
        self.names.get(name).and_then(|oid| self.rules.get(oid))
    }

    /// Look up by OID first, then by alias.
    pub fn resolve(&self, oid_or_name: &str) -> Result<&Arc<MatchingRule>, MatchError> {
        self.get(oid_or_name)
            .or_else(|| self.get_by_name(oid_or_name))
            .ok_or_else(|| MatchError::UnknownRule(oid_or_name.to_owned()))
    }

    /// Rules in OID order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MatchingRule>> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Lock-free reader / copy-on-write writer registry of matching rules.
#[derive(Debug, Default)]
pub struct MatchingRuleRegistry {
    snap: ArcSwap<RuleGeneration>,
}

impl MatchingRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation. Stays valid and unchanged while held.
    pub fn snapshot(&self) -> Arc<RuleGeneration> {
        self.snap.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.snap.load().number
    }

    /// Add or replace one rule, publishing a new generation.
    pub fn register(&self, rule: MatchingRule) -> Arc<MatchingRule> {
        let rule = Arc::new(rule);
        self.snap.rcu(|cur| {
            let mut next = RuleGeneration::clone(cur);
            next.number += 1;
            next.insert(Arc::clone(&rule));
            next
        });
        rule
    }

    pub fn lookup(&self, oid: &str) -> Option<Arc<MatchingRule>> {
        self.snap.load().get(oid).cloned()
    }

    pub fn lookup_name(&self, name: &str) -> Option<Arc<MatchingRule>> {
        self.snap.load().get_by_name(name).cloned()
    }

    /// Every rule of the current generation, in OID order.
    pub fn all(&self) -> Vec<Arc<MatchingRule>> {
        self.snap.load().iter().cloned().collect()
    }

    /// Publish a generation made of exactly `rules`, keeping the current
    /// window length. Returns its number.
    pub fn replace_all(&self, rules: Vec<Arc<MatchingRule>>) -> u64 {
        let previous = self.snap.rcu(|cur| {
            RuleGeneration::from_rules(cur.number + 1, cur.substring_length, rules.iter().cloned())
        });
        previous.number + 1
    }

    /// Publish `rules` built for a `substring_length` window in one swap.
    pub fn publish(&self, rules: Vec<Arc<MatchingRule>>, substring_length: usize) -> u64 {
        let previous = self.snap.rcu(|cur| {
            RuleGeneration::from_rules(cur.number + 1, substring_length, rules.iter().cloned())
        });
        previous.number + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleKind;
    use collation::Collator;

    fn rule(oid: &str, names: &[&str], tag: &str) -> MatchingRule {
        MatchingRule::new(
            oid,
            names.iter().map(|n| n.to_string()),
            RuleKind::Equality,
            Collator::for_tag(tag).unwrap(),
        )
    }

    #[test]
    fn register_publishes_new_generation() {
        let registry = MatchingRuleRegistry::new();
        assert_eq!(registry.generation(), 0);
        let before = registry.snapshot();

        registry.register(rule("1.1", &["en"], "en"));
        assert_eq!(registry.generation(), 1);
        assert!(before.is_empty());
        assert_eq!(registry.lookup_name("en").unwrap().oid(), "1.1");
        assert!(registry.lookup_name("EN").is_none());
    }

    #[test]
    fn reregistering_an_oid_drops_its_stale_aliases() {
        let registry = MatchingRuleRegistry::new();
        registry.register(rule("1.1", &["en", "old"], "en"));
        registry.register(rule("1.1", &["en"], "en"));
        assert!(registry.lookup_name("old").is_none());
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn replace_all_swaps_everything_at_once() {
        let registry = MatchingRuleRegistry::new();
        registry.register(rule("1.1", &["en"], "en"));
        let held = registry.snapshot();

        let number = registry.replace_all(vec![
            Arc::new(rule("2.1", &["fr"], "fr")),
            Arc::new(rule("2.2", &["de"], "de")),
        ]);
        assert_eq!(number, 2);
        assert_eq!(registry.generation(), 2);
        assert!(registry.lookup("1.1").is_none());
        let oids: Vec<_> = registry.all().iter().map(|r| r.oid().to_owned()).collect();
        assert_eq!(oids, vec!["2.1", "2.2"]);

        // A reader holding the old generation keeps seeing it whole.
        assert_eq!(held.len(), 1);
        assert!(held.get_by_name("en").is_some());
    }

    #[test]
    fn window_length_travels_with_the_generation() {
        let registry = MatchingRuleRegistry::new();
        assert_eq!(registry.snapshot().substring_length(), DEFAULT_SUBSTRING_LENGTH);

        registry.publish(vec![Arc::new(rule("1.1", &["en"], "en"))], 4);
        let held = registry.snapshot();
        registry.publish(vec![Arc::new(rule("1.1", &["en"], "en"))], 9);

        assert_eq!(held.substring_length(), 4);
        assert_eq!(registry.snapshot().substring_length(), 9);
        registry.replace_all(Vec::new());
        assert_eq!(registry.snapshot().substring_length(), 9);
    }

    #[test]
    fn resolve_tries_oid_then_alias() {
        let registry = MatchingRuleRegistry::new();
        registry.register(rule("1.1", &["en"], "en"));
        let generation = registry.snapshot();
        assert_eq!(generation.resolve("1.1").unwrap().oid(), "1.1");
        assert_eq!(generation.resolve("en").unwrap().oid(), "1.1");
        assert_eq!(
            generation.resolve("fr").unwrap_err(),
            MatchError::UnknownRule("fr".into())
        );
    }
}
