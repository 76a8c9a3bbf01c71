use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::MatchError;
use crate::types::MatchingRule;

/// The server-wide schema that rule factories publish their rules into.
///
/// Several owners share one directory. A rule is refused when its OID or any
/// of its aliases is already held by a different rule; the foreign rule is
/// left in place.
pub trait MatchingRuleDirectory: Send + Sync {
    fn register(&self, owner: &str, rule: Arc<MatchingRule>) -> Result<(), MatchError>;

    /// Remove `oid` if `owner` registered it. Unknown OIDs are ignored.
    fn deregister(&self, owner: &str, oid: &str);
}

#[derive(Debug)]
struct Registered {
    owner: String,
    rule: Arc<MatchingRule>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    rules: BTreeMap<String, Registered>,
    names: BTreeMap<String, String>,
}

/// In-memory [`MatchingRuleDirectory`].
#[derive(Debug, Default)]
pub struct SchemaDirectory {
    state: RwLock<DirectoryState>,
}

impl SchemaDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, oid: &str) -> Option<Arc<MatchingRule>> {
        let state = self.state.read().unwrap_or_else(|p| p.into_inner());
        state.rules.get(oid).map(|r| Arc::clone(&r.rule))
    }

    pub fn lookup_name(&self, name: &str) -> Option<Arc<MatchingRule>> {
        let state = self.state.read().unwrap_or_else(|p| p.into_inner());
        state
            .names
            .get(name)
            .and_then(|oid| state.rules.get(oid))
            .map(|r| Arc::clone(&r.rule))
    }

    pub fn owner_of(&self, oid: &str) -> Option<String> {
        let state = self.state.read().unwrap_or_else(|p| p.into_inner());
        state.rules.get(oid).map(|r| r.owner.clone())
    }

    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|p| p.into_inner());
        state.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchingRuleDirectory for SchemaDirectory {
    fn register(&self, owner: &str, rule: Arc<MatchingRule>) -> Result<(), MatchError> {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        let conflict = |name: &str, holder: &Registered| MatchError::RegistrationConflict {
            oid: rule.oid().to_owned(),
            name: name.to_owned(),
            owner: holder.owner.clone(),
        };

        if let Some(existing) = state.rules.get(rule.oid()) {
            if existing.owner != owner {
                return Err(conflict(rule.oid(), existing));
            }
        }
        for name in rule.names() {
            let holder = state
                .names
                .get(name)
                .filter(|oid| oid.as_str() != rule.oid())
                .and_then(|oid| state.rules.get(oid));
            if let Some(holder) = holder {
                return Err(conflict(name, holder));
            }
        }

        if let Some(old) = state.rules.remove(rule.oid()) {
            for name in old.rule.names() {
                state.names.remove(name);
            }
        }
        for name in rule.names() {
            state.names.insert(name.clone(), rule.oid().to_owned());
        }
        state.rules.insert(
            rule.oid().to_owned(),
            Registered {
                owner: owner.to_owned(),
                rule,
            },
        );
        Ok(())
    }

    fn deregister(&self, owner: &str, oid: &str) {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        if state.rules.get(oid).is_some_and(|r| r.owner == owner) {
            if let Some(old) = state.rules.remove(oid) {
                for name in old.rule.names() {
                    if state.names.get(name).is_some_and(|held| held == oid) {
                        state.names.remove(name);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleKind;
    use collation::Collator;

    fn rule(oid: &str, names: &[&str]) -> Arc<MatchingRule> {
        Arc::new(MatchingRule::new(
            oid,
            names.iter().map(|n| n.to_string()),
            RuleKind::Equality,
            Collator::for_tag("en").unwrap(),
        ))
    }

    #[test]
    fn foreign_oid_is_refused_and_kept() {
        let dir = SchemaDirectory::new();
        dir.register("core", rule("1.1", &["caseIgnoreMatch"])).unwrap();

        let err = dir.register("collation", rule("1.1", &["en"])).unwrap_err();
        assert_eq!(
            err,
            MatchError::RegistrationConflict {
                oid: "1.1".into(),
                name: "1.1".into(),
                owner: "core".into(),
            }
        );
        assert_eq!(dir.owner_of("1.1").as_deref(), Some("core"));
        assert!(dir.lookup_name("en").is_none());
    }

    #[test]
    fn alias_held_by_another_oid_is_a_conflict() {
        let dir = SchemaDirectory::new();
        dir.register("core", rule("1.1", &["en"])).unwrap();
        let err = dir.register("collation", rule("2.1", &["en", "en.eq"])).unwrap_err();
        assert!(matches!(err, MatchError::RegistrationConflict { ref name, .. } if name == "en"));
        assert!(dir.lookup("2.1").is_none());
    }

    #[test]
    fn owner_can_replace_and_deregister_its_rules() {
        let dir = SchemaDirectory::new();
        dir.register("collation", rule("2.1", &["en", "old"])).unwrap();
        dir.register("collation", rule("2.1", &["en"])).unwrap();
        assert!(dir.lookup_name("old").is_none());

        dir.deregister("someone-else", "2.1");
        assert_eq!(dir.len(), 1);
        dir.deregister("collation", "2.1");
        assert!(dir.is_empty());
        assert!(dir.lookup_name("en").is_none());
        dir.deregister("collation", "2.1");
    }
}
