//! Rule behaviour, dispatched on [`RuleKind`].
//!
//! Every kind normalizes attribute values to the locale's full collation key.
//! Assertions differ: substring rules pack the parsed filter with
//! [`collation::encode_assertion`], the others use the full key as well.

use collation::{encode_assertion, SubstringAssertion};
use index::{
    compare_keys, equality_query, ordering_query, substring_query, IndexKeyFactory,
    IndexQueryFactory, SubstringKeyFactory,
};

use crate::error::MatchError;
use crate::types::{MatchingRule, RuleKind};

impl MatchingRule {
    /// Normalized form of an attribute value.
    pub fn normalize_value(&self, value: &str) -> Vec<u8> {
        self.collator().full_key(value)
    }

    /// Normalized form of an assertion value.
    pub fn normalize_assertion(&self, assertion: &str) -> Result<Vec<u8>, MatchError> {
        match self.kind {
            RuleKind::Substring => {
                let parsed = SubstringAssertion::parse(assertion)?;
                Ok(encode_assertion(&parsed, self.collator())?)
            }
            _ => Ok(self.collator().full_key(assertion)),
        }
    }

    /// Compare a normalized attribute value against a normalized assertion.
    ///
    /// Never fails: malformed input simply does not match.
    pub fn values_match(&self, attribute: &[u8], assertion: &[u8]) -> bool {
        match self.kind {
            RuleKind::Equality => attribute == assertion,
            RuleKind::Substring => collation::values_match(attribute, assertion),
            kind => kind
                .range_operator()
                .is_some_and(|op| op.accepts(compare_keys(attribute, assertion))),
        }
    }

    /// Normalize both sides and match them.
    pub fn matches(&self, attribute: &str, assertion: &str) -> Result<bool, MatchError> {
        let assertion = self.normalize_assertion(assertion)?;
        Ok(self.values_match(&self.normalize_value(attribute), &assertion))
    }

    /// Key factories for the indexes this rule needs.
    ///
    /// Substring rules need their window index plus the locale's equality
    /// index, which serves the initial-fragment prefix ranges.
    pub fn key_factories(&self, window: usize) -> Result<Vec<Box<dyn IndexKeyFactory>>, MatchError> {
        let equality: Box<dyn IndexKeyFactory> = Box::new(self.equality.clone());
        match self.kind {
            RuleKind::Substring => {
                let substring = SubstringKeyFactory::new(self.collator().clone(), window)?;
                Ok(vec![Box::new(substring), equality])
            }
            _ => Ok(vec![equality]),
        }
    }

    /// Compile an assertion into the backend's query type.
    pub fn create_index_query<T, F>(
        &self,
        assertion: &str,
        window: usize,
        factory: &F,
    ) -> Result<T, MatchError>
    where
        F: IndexQueryFactory<T> + ?Sized,
    {
        match self.kind {
            RuleKind::Equality => Ok(equality_query(factory, &self.equality, assertion)),
            RuleKind::Substring => {
                let substring = SubstringKeyFactory::new(self.collator().clone(), window)?;
                Ok(substring_query(factory, &self.equality, &substring, assertion)?)
            }
            kind => match kind.range_operator() {
                Some(op) => Ok(ordering_query(factory, &self.equality, op, assertion)),
                None => Err(MatchError::UnknownRule(self.oid.clone())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collation::{Collator, CollationError};
    use index::{PlanFactory, QueryPlan};

    fn rule(kind: RuleKind, tag: &str) -> MatchingRule {
        MatchingRule::new(
            format!("1.2.3.{}", kind.oid_suffix()),
            [format!("{tag}.{}", kind.shortcode())],
            kind,
            Collator::for_tag(tag).unwrap(),
        )
    }

    #[test]
    fn equality_ignores_case_and_accents() {
        let eq = rule(RuleKind::Equality, "fr-FR");
        assert!(eq.matches("Élève", "ELEVE").unwrap());
        assert!(!eq.matches("élève", "élevé-e").unwrap());
    }

    #[test]
    fn ordering_rules_apply_their_operator() {
        let cases = [
            (RuleKind::LessThan, [true, false, false]),
            (RuleKind::LessOrEqual, [true, true, false]),
            (RuleKind::GreaterOrEqual, [false, true, true]),
            (RuleKind::GreaterThan, [false, false, true]),
        ];
        for (kind, expected) in cases {
            let r = rule(kind, "sv-SE");
            let got = ["zebra", "Ö", "öl"].map(|v| r.matches(v, "ö").unwrap());
            assert_eq!(got, expected, "{kind}");
        }
    }

    #[test]
    fn substring_rule_matches_through_encoded_assertion() {
        let sub = rule(RuleKind::Substring, "de-DE");
        assert!(sub.matches("Hauptstraße 5", "haupt*STRASSE*").unwrap());
        assert!(!sub.matches("Hauptweg", "haupt*strasse*").unwrap());
        assert_eq!(
            sub.normalize_assertion("plain").unwrap_err(),
            MatchError::Collation(CollationError::NotASubstringFilter("plain".into()))
        );
    }

    #[test]
    fn values_match_never_panics_on_garbage() {
        let sub = rule(RuleKind::Substring, "en");
        assert!(!sub.values_match(&[], &[]));
        assert!(!sub.values_match(&[0x80, 0, 0], &[9, 1, 2]));
    }

    #[test]
    fn key_factories_per_kind() {
        let ids = |r: &MatchingRule| -> Vec<String> {
            r.key_factories(6)
                .unwrap()
                .iter()
                .map(|f| f.index_id().to_owned())
                .collect()
        };
        assert_eq!(ids(&rule(RuleKind::GreaterThan, "en-US")), vec!["en_US.equality"]);
        assert_eq!(
            ids(&rule(RuleKind::Substring, "en-US")),
            vec!["en_US.substring.6", "en_US.equality"]
        );
        assert!(rule(RuleKind::Substring, "en").key_factories(0).is_err());
    }

    #[test]
    fn index_queries_follow_kind() {
        let eq = rule(RuleKind::Equality, "en");
        let plan: QueryPlan = eq.create_index_query("x", 6, &PlanFactory).unwrap();
        assert!(matches!(plan, QueryPlan::Exact { .. }));

        let lt = rule(RuleKind::LessThan, "en");
        let plan: QueryPlan = lt.create_index_query("x", 6, &PlanFactory).unwrap();
        assert!(matches!(
            plan,
            QueryPlan::Range { ref lower, upper_inclusive: false, .. } if lower.is_empty()
        ));

        let sub = rule(RuleKind::Substring, "en");
        let plan: QueryPlan = sub.create_index_query("*", 6, &PlanFactory).unwrap();
        assert!(plan.is_match_all());
    }
}
