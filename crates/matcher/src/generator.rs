use std::collections::BTreeSet;

use collation::{Collator, CollationError, LocaleSpec};

use crate::diagnostics::Diagnostic;
use crate::registry::RuleGeneration;
use crate::types::{MatchingRule, RuleKind};

/// Rules derived from a list of collation specs, plus what went wrong on the way.
#[derive(Debug, Default)]
pub struct GeneratedRules {
    pub rules: Vec<MatchingRule>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Derives the family of matching rules for each configured collation.
///
/// For base OID `B` and tag `t`, each enabled kind yields `B.n` with aliases
/// `t.<shortcode>` and `t.n`. Equality additionally owns the bare `B` under the
/// alias `t`. A rule whose OID already exists, in the previous generation or
/// earlier in this run, keeps the aliases it had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRuleGenerator {
    kinds: BTreeSet<RuleKind>,
}

impl Default for LocaleRuleGenerator {
    fn default() -> Self {
        Self::new(RuleKind::ALL)
    }
}

impl LocaleRuleGenerator {
    pub fn new<I: IntoIterator<Item = RuleKind>>(kinds: I) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn kinds(&self) -> &BTreeSet<RuleKind> {
        &self.kinds
    }

    /// Append the rules for one collation to `out`.
    pub fn generate(
        &self,
        spec: &LocaleSpec,
        previous: &RuleGeneration,
        out: &mut Vec<MatchingRule>,
    ) -> Result<(), CollationError> {
        let locale = spec.locale()?;
        let collator = Collator::new(&locale)?;
        let tag = spec.tag();
        let base = spec.oid();

        for &kind in &self.kinds {
            if kind == RuleKind::Equality {
                push_rule(out, previous, base.to_owned(), vec![tag.to_owned()], kind, &collator);
            }
            let n = kind.oid_suffix();
            push_rule(
                out,
                previous,
                format!("{base}.{n}"),
                vec![format!("{tag}.{}", kind.shortcode()), format!("{tag}.{n}")],
                kind,
                &collator,
            );
        }
        Ok(())
    }

    /// Generate rules for every raw `"tag:oid"` string. Bad entries become
    /// diagnostics and are skipped.
    pub fn generate_all<S: AsRef<str>>(
        &self,
        collations: &[S],
        previous: &RuleGeneration,
    ) -> GeneratedRules {
        let mut generated = GeneratedRules::default();
        for collation in collations {
            let collation = collation.as_ref();
            let result = LocaleSpec::parse(collation)
                .and_then(|spec| self.generate(&spec, previous, &mut generated.rules));
            if let Err(err) = result {
                generated
                    .diagnostics
                    .push(Diagnostic::for_collation(collation, &err));
            }
        }
        generated
    }
}

fn push_rule(
    out: &mut Vec<MatchingRule>,
    previous: &RuleGeneration,
    oid: String,
    names: Vec<String>,
    kind: RuleKind,
    collator: &Collator,
) {
    let mut rule = MatchingRule::new(oid, names, kind, collator.clone());
    if let Some(old) = previous.get(rule.oid()) {
        rule.merge_names(old.names().iter().cloned());
    }
    match out.iter().position(|r| r.oid() == rule.oid()) {
        Some(idx) => {
            rule.merge_names(out[idx].names().iter().cloned());
            out[idx] = rule;
        }
        None => out.push(rule),
    }
}
