use std::collections::BTreeSet;
use std::fmt;

use collation::{Collator, Locale};
use index::{CollationKeyFactory, RangeOperator};
use serde::{Deserialize, Serialize};

/// Syntax every collation matching rule applies to (Directory String).
pub const DIRECTORY_STRING_SYNTAX_OID: &str = "1.3.6.1.4.1.1466.115.121.1.15";

/// What a collation matching rule does with its assertion value.
///
/// Declaration order is the order rules are generated in for a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    LessThan,
    LessOrEqual,
    Equality,
    GreaterOrEqual,
    GreaterThan,
    Substring,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::LessThan,
        RuleKind::LessOrEqual,
        RuleKind::Equality,
        RuleKind::GreaterOrEqual,
        RuleKind::GreaterThan,
        RuleKind::Substring,
    ];

    pub fn is_ordering(self) -> bool {
        self.range_operator().is_some()
    }

    /// Operator applied by ordering rules; `None` for equality and substring.
    pub fn range_operator(self) -> Option<RangeOperator> {
        match self {
            RuleKind::LessThan => Some(RangeOperator::LessThan),
            RuleKind::LessOrEqual => Some(RangeOperator::LessOrEqual),
            RuleKind::GreaterOrEqual => Some(RangeOperator::GreaterOrEqual),
            RuleKind::GreaterThan => Some(RangeOperator::GreaterThan),
            RuleKind::Equality | RuleKind::Substring => None,
        }
    }

    /// OID arc appended to the locale's base OID.
    pub fn oid_suffix(self) -> u8 {
        match self {
            RuleKind::LessThan => 1,
            RuleKind::LessOrEqual => 2,
            RuleKind::Equality => 3,
            RuleKind::GreaterOrEqual => 4,
            RuleKind::GreaterThan => 5,
            RuleKind::Substring => 6,
        }
    }

    /// Alias suffix, as in `en-US.lte`.
    pub fn shortcode(self) -> &'static str {
        match self {
            RuleKind::LessThan => "lt",
            RuleKind::LessOrEqual => "lte",
            RuleKind::Equality => "eq",
            RuleKind::GreaterOrEqual => "gte",
            RuleKind::GreaterThan => "gt",
            RuleKind::Substring => "sub",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::LessThan => "less-than",
            RuleKind::LessOrEqual => "less-or-equal",
            RuleKind::Equality => "equality",
            RuleKind::GreaterOrEqual => "greater-or-equal",
            RuleKind::GreaterThan => "greater-than",
            RuleKind::Substring => "substring",
        };
        f.write_str(name)
    }
}

/// A collation matching rule for one locale.
///
/// Identity is the OID. Aliases are case-sensitive and kept sorted; they
/// accumulate across configuration generations. Behaviour lives in
/// `crate::rule` and dispatches on [`RuleKind`].
#[derive(Debug, Clone)]
pub struct MatchingRule {
    pub(crate) oid: String,
    pub(crate) names: BTreeSet<String>,
    pub(crate) kind: RuleKind,
    pub(crate) equality: CollationKeyFactory,
}

impl MatchingRule {
    pub fn new(
        oid: impl Into<String>,
        names: impl IntoIterator<Item = String>,
        kind: RuleKind,
        collator: Collator,
    ) -> Self {
        Self {
            oid: oid.into(),
            names: names.into_iter().collect(),
            kind,
            equality: CollationKeyFactory::new(collator),
        }
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// First alias in sorted order, or the OID when the rule has none.
    pub fn name(&self) -> &str {
        self.names.first().map_or(self.oid.as_str(), String::as_str)
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn syntax_oid(&self) -> &'static str {
        DIRECTORY_STRING_SYNTAX_OID
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn collator(&self) -> &Collator {
        self.equality.collator()
    }

    pub fn locale(&self) -> &Locale {
        self.collator().locale()
    }

    /// Name shared by every rule of this locale's indexes: `lang[_COUNTRY][_variant]`.
    pub fn index_name(&self) -> String {
        self.locale().index_name()
    }

    /// Add aliases, keeping the existing ones.
    pub fn merge_names<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.names.extend(names);
    }
}

impl fmt::Display for MatchingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {} NAME ", self.oid)?;
        match self.names.len() {
            0 => f.write_str("''")?,
            1 => write!(f, "'{}'", self.name())?,
            _ => {
                f.write_str("( ")?;
                for name in &self.names {
                    write!(f, "'{name}' ")?;
                }
                f.write_str(")")?;
            }
        }
        write!(f, " SYNTAX {} )", self.syntax_oid())
    }
}
