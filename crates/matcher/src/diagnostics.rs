use std::collections::BTreeMap;
use std::fmt;

use collation::CollationError;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// A collation names a locale the server cannot collate.
    UnsupportedLocale,
    /// A collation is not of the form `tag:numeric-oid`.
    MalformedCollationSpec,
    /// A generated rule collides with one already in the schema.
    RegistrationConflict,
}

/// A non-fatal problem found while applying configuration, carried as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub params: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new<'a, I>(code: DiagnosticCode, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        Self {
            code,
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        }
    }

    /// Diagnostic for a collation entry that could not be turned into rules.
    pub fn for_collation(collation: &str, err: &CollationError) -> Self {
        match err {
            CollationError::UnsupportedLocale(tag) => Self::new(
                DiagnosticCode::UnsupportedLocale,
                [("collation", collation.to_owned()), ("tag", tag.clone())],
            ),
            other => Self::new(
                DiagnosticCode::MalformedCollationSpec,
                [("collation", collation.to_owned()), ("reason", other.to_string())],
            ),
        }
    }

    /// Diagnostic for a rule the directory refused.
    pub fn for_registration(err: &MatchError) -> Self {
        match err {
            MatchError::RegistrationConflict { oid, name, owner } => Self::new(
                DiagnosticCode::RegistrationConflict,
                [
                    ("oid", oid.clone()),
                    ("name", name.clone()),
                    ("owner", owner.clone()),
                ],
            ),
            other => Self::new(
                DiagnosticCode::RegistrationConflict,
                [("reason", other.to_string())],
            ),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.code)?;
        for (key, value) in &self.params {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Outcome of initializing or reconfiguring a rule factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChangeResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Set when some rules could not be registered and an operator has to
    /// resolve the conflict.
    pub admin_action_required: bool,
    /// Registry generation in effect after the change.
    pub generation: u64,
}

impl ConfigChangeResult {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && !self.admin_action_required
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }
}
