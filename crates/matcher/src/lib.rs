//! # Collation matching rules (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` owns the schema side of locale-aware matching. It derives a
//! family of matching rules for every configured collation, publishes them
//! through a lock-free registry and a shared schema directory, and gives each
//! rule its behaviour: value normalization, value matching, index key
//! factories and index query construction.
//!
//! ## Core Types
//!
//! - [`RuleKind`]: equality, the four orderings and substring.
//! - [`MatchingRule`]: OID, sorted aliases, kind and the locale's collator.
//! - [`LocaleRuleGenerator`]: `"tag:oid"` → rules `B`, `B.1` … `B.6`.
//! - [`MatchingRuleRegistry`]: immutable [`RuleGeneration`]s swapped atomically.
//! - [`MatchingRuleDirectory`] / [`SchemaDirectory`]: the shared schema, with
//!   owner-aware conflict detection.
//! - [`CollationRuleFactory`]: initialize, check, apply and finalize
//!   configuration; results carry [`Diagnostic`]s instead of failing.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use index::{PlanFactory, QueryPlan};
//! use matcher::{CollationConfig, CollationRuleFactory, SchemaDirectory};
//!
//! let directory = Arc::new(SchemaDirectory::new());
//! let factory = CollationRuleFactory::new("collation", directory);
//! let result = factory.initialize(CollationConfig::with_collations([
//!     "sv-SE:1.3.6.1.4.1.42.2.27.9.4.148.1",
//! ]));
//! assert!(result.is_clean());
//!
//! let lt = factory.resolve("sv-SE.lt").unwrap();
//! assert!(lt.matches("zebra", "ö").unwrap());
//!
//! let sub = factory.resolve("sv-SE.sub").unwrap();
//! let plan: QueryPlan = sub
//!     .create_index_query("*strand*", factory.substring_length(), &PlanFactory)
//!     .unwrap();
//! assert!(!plan.is_match_all());
//! ```
//!
//! ## Observability
//!
//! Reloads emit `tracing` events (`generation_published`, `collation_skipped`,
//! `rule_registration_conflict`) inside a `matcher.reload` span. Install a
//! [`ReloadMetrics`] implementation via [`set_reload_metrics`] to record reload
//! latency and rule counts.

mod diagnostics;
mod directory;
mod error;
mod factory;
mod generator;
pub mod metrics;
mod registry;
mod rule;
mod types;

pub use crate::diagnostics::{ConfigChangeResult, Diagnostic, DiagnosticCode};
pub use crate::directory::{MatchingRuleDirectory, SchemaDirectory};
pub use crate::error::MatchError;
pub use crate::factory::{CollationConfig, CollationRuleFactory};
pub use crate::generator::{GeneratedRules, LocaleRuleGenerator};
pub use crate::metrics::{set_reload_metrics, ReloadMetrics};
pub use crate::registry::{MatchingRuleRegistry, RuleGeneration};
pub use crate::types::{MatchingRule, RuleKind, DIRECTORY_STRING_SYNTAX_OID};
