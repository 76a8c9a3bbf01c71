//! # Directory index keys and query plans
//!
//! This crate sits between the collation codec and a directory backend. It
//! turns attribute values into index keys at write time and assertion values
//! into query plans at search time, for every kind of collation matching rule.
//!
//! ## Core pieces
//!
//! - **Keys**: [`KeySet`] keeps keys in unsigned byte-lexicographic order
//!   ([`compare_keys`]); [`increment_prefix`] computes exclusive upper bounds
//!   for prefix ranges.
//! - **Key factories**: [`CollationKeyFactory`] (equality and ordering),
//!   [`SubstringKeyFactory`] (overlapping windows) and
//!   [`ApproximateKeyFactory`] (pluggable phonetic normalizer, [`Soundex`] by
//!   default). Each exposes an index id that namespaces its keys per locale.
//! - **Query builders**: [`equality_query`], [`ordering_query`],
//!   [`substring_query`] and [`approximate_query`] are generic over the
//!   backend's query type through [`IndexQueryFactory`]. [`PlanFactory`]
//!   builds the backend-neutral [`QueryPlan`].
//! - **Reference backend**: [`InMemoryBackend`] stores postings and evaluates
//!   plans. Tests and benchmarks use it; production backends implement
//!   [`IndexQueryFactory`] for their own query type.
//!
//! ## Example Usage
//!
//! ```
//! use collation::Collator;
//! use index::{
//!     substring_query, CollationKeyFactory, IndexBackend, InMemoryBackend, PlanFactory,
//!     QueryPlan, SubstringKeyFactory, DEFAULT_SUBSTRING_LENGTH,
//! };
//!
//! let collator = Collator::for_tag("en-US").unwrap();
//! let equality = CollationKeyFactory::new(collator.clone());
//! let substring = SubstringKeyFactory::new(collator, DEFAULT_SUBSTRING_LENGTH).unwrap();
//!
//! let backend = InMemoryBackend::new();
//! backend.index_values(&equality, &["Babs Jensen"], 1).unwrap();
//! backend.index_values(&substring, &["Babs Jensen"], 1).unwrap();
//! backend.index_values(&equality, &["Barbara Jones"], 2).unwrap();
//! backend.index_values(&substring, &["Barbara Jones"], 2).unwrap();
//!
//! let plan: QueryPlan = substring_query(&PlanFactory, &equality, &substring, "b*jen*").unwrap();
//! assert_eq!(backend.evaluate(&plan).unwrap().into_iter().collect::<Vec<_>>(), vec![1]);
//! ```

mod approximate;
mod backend;
mod builder;
mod error;
mod factory;
mod key;
mod query;

pub use crate::approximate::{ApproximateNormalizer, Soundex};
pub use crate::backend::{EntryId, InMemoryBackend, IndexBackend};
pub use crate::builder::{
    approximate_query, equality_query, ordering_query, prefix_range_query, substring_query,
    RangeOperator,
};
pub use crate::error::IndexError;
pub use crate::factory::{
    equality_index_id, substring_index_id, ApproximateKeyFactory, CollationKeyFactory,
    IndexKeyFactory, SubstringKeyFactory, APPROXIMATE_INDEX_ID, DEFAULT_SUBSTRING_LENGTH,
};
pub use crate::key::{compare_keys, increment_prefix, IndexKey, KeySet};
pub use crate::query::{range_contains, IndexQueryFactory, PlanFactory, QueryPlan};
