//! Compile assertion values into index queries.
//!
//! Builders are generic over the backend's query type and only use
//! [`IndexQueryFactory`]. Ordering queries are single ranges over full keys.
//! Substring queries combine prefix ranges (for an initial fragment, or a
//! fragment shorter than the window) with exact lookups of every window of
//! longer fragments.

use collation::{full_windows, SubstringAssertion};
use serde::{Deserialize, Serialize};

use crate::approximate::ApproximateNormalizer;
use crate::error::IndexError;
use crate::factory::{
    ApproximateKeyFactory, CollationKeyFactory, IndexKeyFactory, SubstringKeyFactory,
};
use crate::key::increment_prefix;
use crate::query::IndexQueryFactory;

/// Relational operator of an ordering filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeOperator {
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl RangeOperator {
    /// Whether a value whose key compares as `ordering` against the assertion key
    /// satisfies this operator.
    pub fn accepts(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            RangeOperator::LessThan => ordering == Less,
            RangeOperator::LessOrEqual => ordering != Greater,
            RangeOperator::GreaterThan => ordering == Greater,
            RangeOperator::GreaterOrEqual => ordering != Less,
        }
    }
}

pub fn equality_query<T, F>(factory: &F, index: &CollationKeyFactory, assertion: &str) -> T
where
    F: IndexQueryFactory<T> + ?Sized,
{
    let key = index.collator().full_key(assertion);
    factory.create_exact_match_query(index.index_id(), &key)
}

pub fn ordering_query<T, F>(
    factory: &F,
    index: &CollationKeyFactory,
    operator: RangeOperator,
    assertion: &str,
) -> T
where
    F: IndexQueryFactory<T> + ?Sized,
{
    let key = index.collator().full_key(assertion);
    let id = index.index_id();
    match operator {
        RangeOperator::LessThan => factory.create_range_match_query(id, &[], &key, false, false),
        RangeOperator::LessOrEqual => factory.create_range_match_query(id, &[], &key, false, true),
        RangeOperator::GreaterThan => {
            factory.create_range_match_query(id, &key, &[], false, false)
        }
        RangeOperator::GreaterOrEqual => {
            factory.create_range_match_query(id, &key, &[], true, false)
        }
    }
}

/// `[prefix, increment(prefix))`, or `[prefix, ∞)` when the prefix cannot be incremented.
pub fn prefix_range_query<T, F>(factory: &F, index_id: &str, prefix: &[u8]) -> T
where
    F: IndexQueryFactory<T> + ?Sized,
{
    let upper = increment_prefix(prefix).unwrap_or_default();
    factory.create_range_match_query(index_id, prefix, &upper, true, false)
}

/// Compile a raw substring filter value.
///
/// The initial fragment becomes a prefix range on the equality index. Middle and
/// final fragments go to the substring index: a prefix range when shorter than
/// the window, otherwise the intersection of exact lookups of their windows.
/// A wildcard-only filter matches everything.
pub fn substring_query<T, F>(
    factory: &F,
    equality: &CollationKeyFactory,
    substring: &SubstringKeyFactory,
    assertion: &str,
) -> Result<T, IndexError>
where
    F: IndexQueryFactory<T> + ?Sized,
{
    let assertion = SubstringAssertion::parse(assertion)?;
    if assertion.is_wildcard_only() {
        return Ok(factory.create_match_all_query());
    }

    let collator = substring.collator();
    let window = substring.window();
    let mut queries = Vec::with_capacity(assertion.sub_any().len() + 2);

    if let Some(initial) = assertion.sub_initial() {
        let key = equality.collator().fragment_key(initial);
        if !key.is_empty() {
            queries.push(prefix_range_query(factory, equality.index_id(), &key));
        }
    }

    let fragments = assertion
        .sub_any()
        .iter()
        .map(String::as_str)
        .chain(assertion.sub_final());
    for fragment in fragments {
        let key = collator.fragment_key(fragment);
        if key.is_empty() {
            continue;
        }
        if key.len() < window {
            queries.push(prefix_range_query(factory, substring.index_id(), &key));
            continue;
        }
        let exact = full_windows(&key, window)
            .into_iter()
            .map(|w| factory.create_exact_match_query(substring.index_id(), &w))
            .collect();
        queries.push(factory.create_intersection_query(exact));
    }

    if queries.is_empty() {
        // Every fragment was made only of ignorable characters.
        return Ok(factory.create_match_all_query());
    }
    Ok(factory.create_intersection_query(queries))
}

pub fn approximate_query<T, F, N>(
    factory: &F,
    index: &ApproximateKeyFactory<N>,
    assertion: &str,
) -> Result<T, IndexError>
where
    F: IndexQueryFactory<T> + ?Sized,
    N: ApproximateNormalizer,
{
    let key = index.normalizer().normalize(assertion)?;
    Ok(factory.create_exact_match_query(index.index_id(), &key))
}
