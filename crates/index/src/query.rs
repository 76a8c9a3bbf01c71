use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::compare_keys;

/// Backend-side constructor for index queries.
///
/// Query builders only ever talk to this trait, so any backend can plug in its
/// own query representation `T`. An empty `lower` or `upper` bound means the
/// range is unbounded on that side.
pub trait IndexQueryFactory<T> {
    fn create_exact_match_query(&self, index_id: &str, key: &[u8]) -> T;

    fn create_range_match_query(
        &self,
        index_id: &str,
        lower: &[u8],
        upper: &[u8],
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> T;

    fn create_intersection_query(&self, queries: Vec<T>) -> T;

    fn create_union_query(&self, queries: Vec<T>) -> T;

    fn create_match_all_query(&self) -> T;
}

/// A backend-neutral query plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPlan {
    Exact {
        index_id: String,
        key: Vec<u8>,
    },
    Range {
        index_id: String,
        lower: Vec<u8>,
        upper: Vec<u8>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    },
    Intersection(Vec<QueryPlan>),
    Union(Vec<QueryPlan>),
    MatchAll,
}

impl QueryPlan {
    pub fn is_match_all(&self) -> bool {
        matches!(self, QueryPlan::MatchAll)
    }

    /// Number of leaf terms (exact, range and match-all) in the plan.
    pub fn leaf_count(&self) -> usize {
        match self {
            QueryPlan::Intersection(plans) | QueryPlan::Union(plans) => {
                plans.iter().map(QueryPlan::leaf_count).sum()
            }
            _ => 1,
        }
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPlan::Exact { index_id, key } => {
                write!(f, "{index_id}={}", hex::encode(key))
            }
            QueryPlan::Range {
                index_id,
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => write!(
                f,
                "{index_id}{}{},{}{}",
                if *lower_inclusive { '[' } else { '(' },
                hex::encode(lower),
                hex::encode(upper),
                if *upper_inclusive { ']' } else { ')' },
            ),
            QueryPlan::Intersection(plans) => write_group(f, "AND", plans),
            QueryPlan::Union(plans) => write_group(f, "OR", plans),
            QueryPlan::MatchAll => f.write_str("ALL"),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, op: &str, plans: &[QueryPlan]) -> fmt::Result {
    write!(f, "{op}(")?;
    for (idx, plan) in plans.iter().enumerate() {
        if idx > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{plan}")?;
    }
    f.write_str(")")
}

/// Builds [`QueryPlan`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanFactory;

impl IndexQueryFactory<QueryPlan> for PlanFactory {
    fn create_exact_match_query(&self, index_id: &str, key: &[u8]) -> QueryPlan {
        QueryPlan::Exact {
            index_id: index_id.to_owned(),
            key: key.to_vec(),
        }
    }

    fn create_range_match_query(
        &self,
        index_id: &str,
        lower: &[u8],
        upper: &[u8],
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> QueryPlan {
        QueryPlan::Range {
            index_id: index_id.to_owned(),
            lower: lower.to_vec(),
            upper: upper.to_vec(),
            lower_inclusive,
            upper_inclusive,
        }
    }

    fn create_intersection_query(&self, queries: Vec<QueryPlan>) -> QueryPlan {
        QueryPlan::Intersection(queries)
    }

    fn create_union_query(&self, queries: Vec<QueryPlan>) -> QueryPlan {
        QueryPlan::Union(queries)
    }

    fn create_match_all_query(&self) -> QueryPlan {
        QueryPlan::MatchAll
    }
}

/// Whether `key` falls inside a range whose empty bounds are unbounded.
pub fn range_contains(
    key: &[u8],
    lower: &[u8],
    upper: &[u8],
    lower_inclusive: bool,
    upper_inclusive: bool,
) -> bool {
    use std::cmp::Ordering::*;

    let above = lower.is_empty()
        || match compare_keys(key, lower) {
            Greater => true,
            Equal => lower_inclusive,
            Less => false,
        };
    let below = upper.is_empty()
        || match compare_keys(key, upper) {
            Less => true,
            Equal => upper_inclusive,
            Greater => false,
        };
    above && below
}
