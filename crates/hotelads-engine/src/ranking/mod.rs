//! Hotel ranking.
//!
//! Contains sort criteria parsing and the multi-key ranking sort.

mod criteria;
mod rank;

pub use criteria::{SortConfig, SortCriterion, UnknownCriterionPolicy, DEFAULT_SORT};
pub use rank::{rank, rank_key};
