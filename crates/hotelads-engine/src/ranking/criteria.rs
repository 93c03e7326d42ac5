//! Sort criteria.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AdError, AdResult};

/// Criteria string used when a request gives none.
pub const DEFAULT_SORT: &str = "distance,popularity,rating,price";

/// A single ranking criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortCriterion {
    /// Closer to the event ranks higher.
    Distance,
    Popularity,
    Rating,
    /// Closeness to a target price, or the advertised price without one.
    Price,
}

impl SortCriterion {
    /// Every criterion, in the order omitted criteria are appended.
    pub const ALL: [SortCriterion; 4] = [
        SortCriterion::Distance,
        SortCriterion::Popularity,
        SortCriterion::Rating,
        SortCriterion::Price,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortCriterion::Distance => "distance",
            SortCriterion::Popularity => "popularity",
            SortCriterion::Rating => "rating",
            SortCriterion::Price => "price",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = AdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(SortCriterion::Distance),
            "popularity" => Ok(SortCriterion::Popularity),
            "rating" => Ok(SortCriterion::Rating),
            "price" => Ok(SortCriterion::Price),
            _ => Err(AdError::UnknownCriterion(s.trim().to_string())),
        }
    }
}

/// What to do with an unrecognised criterion name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCriterionPolicy {
    /// Skip it.
    #[default]
    Drop,
    /// Fail with [`AdError::UnknownCriterion`].
    Reject,
}

/// Complete sort configuration of one ranking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// All four criteria, most significant first.
    criteria: Vec<SortCriterion>,
    /// Sort from highest to lowest key.
    pub descending: bool,
    /// Target nightly price.
    pub target_price: Option<f64>,
}

impl SortConfig {
    /// Build from an explicit criteria order.
    ///
    /// Duplicates keep their first position and omitted criteria are
    /// appended in [`SortCriterion::ALL`] order, so the result always holds
    /// all four criteria exactly once.
    pub fn new(explicit: impl IntoIterator<Item = SortCriterion>) -> Self {
        let mut criteria: Vec<SortCriterion> = Vec::with_capacity(SortCriterion::ALL.len());
        for criterion in explicit.into_iter().chain(SortCriterion::ALL) {
            if !criteria.contains(&criterion) {
                criteria.push(criterion);
            }
        }
        Self {
            criteria,
            descending: true,
            target_price: None,
        }
    }

    /// Parse a comma-separated criteria string.
    ///
    /// Tokens are trimmed and matched case-insensitively; empty tokens are
    /// ignored.
    pub fn parse(input: &str, policy: UnknownCriterionPolicy) -> AdResult<Self> {
        let mut explicit = Vec::new();
        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<SortCriterion>() {
                Ok(criterion) => explicit.push(criterion),
                Err(err) => match policy {
                    UnknownCriterionPolicy::Drop => {
                        debug!(criterion = token, "dropping unknown sort criterion");
                    }
                    UnknownCriterionPolicy::Reject => return Err(err),
                },
            }
        }
        Ok(Self::new(explicit))
    }

    /// Set the sort direction.
    pub fn with_descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Set the target price.
    pub fn with_target_price(mut self, price: Option<f64>) -> Self {
        self.target_price = price;
        self
    }

    /// Criteria, most significant first.
    pub fn criteria(&self) -> &[SortCriterion] {
        &self.criteria
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self::new(SortCriterion::ALL)
    }
}

impl fmt::Display for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.criteria.iter().map(SortCriterion::as_str).collect();
        f.write_str(&names.join(","))
    }
}
