//! Recommendation queries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hotelads_codec::Zipcode;

use crate::hotel::{DEFAULT_CURRENCY, DEFAULT_LANGUAGE};
use crate::ranking::{rank, SortConfig};
use crate::{AdError, AdResult, Hotel};

/// Days between the event and check-in or check-out.
const STAY_MARGIN_DAYS: u64 = 5;

/// Source of hotels near a zipcode.
#[async_trait]
pub trait HotelProvider: Send + Sync {
    /// Hotels near the zipcode.
    ///
    /// Returns [`AdError::ZipcodeNotInDatabase`] when the provider has no
    /// data for it.
    async fn hotels_by_zipcode(
        &self,
        zipcode: &Zipcode,
        query: &RecommendationQuery,
    ) -> AdResult<Vec<Hotel>>;
}

/// [`HotelProvider`] backed by a fixed map, for tests and local tools.
#[derive(Debug, Clone, Default)]
pub struct StaticHotelProvider {
    hotels: HashMap<Zipcode, Vec<Hotel>>,
}

impl StaticHotelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hotels for a zipcode.
    pub fn with_hotels(mut self, zipcode: Zipcode, hotels: Vec<Hotel>) -> Self {
        self.hotels.insert(zipcode, hotels);
        self
    }
}

#[async_trait]
impl HotelProvider for StaticHotelProvider {
    async fn hotels_by_zipcode(
        &self,
        zipcode: &Zipcode,
        _query: &RecommendationQuery,
    ) -> AdResult<Vec<Hotel>> {
        self.hotels
            .get(zipcode)
            .cloned()
            .ok_or_else(|| AdError::ZipcodeNotInDatabase(zipcode.clone()))
    }
}

/// Check-in and check-out dates for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayDates {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayDates {
    /// A stay around an event date.
    ///
    /// Check-in is five days before the event but never in the past;
    /// check-out is five days after the event and at least five days after
    /// check-in.
    pub fn around_event(event_date: NaiveDate, today: NaiveDate) -> Self {
        let margin = Days::new(STAY_MARGIN_DAYS);
        let check_in = event_date
            .checked_sub_days(margin)
            .unwrap_or(event_date)
            .max(today);
        let check_out = event_date
            .checked_add_days(margin)
            .unwrap_or(event_date)
            .max(check_in.checked_add_days(margin).unwrap_or(check_in));
        Self {
            check_in,
            check_out,
        }
    }
}

/// One recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationQuery {
    /// Zipcode of the event. No zipcode means no recommendations.
    pub zipcode: Option<Zipcode>,
    /// Ranking configuration.
    pub sort: SortConfig,
    /// Response language, defaults to `en`.
    pub language: Option<String>,
    /// Price currency, defaults to `usd`.
    pub currency: Option<String>,
    /// Stay dates forwarded to the provider.
    pub stay: Option<StayDates>,
}

impl RecommendationQuery {
    pub fn new(zipcode: Option<Zipcode>) -> Self {
        Self {
            zipcode,
            sort: SortConfig::default(),
            language: None,
            currency: None,
            stay: None,
        }
    }

    pub fn with_sort(mut self, sort: SortConfig) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_locale(mut self, language: Option<String>, currency: Option<String>) -> Self {
        self.language = language;
        self.currency = currency;
        self
    }

    pub fn with_stay(mut self, stay: StayDates) -> Self {
        self.stay = Some(stay);
        self
    }

    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}

/// Fetches, ranks and truncates hotel recommendations.
#[derive(Clone)]
pub struct StandardEngine {
    provider: Arc<dyn HotelProvider>,
    max_results: usize,
}

impl StandardEngine {
    /// Default number of recommendations per query.
    pub const DEFAULT_MAX_RESULTS: usize = 6;

    pub fn new(provider: Arc<dyn HotelProvider>) -> Self {
        Self {
            provider,
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    /// Set the maximum number of recommendations.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Run a query.
    ///
    /// Returns an empty list when the query has no zipcode or the provider
    /// does not know the zipcode. Other provider failures are propagated.
    /// Results are tagged with the query's language and currency.
    pub async fn query(&self, query: &RecommendationQuery) -> AdResult<Vec<Hotel>> {
        let Some(zipcode) = query.zipcode.as_ref() else {
            debug!("recommendation query without zipcode");
            return Ok(Vec::new());
        };

        let hotels = match self.provider.hotels_by_zipcode(zipcode, query).await {
            Ok(hotels) => hotels,
            Err(AdError::ZipcodeNotInDatabase(_)) => {
                warn!(%zipcode, "zipcode not in hotel database");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let language = query.language_or_default();
        let currency = query.currency_or_default();
        let mut ranked = rank(hotels, &query.sort);
        ranked.truncate(self.max_results);

        info!(%zipcode, count = ranked.len(), sort = %query.sort, "recommendations ranked");
        Ok(ranked
            .into_iter()
            .map(|hotel| hotel.with_locale(language, currency))
            .collect())
    }
}

impl std::fmt::Debug for StandardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardEngine")
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}
