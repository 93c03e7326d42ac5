//! Hotel records.
//!
//! Hotels are flat JSON objects from the hotel data provider. Only the fields
//! used for ranking, rotation and redirects are typed; everything else is kept
//! in [`Hotel::extra`] and written back to the cache unchanged.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hotelads_codec::HotelId;

/// Language assumed when a record carries none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Currency assumed when a record carries none.
pub const DEFAULT_CURRENCY: &str = "usd";

/// A hotel record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    /// Hotel identifier.
    pub id: HotelId,

    /// Display name, either a string or a `{language: name}` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    /// Photo descriptors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<Value>>,

    /// Photo counts keyed by room type.
    #[serde(
        rename = "photosByRoomType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub photos_by_room_type: Option<Value>,

    /// Review summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    /// Lowest advertised nightly price.
    #[serde(
        rename = "priceFrom",
        alias = "pricefrom",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price_from: Option<f64>,

    /// Best offer for the requested stay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_price: Option<f64>,

    /// Reference price shown struck through next to `best_price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worst_price: Option<f64>,

    /// Distance to the event venue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_to_event: Option<f64>,

    /// City (location) id used in redirects.
    #[serde(rename = "cityId", default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Fields not used by the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Hotel {
    /// Create a bare record with only an id.
    pub fn new(id: u64) -> Self {
        Self {
            id: HotelId::new(id),
            name: None,
            photos: None,
            photos_by_room_type: None,
            summary: None,
            popularity: None,
            rating: None,
            price_from: None,
            best_price: None,
            worst_price: None,
            distance_to_event: None,
            city_id: None,
            language: None,
            currency: None,
            extra: Map::new(),
        }
    }

    /// Record has a name and at least one photo.
    pub fn is_displayable(&self) -> bool {
        self.name.as_ref().is_some_and(is_truthy)
            && self.photos.as_ref().is_some_and(|photos| !photos.is_empty())
    }

    /// A non-zero best price is known.
    pub fn has_best_price(&self) -> bool {
        self.best_price.is_some_and(|price| price != 0.0)
    }

    pub fn has_summary(&self) -> bool {
        self.summary.as_ref().is_some_and(is_truthy)
    }

    pub fn has_room_type_photos(&self) -> bool {
        self.photos_by_room_type.as_ref().is_some_and(is_truthy)
    }

    /// Name in the requested language, falling back to English.
    pub fn display_name(&self, language: &str) -> Option<&str> {
        match self.name.as_ref()? {
            Value::String(name) => Some(name),
            Value::Object(names) => names
                .get(language)
                .or_else(|| names.get(DEFAULT_LANGUAGE))
                .and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    /// Tag the record with the locale of the request that produced it.
    pub fn with_locale(mut self, language: &str, currency: &str) -> Self {
        self.language = Some(language.to_string());
        self.currency = Some(currency.to_string());
        self
    }

    /// Maybe present the best price as a discount.
    ///
    /// With the given probability, and only when a best price is known but no
    /// reference price is, the current best price becomes the reference price
    /// and the best price is lowered by `1 / (5 * (k % 5 + 1))` for a random
    /// `k` in `5..=31`. Returns whether the record changed.
    pub fn apply_discount_presentation<R: Rng + ?Sized>(
        &mut self,
        probability: f64,
        rng: &mut R,
    ) -> bool {
        if probability.is_nan() || probability <= 0.0 || !rng.gen_bool(probability.min(1.0)) {
            return false;
        }
        if self.worst_price.is_some_and(|price| price != 0.0) {
            return false;
        }
        let Some(best) = self.best_price.filter(|price| *price != 0.0) else {
            return false;
        };

        let k: u32 = rng.gen_range(5..=31);
        let discount = 1.0 / (5.0 * f64::from(k % 5 + 1));
        self.worst_price = Some(best);
        self.best_price = Some(best * (1.0 - discount));
        true
    }
}

/// Python-style truthiness of a JSON value.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
