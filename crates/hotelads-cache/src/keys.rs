//! Logical keyspace shared by every component that touches the store.
//!
//! | Key pattern | Structure |
//! |---|---|
//! | `cache` | hash, field `hotel_{id}` |
//! | `rec_context_id_generator` | integer counter |
//! | `rec_context_zipcodes` | hash, field = context id |
//! | `rec_context_hotels_{id}` | set of hotel ids |
//! | `free_hotels_{id}` | set of hotel ids |
//! | `ad_{id}_{slot}` | string |

use std::fmt::Display;

/// Hash holding canonical hotel records as JSON.
pub const HOTEL_CACHE: &str = "cache";

/// Counter used to allocate context ids.
pub const CONTEXT_ID_GENERATOR: &str = "rec_context_id_generator";

/// Hash mapping context id to zipcode.
pub const CONTEXT_ZIPCODES: &str = "rec_context_zipcodes";

/// Build an underscore-joined cache key.
///
/// # Example
///
/// ```rust
/// use hotelads_cache::cache_key;
///
/// assert_eq!(cache_key!("ad", 7, 2), "ad_7_2");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push('_');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

/// Field of [`HOTEL_CACHE`] holding one hotel record.
pub fn hotel_field(hotel_id: impl Display) -> String {
    cache_key!("hotel", hotel_id)
}

/// Candidate set of a context.
pub fn context_hotels(context_id: impl Display) -> String {
    cache_key!("rec_context_hotels", context_id)
}

/// Rotation pool of a context.
pub fn free_hotels(context_id: impl Display) -> String {
    cache_key!("free_hotels", context_id)
}

/// Current assignment of one ad slot.
pub fn ad_slot(context_id: impl Display, slot: impl Display) -> String {
    cache_key!("ad", context_id, slot)
}
