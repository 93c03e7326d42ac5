//! Hotel recommendations and ad rotation for event pages.
//!
//! This crate provides:
//! - `StandardEngine` - ranked, truncated recommendations for a zipcode
//! - `RecommendationContext` - a persisted candidate set rotated across four ad slots
//! - `AdDataBundle` - a single hotel ad addressed by a shareable id
//! - `AdService` - request-level operations over all of the above
//!
//! All shared state lives in a [`hotelads_cache::CacheStore`]; contexts can be
//! served from any process that shares the store and the token key.

mod bundle;
mod config;
mod context;
mod engine;
mod error;
mod hotel;
mod hotel_cache;
pub mod ranking;
mod render;
mod service;
mod urls;

pub use bundle::{image_path, AdDataBundle, IMAGE_EXTENSION};
pub use config::{
    AdsConfig, AdsSettings, CryptoConfig, MediaConfig, ServerConfig, ENCRYPTION_KEY_ENV,
};
pub use context::{RecommendationContext, MIN_CANDIDATES, SLOT_COUNT};
pub use engine::{
    HotelProvider, RecommendationQuery, StandardEngine, StaticHotelProvider, StayDates,
};
pub use error::{AdError, AdResult};
pub use hotel::{Hotel, DEFAULT_CURRENCY, DEFAULT_LANGUAGE};
pub use hotel_cache::HotelCache;
pub use render::{
    AdImageGenerator, FsImageStore, HotelFormatter, ImageRenderer, ImageStore,
    PassthroughFormatter, RenderOptions,
};
pub use service::{AdService, Collaborators, ContextAds};
pub use urls::{parse_dimensions, UrlBuilder, UrlOptions, UrlPair};

pub use hotelads_codec::{BundleId, ContextId, ContextTokenCodec, HotelId, Zipcode};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::ranking::{SortConfig, SortCriterion, UnknownCriterionPolicy};
    pub use crate::{
        AdDataBundle, AdError, AdResult, AdService, AdsConfig, Collaborators, ContextId, Hotel,
        HotelId, HotelProvider, RecommendationContext, RecommendationQuery, RenderOptions,
        UrlOptions, Zipcode, SLOT_COUNT,
    };
}
