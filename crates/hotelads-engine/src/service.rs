//! Request-level operations tying the engine, contexts and bundles together.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use hotelads_cache::CacheStore;
use hotelads_codec::{ContextId, ContextTokenCodec, Zipcode};

use crate::bundle::AdDataBundle;
use crate::config::AdsConfig;
use crate::context::RecommendationContext;
use crate::engine::{HotelProvider, RecommendationQuery, StandardEngine};
use crate::hotel_cache::HotelCache;
use crate::ranking::SortConfig;
use crate::render::{AdImageGenerator, HotelFormatter, ImageRenderer, ImageStore, RenderOptions};
use crate::urls::{UrlBuilder, UrlOptions, UrlPair};
use crate::{AdError, AdResult, Hotel};

/// Language put in redirect URLs when a hotel carries none.
const REDIRECT_DEFAULT_LANGUAGE: &str = "es-US";

/// Everything an [`AdService`] delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn CacheStore>,
    pub provider: Arc<dyn HotelProvider>,
    pub formatter: Arc<dyn HotelFormatter>,
    pub renderer: Arc<dyn ImageRenderer>,
    pub images: Arc<dyn ImageStore>,
}

/// A context and the public URLs of its slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAds {
    pub context_id: ContextId,
    pub token: String,
    pub zipcode: Zipcode,
    /// City of the top-ranked hotel.
    pub location_id: Option<u64>,
    pub total_recommendations: usize,
    pub urls: Vec<UrlPair>,
    /// API endpoint that refreshes the candidates.
    pub update_url: String,
}

/// Hotel ad service.
pub struct AdService {
    config: AdsConfig,
    store: Arc<dyn CacheStore>,
    hotels: HotelCache,
    engine: StandardEngine,
    codec: ContextTokenCodec,
    generator: AdImageGenerator,
    formatter: Arc<dyn HotelFormatter>,
    images: Arc<dyn ImageStore>,
    urls: UrlBuilder,
}

impl AdService {
    /// Build a service from validated configuration.
    ///
    /// Fails when the configuration is invalid or carries no encryption key.
    pub fn new(config: AdsConfig, collaborators: Collaborators) -> AdResult<Self> {
        config.validate()?;
        let key = config
            .crypto
            .id_encryption_key
            .as_deref()
            .ok_or_else(|| AdError::Config("crypto.id_encryption_key is not set".into()))?;
        let codec = ContextTokenCodec::new(key)?;

        let engine = StandardEngine::new(collaborators.provider)
            .with_max_results(config.ads.max_recommendations);
        let generator =
            AdImageGenerator::new(collaborators.formatter.clone(), collaborators.renderer)
                .with_discount_probability(config.ads.discount_probability)
                .with_timeout(Duration::from_millis(config.ads.render_timeout_ms));
        let urls = UrlBuilder::new(config.server.clone());

        Ok(Self {
            hotels: HotelCache::new(collaborators.store.clone()),
            store: collaborators.store,
            engine,
            codec,
            generator,
            formatter: collaborators.formatter,
            images: collaborators.images,
            urls,
            config,
        })
    }

    pub fn config(&self) -> &AdsConfig {
        &self.config
    }

    pub fn codec(&self) -> &ContextTokenCodec {
        &self.codec
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    /// Ranked recommendations for a query.
    pub async fn recommend(&self, query: &RecommendationQuery) -> AdResult<Vec<Hotel>> {
        self.engine.query(query).await
    }

    /// Run a query, cache its results and open a context on them.
    ///
    /// Returns `None` when the query produced no recommendations. Stay dates
    /// on the query take precedence over the ones in `options`.
    #[instrument(skip(self, query, options), fields(zipcode = ?query.zipcode))]
    pub async fn create_context(
        &self,
        query: &RecommendationQuery,
        options: &UrlOptions,
    ) -> AdResult<Option<ContextAds>> {
        let hotels = self.engine.query(query).await?;
        let Some(zipcode) = query.zipcode.clone().filter(|_| !hotels.is_empty()) else {
            debug!("no recommendations, no context created");
            return Ok(None);
        };

        self.hotels.cache_hotels(&hotels).await?;
        let context = RecommendationContext::create(self.store.clone(), zipcode, &hotels).await?;
        let options = match query.stay {
            Some(stay) => options.clone().with_stay(stay.check_in, stay.check_out),
            None => options.clone(),
        };
        Ok(Some(self.context_ads(&context, &hotels, &options)))
    }

    /// URLs of an existing context.
    pub async fn open_context(&self, id: ContextId, options: &UrlOptions) -> AdResult<ContextAds> {
        let context = RecommendationContext::from_id(self.store.clone(), id).await?;
        let hotels = context.hotels().await?;
        Ok(self.context_ads(&context, &hotels, options))
    }

    fn context_ads(
        &self,
        context: &RecommendationContext,
        hotels: &[Hotel],
        options: &UrlOptions,
    ) -> ContextAds {
        ContextAds {
            context_id: context.id(),
            token: context.token(&self.codec),
            zipcode: context.zipcode().clone(),
            location_id: hotels.first().and_then(|hotel| hotel.city_id),
            total_recommendations: hotels.len(),
            urls: context.generate_urls(&self.codec, &self.urls, options),
            update_url: self.urls.context_update_url(context.id()),
        }
    }

    /// Re-run the search of a context, optionally for a new zipcode.
    ///
    /// The fresh results are cached and replace the candidate set, which
    /// resets rotation for every slot. Fewer than four results fail with
    /// [`AdError::InsufficientCandidates`] and leave the context as it was.
    #[instrument(skip(self, sort), fields(sort = %sort))]
    pub async fn update_context(
        &self,
        id: ContextId,
        zipcode: Option<Zipcode>,
        sort: SortConfig,
    ) -> AdResult<RecommendationContext> {
        let mut context = RecommendationContext::from_id(self.store.clone(), id).await?;
        let target = zipcode.unwrap_or_else(|| context.zipcode().clone());

        let query = RecommendationQuery::new(Some(target.clone())).with_sort(sort);
        let hotels = self.engine.query(&query).await?;
        self.hotels.cache_hotels(&hotels).await?;
        context.set_hotels(&hotels).await?;
        context.set_zipcode(Some(target)).await?;

        info!(context_id = %id, zipcode = %context.zipcode(), "context updated");
        Ok(context)
    }

    /// Rotate a slot of the context behind a token and render it.
    pub async fn ad_image(
        &self,
        token: &str,
        slot: usize,
        options: &RenderOptions,
    ) -> AdResult<Option<Vec<u8>>> {
        let context =
            RecommendationContext::from_token(self.store.clone(), &self.codec, token).await?;
        context.get_ad(slot, &self.generator, options).await
    }

    /// Redirect target for the hotel currently shown in a slot.
    pub async fn ad_redirect(&self, token: &str, slot: usize) -> AdResult<Option<String>> {
        let context =
            RecommendationContext::from_token(self.store.clone(), &self.codec, token).await?;
        Ok(context
            .get_hotel(slot)
            .await?
            .map(|hotel| self.redirect_url(&hotel)))
    }

    /// Fill the redirect template for a hotel.
    pub fn redirect_url(&self, hotel: &Hotel) -> String {
        let location = hotel
            .city_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        self.config
            .ads
            .hotel_redirect_url_template
            .replace("{hotel_id}", &hotel.id.to_string())
            .replace("{location_id}", &location)
            .replace(
                "{hotel_lang}",
                hotel.language.as_deref().unwrap_or(REDIRECT_DEFAULT_LANGUAGE),
            )
            .replace("{hotel_currency}", hotel.currency_or_default())
    }

    /// Render a standalone ad, persist its image and return the bundle.
    ///
    /// The bundle holds the same prepared record the image was rendered from.
    pub async fn publish_bundle(
        &self,
        zipcode: Zipcode,
        hotel: Hotel,
        options: &RenderOptions,
    ) -> AdResult<AdDataBundle> {
        let prepared = self.generator.prepare(hotel)?;
        let image = self.generator.render(&prepared, options).await?;
        let bundle = AdDataBundle::new(
            zipcode,
            prepared,
            Some(image),
            &self.config.media.ad_images_dir,
        );
        bundle.store_image(self.images.as_ref()).await?;
        info!(bundle_id = bundle.bundle_id(), "published ad bundle");
        Ok(bundle)
    }

    /// Public image URL of a bundle.
    pub fn bundle_url(&self, bundle: &AdDataBundle) -> String {
        self.urls.bundle_image_url(bundle.bundle_id())
    }

    /// Look up a bundle by its public id.
    pub async fn bundle(&self, bundle_id: &str) -> AdResult<AdDataBundle> {
        AdDataBundle::from_identifier(
            bundle_id,
            self.store.clone(),
            self.formatter.as_ref(),
            &self.config.media.ad_images_dir,
        )
        .await
    }

    /// Image bytes of a bundle.
    pub async fn bundle_image(&self, bundle_id: &str) -> AdResult<Vec<u8>> {
        self.bundle(bundle_id).await?.image(self.images.as_ref()).await
    }
}

impl std::fmt::Debug for AdService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdService")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}
