//! Recommendation contexts and ad slot rotation.
//!
//! A context binds a zipcode to a candidate set of hotels and serves
//! [`SLOT_COUNT`] ad slots from it. All state lives in the shared store:
//!
//! - `rec_context_zipcodes[{id}]` is the zipcode; a context without one does
//!   not exist.
//! - `rec_context_hotels_{id}` is the candidate set.
//! - `free_hotels_{id}` is the rotation pool, candidates not currently shown.
//! - `ad_{id}_{slot}` is the hotel shown in a slot.
//!
//! Drawing for a slot returns the slot's current hotel to the pool and pops a
//! new one, in a single atomic store command. When the pool runs dry it is
//! refilled from the whole candidate set, which may hand a slot the hotel it
//! just held.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use hotelads_cache::{keys, CacheError, CacheStore, Pipeline};
use hotelads_codec::{ContextId, ContextTokenCodec, HotelId, Zipcode};

use crate::hotel_cache::HotelCache;
use crate::render::{AdImageGenerator, RenderOptions};
use crate::urls::{UrlBuilder, UrlOptions, UrlPair};
use crate::{AdError, AdResult, Hotel};

/// Number of ad slots per context.
pub const SLOT_COUNT: usize = 4;

/// Fewest distinct candidates a context may hold.
pub const MIN_CANDIDATES: usize = SLOT_COUNT;

/// A persisted recommendation context.
#[derive(Clone)]
pub struct RecommendationContext {
    store: Arc<dyn CacheStore>,
    id: ContextId,
    zipcode: Zipcode,
}

impl RecommendationContext {
    /// Allocate a new context for a zipcode and its candidates.
    ///
    /// Fails with [`AdError::InsufficientCandidates`] before touching the
    /// store when fewer than [`MIN_CANDIDATES`] distinct hotels are given.
    pub async fn create(
        store: Arc<dyn CacheStore>,
        zipcode: Zipcode,
        hotels: &[Hotel],
    ) -> AdResult<Self> {
        let candidates = distinct_ids(hotels.iter().map(|hotel| hotel.id));
        ensure_enough_candidates(candidates.len())?;

        let raw_id = store.incr(keys::CONTEXT_ID_GENERATOR).await?;
        let id = u64::try_from(raw_id)
            .ok()
            .filter(|id| *id > 0)
            .map(ContextId::new)
            .ok_or_else(|| {
                AdError::Cache(CacheError::UnexpectedReply(format!(
                    "context id generator returned {}",
                    raw_id
                )))
            })?;

        store
            .hset(keys::CONTEXT_ZIPCODES, &id.to_string(), zipcode.as_str())
            .await?;

        let context = Self { store, id, zipcode };
        context.replace_candidates(&candidates).await?;

        info!(
            context_id = %id,
            zipcode = %context.zipcode,
            candidates = candidates.len(),
            "created recommendation context"
        );
        Ok(context)
    }

    /// Load an existing context.
    pub async fn from_id(store: Arc<dyn CacheStore>, id: ContextId) -> AdResult<Self> {
        let zipcode = load_zipcode(store.as_ref(), id).await?;
        Ok(Self { store, id, zipcode })
    }

    /// Load the context an encrypted token refers to.
    pub async fn from_token(
        store: Arc<dyn CacheStore>,
        codec: &ContextTokenCodec,
        token: &str,
    ) -> AdResult<Self> {
        let id = codec.decode(token)?;
        Self::from_id(store, id).await
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn zipcode(&self) -> &Zipcode {
        &self.zipcode
    }

    /// Encrypted token identifying this context in public URLs.
    pub fn token(&self, codec: &ContextTokenCodec) -> String {
        codec.encode(self.id)
    }

    /// Persist a new zipcode, or reload the stored one when `None`.
    pub async fn set_zipcode(&mut self, zipcode: Option<Zipcode>) -> AdResult<()> {
        match zipcode {
            Some(zipcode) => {
                self.store
                    .hset(keys::CONTEXT_ZIPCODES, &self.id.to_string(), zipcode.as_str())
                    .await?;
                debug!(context_id = %self.id, %zipcode, "context zipcode updated");
                self.zipcode = zipcode;
            }
            None => {
                self.zipcode = load_zipcode(self.store.as_ref(), self.id).await?;
            }
        }
        Ok(())
    }

    /// Replace the candidate set.
    ///
    /// The rotation pool and every slot assignment are cleared in the same
    /// atomic pipeline, so the next draw for any slot starts a fresh cycle
    /// over the new candidates.
    pub async fn set_hotels(&self, hotels: &[Hotel]) -> AdResult<()> {
        self.set_hotel_ids(hotels.iter().map(|hotel| hotel.id)).await
    }

    /// [`set_hotels`](Self::set_hotels) by id.
    pub async fn set_hotel_ids(&self, ids: impl IntoIterator<Item = HotelId>) -> AdResult<()> {
        let candidates = distinct_ids(ids);
        ensure_enough_candidates(candidates.len())?;
        self.replace_candidates(&candidates).await?;
        info!(context_id = %self.id, candidates = candidates.len(), "context candidates replaced");
        Ok(())
    }

    async fn replace_candidates(&self, candidates: &BTreeSet<HotelId>) -> AdResult<()> {
        let hotels_key = keys::context_hotels(self.id);
        let mut pipeline = Pipeline::atomic()
            .delete(hotels_key.clone())
            .sadd(hotels_key, candidates.iter().map(HotelId::to_string))
            .delete(keys::free_hotels(self.id));
        for slot in 0..SLOT_COUNT {
            pipeline = pipeline.delete(keys::ad_slot(self.id, slot));
        }
        self.store.execute(pipeline).await?;
        Ok(())
    }

    /// Current candidate ids, in ascending order.
    pub async fn candidate_ids(&self) -> AdResult<Vec<HotelId>> {
        let members = self.store.smembers(&keys::context_hotels(self.id)).await?;
        let ids = distinct_ids(parse_ids(members)?);
        Ok(ids.into_iter().collect())
    }

    /// Cached records of every candidate.
    pub async fn hotels(&self) -> AdResult<Vec<Hotel>> {
        let ids = self.candidate_ids().await?;
        HotelCache::new(self.store.clone()).get_hotels(&ids).await
    }

    /// Advance a slot to its next hotel.
    ///
    /// Returns `None` for slots outside `0..SLOT_COUNT` and for contexts
    /// without candidates. Concurrent draws never drop a candidate: every
    /// candidate is always either in the pool or in exactly one slot.
    pub async fn draw(&self, slot: usize) -> AdResult<Option<HotelId>> {
        if slot >= SLOT_COUNT {
            return Ok(None);
        }
        let next = self
            .store
            .rotate_slot(
                &keys::ad_slot(self.id, slot),
                &keys::free_hotels(self.id),
                &keys::context_hotels(self.id),
            )
            .await?;
        let Some(next) = next else {
            warn!(context_id = %self.id, slot, "context has no candidates");
            return Ok(None);
        };

        let hotel_id = parse_id(&next)?;
        debug!(context_id = %self.id, slot, %hotel_id, "slot assigned");
        Ok(Some(hotel_id))
    }

    /// Rotate a slot and render its new hotel.
    ///
    /// Returns `None` when [`draw`](Self::draw) does. A drawn hotel missing
    /// from the cache is [`AdError::HotelNotFoundInCache`]; render failures
    /// are returned without drawing again.
    pub async fn get_ad(
        &self,
        slot: usize,
        generator: &AdImageGenerator,
        options: &RenderOptions,
    ) -> AdResult<Option<Vec<u8>>> {
        let Some(hotel_id) = self.draw(slot).await? else {
            return Ok(None);
        };
        let hotel = HotelCache::new(self.store.clone())
            .get_hotel(hotel_id)
            .await?
            .ok_or(AdError::HotelNotFoundInCache(hotel_id))?;
        generator.generate(hotel, options).await.map(Some)
    }

    /// Hotel currently shown in a slot, without rotating.
    pub async fn get_hotel(&self, slot: usize) -> AdResult<Option<Hotel>> {
        if slot >= SLOT_COUNT {
            return Ok(None);
        }
        let Some(raw) = self.store.get(&keys::ad_slot(self.id, slot)).await? else {
            return Ok(None);
        };
        let hotel_id = parse_id(&raw)?;
        HotelCache::new(self.store.clone()).get_hotel(hotel_id).await
    }

    /// Image and redirect URLs for every slot.
    pub fn generate_urls(
        &self,
        codec: &ContextTokenCodec,
        urls: &UrlBuilder,
        options: &UrlOptions,
    ) -> Vec<UrlPair> {
        let token = self.token(codec);
        (0..SLOT_COUNT)
            .map(|slot| urls.url_pair(&token, slot, options))
            .collect()
    }
}

impl std::fmt::Debug for RecommendationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationContext")
            .field("id", &self.id)
            .field("zipcode", &self.zipcode)
            .finish_non_exhaustive()
    }
}

async fn load_zipcode(store: &dyn CacheStore, id: ContextId) -> AdResult<Zipcode> {
    let raw = store
        .hget(keys::CONTEXT_ZIPCODES, &id.to_string())
        .await?
        .ok_or(AdError::NoZipcodeAssignedToContext(id))?;
    Ok(Zipcode::new(raw)?)
}

fn distinct_ids(ids: impl IntoIterator<Item = HotelId>) -> BTreeSet<HotelId> {
    ids.into_iter().collect()
}

fn ensure_enough_candidates(available: usize) -> AdResult<()> {
    if available < MIN_CANDIDATES {
        return Err(AdError::InsufficientCandidates {
            required: MIN_CANDIDATES,
            available,
        });
    }
    Ok(())
}

fn parse_id(raw: &str) -> AdResult<HotelId> {
    raw.parse::<HotelId>().map_err(|_| {
        AdError::Cache(CacheError::UnexpectedReply(format!(
            "stored hotel id {:?} is not an integer",
            raw
        )))
    })
}

fn parse_ids(raw: Vec<String>) -> AdResult<Vec<HotelId>> {
    raw.iter().map(|id| parse_id(id)).collect()
}
