//! Canonical hotel records in the shared store.

use std::sync::Arc;

use hotelads_cache::{keys, CacheStore, CacheStoreExt, Pipeline};
use hotelads_codec::HotelId;
use tracing::debug;

use crate::{AdError, AdResult, Hotel};

/// Reads and writes hotel records in the `cache` hash.
#[derive(Clone)]
pub struct HotelCache {
    store: Arc<dyn CacheStore>,
}

impl HotelCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Store records in one pipeline, overwriting existing ones.
    pub async fn cache_hotels(&self, hotels: &[Hotel]) -> AdResult<()> {
        if hotels.is_empty() {
            return Ok(());
        }
        let mut pipeline = Pipeline::new();
        for hotel in hotels {
            pipeline = pipeline.hset(
                keys::HOTEL_CACHE,
                keys::hotel_field(hotel.id),
                serde_json::to_string(hotel)?,
            );
        }
        self.store.execute(pipeline).await?;
        debug!(count = hotels.len(), "cached hotel records");
        Ok(())
    }

    /// Look up one record.
    pub async fn get_hotel(&self, id: HotelId) -> AdResult<Option<Hotel>> {
        Ok(self
            .store
            .hget_json(keys::HOTEL_CACHE, &keys::hotel_field(id))
            .await?)
    }

    /// Look up several records, failing on the first one that is missing.
    pub async fn get_hotels(&self, ids: &[HotelId]) -> AdResult<Vec<Hotel>> {
        let pipeline = ids.iter().fold(Pipeline::new(), |pipeline, id| {
            pipeline.hget(keys::HOTEL_CACHE, keys::hotel_field(id))
        });
        let replies = self.store.execute(pipeline).await?;

        let mut hotels = Vec::with_capacity(ids.len());
        for (id, reply) in ids.iter().zip(replies) {
            let raw = reply.into_string()?.ok_or(AdError::HotelNotFoundInCache(*id))?;
            hotels.push(serde_json::from_str(&raw)?);
        }
        Ok(hotels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotelads_cache::InMemoryStore;
    use serde_json::json;

    fn cache() -> (Arc<InMemoryStore>, HotelCache) {
        let store = Arc::new(InMemoryStore::with_seed(1));
        (store.clone(), HotelCache::new(store))
    }

    #[tokio::test]
    async fn test_cache_and_get() {
        let (store, cache) = cache();
        let mut hotel = Hotel::new(555);
        hotel.extra.insert("stars".into(), json!(3));
        cache.cache_hotels(&[hotel.clone(), Hotel::new(556)]).await.unwrap();

        assert_eq!(cache.get_hotel(HotelId::new(555)).await.unwrap(), Some(hotel));
        assert!(store.hexists("cache", "hotel_556").await.unwrap());
        assert_eq!(cache.get_hotel(HotelId::new(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_hotels_preserves_order() {
        let (_, cache) = cache();
        cache
            .cache_hotels(&[Hotel::new(1), Hotel::new(2), Hotel::new(3)])
            .await
            .unwrap();

        let ids = [HotelId::new(3), HotelId::new(1)];
        let hotels = cache.get_hotels(&ids).await.unwrap();
        assert_eq!(hotels.iter().map(|h| h.id).collect::<Vec<_>>(), ids);
    }

    #[tokio::test]
    async fn test_get_hotels_missing_record() {
        let (_, cache) = cache();
        cache.cache_hotels(&[Hotel::new(1)]).await.unwrap();

        let err = cache
            .get_hotels(&[HotelId::new(1), HotelId::new(2)])
            .await
            .unwrap_err();
        assert!(matches!(err, AdError::HotelNotFoundInCache(id) if id == HotelId::new(2)));
    }
}
