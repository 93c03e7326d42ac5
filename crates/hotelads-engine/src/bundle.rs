//! Ad data bundles: one hotel ad outside the slot rotation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use hotelads_cache::CacheStore;
use hotelads_codec::{BundleId, Zipcode};

use crate::hotel_cache::HotelCache;
use crate::render::{HotelFormatter, ImageStore};
use crate::{AdError, AdResult, Hotel};

/// Extension of persisted bundle images.
pub const IMAGE_EXTENSION: &str = "png";

/// Path of the image for a bundle id: `{dir}/{bundle_id}.png`.
pub fn image_path(images_dir: &Path, bundle_id: &str) -> PathBuf {
    images_dir.join(format!("{}.{}", bundle_id, IMAGE_EXTENSION))
}

/// A formatted hotel plus its ad image, addressed by a bundle id.
#[derive(Debug, Clone)]
pub struct AdDataBundle {
    id: BundleId,
    encoded: String,
    hotel: Hotel,
    image: Option<Vec<u8>>,
    image_path: PathBuf,
}

impl AdDataBundle {
    /// Bundle an already formatted hotel, optionally with its image.
    pub fn new(
        zipcode: Zipcode,
        hotel: Hotel,
        image: Option<Vec<u8>>,
        images_dir: &Path,
    ) -> Self {
        let id = BundleId::new(zipcode, hotel.id);
        let encoded = id.encode();
        let image_path = image_path(images_dir, &encoded);
        Self {
            id,
            encoded,
            hotel,
            image,
            image_path,
        }
    }

    /// Rebuild a bundle from its public id.
    ///
    /// The id is validated before any cache lookup. The hotel must be in the
    /// cache; its image is loaded lazily. Any accepted spelling of the id maps
    /// to the canonical id and image path.
    pub async fn from_identifier(
        encoded: &str,
        store: Arc<dyn CacheStore>,
        formatter: &dyn HotelFormatter,
        images_dir: &Path,
    ) -> AdResult<Self> {
        let id = BundleId::decode(encoded)?;
        let hotel = HotelCache::new(store)
            .get_hotel(id.hotel_id)
            .await?
            .ok_or(AdError::HotelNotFoundInCache(id.hotel_id))?;
        let hotel = formatter.format(hotel)?;

        let encoded = id.encode();
        let image_path = image_path(images_dir, &encoded);
        debug!(bundle_id = %encoded, hotel_id = %id.hotel_id, "loaded ad bundle");
        Ok(Self {
            id,
            encoded,
            hotel,
            image: None,
            image_path,
        })
    }

    /// Public id.
    pub fn bundle_id(&self) -> &str {
        &self.encoded
    }

    pub fn zipcode(&self) -> &Zipcode {
        &self.id.zipcode
    }

    pub fn hotel(&self) -> &Hotel {
        &self.hotel
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Image bytes, read from the image store when not held in memory.
    pub async fn image(&self, images: &dyn ImageStore) -> AdResult<Vec<u8>> {
        match &self.image {
            Some(image) => Ok(image.clone()),
            None => images.read(&self.image_path).await,
        }
    }

    /// Persist the in-memory image under the bundle's path.
    pub async fn store_image(&self, images: &dyn ImageStore) -> AdResult<()> {
        let image = self.image.as_deref().ok_or_else(|| {
            AdError::ImageIo(format!("bundle {} has no image to store", self.encoded))
        })?;
        images.write(&self.image_path, image).await?;
        debug!(bundle_id = %self.encoded, path = %self.image_path.display(), "stored ad image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PassthroughFormatter;
    use async_trait::async_trait;
    use hotelads_cache::InMemoryStore;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryImages {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    }

    #[async_trait]
    impl ImageStore for MemoryImages {
        async fn read(&self, path: &Path) -> AdResult<Vec<u8>> {
            self.files
                .lock()
                .await
                .get(path)
                .cloned()
                .ok_or_else(|| AdError::ImageIo(format!("missing {}", path.display())))
        }

        async fn write(&self, path: &Path, bytes: &[u8]) -> AdResult<()> {
            self.files.lock().await.insert(path.to_path_buf(), bytes.to_vec());
            Ok(())
        }
    }

    fn zip() -> Zipcode {
        Zipcode::new("90210").unwrap()
    }

    #[test]
    fn test_image_path_rule() {
        let path = image_path(Path::new("/srv/ads"), "OTAyMTB8NTU1");
        assert_eq!(path, PathBuf::from("/srv/ads/OTAyMTB8NTU1.png"));
    }

    #[tokio::test]
    async fn test_store_then_load_image() {
        let store = Arc::new(InMemoryStore::with_seed(1));
        HotelCache::new(store.clone())
            .cache_hotels(&[Hotel::new(555)])
            .await
            .unwrap();
        let images = MemoryImages::default();
        let dir = Path::new("ads");

        let bundle = AdDataBundle::new(zip(), Hotel::new(555), Some(b"png".to_vec()), dir);
        bundle.store_image(&images).await.unwrap();

        let loaded =
            AdDataBundle::from_identifier(bundle.bundle_id(), store, &PassthroughFormatter, dir)
                .await
                .unwrap();
        assert_eq!(loaded.zipcode(), &zip());
        assert_eq!(loaded.hotel().id.get(), 555);
        assert_eq!(loaded.image_path(), bundle.image_path());
        assert_eq!(loaded.image(&images).await.unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_unpadded_id_loads_canonical_image() {
        let store = Arc::new(InMemoryStore::with_seed(1));
        HotelCache::new(store.clone())
            .cache_hotels(&[Hotel::new(7)])
            .await
            .unwrap();
        let images = MemoryImages::default();
        let dir = Path::new("ads");

        let zipcode = Zipcode::new("10001").unwrap();
        let bundle = AdDataBundle::new(zipcode, Hotel::new(7), Some(b"png".to_vec()), dir);
        assert_eq!(bundle.bundle_id(), "MTAwMDF8Nw==");
        bundle.store_image(&images).await.unwrap();

        let loaded = AdDataBundle::from_identifier(
            " MTAwMDF8Nw ",
            store,
            &PassthroughFormatter,
            dir,
        )
        .await
        .unwrap();
        assert_eq!(loaded.bundle_id(), "MTAwMDF8Nw==");
        assert_eq!(loaded.image_path(), Path::new("ads/MTAwMDF8Nw==.png"));
        assert_eq!(loaded.image(&images).await.unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_before_lookup() {
        let store = Arc::new(InMemoryStore::with_seed(1));
        let err = AdDataBundle::from_identifier(
            "not*base64",
            store,
            &PassthroughFormatter,
            Path::new("ads"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AdError::InvalidDataBundleId(_)));
    }

    #[tokio::test]
    async fn test_uncached_hotel_not_found() {
        let store = Arc::new(InMemoryStore::with_seed(1));
        let encoded = BundleId::new(zip(), hotelads_codec::HotelId::new(555)).encode();
        let err =
            AdDataBundle::from_identifier(&encoded, store, &PassthroughFormatter, Path::new("ads"))
                .await
                .unwrap_err();
        assert!(matches!(err, AdError::HotelNotFoundInCache(id) if id.get() == 555));
    }

    #[tokio::test]
    async fn test_store_without_image_fails() {
        let bundle = AdDataBundle::new(zip(), Hotel::new(1), None, Path::new("ads"));
        let err = bundle.store_image(&MemoryImages::default()).await.unwrap_err();
        assert!(matches!(err, AdError::ImageIo(_)));
    }
}
