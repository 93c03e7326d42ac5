//! Ad rendering collaborators.
//!
//! Layout and rasterisation live outside this crate behind
//! [`ImageRenderer`]. The engine only decides which hotel to show, prepares
//! the record, and bounds how long a render may take.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{AdError, AdResult, Hotel};

/// Size and stay dates of a rendered ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<NaiveDate>,
}

impl RenderOptions {
    /// Default ad size.
    pub const DEFAULT_WIDTH: u32 = 260;
    pub const DEFAULT_HEIGHT: u32 = 360;

    /// Size used when requested dimensions are out of range.
    pub const FALLBACK_WIDTH: u32 = 260;
    pub const FALLBACK_HEIGHT: u32 = 370;

    /// Options for the requested size.
    ///
    /// Width must be within `239..=649` and height within `291..=699`;
    /// otherwise the fallback size is used.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = if Self::is_supported(width, height) {
            (width, height)
        } else {
            debug!(width, height, "unsupported ad size, using fallback");
            (Self::FALLBACK_WIDTH, Self::FALLBACK_HEIGHT)
        };
        Self {
            width,
            height,
            checkin: None,
            checkout: None,
        }
    }

    pub fn is_supported(width: u32, height: u32) -> bool {
        (239..650).contains(&width) && (291..700).contains(&height)
    }

    /// Set stay dates.
    pub fn with_stay(mut self, checkin: Option<NaiveDate>, checkout: Option<NaiveDate>) -> Self {
        self.checkin = checkin;
        self.checkout = checkout;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            checkin: None,
            checkout: None,
        }
    }
}

/// Turns a cached record into the record an ad displays.
pub trait HotelFormatter: Send + Sync {
    fn format(&self, hotel: Hotel) -> AdResult<Hotel>;
}

/// Formatter that leaves records untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFormatter;

impl HotelFormatter for PassthroughFormatter {
    fn format(&self, hotel: Hotel) -> AdResult<Hotel> {
        Ok(hotel)
    }
}

/// Draws an ad image for one formatted hotel.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Render image bytes. Failures should be reported as [`AdError::Render`].
    async fn render(&self, hotel: &Hotel, options: &RenderOptions) -> AdResult<Vec<u8>>;
}

/// Persistent storage for bundle images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn read(&self, path: &Path) -> AdResult<Vec<u8>>;
    async fn write(&self, path: &Path, bytes: &[u8]) -> AdResult<()>;
}

/// [`ImageStore`] on the local filesystem.
///
/// Writes go through a temporary file and a rename, so readers never see a
/// partial image.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageStore;

#[async_trait]
impl ImageStore for FsImageStore {
    async fn read(&self, path: &Path) -> AdResult<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| AdError::ImageIo(format!("failed to read {}: {}", path.display(), e)))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> AdResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AdError::ImageIo(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let tmp_path = temporary_path(path)?;
        if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AdError::ImageIo(format!(
                "failed to write {}: {}",
                tmp_path.display(),
                e
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AdError::ImageIo(format!(
                "failed to move image into {}: {}",
                path.display(),
                e
            )));
        }
        Ok(())
    }
}

fn temporary_path(path: &Path) -> AdResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| AdError::ImageIo(format!("invalid image path {}", path.display())))?
        .to_string_lossy();
    let tmp_name = format!(".{}.tmp.{:016x}", file_name, rand::random::<u64>());
    Ok(path.with_file_name(tmp_name))
}

/// Prepares and renders one ad image.
///
/// Formats the record, applies the discount presentation, then renders under
/// a timeout. A failed or timed-out render is returned as an error and never
/// retried.
#[derive(Clone)]
pub struct AdImageGenerator {
    formatter: Arc<dyn HotelFormatter>,
    renderer: Arc<dyn ImageRenderer>,
    discount_probability: f64,
    timeout: Duration,
}

impl AdImageGenerator {
    pub fn new(formatter: Arc<dyn HotelFormatter>, renderer: Arc<dyn ImageRenderer>) -> Self {
        Self {
            formatter,
            renderer,
            discount_probability: 0.2,
            timeout: Duration::from_secs(2),
        }
    }

    /// Set the discount presentation probability.
    pub fn with_discount_probability(mut self, probability: f64) -> Self {
        self.discount_probability = probability;
        self
    }

    /// Set the render timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Format a record and apply the discount presentation, without
    /// rendering it.
    pub fn prepare(&self, hotel: Hotel) -> AdResult<Hotel> {
        let hotel_id = hotel.id;
        let mut formatted = self.formatter.format(hotel)?;
        let discounted = {
            let mut rng = rand::thread_rng();
            formatted.apply_discount_presentation(self.discount_probability, &mut rng)
        };
        if discounted {
            debug!(%hotel_id, "presenting best price as discount");
        }
        Ok(formatted)
    }

    /// Render an already prepared record under the timeout.
    pub async fn render(&self, hotel: &Hotel, options: &RenderOptions) -> AdResult<Vec<u8>> {
        let hotel_id = hotel.id;
        match tokio::time::timeout(self.timeout, self.renderer.render(hotel, options)).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => {
                warn!(%hotel_id, error = %e, "ad render failed");
                Err(e)
            }
            Err(_) => {
                warn!(%hotel_id, timeout_ms = self.timeout.as_millis() as u64, "ad render timed out");
                Err(AdError::Render(format!(
                    "render of hotel {} timed out after {:?}",
                    hotel_id, self.timeout
                )))
            }
        }
    }

    /// Prepare and render a hotel.
    pub async fn generate(&self, hotel: Hotel, options: &RenderOptions) -> AdResult<Vec<u8>> {
        let prepared = self.prepare(hotel)?;
        self.render(&prepared, options).await
    }
}

impl std::fmt::Debug for AdImageGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdImageGenerator")
            .field("discount_probability", &self.discount_probability)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowRenderer;

    #[async_trait]
    impl ImageRenderer for SlowRenderer {
        async fn render(&self, _hotel: &Hotel, _options: &RenderOptions) -> AdResult<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1])
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageRenderer for CountingRenderer {
        async fn render(&self, hotel: &Hotel, options: &RenderOptions) -> AdResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}:{}x{}", hotel.id, options.width, options.height).into_bytes())
        }
    }

    #[test]
    fn test_render_options_size_rules() {
        assert_eq!(RenderOptions::default().width, 260);
        assert_eq!(RenderOptions::default().height, 360);

        let ok = RenderOptions::new(300, 400);
        assert_eq!((ok.width, ok.height), (300, 400));

        for (w, h) in [(238, 400), (650, 400), (300, 290), (300, 700), (0, 0)] {
            let fallback = RenderOptions::new(w, h);
            assert_eq!((fallback.width, fallback.height), (260, 370), "{w}x{h}");
        }

        let edge = RenderOptions::new(239, 291);
        assert_eq!((edge.width, edge.height), (239, 291));
    }

    #[tokio::test]
    async fn test_generate_renders_formatted_hotel() {
        let renderer = Arc::new(CountingRenderer::default());
        let generator = AdImageGenerator::new(Arc::new(PassthroughFormatter), renderer.clone())
            .with_discount_probability(0.0);

        let bytes = generator
            .generate(Hotel::new(7), &RenderOptions::new(300, 400))
            .await
            .unwrap();
        assert_eq!(bytes, b"7:300x400");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prepare_applies_discount_once() {
        let renderer = Arc::new(CountingRenderer::default());
        let generator = AdImageGenerator::new(Arc::new(PassthroughFormatter), renderer.clone())
            .with_discount_probability(1.0);
        let mut hotel = Hotel::new(7);
        hotel.best_price = Some(80.0);

        let prepared = generator.prepare(hotel).unwrap();
        assert_eq!(prepared.worst_price, Some(80.0));
        assert!(prepared.best_price < Some(80.0));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);

        generator.render(&prepared, &RenderOptions::default()).await.unwrap();
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let generator = AdImageGenerator::new(Arc::new(PassthroughFormatter), Arc::new(SlowRenderer))
            .with_timeout(Duration::from_millis(50));

        let err = generator
            .generate(Hotel::new(7), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdError::Render(_)));
    }

    #[tokio::test]
    async fn test_fs_image_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("hotelads-test-{:016x}", rand::random::<u64>()));
        let path = dir.join("bundle.png");

        FsImageStore.write(&path, b"png-bytes").await.unwrap();
        assert_eq!(FsImageStore.read(&path).await.unwrap(), b"png-bytes");

        let missing = FsImageStore.read(&dir.join("missing.png")).await.unwrap_err();
        assert!(matches!(missing, AdError::ImageIo(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
