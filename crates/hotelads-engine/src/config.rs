//! Service configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::MIN_CANDIDATES;
use crate::{AdError, AdResult};

/// Environment variable overriding [`CryptoConfig::id_encryption_key`].
pub const ENCRYPTION_KEY_ENV: &str = "HOTELADS_ID_ENCRYPTION_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdsConfig {
    /// Public URL layout.
    #[serde(default)]
    pub server: ServerConfig,

    /// Persisted ad images.
    #[serde(default)]
    pub media: MediaConfig,

    /// Recommendation and rendering behaviour.
    #[serde(default)]
    pub ads: AdsSettings,

    /// Context token encryption.
    #[serde(default)]
    pub crypto: CryptoConfig,
}

impl AdsConfig {
    /// Load from a TOML file, or JSON when the extension is `.json`.
    pub fn load(path: &Path) -> AdResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AdError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        if is_json(path) {
            serde_json::from_str(&content).map_err(|e| {
                AdError::Config(format!("failed to parse JSON config {}: {}", path.display(), e))
            })
        } else {
            toml::from_str(&content).map_err(|e| {
                AdError::Config(format!("failed to parse TOML config {}: {}", path.display(), e))
            })
        }
    }

    /// Write to a file in the format its extension selects.
    pub fn save(&self, path: &Path) -> AdResult<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)
                .map_err(|e| AdError::Config(format!("failed to encode config: {}", e)))?
        };
        std::fs::write(path, content)
            .map_err(|e| AdError::Config(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Override values from the process environment.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ENCRYPTION_KEY_ENV) {
            if !key.trim().is_empty() {
                self.crypto.id_encryption_key = Some(key);
            }
        }
    }

    /// Check the configuration for values the service cannot run with.
    pub fn validate(&self) -> AdResult<()> {
        if self.server.hostname.trim().is_empty() {
            return Err(AdError::Config("server.hostname must not be empty".into()));
        }
        if !matches!(self.server.protocol.as_str(), "http" | "https") {
            return Err(AdError::Config(format!(
                "server.protocol must be http or https, got {:?}",
                self.server.protocol
            )));
        }
        for (name, prefix) in [
            ("img_url_prefix", &self.server.img_url_prefix),
            ("data_url_prefix", &self.server.data_url_prefix),
            ("api_url_prefix", &self.server.api_url_prefix),
        ] {
            if !prefix.starts_with('/') {
                return Err(AdError::Config(format!(
                    "server.{} must start with '/', got {:?}",
                    name, prefix
                )));
            }
        }
        if self.ads.max_recommendations < MIN_CANDIDATES {
            return Err(AdError::Config(format!(
                "ads.max_recommendations must be at least {}, got {}",
                MIN_CANDIDATES, self.ads.max_recommendations
            )));
        }
        if !(0.0..=1.0).contains(&self.ads.discount_probability) {
            return Err(AdError::Config(format!(
                "ads.discount_probability must be within [0, 1], got {}",
                self.ads.discount_probability
            )));
        }
        if self.ads.render_timeout_ms == 0 {
            return Err(AdError::Config("ads.render_timeout_ms must be positive".into()));
        }
        if crate::urls::parse_dimensions(&self.ads.default_dimensions).is_none() {
            return Err(AdError::Config(format!(
                "ads.default_dimensions must look like 600x595, got {:?}",
                self.ads.default_dimensions
            )));
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Public URL layout of the ad server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// URL scheme.
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Public host name.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Port, omitted from URLs when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Prefix of image endpoints.
    #[serde(default = "default_img_url_prefix")]
    pub img_url_prefix: String,

    /// Prefix of data (redirect) endpoints.
    #[serde(default = "default_data_url_prefix")]
    pub data_url_prefix: String,

    /// Prefix of API endpoints.
    #[serde(default = "default_api_url_prefix")]
    pub api_url_prefix: String,
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_img_url_prefix() -> String {
    "/img/v1".to_string()
}

fn default_data_url_prefix() -> String {
    "/data/v1".to_string()
}

fn default_api_url_prefix() -> String {
    "/api/v1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            hostname: default_hostname(),
            port: None,
            img_url_prefix: default_img_url_prefix(),
            data_url_prefix: default_data_url_prefix(),
            api_url_prefix: default_api_url_prefix(),
        }
    }
}

/// Where bundle images are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory holding `{bundle_id}.png` files.
    #[serde(default = "default_ad_images_dir")]
    pub ad_images_dir: PathBuf,
}

fn default_ad_images_dir() -> PathBuf {
    PathBuf::from("ad_images")
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ad_images_dir: default_ad_images_dir(),
        }
    }
}

/// Recommendation and ad rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsSettings {
    /// Maximum number of ranked hotels returned by a query.
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// `WIDTHxHEIGHT` used when a URL request gives no dimensions.
    #[serde(default = "default_dimensions")]
    pub default_dimensions: String,

    /// Upper bound on a single render call.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Chance that an ad shows a synthetic strike-through price.
    #[serde(default = "default_discount_probability")]
    pub discount_probability: f64,

    /// Redirect target for an ad click.
    ///
    /// Placeholders: `{hotel_id}`, `{location_id}`, `{hotel_lang}`,
    /// `{hotel_currency}`.
    #[serde(default = "default_redirect_template")]
    pub hotel_redirect_url_template: String,
}

fn default_max_recommendations() -> usize {
    6
}

fn default_dimensions() -> String {
    "600x595".to_string()
}

fn default_render_timeout_ms() -> u64 {
    2_000
}

fn default_discount_probability() -> f64 {
    0.2
}

fn default_redirect_template() -> String {
    "https://search.hotellook.com/?hotelId={hotel_id}&locationId={location_id}\
     &adults=2&language={hotel_lang}&currency={hotel_currency}"
        .to_string()
}

impl Default for AdsSettings {
    fn default() -> Self {
        Self {
            max_recommendations: default_max_recommendations(),
            default_dimensions: default_dimensions(),
            render_timeout_ms: default_render_timeout_ms(),
            discount_probability: default_discount_probability(),
            hotel_redirect_url_template: default_redirect_template(),
        }
    }
}

/// Context token encryption settings.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// URL-safe base64 encoded 32-byte Fernet key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_encryption_key: Option<String>,
}

impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field(
                "id_encryption_key",
                &self.id_encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
