//! Public URL construction.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use hotelads_codec::ContextId;

use crate::config::{AdsSettings, ServerConfig};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse `WIDTHxHEIGHT`.
pub fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.trim().split_once(['x', 'X'])?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

/// Image and redirect URLs for one ad slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlPair {
    pub img: String,
    pub data: String,
}

impl UrlPair {
    /// Embeddable `<a><img></a>` tag.
    pub fn html_tag(&self) -> String {
        format!(
            r#"<a target="_blank" href="{}"><img src="{}"></a>"#,
            self.data, self.img
        )
    }
}

/// Parameters embedded in generated image URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlOptions {
    pub width: u32,
    pub height: u32,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
}

impl UrlOptions {
    /// Default size 600x595, a stay from today for seven days.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            width: 600,
            height: 595,
            checkin: today,
            checkout: today.checked_add_days(Days::new(7)).unwrap_or(today),
        }
    }

    /// Defaults taken from configuration.
    pub fn from_settings(settings: &AdsSettings, today: NaiveDate) -> Self {
        let base = Self::new(today);
        match parse_dimensions(&settings.default_dimensions) {
            Some((width, height)) => base.with_dimensions(width, height),
            None => base,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_stay(mut self, checkin: NaiveDate, checkout: NaiveDate) -> Self {
        self.checkin = checkin;
        self.checkout = checkout;
        self
    }
}

/// Builds absolute URLs from the server configuration.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    server: ServerConfig,
}

impl UrlBuilder {
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }

    /// `{protocol}://{hostname}[:{port}]{prefix}`
    pub fn prefixed(&self, prefix: &str) -> String {
        match self.server.port {
            Some(port) => format!(
                "{}://{}:{}{}",
                self.server.protocol, self.server.hostname, port, prefix
            ),
            None => format!("{}://{}{}", self.server.protocol, self.server.hostname, prefix),
        }
    }

    /// Image URL of a context ad slot.
    pub fn context_image_url(&self, token: &str, slot: usize, options: &UrlOptions) -> String {
        format!(
            "{}/{}/{}?width={}&height={}&checkin={}&checkout={}",
            self.prefixed(&self.server.img_url_prefix),
            token,
            slot,
            options.width,
            options.height,
            options.checkin.format(DATE_FORMAT),
            options.checkout.format(DATE_FORMAT),
        )
    }

    /// Redirect URL of a context ad slot.
    pub fn context_data_url(&self, token: &str, slot: usize) -> String {
        format!(
            "{}/{}/{}",
            self.prefixed(&self.server.data_url_prefix),
            token,
            slot
        )
    }

    pub fn url_pair(&self, token: &str, slot: usize, options: &UrlOptions) -> UrlPair {
        UrlPair {
            img: self.context_image_url(token, slot, options),
            data: self.context_data_url(token, slot),
        }
    }

    /// API URL that re-runs the search of a context.
    pub fn context_update_url(&self, context_id: ContextId) -> String {
        format!(
            "{}/context_update?context_id={}",
            self.prefixed(&self.server.api_url_prefix),
            context_id
        )
    }

    /// Image URL of a persisted bundle.
    pub fn bundle_image_url(&self, bundle_id: &str) -> String {
        format!("{}/{}", self.prefixed(&self.server.img_url_prefix), bundle_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("600x595"), Some((600, 595)));
        assert_eq!(parse_dimensions(" 300 X 250 "), Some((300, 250)));
        assert_eq!(parse_dimensions("600"), None);
        assert_eq!(parse_dimensions("ax595"), None);
    }

    #[test]
    fn test_prefixed_with_and_without_port() {
        let mut server = ServerConfig::default();
        server.hostname = "ads.example.com".into();
        assert_eq!(
            UrlBuilder::new(server.clone()).prefixed("/img/v1"),
            "http://ads.example.com/img/v1"
        );

        server.port = Some(8080);
        server.protocol = "https".into();
        assert_eq!(
            UrlBuilder::new(server).prefixed("/img/v1"),
            "https://ads.example.com:8080/img/v1"
        );
    }

    #[test]
    fn test_context_urls() {
        let urls = UrlBuilder::new(ServerConfig::default());
        let pair = urls.url_pair("TOKEN", 2, &UrlOptions::new(today()));
        assert_eq!(
            pair.img,
            "http://localhost/img/v1/TOKEN/2?width=600&height=595&checkin=2026-10-14&checkout=2026-10-21"
        );
        assert_eq!(pair.data, "http://localhost/data/v1/TOKEN/2");
        assert!(pair.html_tag().starts_with(
            r#"<a target="_blank" href="http://localhost/data/v1/TOKEN/2"><img src="http://localhost/img/v1/TOKEN/2?"#
        ));
    }

    #[test]
    fn test_bundle_image_url() {
        let urls = UrlBuilder::new(ServerConfig::default());
        assert_eq!(
            urls.bundle_image_url("OTAyMTB8NTU1"),
            "http://localhost/img/v1/OTAyMTB8NTU1"
        );
    }

    #[test]
    fn test_context_update_url() {
        let mut server = ServerConfig::default();
        server.api_url_prefix = "/api/v2".into();
        assert_eq!(
            UrlBuilder::new(server).context_update_url(ContextId::new(12)),
            "http://localhost/api/v2/context_update?context_id=12"
        );
    }

    #[test]
    fn test_options_from_settings() {
        let mut settings = AdsSettings::default();
        settings.default_dimensions = "300x400".into();
        let options = UrlOptions::from_settings(&settings, today());
        assert_eq!((options.width, options.height), (300, 400));
    }
}
