//! Config file discovery and templates.

use std::path::{Path, PathBuf};

/// File names searched for, in order, in each directory.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["hotelads.toml", ".hotelads.toml", "hotelads.json"];

/// Find the nearest config file, starting at `start` and walking up.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Generate a default hotelads.toml.
pub fn generate_default_config(hostname: &str, key: &str) -> String {
    format!(
        r#"# Hotel ads configuration

[server]
protocol = "http"
hostname = "{hostname}"
# port = 8080
img_url_prefix = "/img/v1"
data_url_prefix = "/data/v1"
api_url_prefix = "/api/v1"

[media]
ad_images_dir = "ad_images"

[ads]
max_recommendations = 6
default_dimensions = "600x595"
render_timeout_ms = 2000
discount_probability = 0.2
hotel_redirect_url_template = "https://search.hotellook.com/?hotelId={{hotel_id}}&locationId={{location_id}}&adults=2&language={{hotel_lang}}&currency={{hotel_currency}}"

[crypto]
# Overridden by HOTELADS_ID_ENCRYPTION_KEY when set.
id_encryption_key = "{key}"
"#,
        hostname = hostname,
        key = key
    )
}
