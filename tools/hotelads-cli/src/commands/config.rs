//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};

use hotelads_engine::{AdsConfig, ContextTokenCodec, UrlBuilder};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

const REDACTED: &str = "<redacted>";

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init {
            path,
            hostname,
            force,
        } => init_config(&path, &hostname, force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

/// Copy of the configuration that is safe to print.
fn redacted(config: &AdsConfig) -> AdsConfig {
    let mut config = config.clone();
    if config.crypto.id_encryption_key.is_some() {
        config.crypto.id_encryption_key = Some(REDACTED.to_string());
    }
    config
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = redacted(&ctx.config);
    if ctx.output.emit_json(&config) {
        return Ok(());
    }

    ctx.output.section("Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.field("file", path.display()),
        None => ctx.output.field("file", "(defaults)"),
    }

    let urls = UrlBuilder::new(config.server.clone());
    ctx.output.section("[server]");
    ctx.output.field("base_url", urls.prefixed(""));
    ctx.output.field("img_url_prefix", &config.server.img_url_prefix);
    ctx.output.field("data_url_prefix", &config.server.data_url_prefix);
    ctx.output.field("api_url_prefix", &config.server.api_url_prefix);

    ctx.output.section("[media]");
    ctx.output.field("ad_images_dir", config.media.ad_images_dir.display());

    ctx.output.section("[ads]");
    ctx.output.field("max_recommendations", config.ads.max_recommendations);
    ctx.output.field("default_dimensions", &config.ads.default_dimensions);
    ctx.output.field("render_timeout_ms", config.ads.render_timeout_ms);
    ctx.output.field("discount_probability", config.ads.discount_probability);
    ctx.output.field(
        "hotel_redirect_url",
        &config.ads.hotel_redirect_url_template,
    );

    ctx.output.section("[crypto]");
    ctx.output.field(
        "id_encryption_key",
        config.crypto.id_encryption_key.as_deref().unwrap_or("(not set)"),
    );
    Ok(())
}

fn init_config(path: &str, hostname: &str, force: bool, ctx: &Context) -> Result<()> {
    let target = ctx.resolve_path(path);
    if target.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            target.display()
        );
    }

    let key = ContextTokenCodec::generate_key();
    let content = generate_default_config(hostname, &key);
    let parsed: AdsConfig = toml::from_str(&content).context("Generated config is invalid")?;
    parsed.validate()?;

    fs::write(&target, content)
        .with_context(|| format!("Failed to write config file: {}", target.display()))?;

    ctx.output
        .done(&format!("created {} with a new encryption key", target.display()));
    ctx.output
        .caution("keep the key secret; tokens issued with it stop decoding if it changes");
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    let Some(path) = &ctx.config_path else {
        ctx.output.caution("no config file found, validating defaults");
        ctx.config.validate()?;
        ctx.output.done("default configuration is valid");
        return Ok(());
    };

    ctx.config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.display()))?;

    match &ctx.config.crypto.id_encryption_key {
        Some(key) => {
            ContextTokenCodec::new(key).context("crypto.id_encryption_key is not a valid key")?;
        }
        None => ctx
            .output
            .caution("crypto.id_encryption_key is not set; the service will refuse to start"),
    }

    ctx.output.done(&format!("{} is valid", path.display()));
    Ok(())
}
