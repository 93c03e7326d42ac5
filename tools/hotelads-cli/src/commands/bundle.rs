//! Bundle id commands.

use anyhow::{Context as _, Result};
use serde_json::json;

use hotelads_engine::{image_path, BundleId, HotelId, UrlBuilder, Zipcode};

use super::{BundleArgs, BundleCommand};
use crate::context::Context;

/// Run the bundle command.
pub async fn run(args: BundleArgs, ctx: &Context) -> Result<()> {
    match args.command {
        BundleCommand::Encode { zipcode, hotel_id } => encode(&zipcode, hotel_id, ctx),
        BundleCommand::Decode { bundle_id } => decode(&bundle_id, ctx),
    }
}

fn encode(zipcode: &str, hotel_id: u64, ctx: &Context) -> Result<()> {
    let zipcode =
        Zipcode::new(zipcode).with_context(|| format!("Invalid zipcode: {:?}", zipcode))?;
    let bundle_id = BundleId::new(zipcode, HotelId::new(hotel_id)).encode();
    describe(&bundle_id, ctx)
}

fn decode(bundle_id: &str, ctx: &Context) -> Result<()> {
    let decoded = BundleId::decode(bundle_id)?;
    let canonical = decoded.encode();
    if ctx.output.emit_json(&json!({
        "bundle_id": canonical,
        "zipcode": decoded.zipcode.as_str(),
        "hotel_id": decoded.hotel_id.get(),
    })) {
        return Ok(());
    }
    ctx.output.field("zipcode", &decoded.zipcode);
    ctx.output.field("hotel_id", decoded.hotel_id);
    if canonical != bundle_id.trim() {
        ctx.output.field("canonical_id", &canonical);
    }
    Ok(())
}

fn describe(bundle_id: &str, ctx: &Context) -> Result<()> {
    let url = UrlBuilder::new(ctx.config.server.clone()).bundle_image_url(bundle_id);
    let path = image_path(&ctx.config.media.ad_images_dir, bundle_id);

    if ctx.output.emit_json(&json!({
        "bundle_id": bundle_id,
        "image_url": url,
        "image_path": path,
    })) {
        return Ok(());
    }
    ctx.output.field("bundle_id", bundle_id);
    ctx.output.field("image_url", &url);
    ctx.output.field("image_path", path.display());
    Ok(())
}
