//! Simulate slot rotation for a context against an in-memory store.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use hotelads_cache::InMemoryStore;
use hotelads_engine::{
    AdResult, AdService, Collaborators, ContextAds, ContextTokenCodec, FsImageStore, Hotel,
    ImageRenderer, PassthroughFormatter, RecommendationQuery, RenderOptions, StaticHotelProvider,
    StayDates, UrlOptions, Zipcode, SLOT_COUNT,
};

use super::rank::sort_config;
use super::{read_hotels, SimulateArgs};
use crate::context::Context;
use crate::output::Table;

/// Renders a one-line text summary instead of an image.
struct SummaryRenderer;

#[async_trait]
impl ImageRenderer for SummaryRenderer {
    async fn render(&self, hotel: &Hotel, _options: &RenderOptions) -> AdResult<Vec<u8>> {
        let name = hotel.display_name(hotel.language_or_default()).unwrap_or("-");
        let price = match (hotel.best_price, hotel.worst_price) {
            (Some(best), Some(worst)) => format!("{:.2} (was {:.2})", best, worst),
            (Some(best), None) => format!("{:.2}", best),
            _ => "-".to_string(),
        };
        Ok(format!("{} {} {}", hotel.id, name, price).into_bytes())
    }
}

#[derive(Serialize)]
struct Draw {
    round: usize,
    slot: usize,
    ad: String,
    redirect: Option<String>,
}

#[derive(Serialize)]
struct Simulation<'a> {
    context: &'a ContextAds,
    draws: &'a [Draw],
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let hotels = read_hotels(&args.input, ctx)?;
    let zipcode = Zipcode::new(args.zipcode.as_str())
        .with_context(|| format!("Invalid zipcode: {:?}", args.zipcode))?;
    let sort = sort_config(&args.sort, false, None, false)?;

    let mut config = ctx.config.clone();
    if config.crypto.id_encryption_key.is_none() {
        ctx.output.caution("no encryption key configured, using a throwaway key for this run");
        config.crypto.id_encryption_key = Some(ContextTokenCodec::generate_key());
    }

    let store = match args.seed {
        Some(seed) => InMemoryStore::with_seed(seed),
        None => InMemoryStore::new(),
    };
    let today = chrono::Local::now().date_naive();
    let url_options = UrlOptions::from_settings(&config.ads, today);

    let service = AdService::new(
        config,
        Collaborators {
            store: Arc::new(store),
            provider: Arc::new(StaticHotelProvider::new().with_hotels(zipcode.clone(), hotels)),
            formatter: Arc::new(PassthroughFormatter),
            renderer: Arc::new(SummaryRenderer),
            images: Arc::new(FsImageStore),
        },
    )?;

    let mut query = RecommendationQuery::new(Some(zipcode.clone())).with_sort(sort);
    let stay = stay_dates(args.event_date, &url_options);
    if args.event_date.is_some() {
        query = query.with_stay(stay);
    }
    let Some(context) = service.create_context(&query, &url_options).await? else {
        bail!("No displayable hotels for zipcode {}", zipcode);
    };

    let render =
        RenderOptions::default().with_stay(Some(stay.check_in), Some(stay.check_out));
    let mut draws = Vec::with_capacity(args.rounds * SLOT_COUNT);
    for round in 1..=args.rounds {
        for slot in 0..SLOT_COUNT {
            let ad = service
                .ad_image(&context.token, slot, &render)
                .await?
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            let redirect = service.ad_redirect(&context.token, slot).await?;
            draws.push(Draw {
                round,
                slot,
                ad,
                redirect,
            });
        }
    }

    if ctx.output.emit_json(&Simulation { context: &context, draws: &draws }) {
        return Ok(());
    }

    ctx.output.section("Context");
    ctx.output.field("id", context.context_id);
    ctx.output.field("zipcode", &context.zipcode);
    ctx.output.field("token", &context.token);
    ctx.output.field("candidates", context.total_recommendations);
    if let Some(location) = context.location_id {
        ctx.output.field("location_id", location);
    }
    ctx.output.field("stay", format!("{} to {}", stay.check_in, stay.check_out));
    ctx.output.field("update_url", &context.update_url);

    ctx.output.section("Slot URLs");
    for (slot, pair) in context.urls.iter().enumerate() {
        ctx.output.field(&format!("slot {}", slot), &pair.img);
        ctx.output.trace(&pair.html_tag());
    }

    ctx.output.section("Rotation");
    ctx.output.table(&rotation_table(&draws));
    for redirect in draws.iter().filter_map(|draw| draw.redirect.as_deref()) {
        ctx.output.trace(redirect);
    }

    ctx.output
        .done(&format!("{} draws over {} slots", draws.len(), SLOT_COUNT));
    Ok(())
}

/// Stay around the event date, or the stay of the default URL options.
fn stay_dates(event_date: Option<NaiveDate>, url_options: &UrlOptions) -> StayDates {
    match event_date {
        Some(event) => StayDates::around_event(event, url_options.checkin),
        None => StayDates {
            check_in: url_options.checkin,
            check_out: url_options.checkout,
        },
    }
}

fn rotation_table(draws: &[Draw]) -> Table {
    let mut table = Table::new(&[("ROUND", 6), ("SLOT", 5), ("AD", 48)]);
    for draw in draws {
        table.row([draw.round.to_string(), draw.slot.to_string(), draw.ad.clone()]);
    }
    table
}
