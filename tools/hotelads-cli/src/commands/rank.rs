//! Rank a list of hotels.

use anyhow::Result;
use serde::Serialize;

use hotelads_engine::ranking::{rank, rank_key, SortConfig, UnknownCriterionPolicy};
use hotelads_engine::DEFAULT_LANGUAGE;

use super::{read_hotels, RankArgs};
use crate::context::Context;
use crate::output::Table;

#[derive(Serialize)]
struct RankedRow {
    position: usize,
    id: u64,
    name: Option<String>,
    key: Vec<f64>,
}

/// Sort configuration from command line flags.
pub fn sort_config(
    sort: &str,
    ascending: bool,
    target_price: Option<f64>,
    strict: bool,
) -> Result<SortConfig> {
    let policy = if strict {
        UnknownCriterionPolicy::Reject
    } else {
        UnknownCriterionPolicy::Drop
    };
    Ok(SortConfig::parse(sort, policy)?
        .with_descending(!ascending)
        .with_target_price(target_price))
}

/// Run the rank command.
pub async fn run(args: RankArgs, ctx: &Context) -> Result<()> {
    let hotels = read_hotels(&args.input, ctx)?;
    let total = hotels.len();
    let config = sort_config(&args.sort, args.ascending, args.target_price, args.strict)?;
    let limit = args.limit.unwrap_or(ctx.config.ads.max_recommendations);

    let mut ranked = rank(hotels, &config);
    let displayable = ranked.len();
    ranked.truncate(limit);

    let rows: Vec<RankedRow> = ranked
        .iter()
        .enumerate()
        .map(|(i, hotel)| RankedRow {
            position: i + 1,
            id: hotel.id.get(),
            name: hotel.display_name(DEFAULT_LANGUAGE).map(str::to_string),
            key: rank_key(hotel, &config),
        })
        .collect();

    if ctx.output.emit_json(&rows) {
        return Ok(());
    }

    ctx.output.section(&format!("Ranked by {}", config));
    if total > displayable {
        ctx.output.caution(&format!(
            "{} of {} hotels skipped (missing name or photos)",
            total - displayable,
            total
        ));
    }

    ctx.output.table(&ranking_table(&rows));
    ctx.output.done(&format!("{} of {} hotels shown", rows.len(), displayable));
    Ok(())
}

fn ranking_table(rows: &[RankedRow]) -> Table {
    let mut table = Table::new(&[("#", 4), ("ID", 10), ("NAME", 32), ("KEY", 0)]);
    for row in rows {
        table.row([
            row.position.to_string(),
            row.id.to_string(),
            row.name.clone().unwrap_or_else(|| "-".to_string()),
            format!("{:?}", row.key),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotelads_engine::ranking::SortCriterion;

    #[test]
    fn test_sort_config_flags() {
        let config = sort_config("rating,bogus", true, Some(90.0), false).unwrap();
        assert_eq!(config.criteria()[0], SortCriterion::Rating);
        assert!(!config.descending);
        assert_eq!(config.target_price, Some(90.0));

        assert!(sort_config("rating,bogus", false, None, true).is_err());
    }

    #[test]
    fn test_ranking_table_rows() {
        let rows = vec![
            RankedRow {
                position: 1,
                id: 42,
                name: Some("Harbor Inn".into()),
                key: vec![5.0, 4.5],
            },
            RankedRow {
                position: 2,
                id: 7,
                name: None,
                key: vec![],
            },
        ];
        let lines = ranking_table(&rows).render();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1     42"));
        assert!(lines[1].ends_with("[5.0, 4.5]"));
        assert!(lines[2].contains(" - "));
    }
}
