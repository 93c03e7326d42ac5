//! Multi-key ranking sort.

use std::cmp::Ordering;

use tracing::trace;

use super::{SortConfig, SortCriterion};
use crate::Hotel;

const DEFAULT_DISTANCE: f64 = 30.0;
const DEFAULT_BEST_PRICE: f64 = 10e6;

/// Rank hotels for display.
///
/// Hotels without photos or without a name are removed. The rest are sorted
/// by [`rank_key`], stably, in the configured direction. The result is not
/// truncated.
pub fn rank(hotels: Vec<Hotel>, config: &SortConfig) -> Vec<Hotel> {
    let total = hotels.len();
    let mut keyed: Vec<(Vec<f64>, Hotel)> = hotels
        .into_iter()
        .filter(Hotel::is_displayable)
        .map(|hotel| (rank_key(&hotel, config), hotel))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        if config.descending {
            compare_keys(b, a)
        } else {
            compare_keys(a, b)
        }
    });

    trace!(total, ranked = keyed.len(), order = %config, "ranked hotels");
    keyed.into_iter().map(|(_, hotel)| hotel).collect()
}

/// Sort key of one hotel.
///
/// Three presence flags (best price, summary, room-type photos) come first,
/// followed by one value per criterion in configured order. Larger is better
/// for every component.
pub fn rank_key(hotel: &Hotel, config: &SortConfig) -> Vec<f64> {
    let mut key = Vec::with_capacity(3 + config.criteria().len());
    key.push(flag(hotel.has_best_price()));
    key.push(flag(hotel.has_summary()));
    key.push(flag(hotel.has_room_type_photos()));
    key.extend(
        config
            .criteria()
            .iter()
            .map(|criterion| criterion_value(hotel, *criterion, config.target_price)),
    );
    key
}

fn criterion_value(hotel: &Hotel, criterion: SortCriterion, target_price: Option<f64>) -> f64 {
    match criterion {
        SortCriterion::Distance => -hotel.distance_to_event.unwrap_or(DEFAULT_DISTANCE),
        SortCriterion::Popularity => hotel.popularity.unwrap_or(0.0),
        SortCriterion::Rating => hotel.rating.unwrap_or(0.0),
        SortCriterion::Price => match target_price.filter(|target| *target != 0.0) {
            Some(target) => {
                let gap = hotel.best_price.unwrap_or(DEFAULT_BEST_PRICE) - target;
                -(gap * gap)
            }
            None => hotel.price_from.unwrap_or(0.0),
        },
    }
}

fn flag(present: bool) -> f64 {
    if present {
        1.0
    } else {
        0.0
    }
}

fn compare_keys(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| normalize(*x).total_cmp(&normalize(*y)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

// total_cmp orders -0.0 below 0.0
fn normalize(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::UnknownCriterionPolicy;
    use serde_json::json;

    fn hotel(id: u64) -> Hotel {
        let mut hotel = Hotel::new(id);
        hotel.name = Some(json!({"en": format!("Hotel {id}")}));
        hotel.photos = Some(vec![json!({"url": "https://photo.example/a.jpg"})]);
        hotel
    }

    fn ids(hotels: &[Hotel]) -> Vec<u64> {
        hotels.iter().map(|h| h.id.get()).collect()
    }

    #[test]
    fn test_removes_incomplete_hotels() {
        let mut no_photos = hotel(2);
        no_photos.photos = None;
        let mut no_name = hotel(3);
        no_name.name = None;

        let ranked = rank(vec![hotel(1), no_photos, no_name], &SortConfig::default());
        assert_eq!(ids(&ranked), vec![1]);
    }

    #[test]
    fn test_presence_flags_lead() {
        let mut priced = hotel(1);
        priced.best_price = Some(150.0);
        let mut popular = hotel(2);
        popular.popularity = Some(1_000.0);
        popular.rating = Some(10.0);

        let ranked = rank(vec![popular, priced], &SortConfig::default());
        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_closer_hotel_ranks_first() {
        let mut near = hotel(1);
        near.distance_to_event = Some(0.4);
        let mut far = hotel(2);
        far.distance_to_event = Some(12.0);
        let unknown = hotel(3);

        let ranked = rank(vec![unknown, far, near], &SortConfig::default());
        assert_eq!(ids(&ranked), vec![1, 2, 3]);
    }

    #[test]
    fn test_criteria_order_matters() {
        let mut rated = hotel(1);
        rated.rating = Some(9.5);
        rated.popularity = Some(10.0);
        let mut popular = hotel(2);
        popular.rating = Some(7.0);
        popular.popularity = Some(500.0);

        let by_rating = SortConfig::parse("rating", UnknownCriterionPolicy::Drop).unwrap();
        let ranked = rank(vec![popular.clone(), rated.clone()], &by_rating);
        assert_eq!(ids(&ranked), vec![1, 2]);

        let by_popularity = SortConfig::parse("popularity", UnknownCriterionPolicy::Drop).unwrap();
        let ranked = rank(vec![rated, popular], &by_popularity);
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn test_target_price_prefers_closest() {
        let prices = [(1, 300.0), (2, 110.0), (3, 95.0)];
        let hotels: Vec<Hotel> = prices
            .iter()
            .map(|(id, price)| {
                let mut h = hotel(*id);
                h.best_price = Some(*price);
                h
            })
            .collect();

        let config = SortConfig::parse("price", UnknownCriterionPolicy::Drop)
            .unwrap()
            .with_target_price(Some(100.0));
        let ranked = rank(hotels, &config);
        assert_eq!(ids(&ranked), vec![3, 2, 1]);
    }

    #[test]
    fn test_price_without_target_favours_higher_price_when_descending() {
        let mut cheap = hotel(1);
        cheap.price_from = Some(50.0);
        let mut pricey = hotel(2);
        pricey.price_from = Some(400.0);

        let config = SortConfig::parse("price", UnknownCriterionPolicy::Drop).unwrap();
        let ranked = rank(vec![cheap.clone(), pricey.clone()], &config);
        assert_eq!(ids(&ranked), vec![2, 1]);

        let ascending = config.with_descending(false);
        let ranked = rank(vec![pricey, cheap], &ascending);
        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_ascending_flips_presence_flags_too() {
        let mut priced = hotel(1);
        priced.best_price = Some(150.0);
        let plain = hotel(2);

        let config = SortConfig::default().with_descending(false);
        let ranked = rank(vec![priced, plain], &config);
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let hotels = vec![hotel(4), hotel(2), hotel(9), hotel(1)];
        let ranked = rank(hotels.clone(), &SortConfig::default());
        assert_eq!(ids(&ranked), vec![4, 2, 9, 1]);

        let ranked = rank(hotels, &SortConfig::default().with_descending(false));
        assert_eq!(ids(&ranked), vec![4, 2, 9, 1]);
    }

    #[test]
    fn test_zero_distance_ties_with_negative_zero() {
        let mut a = hotel(1);
        a.distance_to_event = Some(0.0);
        let mut b = hotel(2);
        b.distance_to_event = Some(-0.0);
        let ranked = rank(vec![a, b], &SortConfig::default());
        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_rank_does_not_truncate() {
        let hotels: Vec<Hotel> = (1..=10).map(hotel).collect();
        assert_eq!(rank(hotels, &SortConfig::default()).len(), 10);
    }
}
