//! End-to-end scenarios for ranking, contexts and identifiers.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde_json::json;

use hotelads_cache::{keys, CacheStore, InMemoryStore};
use hotelads_engine::prelude::*;
use hotelads_engine::{BundleId, ContextTokenCodec, StandardEngine, StaticHotelProvider};

fn complete(id: u64) -> Hotel {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Hotel {id}"),
        "photos": [{"url": "https://photo.example/p.jpg"}],
        "best_price": 100.0 + id as f64,
        "summary": {"text": "Clean and quiet"},
        "photosByRoomType": {"1": 2},
        "popularity": id as f64
    }))
    .unwrap()
}

fn incomplete_without_photos(id: u64) -> Hotel {
    let mut hotel = complete(id);
    hotel.photos = None;
    hotel
}

fn zip(code: &str) -> Zipcode {
    Zipcode::new(code).unwrap()
}

fn engine(provider: StaticHotelProvider) -> StandardEngine {
    StandardEngine::new(Arc::new(provider))
}

#[tokio::test]
async fn test_incomplete_candidate_leaves_too_few_for_four_slots() {
    let provider = StaticHotelProvider::new().with_hotels(
        zip("10001"),
        vec![complete(1), complete(2), incomplete_without_photos(3), complete(4)],
    );
    let ranked = engine(provider)
        .query(&RecommendationQuery::new(Some(zip("10001"))))
        .await
        .unwrap();
    let ids: Vec<u64> = ranked.iter().map(|hotel| hotel.id.get()).collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&3));

    let store = Arc::new(InMemoryStore::with_seed(10001));
    let previous: Vec<Hotel> = (10..=15).map(complete).collect();
    let context = RecommendationContext::create(store.clone(), zip("10001"), &previous)
        .await
        .unwrap();
    context.draw(0).await.unwrap();

    let err = context.set_hotels(&ranked).await.unwrap_err();
    assert!(matches!(
        err,
        AdError::InsufficientCandidates {
            required: 4,
            available: 3
        }
    ));
    assert_eq!(context.candidate_ids().await.unwrap().len(), 6);
    assert!(store
        .get(&keys::ad_slot(context.id(), 0))
        .await
        .unwrap()
        .is_some());

    let exactly_four: Vec<Hotel> = (1..=4).map(complete).collect();
    context.set_hotels(&exactly_four).await.unwrap();
    assert!(store
        .get(&keys::ad_slot(context.id(), 0))
        .await
        .unwrap()
        .is_none());
    let candidates: Vec<u64> = context
        .candidate_ids()
        .await
        .unwrap()
        .into_iter()
        .map(HotelId::get)
        .collect();
    assert_eq!(candidates, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_complete_hotels_rank_first_for_any_criteria_order() {
    let mut bare = Hotel::new(50);
    bare.name = Some(json!("Bare"));
    bare.photos = Some(vec![json!({"url": "https://photo.example/b.jpg"})]);
    bare.popularity = Some(1_000_000.0);
    bare.rating = Some(10.0);
    bare.distance_to_event = Some(0.0);

    let provider = StaticHotelProvider::new()
        .with_hotels(zip("10001"), vec![bare, complete(1), complete(2)]);
    let engine = engine(provider);

    for order in ["distance", "popularity", "rating", "price", "rating,distance", ""] {
        let sort = SortConfig::parse(order, UnknownCriterionPolicy::Drop).unwrap();
        let ranked = engine
            .query(&RecommendationQuery::new(Some(zip("10001"))).with_sort(sort))
            .await
            .unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked.last().map(|hotel| hotel.id.get()), Some(50), "order {order:?}");
    }
}

#[test]
fn test_bundle_id_for_known_pair() {
    let id = BundleId::new(zip("90210"), HotelId::new(555));
    let encoded = id.encode();
    assert_eq!(encoded, URL_SAFE.encode("90210|555"));

    let decoded = BundleId::decode(&encoded).unwrap();
    assert_eq!(decoded.zipcode.as_str(), "90210");
    assert_eq!(decoded.hotel_id.get(), 555);
}

#[tokio::test]
async fn test_bundle_id_with_non_numeric_zipcode_rejected() {
    let forged = URL_SAFE.encode("ABCDE|555");
    let store = Arc::new(InMemoryStore::new());
    let err = AdDataBundle::from_identifier(
        &forged,
        store,
        &hotelads_engine::PassthroughFormatter,
        std::path::Path::new("ad_images"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AdError::InvalidDataBundleId(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_context_reachable_only_through_its_key() {
    let store = Arc::new(InMemoryStore::with_seed(4));
    let context = RecommendationContext::create(
        store.clone(),
        zip("10001"),
        &(1..=4).map(complete).collect::<Vec<_>>(),
    )
    .await
    .unwrap();

    let codec = ContextTokenCodec::new(&ContextTokenCodec::generate_key()).unwrap();
    let token = context.token(&codec);
    let reopened = RecommendationContext::from_token(store.clone(), &codec, &token)
        .await
        .unwrap();
    assert_eq!(reopened.id(), context.id());
    assert_eq!(reopened.zipcode().as_str(), "10001");

    let foreign = ContextTokenCodec::new(&ContextTokenCodec::generate_key()).unwrap();
    let err = RecommendationContext::from_token(store.clone(), &foreign, &token)
        .await
        .unwrap_err();
    assert!(matches!(err, AdError::InvalidContextToken));

    let mut corrupted = token.clone();
    corrupted.push('x');
    assert!(RecommendationContext::from_token(store, &codec, &corrupted)
        .await
        .is_err());
}
