//! Slot rotation properties against the in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;

use hotelads_cache::{keys, CacheStore, InMemoryStore};
use hotelads_engine::{Hotel, HotelId, RecommendationContext, Zipcode, SLOT_COUNT};

fn hotels(ids: impl IntoIterator<Item = u64>) -> Vec<Hotel> {
    ids.into_iter().map(Hotel::new).collect()
}

async fn context(store: &Arc<InMemoryStore>, count: u64) -> RecommendationContext {
    RecommendationContext::create(
        store.clone(),
        Zipcode::new("10001").unwrap(),
        &hotels(1..=count),
    )
    .await
    .unwrap()
}

async fn assigned(store: &InMemoryStore, context: &RecommendationContext) -> Vec<Option<String>> {
    let mut slots = Vec::new();
    for slot in 0..SLOT_COUNT {
        slots.push(store.get(&keys::ad_slot(context.id(), slot)).await.unwrap());
    }
    slots
}

async fn pool(store: &InMemoryStore, context: &RecommendationContext) -> Vec<String> {
    store
        .smembers(&keys::free_hotels(context.id()))
        .await
        .unwrap()
}

/// Assigned slots and the pool are disjoint and together hold every candidate.
async fn assert_partition(store: &InMemoryStore, context: &RecommendationContext, count: u64) {
    let slots: Vec<String> = assigned(store, context).await.into_iter().flatten().collect();
    let pool = pool(store, context).await;

    let distinct_slots: BTreeSet<&String> = slots.iter().collect();
    assert_eq!(distinct_slots.len(), slots.len(), "slots share a hotel: {slots:?}");

    let mut all: BTreeSet<String> = pool.iter().cloned().collect();
    assert_eq!(all.len(), pool.len());
    for id in &slots {
        assert!(all.insert(id.clone()), "hotel {id} both assigned and free");
    }
    let expected: BTreeSet<String> = (1..=count).map(|id| id.to_string()).collect();
    assert_eq!(all, expected);
}

#[tokio::test]
async fn test_first_round_fills_every_slot_with_distinct_hotels() {
    for count in [4, 5, 9] {
        let store = Arc::new(InMemoryStore::with_seed(count));
        let context = context(&store, count).await;

        let mut shown = BTreeSet::new();
        for slot in 0..SLOT_COUNT {
            let id = context.draw(slot).await.unwrap().unwrap();
            assert!((1..=count).contains(&id.get()));
            shown.insert(id);
        }
        assert_eq!(shown.len(), SLOT_COUNT);
        assert_partition(&store, &context, count).await;
    }
}

#[tokio::test]
async fn test_partition_holds_across_many_rotations() {
    let store = Arc::new(InMemoryStore::with_seed(11));
    let count = 7;
    let context = context(&store, count).await;

    for round in 0..(4 * count as usize) {
        let slot = round % SLOT_COUNT;
        let id = context.draw(slot).await.unwrap().unwrap();
        assert_eq!(
            store
                .get(&keys::ad_slot(context.id(), slot))
                .await
                .unwrap()
                .as_deref(),
            Some(id.to_string().as_str())
        );
        assert_partition(&store, &context, count).await;
    }
}

#[tokio::test]
async fn test_exactly_four_candidates_each_slot_keeps_its_hotel() {
    let store = Arc::new(InMemoryStore::with_seed(3));
    let context = context(&store, 4).await;

    let mut first = Vec::new();
    for slot in 0..SLOT_COUNT {
        first.push(context.draw(slot).await.unwrap().unwrap());
    }
    assert!(pool(&store, &context).await.is_empty());

    // Only the slot's own hotel is ever free when it redraws.
    for slot in 0..SLOT_COUNT {
        assert_eq!(context.draw(slot).await.unwrap(), Some(first[slot]));
    }
}

#[tokio::test]
async fn test_draw_out_of_range_slot() {
    let store = Arc::new(InMemoryStore::with_seed(1));
    let context = context(&store, 4).await;
    assert_eq!(context.draw(SLOT_COUNT).await.unwrap(), None);
    assert!(assigned(&store, &context).await.iter().all(Option::is_none));
}

#[tokio::test]
async fn test_set_hotels_resets_rotation() {
    let store = Arc::new(InMemoryStore::with_seed(5));
    let context = context(&store, 6).await;
    for slot in 0..SLOT_COUNT {
        context.draw(slot).await.unwrap();
    }

    context.set_hotels(&hotels(100..=104)).await.unwrap();
    assert!(assigned(&store, &context).await.iter().all(Option::is_none));
    assert!(pool(&store, &context).await.is_empty());

    let id = context.draw(2).await.unwrap().unwrap();
    assert!((100..=104).contains(&id.get()));
}

#[tokio::test]
async fn test_rejected_set_hotels_leaves_state_unchanged() {
    let store = Arc::new(InMemoryStore::with_seed(5));
    let context = context(&store, 6).await;
    context.draw(0).await.unwrap();
    context.draw(1).await.unwrap();

    let slots_before = assigned(&store, &context).await;
    let mut pool_before = pool(&store, &context).await;
    pool_before.sort();
    let candidates_before = context.candidate_ids().await.unwrap();

    assert!(context.set_hotels(&hotels([7, 8, 9])).await.is_err());
    assert!(context.set_hotels(&hotels([7, 7, 8, 8])).await.is_err());

    let mut pool_after = pool(&store, &context).await;
    pool_after.sort();
    assert_eq!(assigned(&store, &context).await, slots_before);
    assert_eq!(pool_after, pool_before);
    assert_eq!(context.candidate_ids().await.unwrap(), candidates_before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_draws_on_different_slots() {
    let store = Arc::new(InMemoryStore::with_seed(21));
    let count = 10;
    let context = context(&store, count).await;
    for slot in 0..SLOT_COUNT {
        context.draw(slot).await.unwrap();
    }

    let mut handles = Vec::new();
    for slot in 0..SLOT_COUNT {
        let context = context.clone();
        handles.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..25 {
                seen.push(context.draw(slot).await.unwrap().unwrap());
            }
            seen
        }));
    }
    for handle in handles {
        let seen = handle.await.unwrap();
        assert!(seen.iter().all(|id| (1..=count).contains(&id.get())));
    }

    assert_partition(&store, &context, count).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_draws_on_same_slot_keep_every_candidate() {
    let store = Arc::new(InMemoryStore::with_seed(8));
    let count = 8;
    let context = context(&store, count).await;
    for slot in 0..SLOT_COUNT {
        context.draw(slot).await.unwrap();
    }

    let draws = (0..16).map(|_| {
        let context = context.clone();
        tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..10 {
                seen.push(context.draw(0).await.unwrap().unwrap());
            }
            seen
        })
    });
    let results: Vec<HotelId> = futures::future::join_all(draws)
        .await
        .into_iter()
        .flat_map(Result::unwrap)
        .collect();
    assert_eq!(results.len(), 160);

    let current = store
        .get(&keys::ad_slot(context.id(), 0))
        .await
        .unwrap()
        .unwrap();
    assert!(results.iter().any(|id| id.to_string() == current));
    assert_partition(&store, &context, count).await;
}

#[tokio::test]
async fn test_every_candidate_is_shown() {
    for (seed, count) in [(1, 4), (2, 5), (3, 7), (4, 12)] {
        let store = Arc::new(InMemoryStore::with_seed(seed));
        let context = context(&store, count).await;

        let mut shown = BTreeSet::new();
        for call in 0..(50 * count as usize) {
            shown.insert(context.draw(call % SLOT_COUNT).await.unwrap().unwrap().get());
        }
        assert_eq!(shown, (1..=count).collect::<BTreeSet<_>>(), "{count} candidates");
        assert_partition(&store, &context, count).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_candidate_is_shown_under_concurrent_draws() {
    let store = Arc::new(InMemoryStore::with_seed(17));
    let count = 9;
    let context = context(&store, count).await;

    let draws = (0..2 * SLOT_COUNT).map(|task| {
        let context = context.clone();
        tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..(25 * count as usize) {
                seen.push(context.draw(task % SLOT_COUNT).await.unwrap().unwrap().get());
            }
            seen
        })
    });
    let shown: BTreeSet<u64> = futures::future::join_all(draws)
        .await
        .into_iter()
        .flat_map(Result::unwrap)
        .collect();

    assert_eq!(shown, (1..=count).collect::<BTreeSet<_>>());
    assert_partition(&store, &context, count).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_context_ids_are_unique() {
    let store = Arc::new(InMemoryStore::with_seed(2));
    let creates = (0..32).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            RecommendationContext::create(store, Zipcode::new("10001").unwrap(), &hotels(1..=4))
                .await
                .unwrap()
                .id()
        })
    });

    let ids: BTreeSet<u64> = futures::future::join_all(creates)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().get())
        .collect();
    assert_eq!(ids.len(), 32);
    assert_eq!(ids.iter().next(), Some(&1));
}
