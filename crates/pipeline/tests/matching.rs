//! Matching cascade behavior, exercised end-to-end through the service
//! with faked lookup sources.

mod common;

use common::*;
use mealscan_core::nutrients::ItemSource;
use mealscan_core::ports::ProviderFood;

#[tokio::test]
async fn local_corpus_hit_short_circuits_provider() {
    let h = harness();
    h.vision
        .script("rice bowl", vec![candidate("Rice", 200.0, 999.0)]);
    h.search.seed("rice", per100(130.0, 2.7, 28.0, 0.3), 0.62);
    h.provider.seed(
        "rice",
        ProviderFood {
            provider_id: "fdc:1001".into(),
            per_100g: per100(500.0, 1.0, 1.0, 1.0),
            confidence: 0.9,
        },
    );

    let job_id = run_to_completion(&h, "rice bowl", "en").await;
    let (_, stored) = h.service.get_result(job_id).await.unwrap();
    let item = &stored.unwrap().snapshot.items[0];

    assert_eq!(item.source, ItemSource::Provider);
    assert_eq!(item.provider_id, None);
    assert_eq!(item.confidence, Some(0.62));
    assert!(!item.is_fallback);
    // Per-100g corpus values scaled to the 200 g portion, not the
    // vision estimate and not the provider row.
    assert_eq!(item.nutrients.calories, 260.0);
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn low_rank_corpus_hit_falls_through_to_provider() {
    let h = harness();
    h.vision.script(
        "chicken",
        vec![candidate("Grilled Chicken Breast", 150.0, 300.0)],
    );
    // Below the 0.1 relevance threshold.
    h.search
        .seed("grilled chicken breast", per100(1.0, 1.0, 1.0, 1.0), 0.05);
    h.provider.seed(
        "grilled chicken breast",
        ProviderFood {
            provider_id: "fdc:2345".into(),
            per_100g: per100(165.0, 31.0, 0.0, 3.6),
            confidence: 0.9,
        },
    );

    let job_id = run_to_completion(&h, "chicken", "en").await;
    let (_, stored) = h.service.get_result(job_id).await.unwrap();
    let item = &stored.unwrap().snapshot.items[0];

    assert_eq!(item.provider_id.as_deref(), Some("fdc:2345"));
    assert_eq!(item.confidence, Some(0.9));
    assert!(!item.is_fallback);
    assert_eq!(item.nutrients.calories, 247.5);
    assert_eq!(h.search.call_count(), 1);
}

#[tokio::test]
async fn provider_outage_degrades_to_vision_fallback() {
    let h = harness();
    h.vision
        .script("stew", vec![candidate("Mystery Stew", 250.0, 400.0)]);
    h.provider.failures_before_success.store(
        10,
        std::sync::atomic::Ordering::SeqCst,
    );

    let job_id = run_to_completion(&h, "stew", "en").await;
    let (status, stored) = h.service.get_result(job_id).await.unwrap();
    let snapshot = stored.unwrap().snapshot;
    let item = &snapshot.items[0];

    // A source outage degrades the match; it never fails the job.
    assert_eq!(status, mealscan_core::job::JobStatus::Completed);
    assert_eq!(item.source, ItemSource::Vision);
    assert!(item.is_fallback);
    assert_eq!(item.confidence, None);
    // Vision macros used verbatim.
    assert_eq!(item.nutrients.calories, 400.0);
    // Both configured attempts were spent.
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test]
async fn provider_retry_recovers_after_transient_failure() {
    let h = harness();
    h.vision.script("rice", vec![candidate("Rice", 100.0, 999.0)]);
    h.provider.seed(
        "rice",
        ProviderFood {
            provider_id: "fdc:1001".into(),
            per_100g: per100(130.0, 2.7, 28.0, 0.3),
            confidence: 0.8,
        },
    );
    h.provider
        .failures_before_success
        .store(1, std::sync::atomic::Ordering::SeqCst);

    let job_id = run_to_completion(&h, "rice", "en").await;
    let (_, stored) = h.service.get_result(job_id).await.unwrap();
    let item = &stored.unwrap().snapshot.items[0];

    assert!(!item.is_fallback);
    assert_eq!(item.provider_id.as_deref(), Some("fdc:1001"));
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test]
async fn cached_match_serves_repeat_jobs_at_any_portion() {
    let h = harness();
    h.search.seed("rice", per100(130.0, 2.7, 28.0, 0.3), 0.62);

    h.vision.script("lunch", vec![candidate("Rice", 100.0, 0.0)]);
    let first = run_to_completion(&h, "lunch", "en").await;
    let (_, stored) = h.service.get_result(first).await.unwrap();
    assert_eq!(stored.unwrap().snapshot.items[0].nutrients.calories, 130.0);
    assert_eq!(h.search.call_count(), 1);

    // Same food, different portion: the cached per-100g basis must be
    // rescaled without consulting the corpus again.
    h.vision.script("dinner", vec![candidate("Rice", 200.0, 0.0)]);
    let second = run_to_completion(&h, "dinner", "en").await;
    let (_, stored) = h.service.get_result(second).await.unwrap();
    assert_eq!(stored.unwrap().snapshot.items[0].nutrients.calories, 260.0);
    assert_eq!(h.search.call_count(), 1);
}

#[tokio::test]
async fn cache_keys_are_locale_scoped() {
    let h = harness();
    h.search.seed("rice", per100(130.0, 2.7, 28.0, 0.3), 0.62);
    h.vision.script("lunch", vec![candidate("Rice", 100.0, 0.0)]);

    run_to_completion(&h, "lunch", "en").await;
    run_to_completion(&h, "lunch", "ru").await;

    // One cascade walk per locale.
    assert_eq!(h.search.call_count(), 2);
}

#[tokio::test]
async fn zero_portion_fallback_is_not_cached() {
    let h = harness();
    h.vision
        .script("garnish", vec![candidate("Parsley Sprig", 0.0, 1.0)]);

    run_to_completion(&h, "garnish", "en").await;
    run_to_completion(&h, "garnish", "en").await;

    // No usable per-100g basis, so the cascade runs again.
    assert_eq!(h.search.call_count(), 2);
}

#[tokio::test]
async fn names_are_normalized_before_corpus_lookup() {
    let h = harness();
    h.vision.script(
        "photo",
        vec![candidate("  Poêlée  de Légumes ", 180.0, 90.0)],
    );
    h.search
        .seed("poelee de legumes", per100(55.0, 2.0, 8.0, 1.5), 0.4);

    let job_id = run_to_completion(&h, "photo", "fr").await;
    let (_, stored) = h.service.get_result(job_id).await.unwrap();
    let item = &stored.unwrap().snapshot.items[0];

    assert!(!item.is_fallback);
    assert_eq!(item.nutrients.calories, 99.0);
}
