use httpmock::prelude::*;
use locality_score::core::cache::CacheStatus;
use locality_score::core::recommend::RecommendationSource;
use locality_score::domain::model::FacilityCategory;
use locality_score::{build_service, AppConfig, LocalityError};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn counts_body(totals: [u32; 8]) -> Value {
    let elements: Vec<Value> = totals
        .iter()
        .map(|t| json!({ "type": "count", "id": 0, "tags": { "total": t.to_string() } }))
        .collect();
    json!({ "elements": elements })
}

fn locations_body() -> Value {
    let mut elements = vec![
        json!({ "type": "count", "id": 0, "tags": { "total": "3" } }),
        json!({ "type": "node", "id": 1, "lat": 17.4401, "lon": 78.3489, "tags": { "name": "Continental Hospital" } }),
        json!({ "type": "node", "id": 2, "lat": 17.4401, "lon": 78.3489, "tags": { "name": "Continental Hospital" } }),
        json!({ "type": "way", "id": 3, "center": { "lat": 17.4410, "lon": 78.3500 }, "tags": {} }),
        json!({ "type": "count", "id": 0, "tags": { "total": "1" } }),
        json!({ "type": "way", "id": 4, "center": { "lat": 17.4420, "lon": 78.3510 }, "tags": { "name": "Oakridge School" } }),
    ];
    for _ in 0..6 {
        elements.push(json!({ "type": "count", "id": 0, "tags": { "total": "0" } }));
    }
    json!({ "elements": elements })
}

fn config_for(server: &MockServer, dir: &TempDir) -> AppConfig {
    let toml = format!(
        r#"
[upstream]
endpoints = ["{}"]
count_timeout_seconds = 5
location_timeout_seconds = 5

[cache]
store_path = "{}"

[profiles.kiran]
marital_status = "married"
employment_status = "working"
has_children = true
has_vehicle = true
"#,
        server.url("/api/interpreter"),
        dir.path().join("snapshots.json").display()
    );
    AppConfig::from_toml_str(&toml).unwrap()
}

#[tokio::test]
async fn test_score_is_cached_across_service_instances() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let overpass = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/interpreter");
            then.status(200).json_body(counts_body([1, 3, 10, 2, 2, 5, 4, 1]));
        })
        .await;
    let dir = TempDir::new()?;
    let config = config_for(&server, &dir);

    let service = build_service(&config).await?;
    let score = service.area_score(1, None).await?;
    assert_eq!(score.area_name, "Gachibowli");
    assert_eq!(score.breakdown.final_score, 15.0);

    let again = service.area_score(1, Some("kiran")).await?;
    assert_eq!(again.breakdown.infrastructure, score.breakdown.infrastructure);
    overpass.assert_hits_async(1).await;

    let stored: Value = serde_json::from_str(&std::fs::read_to_string(
        dir.path().join("snapshots.json"),
    )?)?;
    assert_eq!(stored["1"]["bus_stops"], 10);

    // A fresh process reads the file instead of going upstream.
    drop(service);
    let reopened = build_service(&config).await?;
    let infra = reopened.area_infrastructure(1, false).await?;
    assert_eq!(infra.cache_status, CacheStatus::Hit);
    assert_eq!(infra.snapshot.counts.gyms, 4);
    overpass.assert_hits_async(1).await;

    Ok(())
}

#[tokio::test]
async fn test_upstream_outage_serves_stale_then_zero() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let healthy = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/interpreter");
            then.status(200).json_body(counts_body([2, 2, 2, 2, 2, 2, 2, 2]));
        })
        .await;
    let dir = TempDir::new()?;
    let service = build_service(&config_for(&server, &dir)).await?;

    service.area_infrastructure(2, false).await?;
    healthy.delete_async().await;

    let outage = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/interpreter");
            then.status(504).body("<html>Gateway Timeout</html>");
        })
        .await;

    let stale = service.area_infrastructure(2, true).await?;
    assert_eq!(stale.cache_status, CacheStatus::StaleFallback);
    assert_eq!(stale.snapshot.counts.hospitals, 2);

    let zero = service.area_infrastructure(3, false).await?;
    assert_eq!(zero.cache_status, CacheStatus::ZeroFilled);
    assert!(zero.snapshot.counts.is_empty());
    outage.assert_hits_async(6).await;

    let rec = service.recommend(3, None).await?;
    assert_eq!(rec.recommendation_source, RecommendationSource::Fallback);
    assert!(rec
        .recommendation
        .starts_with("Hitech City scores 0.0/100 overall, making it not well-suited"));
    assert!(rec.recommendation.contains("It performs best in Transport (0/100)."));

    Ok(())
}

#[tokio::test]
async fn test_facility_locations_are_deduplicated() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let counts = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/interpreter");
            then.status(200).json_body(counts_body([3, 1, 0, 0, 0, 0, 0, 0]));
        })
        .await;
    let dir = TempDir::new()?;
    let service = build_service(&config_for(&server, &dir)).await?;
    service.area_infrastructure(1, false).await?;
    counts.delete_async().await;

    let locations = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/interpreter")
                .body_contains("out+center");
            then.status(200).json_body(locations_body());
        })
        .await;

    let result = service.facility_locations(1).await?;
    locations.assert_hits_async(1).await;

    let hospitals = result.locations.get(FacilityCategory::Hospitals);
    assert_eq!(hospitals.len(), 2);
    assert_eq!(hospitals[0].name.as_deref(), Some("Continental Hospital"));
    assert_eq!(result.locations.get(FacilityCategory::Schools).len(), 1);
    assert!(result.locations.get(FacilityCategory::Bars).is_empty());
    assert_eq!(result.infrastructure.hospitals, 3);

    let json = serde_json::to_value(&result)?;
    assert_eq!(json["locations"]["schools"][0]["type"], "schools");

    Ok(())
}

#[tokio::test]
async fn test_unknown_area_and_bad_coordinates() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let dir = TempDir::new()?;
    let service = build_service(&config_for(&server, &dir)).await?;

    let err = service.area_score(99, None).await.unwrap_err();
    assert!(matches!(err, LocalityError::AreaNotFound { area_id: 99 }));

    let err = service.score_at(17.4, 200.0, 2000, None).await.unwrap_err();
    assert!(matches!(err, LocalityError::InvalidInput { .. }));

    Ok(())
}

#[tokio::test]
async fn test_score_all_ranks_every_seeded_area() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    // Wider radii find more facilities.
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("around%3A3000%2C");
            then.status(200).json_body(counts_body([10, 10, 30, 5, 8, 40, 5, 5]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("around%3A2500%2C");
            then.status(200).json_body(counts_body([5, 5, 15, 2, 4, 20, 2, 2]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("around%3A2200%2C");
            then.status(200).json_body(counts_body([2, 2, 5, 1, 1, 5, 0, 0]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("around%3A2000%2C");
            then.status(200).json_body(counts_body([1, 1, 2, 0, 1, 2, 0, 0]));
        })
        .await;

    let dir = TempDir::new()?;
    let service = Arc::new(build_service(&config_for(&server, &dir)).await?);
    let ranked = service.score_all(Some("kiran".to_string())).await?;

    assert_eq!(ranked.len(), 6);
    assert_eq!(ranked[0].area_name, "Kukatpally");
    assert_eq!(ranked[5].area_id, 3);
    assert!(ranked
        .windows(2)
        .all(|w| w[0].breakdown.final_score >= w[1].breakdown.final_score));
    assert!(ranked.iter().all(|s| s.breakdown.profile_context.is_some()));

    Ok(())
}
