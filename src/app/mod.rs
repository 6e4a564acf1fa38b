// Application layer: wires configuration into a ready-to-use service.

use crate::adapters::gemini::GeminiClient;
use crate::adapters::profiles::StaticProfiles;
use crate::adapters::storage::{InMemoryStore, SnapshotStore};
use crate::config::AppConfig;
use crate::core::fetcher::OverpassFetcher;
use crate::core::recommend::Recommender;
use crate::core::service::LocalityService;
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

pub type AppService =
    LocalityService<InMemoryStore, SnapshotStore, OverpassFetcher, StaticProfiles, GeminiClient>;

pub async fn build_service(config: &AppConfig) -> Result<AppService> {
    let fetcher = Arc::new(OverpassFetcher::new(
        config.endpoint_pool()?,
        config.fetch_settings(),
    ));
    let snapshots = SnapshotStore::open(config.cache.store_path.as_deref().map(Path::new)).await?;

    let generator = config
        .recommend_api_key()
        .map(|key| GeminiClient::new(config.recommend.endpoint.clone(), key));
    if generator.is_none() {
        tracing::debug!("Text generation disabled; recommendations use the built-in fallback");
    }

    tracing::info!(
        "Service ready: {} areas, {} endpoints, {} profiles",
        config.areas.len(),
        config.upstream.endpoints.len(),
        config.profiles.len()
    );

    Ok(LocalityService::new(
        InMemoryStore::with_areas(config.areas.clone()),
        snapshots,
        fetcher,
        StaticProfiles::new(config.profiles.clone()),
        Recommender::new(generator),
        config.service_options(),
    ))
}
