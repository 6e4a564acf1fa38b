//! Caller-facing operations: area lookup, cached infrastructure, facility
//! maps, scoring and recommendations.

use crate::core::cache::{CacheStatus, InfrastructureCache, DEFAULT_TTL_HOURS};
use crate::core::recommend::{RecommendationSource, Recommender};
use crate::core::scoring::{ScoringEngine, ScoringSettings};
use crate::domain::model::{
    Area, Coordinate, FacilityMap, InfrastructureCounts, InfrastructureSnapshot, LifestyleProfile,
    Radius,
};
use crate::domain::ports::{
    AreaRepository, CountSource, LocationSource, ProfileProvider, SnapshotRepository,
    TextGenerator,
};
use crate::domain::score::{AreaScore, RecommendationRequest, ScoreBreakdown};
use crate::utils::error::{LocalityError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub ttl: chrono::Duration,
    pub scoring: ScoringSettings,
    /// Areas whose facility maps may be fetched. `None` allows every area.
    pub location_areas: Option<Vec<u64>>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::hours(DEFAULT_TTL_HOURS),
            scoring: ScoringSettings::default(),
            location_areas: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaInfrastructure {
    pub area_id: u64,
    pub area_name: String,
    #[serde(flatten)]
    pub snapshot: InfrastructureSnapshot,
    pub cache_status: CacheStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaLocations {
    pub area_id: u64,
    pub area_name: String,
    pub infrastructure: InfrastructureCounts,
    pub locations: FacilityMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaRecommendation {
    #[serde(flatten)]
    pub score: AreaScore,
    pub recommendation: String,
    pub recommendation_source: RecommendationSource,
}

pub struct LocalityService<A, R, F, P, G>
where
    A: AreaRepository,
    R: SnapshotRepository,
    F: CountSource + LocationSource,
    P: ProfileProvider,
    G: TextGenerator,
{
    areas: A,
    cache: InfrastructureCache<R, Arc<F>>,
    fetcher: Arc<F>,
    profiles: P,
    scoring: ScoringEngine,
    recommender: Recommender<G>,
    location_areas: Option<Vec<u64>>,
}

impl<A, R, F, P, G> LocalityService<A, R, F, P, G>
where
    A: AreaRepository,
    R: SnapshotRepository,
    F: CountSource + LocationSource,
    P: ProfileProvider,
    G: TextGenerator,
{
    pub fn new(
        areas: A,
        snapshots: R,
        fetcher: Arc<F>,
        profiles: P,
        recommender: Recommender<G>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            areas,
            cache: InfrastructureCache::new(snapshots, fetcher.clone(), options.ttl),
            fetcher,
            profiles,
            scoring: ScoringEngine::new(options.scoring),
            recommender,
            location_areas: options.location_areas,
        }
    }

    pub async fn list_areas(&self) -> Result<Vec<Area>> {
        self.areas.list_areas().await
    }

    pub async fn area(&self, area_id: u64) -> Result<Area> {
        self.areas
            .get_area(area_id)
            .await?
            .ok_or(LocalityError::AreaNotFound { area_id })
    }

    async fn profile(&self, user_id: Option<&str>) -> Result<Option<LifestyleProfile>> {
        match user_id {
            Some(user_id) => self.profiles.profile_for(user_id).await,
            None => Ok(None),
        }
    }

    pub async fn area_infrastructure(
        &self,
        area_id: u64,
        force_refresh: bool,
    ) -> Result<AreaInfrastructure> {
        let area = self.area(area_id).await?;
        let lookup = self.cache.get_or_refresh(&area, force_refresh).await?;

        Ok(AreaInfrastructure {
            area_id: area.id,
            area_name: area.name,
            snapshot: lookup.snapshot,
            cache_status: lookup.status,
        })
    }

    /// Deduplicated facility positions plus the cached counts for the area.
    pub async fn facility_locations(&self, area_id: u64) -> Result<AreaLocations> {
        let area = self.area(area_id).await?;

        if let Some(allowed) = &self.location_areas {
            if !allowed.contains(&area_id) {
                return Err(LocalityError::LocationsNotAllowed { area_id });
            }
        }

        let locations = self
            .fetcher
            .fetch_locations(area.center, area.radius())
            .await?;
        let lookup = self.cache.get_or_refresh(&area, false).await?;

        tracing::info!(
            "Fetched {} facility locations for {}",
            locations.len(),
            area.name
        );

        Ok(AreaLocations {
            area_id: area.id,
            area_name: area.name,
            infrastructure: lookup.snapshot.counts,
            locations,
        })
    }

    pub async fn area_score(&self, area_id: u64, user_id: Option<&str>) -> Result<AreaScore> {
        let area = self.area(area_id).await?;
        let lookup = self.cache.get_or_refresh(&area, false).await?;
        let profile = self.profile(user_id).await?;

        let breakdown = self.scoring.score(&lookup.snapshot.counts, profile.as_ref());
        tracing::debug!(
            "Scored {} at {} (cache: {:?})",
            area.name,
            breakdown.final_score,
            lookup.status
        );

        Ok(AreaScore {
            area_id: area.id,
            area_name: area.name,
            breakdown,
        })
    }

    /// Scores an arbitrary point. Nothing is cached and upstream errors score as zeros.
    pub async fn score_at(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: i64,
        user_id: Option<&str>,
    ) -> Result<ScoreBreakdown> {
        let center = Coordinate::new(lat, lon)?;
        let radius = Radius::new(radius_meters)?;

        let counts = match self.fetcher.fetch_counts(center, radius).await {
            Ok(fetch) => {
                tracing::debug!("Ad-hoc fetch outcome: {:?}", fetch.outcome);
                fetch.counts
            }
            Err(e) => {
                tracing::warn!("Ad-hoc fetch for ({}, {}) failed: {}", lat, lon, e);
                InfrastructureCounts::default()
            }
        };

        let profile = self.profile(user_id).await?;
        Ok(self.scoring.score(&counts, profile.as_ref()))
    }

    pub async fn recommend(
        &self,
        area_id: u64,
        user_id: Option<&str>,
    ) -> Result<AreaRecommendation> {
        let score = self.area_score(area_id, user_id).await?;
        let recommendation = self
            .recommender
            .recommend(&RecommendationRequest::from_score(&score))
            .await;

        Ok(AreaRecommendation {
            score,
            recommendation: recommendation.text,
            recommendation_source: recommendation.source,
        })
    }
}

impl<A, R, F, P, G> LocalityService<A, R, F, P, G>
where
    A: AreaRepository + 'static,
    R: SnapshotRepository + 'static,
    F: CountSource + LocationSource + 'static,
    P: ProfileProvider + 'static,
    G: TextGenerator + 'static,
{
    /// Scores every known area concurrently, best first. Ties keep area id order.
    pub async fn score_all(self: Arc<Self>, user_id: Option<String>) -> Result<Vec<AreaScore>> {
        let areas = self.list_areas().await?;
        let mut tasks = JoinSet::new();

        for area in areas {
            let service = Arc::clone(&self);
            let user_id = user_id.clone();
            tasks.spawn(async move { service.area_score(area.id, user_id.as_deref()).await });
        }

        let mut scores = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let score = joined.map_err(|e| LocalityError::TaskError {
                message: e.to_string(),
            })??;
            scores.push(score);
        }

        scores.sort_by(|a, b| {
            b.breakdown
                .final_score
                .total_cmp(&a.breakdown.final_score)
                .then(a.area_id.cmp(&b.area_id))
        });
        Ok(scores)
    }
}
