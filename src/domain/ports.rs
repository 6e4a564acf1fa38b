use crate::domain::model::{
    Area, Coordinate, CountFetch, FacilityMap, InfrastructureSnapshot, LifestyleProfile, Radius,
};
use crate::domain::score::RecommendationRequest;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence for cached snapshots, keyed by area id.
pub trait SnapshotRepository: Send + Sync {
    fn get(
        &self,
        area_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<InfrastructureSnapshot>>> + Send;

    fn upsert(
        &self,
        area_id: u64,
        snapshot: &InfrastructureSnapshot,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Inserts a snapshot for an area that has none. Fails if one already exists.
    fn create(
        &self,
        area_id: u64,
        snapshot: &InfrastructureSnapshot,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait AreaRepository: Send + Sync {
    fn get_area(&self, area_id: u64) -> impl std::future::Future<Output = Result<Option<Area>>> + Send;
    fn list_areas(&self) -> impl std::future::Future<Output = Result<Vec<Area>>> + Send;
}

pub trait ProfileProvider: Send + Sync {
    fn profile_for(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<LifestyleProfile>>> + Send;
}

/// Anything that can produce facility counts around a point.
#[async_trait]
pub trait CountSource: Send + Sync {
    async fn fetch_counts(&self, center: Coordinate, radius: Radius) -> Result<CountFetch>;
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn fetch_locations(&self, center: Coordinate, radius: Radius) -> Result<FacilityMap>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &RecommendationRequest) -> Result<String>;
}

// Shared handles: the service and the cache hold the same fetcher and store.

impl<T: SnapshotRepository> SnapshotRepository for Arc<T> {
    fn get(
        &self,
        area_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<InfrastructureSnapshot>>> + Send {
        (**self).get(area_id)
    }

    fn upsert(
        &self,
        area_id: u64,
        snapshot: &InfrastructureSnapshot,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        (**self).upsert(area_id, snapshot)
    }

    fn create(
        &self,
        area_id: u64,
        snapshot: &InfrastructureSnapshot,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        (**self).create(area_id, snapshot)
    }
}

impl<T: AreaRepository> AreaRepository for Arc<T> {
    fn get_area(&self, area_id: u64) -> impl std::future::Future<Output = Result<Option<Area>>> + Send {
        (**self).get_area(area_id)
    }

    fn list_areas(&self) -> impl std::future::Future<Output = Result<Vec<Area>>> + Send {
        (**self).list_areas()
    }
}

#[async_trait]
impl<T: CountSource + ?Sized> CountSource for Arc<T> {
    async fn fetch_counts(&self, center: Coordinate, radius: Radius) -> Result<CountFetch> {
        (**self).fetch_counts(center, radius).await
    }
}

#[async_trait]
impl<T: LocationSource + ?Sized> LocationSource for Arc<T> {
    async fn fetch_locations(&self, center: Coordinate, radius: Radius) -> Result<FacilityMap> {
        (**self).fetch_locations(center, radius).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, request: &RecommendationRequest) -> Result<String> {
        (**self).generate(request).await
    }
}
