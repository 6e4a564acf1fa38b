use crate::domain::model::{Area, InfrastructureSnapshot};
use crate::domain::ports::{CountSource, SnapshotRepository};
use crate::utils::error::{LocalityError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const DEFAULT_TTL_HOURS: i64 = 24;

/// How a snapshot was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Stored snapshot within TTL, returned without an upstream call.
    Hit,
    /// Fetched from upstream and written back.
    Refreshed,
    /// Upstream failed; the stored (stale) snapshot was returned unchanged.
    StaleFallback,
    /// Upstream failed and nothing was stored; an all-zero snapshot was created.
    ZeroFilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheLookup {
    pub snapshot: InfrastructureSnapshot,
    pub status: CacheStatus,
}

/// Area-keyed snapshot cache in front of a count source.
///
/// Reads and the optional refresh are not atomic per area. Two concurrent
/// refreshes of the same stale area both fetch and the last write wins.
pub struct InfrastructureCache<R: SnapshotRepository, S: CountSource> {
    repository: R,
    source: S,
    ttl: Duration,
}

impl<R: SnapshotRepository, S: CountSource> InfrastructureCache<R, S> {
    pub fn new(repository: R, source: S, ttl: Duration) -> Self {
        Self {
            repository,
            source,
            ttl,
        }
    }

    pub async fn get_or_refresh(&self, area: &Area, force_refresh: bool) -> Result<CacheLookup> {
        self.get_or_refresh_at(area, force_refresh, Utc::now()).await
    }

    /// Same as [`get_or_refresh`](Self::get_or_refresh) with an explicit clock reading.
    pub async fn get_or_refresh_at(
        &self,
        area: &Area,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<CacheLookup> {
        let existing = self.repository.get(area.id).await?;

        if let Some(snapshot) = existing {
            if !force_refresh && snapshot.is_fresh(now, self.ttl) {
                tracing::info!("Using cached infrastructure data for {}", area.name);
                return Ok(CacheLookup {
                    snapshot,
                    status: CacheStatus::Hit,
                });
            }
        }

        let fetched = match self.source.fetch_counts(area.center, area.radius()).await {
            Ok(fetch) if !fetch.outcome.is_failure() => Some(fetch.counts),
            Ok(fetch) => {
                tracing::error!("Overpass unavailable for {}: {:?}", area.name, fetch.outcome);
                None
            }
            Err(e) => {
                tracing::error!("Overpass API error for {}: {}", area.name, e);
                None
            }
        };

        match (fetched, existing) {
            (Some(counts), _) => {
                let snapshot = InfrastructureSnapshot::new(counts, now);
                self.repository.upsert(area.id, &snapshot).await?;
                tracing::debug!("Stored fresh infrastructure snapshot for {}", area.name);
                Ok(CacheLookup {
                    snapshot,
                    status: CacheStatus::Refreshed,
                })
            }
            (None, Some(snapshot)) => {
                tracing::warn!("Returning stale cache for {}", area.name);
                Ok(CacheLookup {
                    snapshot,
                    status: CacheStatus::StaleFallback,
                })
            }
            (None, None) => self.zero_fill(area, now).await,
        }
    }

    async fn zero_fill(&self, area: &Area, now: DateTime<Utc>) -> Result<CacheLookup> {
        let snapshot = InfrastructureSnapshot::zeroed(now);
        tracing::warn!("No infrastructure data for {}, storing zero counts", area.name);

        match self.repository.create(area.id, &snapshot).await {
            Ok(()) => Ok(CacheLookup {
                snapshot,
                status: CacheStatus::ZeroFilled,
            }),
            // A concurrent refresh stored counts first.
            Err(e @ LocalityError::SnapshotExists { .. }) => {
                match self.repository.get(area.id).await? {
                    Some(current) => Ok(CacheLookup {
                        snapshot: current,
                        status: CacheStatus::Refreshed,
                    }),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
