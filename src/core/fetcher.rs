use crate::core::dedup::{collect_facilities, DEFAULT_MAX_PER_CATEGORY};
use crate::core::endpoints::EndpointPool;
use crate::core::query::{build_query, QueryMode};
use crate::core::response::{parse_counts, OverpassResponse};
use crate::domain::model::{
    Coordinate, CountFetch, FacilityMap, FetchOutcome, InfrastructureCounts, Radius,
};
use crate::domain::ports::{CountSource, LocationSource};
use crate::utils::error::{LocalityError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Retry budget and timeouts for upstream calls.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub max_attempts: u32,
    /// Added to the radius for every count attempt after the first.
    pub radius_step_meters: u32,
    pub count_timeout: Duration,
    pub location_timeout: Duration,
    pub retry_delay: Duration,
    pub max_per_category: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            radius_step_meters: 500,
            count_timeout: Duration::from_secs(30),
            location_timeout: Duration::from_secs(90),
            retry_delay: Duration::ZERO,
            max_per_category: DEFAULT_MAX_PER_CATEGORY,
        }
    }
}

/// Queries an Overpass endpoint pool with retry, endpoint rotation and,
/// for counts, radius escalation.
pub struct OverpassFetcher {
    client: Client,
    pool: EndpointPool,
    settings: FetchSettings,
}

impl OverpassFetcher {
    pub fn new(pool: EndpointPool, settings: FetchSettings) -> Self {
        Self::with_client(Client::new(), pool, settings)
    }

    pub fn with_client(client: Client, pool: EndpointPool, settings: FetchSettings) -> Self {
        Self {
            client,
            pool,
            settings,
        }
    }

    fn attempts(&self) -> u32 {
        self.settings.max_attempts.max(1)
    }

    async fn post_query(
        &self,
        endpoint: &str,
        query: &str,
        timeout: Duration,
    ) -> Result<OverpassResponse> {
        let response = self
            .client
            .post(endpoint)
            .form(&[("data", query)])
            .timeout(timeout)
            .send()
            .await?;

        tracing::debug!("Overpass response status from {}: {}", endpoint, response.status());

        let response = response.error_for_status()?;
        Ok(response.json::<OverpassResponse>().await?)
    }

    async fn pause_before(&self, attempt: u32) {
        if attempt > 0 && !self.settings.retry_delay.is_zero() {
            tokio::time::sleep(self.settings.retry_delay).await;
        }
    }
}

#[async_trait]
impl CountSource for OverpassFetcher {
    /// Never fails: exhausted retries degrade to the best result seen, which
    /// may be all zeros. The outcome says which case happened.
    async fn fetch_counts(&self, center: Coordinate, radius: Radius) -> Result<CountFetch> {
        let attempts = self.attempts();
        tracing::info!(
            "Fetching Overpass counts for ({}, {}) radius={}m",
            center.lat,
            center.lon,
            radius.meters()
        );

        let mut best: Option<InfrastructureCounts> = None;
        let mut well_formed = 0u32;
        let mut last_error: Option<String> = None;

        for attempt in 0..attempts {
            self.pause_before(attempt).await;

            let endpoint = self.pool.for_attempt(attempt);
            let current_radius =
                radius.widened_by(attempt.saturating_mul(self.settings.radius_step_meters));
            let query = build_query(center, current_radius, QueryMode::Counts);

            match self
                .post_query(endpoint, &query, self.settings.count_timeout)
                .await
            {
                Ok(response) => {
                    let counts = parse_counts(&response);
                    if !counts.is_empty() {
                        tracing::info!(
                            "Overpass counts (attempt {}, radius={}m): {:?}",
                            attempt + 1,
                            current_radius.meters(),
                            counts
                        );
                        return Ok(CountFetch {
                            counts,
                            outcome: FetchOutcome::Accepted {
                                attempt: attempt + 1,
                                radius_meters: current_radius.meters(),
                                endpoint: endpoint.to_string(),
                            },
                        });
                    }

                    well_formed += 1;
                    best = Some(counts);
                    tracing::warn!(
                        "Overpass returned all zeros (attempt {}/{}, radius={}m, endpoint={}). Retrying...",
                        attempt + 1,
                        attempts,
                        current_radius.meters(),
                        endpoint
                    );
                }
                Err(e) => {
                    tracing::warn!("Overpass attempt {} failed ({}): {}", attempt + 1, endpoint, e);
                    last_error = Some(e.to_string());
                    best.get_or_insert_with(InfrastructureCounts::default);
                }
            }
        }

        tracing::error!(
            "All {} Overpass attempts returned zeros/failed for ({}, {})",
            attempts,
            center.lat,
            center.lon
        );

        let outcome = if well_formed > 0 {
            FetchOutcome::AllZero { attempts }
        } else {
            FetchOutcome::Failed {
                attempts,
                last_error: last_error.unwrap_or_else(|| "no attempt was made".to_string()),
            }
        };

        Ok(CountFetch {
            counts: best.unwrap_or_default(),
            outcome,
        })
    }
}

#[async_trait]
impl LocationSource for OverpassFetcher {
    /// Same rotation as counts but at the requested radius only. Exhausting the
    /// budget is an error: there is no safe default for a facility map.
    async fn fetch_locations(&self, center: Coordinate, radius: Radius) -> Result<FacilityMap> {
        let attempts = self.attempts();
        let query = build_query(center, radius, QueryMode::CountsWithLocations);
        let mut last_error: Option<LocalityError> = None;

        for attempt in 0..attempts {
            self.pause_before(attempt).await;

            let endpoint = self.pool.for_attempt(attempt);
            match self
                .post_query(endpoint, &query, self.settings.location_timeout)
                .await
            {
                Ok(response) => {
                    let map = collect_facilities(&response.elements, self.settings.max_per_category);
                    tracing::info!(
                        "Fetched {} facility locations (attempt {}, endpoint={})",
                        map.len(),
                        attempt + 1,
                        endpoint
                    );
                    return Ok(map);
                }
                Err(e) => {
                    tracing::warn!(
                        "Overpass location attempt {} failed ({}): {}",
                        attempt + 1,
                        endpoint,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(LocalityError::UpstreamError {
            attempts,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
        })
    }
}
