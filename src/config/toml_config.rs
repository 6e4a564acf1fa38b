use crate::adapters::gemini::DEFAULT_GEMINI_ENDPOINT;
use crate::core::cache::DEFAULT_TTL_HOURS;
use crate::core::dedup::DEFAULT_MAX_PER_CATEGORY;
use crate::core::endpoints::{EndpointPool, DEFAULT_ENDPOINTS};
use crate::core::fetcher::FetchSettings;
use crate::core::scoring::{ScoringSettings, DEFAULT_CAPS, DEFAULT_WEIGHTS};
use crate::core::service::ServiceOptions;
use crate::domain::model::{Area, BoundaryType, Coordinate, LifestyleProfile};
use crate::domain::score::{CategoryValues, ScoreCategory};
use crate::utils::error::{LocalityError, Result};
use crate::utils::validation::{
    validate_http_url, validate_non_empty_string, validate_positive_number, validate_range,
    validate_snapshot_path, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

/// Ten years. Longer TTLs are clamped.
const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub recommend: RecommendConfig,
    pub locations: LocationsConfig,
    pub areas: Vec<Area>,
    pub profiles: HashMap<String, LifestyleProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub endpoints: Vec<String>,
    pub max_attempts: u32,
    pub radius_step_meters: u32,
    pub count_timeout_seconds: u64,
    pub location_timeout_seconds: u64,
    pub retry_delay_millis: u64,
    pub max_per_category: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_hours: u64,
    /// JSON file for snapshots. Snapshots stay in memory when unset.
    pub store_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub caps: CategoryValues,
    pub weights: CategoryValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationsConfig {
    /// Areas whose facility maps may be requested. Unset allows every area.
    pub allowed_area_ids: Option<Vec<u64>>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            max_attempts: 3,
            radius_step_meters: 500,
            count_timeout_seconds: 30,
            location_timeout_seconds: 90,
            retry_delay_millis: 0,
            max_per_category: DEFAULT_MAX_PER_CATEGORY,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_TTL_HOURS as u64,
            store_path: None,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            caps: DEFAULT_CAPS,
            weights: DEFAULT_WEIGHTS,
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            scoring: ScoringConfig::default(),
            recommend: RecommendConfig::default(),
            locations: LocationsConfig::default(),
            areas: seed_areas(),
            profiles: HashMap::new(),
        }
    }
}

/// Hyderabad localities available out of the box.
pub fn seed_areas() -> Vec<Area> {
    const SEEDS: [(&str, f64, f64, u32); 6] = [
        ("Gachibowli", 17.4401, 78.3489, 2500),
        ("Madhapur", 17.4483, 78.3915, 2000),
        ("Hitech City", 17.4435, 78.3772, 2000),
        ("Kukatpally", 17.4849, 78.3942, 3000),
        ("Kondapur", 17.4600, 78.3548, 2200),
        ("LB Nagar", 17.3457, 78.5522, 2500),
    ];

    SEEDS
        .iter()
        .zip(1u64..)
        .map(|(&(name, lat, lon, radius), id)| Area {
            id,
            name: name.to_string(),
            center: Coordinate { lat, lon },
            radius_meters: Some(radius),
            boundary_type: BoundaryType::Circle,
            polygon_geojson: None,
        })
        .collect()
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LocalityError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` if it exists, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LocalityError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LocalityError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            max_attempts: self.upstream.max_attempts,
            radius_step_meters: self.upstream.radius_step_meters,
            count_timeout: Duration::from_secs(self.upstream.count_timeout_seconds),
            location_timeout: Duration::from_secs(self.upstream.location_timeout_seconds),
            retry_delay: Duration::from_millis(self.upstream.retry_delay_millis),
            max_per_category: self.upstream.max_per_category,
        }
    }

    pub fn endpoint_pool(&self) -> Result<EndpointPool> {
        EndpointPool::new(self.upstream.endpoints.clone())
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache.ttl_hours.min(MAX_TTL_HOURS) as i64)
    }

    pub fn scoring_settings(&self) -> ScoringSettings {
        ScoringSettings {
            caps: self.scoring.caps,
            base_weights: self.scoring.weights,
        }
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            ttl: self.cache_ttl(),
            scoring: self.scoring_settings(),
            location_areas: self.locations.allowed_area_ids.clone(),
        }
    }

    /// API key for text generation, if enabled and actually set.
    pub fn recommend_api_key(&self) -> Option<&str> {
        if !self.recommend.enabled {
            return None;
        }
        self.recommend
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
    }

    fn validate_upstream(&self) -> Result<()> {
        if self.upstream.endpoints.is_empty() {
            return Err(LocalityError::ConfigValidationError {
                field: "upstream.endpoints".to_string(),
                message: "at least one endpoint is required".to_string(),
            });
        }
        for endpoint in &self.upstream.endpoints {
            validate_http_url("upstream.endpoints", endpoint)?;
        }
        validate_positive_number("upstream.max_attempts", self.upstream.max_attempts as u64, 1)?;
        validate_positive_number(
            "upstream.count_timeout_seconds",
            self.upstream.count_timeout_seconds,
            1,
        )?;
        validate_positive_number(
            "upstream.location_timeout_seconds",
            self.upstream.location_timeout_seconds,
            1,
        )?;
        validate_positive_number(
            "upstream.max_per_category",
            self.upstream.max_per_category as u64,
            1,
        )?;
        Ok(())
    }

    fn validate_scoring(&self) -> Result<()> {
        for category in ScoreCategory::ALL {
            let cap = self.scoring.caps.get(category);
            if !(cap > 0.0) {
                return Err(LocalityError::InvalidConfigValueError {
                    field: format!("scoring.caps.{}", category.key()),
                    value: cap.to_string(),
                    reason: "Cap must be greater than zero".to_string(),
                });
            }
            validate_range(
                &format!("scoring.weights.{}", category.key()),
                self.scoring.weights.get(category),
                0.0,
                1.0,
            )?;
        }

        let total = self.scoring.weights.sum();
        if (total - 1.0).abs() > 1e-3 {
            return Err(LocalityError::InvalidConfigValueError {
                field: "scoring.weights".to_string(),
                value: total.to_string(),
                reason: "Weights must sum to 1.0".to_string(),
            });
        }
        Ok(())
    }

    fn validate_areas(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for area in &self.areas {
            if !seen.insert(area.id) {
                return Err(LocalityError::InvalidConfigValueError {
                    field: "areas.id".to_string(),
                    value: area.id.to_string(),
                    reason: "Area ids must be unique".to_string(),
                });
            }
            validate_non_empty_string("areas.name", &area.name)?;
            validate_range("areas.center.lat", area.center.lat, -90.0, 90.0)?;
            validate_range("areas.center.lon", area.center.lon, -180.0, 180.0)?;
            if let Some(radius) = area.radius_meters {
                validate_positive_number("areas.radius_meters", radius as u64, 1)?;
            }
        }
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_upstream()?;

        validate_range("cache.ttl_hours", self.cache.ttl_hours, 1, MAX_TTL_HOURS)?;
        if let Some(path) = &self.cache.store_path {
            validate_snapshot_path("cache.store_path", path)?;
        }

        self.validate_scoring()?;
        self.validate_areas()?;

        if self.recommend.enabled {
            validate_http_url("recommend.endpoint", &self.recommend.endpoint)?;
            if self.recommend_api_key().is_none() {
                tracing::warn!("Recommendations enabled without an API key; fallback text will be used");
            }
        }

        Ok(())
    }
}
