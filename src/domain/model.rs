use crate::utils::error::{LocalityError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub const DEFAULT_RADIUS_METERS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(LocalityError::InvalidInput {
                field: "lat".to_string(),
                reason: format!("{} is outside [-90, 90]", lat),
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(LocalityError::InvalidInput {
                field: "lon".to_string(),
                reason: format!("{} is outside [-180, 180]", lon),
            });
        }
        Ok(Self { lat, lon })
    }

    /// Coordinate rounded to 6 decimals (~0.1 m), as integer micro-degrees.
    pub fn rounded_key(&self) -> (i64, i64) {
        (
            (self.lat * 1_000_000.0).round() as i64,
            (self.lon * 1_000_000.0).round() as i64,
        )
    }
}

/// Search radius in meters. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Radius(u32);

impl Radius {
    pub fn new(meters: i64) -> Result<Self> {
        if meters <= 0 || meters > u32::MAX as i64 {
            return Err(LocalityError::InvalidInput {
                field: "radius".to_string(),
                reason: format!("radius must be a positive number of meters, got {}", meters),
            });
        }
        Ok(Self(meters as u32))
    }

    pub fn meters(&self) -> u32 {
        self.0
    }

    pub fn widened_by(&self, meters: u32) -> Self {
        Self(self.0.saturating_add(meters))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
    #[default]
    Circle,
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: u64,
    pub name: String,
    pub center: Coordinate,
    #[serde(default)]
    pub radius_meters: Option<u32>,
    #[serde(default)]
    pub boundary_type: BoundaryType,
    #[serde(default)]
    pub polygon_geojson: Option<String>,
}

impl Area {
    pub fn radius(&self) -> Radius {
        match self.radius_meters {
            Some(meters) if meters > 0 => Radius(meters),
            _ => Radius(DEFAULT_RADIUS_METERS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityCategory {
    Hospitals,
    Schools,
    BusStops,
    MetroStations,
    Supermarkets,
    Restaurants,
    Gyms,
    Bars,
}

impl FacilityCategory {
    /// Upstream block order. Query building and response parsing both rely on it.
    pub const ALL: [FacilityCategory; 8] = [
        FacilityCategory::Hospitals,
        FacilityCategory::Schools,
        FacilityCategory::BusStops,
        FacilityCategory::MetroStations,
        FacilityCategory::Supermarkets,
        FacilityCategory::Restaurants,
        FacilityCategory::Gyms,
        FacilityCategory::Bars,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn key(&self) -> &'static str {
        match self {
            FacilityCategory::Hospitals => "hospitals",
            FacilityCategory::Schools => "schools",
            FacilityCategory::BusStops => "bus_stops",
            FacilityCategory::MetroStations => "metro_stations",
            FacilityCategory::Supermarkets => "supermarkets",
            FacilityCategory::Restaurants => "restaurants",
            FacilityCategory::Gyms => "gyms",
            FacilityCategory::Bars => "bars",
        }
    }
}

/// Facility counts for the eight categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfrastructureCounts {
    pub hospitals: u32,
    pub schools: u32,
    pub bus_stops: u32,
    pub metro_stations: u32,
    pub supermarkets: u32,
    pub restaurants: u32,
    #[serde(default)]
    pub gyms: u32,
    #[serde(default)]
    pub bars: u32,
}

impl InfrastructureCounts {
    /// Builds counts from per-block totals in category order. Missing blocks count as zero.
    pub fn from_blocks(blocks: &[u32]) -> Self {
        let mut counts = Self::default();
        for (category, value) in FacilityCategory::ALL.iter().zip(blocks.iter()) {
            counts.set(*category, *value);
        }
        counts
    }

    pub fn get(&self, category: FacilityCategory) -> u32 {
        match category {
            FacilityCategory::Hospitals => self.hospitals,
            FacilityCategory::Schools => self.schools,
            FacilityCategory::BusStops => self.bus_stops,
            FacilityCategory::MetroStations => self.metro_stations,
            FacilityCategory::Supermarkets => self.supermarkets,
            FacilityCategory::Restaurants => self.restaurants,
            FacilityCategory::Gyms => self.gyms,
            FacilityCategory::Bars => self.bars,
        }
    }

    pub fn set(&mut self, category: FacilityCategory, value: u32) {
        let slot = match category {
            FacilityCategory::Hospitals => &mut self.hospitals,
            FacilityCategory::Schools => &mut self.schools,
            FacilityCategory::BusStops => &mut self.bus_stops,
            FacilityCategory::MetroStations => &mut self.metro_stations,
            FacilityCategory::Supermarkets => &mut self.supermarkets,
            FacilityCategory::Restaurants => &mut self.restaurants,
            FacilityCategory::Gyms => &mut self.gyms,
            FacilityCategory::Bars => &mut self.bars,
        };
        *slot = value;
    }

    pub fn total(&self) -> u64 {
        FacilityCategory::ALL
            .iter()
            .map(|category| self.get(*category) as u64)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Last fetched counts for an area plus the time they were fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureSnapshot {
    #[serde(flatten)]
    pub counts: InfrastructureCounts,
    pub last_updated: DateTime<Utc>,
}

impl InfrastructureSnapshot {
    pub fn new(counts: InfrastructureCounts, last_updated: DateTime<Utc>) -> Self {
        Self {
            counts,
            last_updated,
        }
    }

    pub fn zeroed(now: DateTime<Utc>) -> Self {
        Self::new(InfrastructureCounts::default(), now)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now < self.last_updated + ttl
    }
}

/// How a count-mode fetch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// A well-formed, non-empty response was accepted on `attempt` (1-based).
    Accepted {
        attempt: u32,
        radius_meters: u32,
        endpoint: String,
    },
    /// Every well-formed response was empty.
    AllZero { attempts: u32 },
    /// No attempt produced a well-formed response.
    Failed { attempts: u32, last_error: String },
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountFetch {
    pub counts: InfrastructureCounts,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub name: Option<String>,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(rename = "type")]
    pub category: FacilityCategory,
}

/// Per-category facility lists. Every category is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacilityMap {
    categories: [Vec<FacilityRecord>; 8],
}

impl FacilityMap {
    pub fn get(&self, category: FacilityCategory) -> &[FacilityRecord] {
        &self.categories[category.index()]
    }

    pub fn push(&mut self, record: FacilityRecord) {
        self.categories[record.category.index()].push(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = (FacilityCategory, &[FacilityRecord])> {
        FacilityCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for FacilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FacilityCategory::ALL.len()))?;
        for (category, records) in self.iter() {
            map.serialize_entry(category.key(), records)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentStatus {
    Student,
    #[default]
    Working,
    Unemployed,
}

/// Household facts that shift category weights. Owned by the profile service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifestyleProfile {
    pub marital_status: MaritalStatus,
    pub employment_status: EmploymentStatus,
    pub has_parents: bool,
    pub has_elderly: bool,
    pub has_children: bool,
    pub has_vehicle: bool,
    pub income_range: Option<String>,
}
