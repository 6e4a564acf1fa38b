//! Typed view of the Overpass JSON response.

use crate::domain::model::{Coordinate, InfrastructureCounts};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Present on ways and relations requested with `out center`.
    #[serde(default)]
    pub center: Option<Coordinate>,
    #[serde(default)]
    pub tags: serde_json::Map<String, serde_json::Value>,
}

impl Element {
    pub fn is_count(&self) -> bool {
        self.kind == "count"
    }

    /// The element's own position, or its center for extended geometries.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate { lat, lon }),
            _ => self.center,
        }
    }

    pub fn name(&self) -> Option<String> {
        self.tags
            .get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// `tags.total` of a count element. Overpass sends it as a string.
    pub fn count_total(&self) -> u32 {
        match self.tags.get("total") {
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .map(|v| v.min(u32::MAX as u64) as u32)
                .unwrap_or(0),
            _ => 0,
        }
    }
}

/// Reads one total per `out count` block. Missing blocks are zero.
pub fn parse_counts(response: &OverpassResponse) -> InfrastructureCounts {
    let blocks: Vec<u32> = response
        .elements
        .iter()
        .filter(|el| el.is_count())
        .map(Element::count_total)
        .collect();

    if blocks.len() < 8 {
        tracing::debug!("Overpass returned {} count blocks, padding with zeros", blocks.len());
    }

    InfrastructureCounts::from_blocks(&blocks)
}
