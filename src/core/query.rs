//! Overpass QL query construction for the eight facility categories.

use crate::domain::model::{Coordinate, FacilityCategory, Radius};
use std::fmt::Write;

/// Server-side timeout embedded in the query header, in seconds.
const SERVER_TIMEOUT_SECONDS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// One `out count` block per category.
    Counts,
    /// Per category: a count marker followed by the elements with their centers.
    CountsWithLocations,
}

/// `(element type, tag filter)` pairs unioned into one category block.
fn selectors(category: FacilityCategory) -> &'static [(&'static str, &'static str)] {
    match category {
        FacilityCategory::Hospitals => &[
            ("node", r#"["amenity"="hospital"]"#),
            ("way", r#"["amenity"="hospital"]"#),
            ("node", r#"["amenity"="clinic"]"#),
            ("way", r#"["amenity"="clinic"]"#),
        ],
        FacilityCategory::Schools => &[
            ("node", r#"["amenity"="school"]"#),
            ("way", r#"["amenity"="school"]"#),
        ],
        FacilityCategory::BusStops => &[
            ("node", r#"["highway"="bus_stop"]"#),
            ("node", r#"["public_transport"="platform"]["bus"="yes"]"#),
        ],
        FacilityCategory::MetroStations => &[
            ("node", r#"["station"="subway"]"#),
            ("node", r#"["railway"="station"]"#),
            ("way", r#"["railway"="station"]"#),
        ],
        FacilityCategory::Supermarkets => &[
            ("node", r#"["shop"="supermarket"]"#),
            ("way", r#"["shop"="supermarket"]"#),
        ],
        FacilityCategory::Restaurants => &[
            ("node", r#"["amenity"="restaurant"]"#),
            ("node", r#"["amenity"="fast_food"]"#),
            ("way", r#"["amenity"="restaurant"]"#),
        ],
        FacilityCategory::Gyms => &[
            ("node", r#"["leisure"="fitness_centre"]"#),
            ("way", r#"["leisure"="fitness_centre"]"#),
            ("node", r#"["leisure"="sports_centre"]"#),
            ("way", r#"["leisure"="sports_centre"]"#),
        ],
        FacilityCategory::Bars => &[
            ("node", r#"["amenity"="bar"]"#),
            ("node", r#"["amenity"="pub"]"#),
            ("way", r#"["amenity"="bar"]"#),
            ("way", r#"["amenity"="pub"]"#),
        ],
    }
}

/// Builds the query text. Blocks are emitted in `FacilityCategory::ALL` order,
/// which is what the response parsers rely on.
pub fn build_query(center: Coordinate, radius: Radius, mode: QueryMode) -> String {
    let around = format!("around:{},{},{}", radius.meters(), center.lat, center.lon);
    let mut query = format!("[out:json][timeout:{}];\n", SERVER_TIMEOUT_SECONDS);

    for category in FacilityCategory::ALL {
        query.push_str("(\n");
        for (element, filter) in selectors(category) {
            // Writing to a String cannot fail.
            let _ = writeln!(query, "  {}{}({});", element, filter, around);
        }
        match mode {
            QueryMode::Counts => query.push_str(");\nout count;\n"),
            QueryMode::CountsWithLocations => {
                let set = category.key();
                let _ = writeln!(query, ")->.{set};\n.{set} out count;\n.{set} out center;");
            }
        }
    }

    query.trim_end().to_string()
}
