//! Splits location-mode responses into categories and drops near-duplicate facilities.

use crate::core::response::Element;
use crate::domain::model::{FacilityCategory, FacilityMap, FacilityRecord};
use std::collections::HashSet;

pub const DEFAULT_MAX_PER_CATEGORY: usize = 50;

const CATEGORY_COUNT: usize = FacilityCategory::ALL.len();

/// Assigns elements to category blocks.
///
/// Each `count` element opens the next block, which is how the location query
/// tags its output. Responses without any count element fall back to eight
/// equal contiguous blocks of `len / 8`, the last one taking the remainder.
pub fn split_blocks(elements: &[Element]) -> Vec<Vec<&Element>> {
    let mut blocks: Vec<Vec<&Element>> = vec![Vec::new(); CATEGORY_COUNT];

    if elements.iter().any(Element::is_count) {
        let mut current: Option<usize> = None;
        for element in elements {
            if element.is_count() {
                current = Some(current.map_or(0, |i| i + 1));
                continue;
            }
            match current {
                Some(i) if i < CATEGORY_COUNT => blocks[i].push(element),
                _ => tracing::debug!("Dropping element outside any category block"),
            }
        }
        return blocks;
    }

    let size = elements.len() / CATEGORY_COUNT;
    for (i, block) in blocks.iter_mut().enumerate() {
        let start = i * size;
        let end = if i + 1 < CATEGORY_COUNT {
            start + size
        } else {
            elements.len()
        };
        block.extend(elements[start..end].iter());
    }
    blocks
}

/// Builds the facility map: at most `max_per_category` elements per block,
/// unresolvable coordinates dropped, then deduplicated.
pub fn collect_facilities(elements: &[Element], max_per_category: usize) -> FacilityMap {
    let mut map = FacilityMap::default();

    for (category, block) in FacilityCategory::ALL.into_iter().zip(split_blocks(elements)) {
        for element in block.into_iter().take(max_per_category) {
            if let Some(coordinate) = element.coordinate() {
                map.push(FacilityRecord {
                    name: element.name(),
                    coordinate,
                    category,
                });
            }
        }
    }

    dedupe(&map)
}

/// Keeps the first record for each rounded coordinate within a category.
pub fn dedupe(map: &FacilityMap) -> FacilityMap {
    let mut out = FacilityMap::default();

    for (_, records) in map.iter() {
        let mut seen = HashSet::new();
        for record in records {
            if seen.insert(record.coordinate.rounded_key()) {
                out.push(record.clone());
            }
        }
    }

    let dropped = map.len() - out.len();
    if dropped > 0 {
        tracing::debug!("Removed {} duplicate facilities", dropped);
    }
    out
}
