//! Lifestyle scoring: raw category scores, normalization, profile-driven
//! weights and the weighted final score.
//!
//! Everything here is pure. The same counts and profile always produce the
//! same breakdown, adjustment trail included.

use crate::domain::model::{
    EmploymentStatus, InfrastructureCounts, LifestyleProfile, MaritalStatus,
};
use crate::domain::score::{
    CategoryScores, CategoryValues, ProfileContext, ScoreBreakdown, ScoreCategory, WeightVector,
};

pub const DEFAULT_WEIGHTS: WeightVector = CategoryValues {
    transport: 0.25,
    healthcare: 0.20,
    education: 0.20,
    lifestyle: 0.20,
    grocery: 0.15,
};

/// Raw score that maps to 100 for each category.
pub const DEFAULT_CAPS: CategoryValues = CategoryValues {
    transport: 100.0,
    healthcare: 80.0,
    education: 60.0,
    lifestyle: 100.0,
    grocery: 40.0,
};

const TRANSPORT_FLOOR: f64 = 0.05;
const NO_PROFILE_NOTE: &str = "Using default weights (no profile)";
const NO_RULE_NOTE: &str = "Profile exists but no specific adjustments triggered";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSettings {
    pub caps: CategoryValues,
    pub base_weights: WeightVector,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            caps: DEFAULT_CAPS,
            base_weights: DEFAULT_WEIGHTS,
        }
    }
}

struct WeightRule {
    applies: fn(&LifestyleProfile) -> bool,
    effects: &'static [(ScoreCategory, f64)],
    /// Lower bound for transport after this rule.
    transport_floor: Option<f64>,
    description: &'static str,
}

/// Applied in this order. Each matching rule adds one trail entry.
const WEIGHT_RULES: &[WeightRule] = &[
    WeightRule {
        applies: |p| p.has_parents,
        effects: &[(ScoreCategory::Healthcare, 0.10)],
        transport_floor: None,
        description: "Living with parents → Healthcare weight increased (+0.10)",
    },
    WeightRule {
        applies: |p| p.has_elderly,
        effects: &[(ScoreCategory::Healthcare, 0.12)],
        transport_floor: None,
        description: "Lives with elderly → Healthcare weight increased (+0.12)",
    },
    WeightRule {
        applies: |p| p.has_children,
        effects: &[(ScoreCategory::Education, 0.10)],
        transport_floor: None,
        description: "Has children → Education weight increased (+0.10)",
    },
    WeightRule {
        applies: |p| p.has_vehicle,
        effects: &[(ScoreCategory::Transport, -0.08)],
        transport_floor: Some(TRANSPORT_FLOOR),
        description: "Has vehicle → Transport weight decreased (-0.08)",
    },
    WeightRule {
        applies: |p| p.employment_status == EmploymentStatus::Working,
        effects: &[(ScoreCategory::Transport, 0.08)],
        transport_floor: None,
        description: "Employed (working) → Transport weight increased (+0.08)",
    },
    WeightRule {
        applies: |p| p.employment_status == EmploymentStatus::Student,
        effects: &[(ScoreCategory::Education, 0.05), (ScoreCategory::Transport, 0.03)],
        transport_floor: None,
        description: "Student → Education weight increased (+0.05), Transport +0.03",
    },
    WeightRule {
        applies: |p| p.marital_status == MaritalStatus::Single,
        effects: &[(ScoreCategory::Lifestyle, 0.08)],
        transport_floor: None,
        description: "Single → Lifestyle weight increased (+0.08)",
    },
    WeightRule {
        applies: |p| p.marital_status == MaritalStatus::Married,
        effects: &[(ScoreCategory::Education, 0.08), (ScoreCategory::Grocery, 0.04)],
        transport_floor: None,
        description: "Married → Education weight increased (+0.08), Grocery +0.04",
    },
];

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Fixed linear combination per category. Gyms and bars do not contribute.
pub fn raw_scores(counts: &InfrastructureCounts) -> CategoryValues {
    CategoryValues {
        transport: 5.0 * counts.metro_stations as f64 + 2.0 * counts.bus_stops as f64,
        healthcare: 4.0 * counts.hospitals as f64,
        education: 3.0 * counts.schools as f64,
        lifestyle: 2.0 * counts.restaurants as f64,
        grocery: 2.0 * counts.supermarkets as f64,
    }
}

/// Scales raw scores to 0-100 against the caps, rounded to 2 decimals.
pub fn normalize(raw: &CategoryValues, caps: &CategoryValues) -> CategoryScores {
    raw.map(|category, value| {
        let cap = caps.get(category);
        if cap <= 0.0 {
            return 0.0;
        }
        round_to((value / cap * 100.0).clamp(0.0, 100.0), 2)
    })
}

/// Weights for a profile plus the trail of adjustments that produced them.
pub fn derive_weights(
    base: &WeightVector,
    profile: Option<&LifestyleProfile>,
) -> (WeightVector, Vec<String>) {
    let Some(profile) = profile else {
        return (*base, vec![NO_PROFILE_NOTE.to_string()]);
    };

    let mut weights = *base;
    let mut adjustments = Vec::new();

    for rule in WEIGHT_RULES.iter().filter(|rule| (rule.applies)(profile)) {
        for (category, delta) in rule.effects {
            *weights.get_mut(*category) += delta;
        }
        if let Some(floor) = rule.transport_floor {
            weights.transport = weights.transport.max(floor);
        }
        adjustments.push(rule.description.to_string());
    }

    if adjustments.is_empty() {
        adjustments.push(NO_RULE_NOTE.to_string());
    }

    let total = weights.sum();
    if total > 0.0 {
        weights = weights.map(|_, w| round_to(w / total, 4));
    }

    (weights, adjustments)
}

pub struct ScoringEngine {
    settings: ScoringSettings,
}

impl ScoringEngine {
    pub fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }

    pub fn score(
        &self,
        counts: &InfrastructureCounts,
        profile: Option<&LifestyleProfile>,
    ) -> ScoreBreakdown {
        let raw = raw_scores(counts);
        let category_scores = normalize(&raw, &self.settings.caps);
        let (weights_used, adjustments) = derive_weights(&self.settings.base_weights, profile);

        let weighted: f64 = ScoreCategory::ALL
            .iter()
            .map(|c| category_scores.get(*c) * weights_used.get(*c))
            .sum();
        let final_score = round_to(weighted.min(100.0), 2);

        let profile_context = profile.map(|p| ProfileContext {
            marital_status: p.marital_status,
            has_parents: p.has_parents,
            employment_status: p.employment_status,
            has_vehicle: p.has_vehicle,
            has_elderly: p.has_elderly,
            has_children: p.has_children,
            income_range: p.income_range.clone(),
            adjustments: adjustments.clone(),
        });

        ScoreBreakdown {
            category_scores,
            weights_used,
            final_score,
            infrastructure: *counts,
            adjustments,
            profile_context,
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FacilityCategory;

    fn scenario_counts() -> InfrastructureCounts {
        InfrastructureCounts {
            metro_stations: 2,
            bus_stops: 10,
            hospitals: 1,
            schools: 3,
            restaurants: 5,
            supermarkets: 2,
            ..InfrastructureCounts::default()
        }
    }

    fn all_profiles() -> Vec<LifestyleProfile> {
        let mut profiles = Vec::new();
        for marital_status in [MaritalStatus::Single, MaritalStatus::Married] {
            for employment_status in [
                EmploymentStatus::Student,
                EmploymentStatus::Working,
                EmploymentStatus::Unemployed,
            ] {
                for flags in 0u8..16 {
                    profiles.push(LifestyleProfile {
                        marital_status,
                        employment_status,
                        has_parents: flags & 1 != 0,
                        has_elderly: flags & 2 != 0,
                        has_children: flags & 4 != 0,
                        has_vehicle: flags & 8 != 0,
                        income_range: None,
                    });
                }
            }
        }
        profiles
    }

    #[test]
    fn test_scenario_without_profile() {
        let breakdown = ScoringEngine::default().score(&scenario_counts(), None);

        let raw = raw_scores(&scenario_counts());
        assert_eq!(raw.transport, 30.0);
        assert_eq!(raw.healthcare, 4.0);
        assert_eq!(raw.education, 9.0);
        assert_eq!(raw.lifestyle, 10.0);
        assert_eq!(raw.grocery, 4.0);

        assert_eq!(breakdown.category_scores.transport, 30.0);
        assert_eq!(breakdown.category_scores.healthcare, 5.0);
        assert_eq!(breakdown.category_scores.education, 15.0);
        assert_eq!(breakdown.category_scores.lifestyle, 10.0);
        assert_eq!(breakdown.category_scores.grocery, 10.0);
        assert_eq!(breakdown.weights_used, DEFAULT_WEIGHTS);
        assert_eq!(breakdown.final_score, 15.0);
        assert_eq!(breakdown.adjustments, vec![NO_PROFILE_NOTE.to_string()]);
        assert!(breakdown.profile_context.is_none());
        assert_eq!(breakdown.infrastructure, scenario_counts());
    }

    #[test]
    fn test_scenario_single_working_with_vehicle() {
        let profile = LifestyleProfile {
            marital_status: MaritalStatus::Single,
            employment_status: EmploymentStatus::Working,
            has_vehicle: true,
            ..LifestyleProfile::default()
        };
        let breakdown = ScoringEngine::default().score(&scenario_counts(), Some(&profile));
        let w = breakdown.weights_used;

        assert_eq!(w.transport, round_to(0.25 / 1.08, 4));
        assert_eq!(w.healthcare, round_to(0.20 / 1.08, 4));
        assert_eq!(w.education, round_to(0.20 / 1.08, 4));
        assert_eq!(w.lifestyle, round_to(0.28 / 1.08, 4));
        assert_eq!(w.grocery, round_to(0.15 / 1.08, 4));
        assert!((breakdown.final_score - 14.63).abs() < 0.011);

        let context = breakdown.profile_context.unwrap();
        assert_eq!(
            context.adjustments,
            vec![
                "Has vehicle → Transport weight decreased (-0.08)".to_string(),
                "Employed (working) → Transport weight increased (+0.08)".to_string(),
                "Single → Lifestyle weight increased (+0.08)".to_string(),
            ]
        );
        assert!(context.has_vehicle);
    }

    #[test]
    fn test_all_zero_snapshot_scores_zero() {
        let engine = ScoringEngine::default();
        for profile in all_profiles().iter().take(10) {
            let breakdown = engine.score(&InfrastructureCounts::default(), Some(profile));
            assert_eq!(breakdown.final_score, 0.0);
        }
    }

    #[test]
    fn test_category_scores_are_bounded() {
        let engine = ScoringEngine::default();
        for value in [0u32, 1, 7, 20, 50, 1_000, u32::MAX] {
            let counts = InfrastructureCounts {
                hospitals: value,
                schools: value,
                bus_stops: value,
                metro_stations: value,
                supermarkets: value,
                restaurants: value,
                gyms: value,
                bars: value,
            };
            let breakdown = engine.score(&counts, None);
            for category in ScoreCategory::ALL {
                let score = breakdown.category_scores.get(category);
                assert!((0.0..=100.0).contains(&score), "{:?} = {}", category, score);
            }
            assert!(breakdown.final_score <= 100.0);
        }
    }

    #[test]
    fn test_weights_sum_to_one_for_every_profile() {
        for profile in all_profiles() {
            let (weights, adjustments) = derive_weights(&DEFAULT_WEIGHTS, Some(&profile));
            assert!((weights.sum() - 1.0).abs() < 1e-3, "{:?}", profile);
            for category in ScoreCategory::ALL {
                assert!(weights.get(category) >= 0.0);
            }
            assert!(!adjustments.is_empty());
        }
    }

    #[test]
    fn test_unemployed_single_only_triggers_lifestyle_rule() {
        let profile = LifestyleProfile {
            employment_status: EmploymentStatus::Unemployed,
            ..LifestyleProfile::default()
        };
        let (weights, adjustments) = derive_weights(&DEFAULT_WEIGHTS, Some(&profile));
        assert_eq!(
            adjustments,
            vec!["Single → Lifestyle weight increased (+0.08)".to_string()]
        );
        assert_eq!(weights.lifestyle, round_to(0.28 / 1.08, 4));
    }

    #[test]
    fn test_transport_floor_applies_when_decrement_would_go_negative() {
        let base = CategoryValues {
            transport: 0.02,
            healthcare: 0.30,
            education: 0.28,
            lifestyle: 0.25,
            grocery: 0.15,
        };
        let profile = LifestyleProfile {
            marital_status: MaritalStatus::Married,
            employment_status: EmploymentStatus::Unemployed,
            has_vehicle: true,
            ..LifestyleProfile::default()
        };

        let (weights, _) = derive_weights(&base, Some(&profile));
        // 0.02 - 0.08 floors to 0.05; married adds 0.12 elsewhere.
        let total = 0.05 + 0.30 + 0.36 + 0.25 + 0.19;
        assert_eq!(weights.transport, round_to(0.05 / total, 4));
        assert!(weights.transport > 0.0);
        assert!((weights.sum() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_rule_order_does_not_change_net_effect_above_floor() {
        let profile = LifestyleProfile {
            marital_status: MaritalStatus::Married,
            employment_status: EmploymentStatus::Student,
            has_parents: true,
            has_elderly: true,
            has_children: true,
            has_vehicle: true,
            income_range: Some("10-20L".to_string()),
        };
        let (weights, _) = derive_weights(&DEFAULT_WEIGHTS, Some(&profile));

        let mut reversed = DEFAULT_WEIGHTS;
        for rule in WEIGHT_RULES.iter().rev().filter(|r| (r.applies)(&profile)) {
            for (category, delta) in rule.effects {
                *reversed.get_mut(*category) += delta;
            }
        }
        let total = reversed.sum();
        let reversed = reversed.map(|_, w| round_to(w / total, 4));
        assert_eq!(weights, reversed);
    }

    #[test]
    fn test_final_score_is_monotonic_in_each_count() {
        let engine = ScoringEngine::default();
        let profile = LifestyleProfile::default();
        for category in FacilityCategory::ALL {
            let mut counts = scenario_counts();
            let mut previous = f64::MIN;
            for value in 0..60 {
                counts.set(category, value);
                let score = engine.score(&counts, Some(&profile)).final_score;
                assert!(score >= previous, "{:?} at {}", category, value);
                previous = score;
            }
        }
    }

    #[test]
    fn test_score_is_reproducible() {
        let engine = ScoringEngine::default();
        let profile = LifestyleProfile {
            has_children: true,
            has_elderly: true,
            ..LifestyleProfile::default()
        };
        let a = serde_json::to_string(&engine.score(&scenario_counts(), Some(&profile))).unwrap();
        let b = serde_json::to_string(&engine.score(&scenario_counts(), Some(&profile))).unwrap();
        assert_eq!(a, b);
    }
}
