//! Short plain-text recommendations for a scored locality.

use crate::domain::model::{EmploymentStatus, FacilityCategory, MaritalStatus};
use crate::domain::ports::TextGenerator;
use crate::domain::score::{RecommendationRequest, ScoreCategory};
use serde::Serialize;

const SYSTEM_INSTRUCTION: &str = "You are a concise lifestyle advisor for people considering \
localities in a city. Given locality score data and the user's personal profile, write \
EXACTLY 2-3 short sentences recommending whether this locality suits the person. Be specific \
about strengths and weaknesses based on the numbers provided. Do NOT use bullet points, \
markdown, bold, italics, headings, or asterisks. Keep the tone friendly and direct. If the \
user profile is missing or incomplete, give a general recommendation based on the scores alone.";

/// Category score below which a profile caveat is added.
const CAVEAT_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub text: String,
    pub source: RecommendationSource,
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the generation prompt. Same request, same prompt.
pub fn build_prompt(request: &RecommendationRequest) -> String {
    let profile_section = match &request.profile {
        Some(profile) => {
            let mut lines = vec![
                format!(
                    "Marital status: {}",
                    match profile.marital_status {
                        MaritalStatus::Single => "single",
                        MaritalStatus::Married => "married",
                    }
                ),
                format!(
                    "Employment: {}",
                    match profile.employment_status {
                        EmploymentStatus::Student => "student",
                        EmploymentStatus::Working => "working",
                        EmploymentStatus::Unemployed => "unemployed",
                    }
                ),
            ];
            if let Some(income) = &profile.income_range {
                lines.push(format!("Income range: {}", income));
            }
            lines.push(format!("Has vehicle: {}", yes_no(profile.has_vehicle)));
            lines.push(format!("Has elderly dependents: {}", yes_no(profile.has_elderly)));
            lines.push(format!("Has children: {}", yes_no(profile.has_children)));
            lines.push(format!("Living with parents: {}", yes_no(profile.has_parents)));
            lines.join("; ")
        }
        None => "No profile data available.".to_string(),
    };

    let infra_section = FacilityCategory::ALL
        .iter()
        .map(|c| format!("{}: {}", title_case(c.key()), request.infrastructure.get(*c)))
        .collect::<Vec<_>>()
        .join(", ");

    let scores_section = ScoreCategory::ALL
        .iter()
        .map(|c| format!("{}: {:?}/100", c.label(), request.category_scores.get(*c)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{SYSTEM_INSTRUCTION}\n\n\
         Locality: {}\n\
         Overall Lifestyle Score: {:?}/100\n\
         Category Scores: {}\n\
         Nearby Infrastructure: {}\n\
         User Profile: {}\n\n\
         Write your 2-3 sentence recommendation now (plain text only):",
        request.locality_name, request.final_score, scores_section, infra_section, profile_section
    )
}

fn tier(final_score: f64) -> &'static str {
    if final_score >= 75.0 {
        "a strong choice"
    } else if final_score >= 55.0 {
        "a decent option"
    } else if final_score >= 35.0 {
        "a below-average option"
    } else {
        "not well-suited"
    }
}

/// Deterministic recommendation built only from the numbers in the request.
pub fn fallback_recommendation(request: &RecommendationRequest) -> String {
    let scores = &request.category_scores;
    let mut parts = vec![format!(
        "{} scores {:?}/100 overall, making it {} for your lifestyle needs.",
        request.locality_name,
        request.final_score,
        tier(request.final_score)
    )];

    let best = scores.best();
    let worst = scores.worst();
    // Scores are shown as whole numbers, truncated.
    let best_score = scores.get(best) as i64;
    let worst_score = scores.get(worst) as i64;
    if best != worst {
        parts.push(format!(
            "Its strongest area is {} ({}/100) while {} ({}/100) could use improvement.",
            best.label(),
            best_score,
            worst.label(),
            worst_score
        ));
    } else {
        parts.push(format!(
            "It performs best in {} ({}/100).",
            best.label(),
            best_score
        ));
    }

    if let Some(profile) = &request.profile {
        if profile.has_elderly && scores.healthcare < CAVEAT_THRESHOLD {
            parts.push(
                "Healthcare access may be a concern for elderly family members.".to_string(),
            );
        } else if profile.has_children && scores.education < CAVEAT_THRESHOLD {
            parts.push(
                "Educational facilities are limited, which matters for families with children."
                    .to_string(),
            );
        } else if !profile.has_vehicle && scores.transport < CAVEAT_THRESHOLD {
            parts.push(
                "Public transport is limited, so consider this if you don't own a vehicle."
                    .to_string(),
            );
        }
    }

    parts.join(" ")
}

/// Wraps an optional text generator. Generation never fails from the caller's view.
pub struct Recommender<G: TextGenerator> {
    generator: Option<G>,
}

impl<G: TextGenerator> Recommender<G> {
    pub fn new(generator: Option<G>) -> Self {
        Self { generator }
    }

    pub fn fallback_only() -> Self {
        Self { generator: None }
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> Recommendation {
        let Some(generator) = &self.generator else {
            return Recommendation {
                text: fallback_recommendation(request),
                source: RecommendationSource::Fallback,
            };
        };

        match generator.generate(request).await {
            Ok(text) if !text.trim().is_empty() => Recommendation {
                text: text.trim().to_string(),
                source: RecommendationSource::Generated,
            },
            Ok(_) => {
                tracing::warn!("Text generator returned empty text. Using fallback.");
                Recommendation {
                    text: fallback_recommendation(request),
                    source: RecommendationSource::Fallback,
                }
            }
            Err(e) => {
                tracing::warn!("Text generator failed: {}. Using fallback.", e);
                Recommendation {
                    text: fallback_recommendation(request),
                    source: RecommendationSource::Fallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::InfrastructureCounts;
    use crate::domain::score::{CategoryScores, ProfileContext};
    use crate::utils::error::{LocalityError, Result};
    use async_trait::async_trait;

    fn request(final_score: f64, scores: CategoryScores) -> RecommendationRequest {
        RecommendationRequest {
            locality_name: "Kondapur".to_string(),
            final_score,
            category_scores: scores,
            infrastructure: InfrastructureCounts::default(),
            profile: None,
        }
    }

    fn profile() -> ProfileContext {
        ProfileContext {
            marital_status: MaritalStatus::Married,
            has_parents: false,
            employment_status: EmploymentStatus::Working,
            has_vehicle: true,
            has_elderly: false,
            has_children: false,
            income_range: None,
            adjustments: Vec::new(),
        }
    }

    fn mixed_scores() -> CategoryScores {
        CategoryScores {
            transport: 30.0,
            healthcare: 5.0,
            education: 15.0,
            lifestyle: 10.0,
            grocery: 10.0,
        }
    }

    #[test]
    fn test_fallback_tiers() {
        let scores = mixed_scores();
        assert!(fallback_recommendation(&request(80.0, scores)).contains("a strong choice"));
        assert!(fallback_recommendation(&request(75.0, scores)).contains("a strong choice"));
        assert!(fallback_recommendation(&request(55.0, scores)).contains("a decent option"));
        assert!(fallback_recommendation(&request(35.0, scores)).contains("a below-average option"));
        assert!(fallback_recommendation(&request(15.0, scores)).contains("not well-suited"));
    }

    #[test]
    fn test_fallback_names_best_and_worst() {
        let text = fallback_recommendation(&request(15.0, mixed_scores()));
        assert_eq!(
            text,
            "Kondapur scores 15.0/100 overall, making it not well-suited for your lifestyle needs. \
             Its strongest area is Transport (30/100) while Healthcare (5/100) could use improvement."
        );
    }

    #[test]
    fn test_all_zero_uses_single_category_branch() {
        let text = fallback_recommendation(&request(0.0, CategoryScores::default()));
        assert!(text.contains("It performs best in Transport (0/100)."));
        assert!(!text.contains("could use improvement"));
    }

    #[test]
    fn test_only_first_matching_caveat_is_added() {
        let mut req = request(10.0, CategoryScores::default());
        req.profile = Some(ProfileContext {
            has_elderly: true,
            has_children: true,
            has_vehicle: false,
            ..profile()
        });

        let text = fallback_recommendation(&req);
        assert!(text.contains("elderly family members"));
        assert!(!text.contains("families with children"));
        assert!(!text.contains("own a vehicle"));
    }

    #[test]
    fn test_vehicle_caveat_when_nothing_else_matches() {
        let mut req = request(10.0, CategoryScores::default());
        req.profile = Some(ProfileContext {
            has_vehicle: false,
            ..profile()
        });
        assert!(fallback_recommendation(&req).ends_with("if you don't own a vehicle."));

        req.profile = Some(profile());
        assert!(!fallback_recommendation(&req).contains("vehicle"));
    }

    #[test]
    fn test_prompt_contains_scores_and_profile() {
        let mut req = request(42.5, mixed_scores());
        req.infrastructure.bus_stops = 12;
        let prompt = build_prompt(&req);
        assert!(prompt.contains("Locality: Kondapur"));
        assert!(prompt.contains("Overall Lifestyle Score: 42.5/100"));
        assert!(prompt.contains("Transport: 30.0/100"));
        assert!(prompt.contains("Bus Stops: 12"));
        assert!(prompt.contains("User Profile: No profile data available."));

        req.profile = Some(profile());
        let prompt = build_prompt(&req);
        assert!(prompt.contains("Marital status: married; Employment: working"));
        assert!(prompt.contains("Has vehicle: Yes"));
    }

    struct FixedGenerator(Result<String>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _request: &RecommendationRequest) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(LocalityError::GenerationError {
                    message: e.to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_recommender_prefers_generated_text() {
        let recommender = Recommender::new(Some(FixedGenerator(Ok(
            "  Kondapur suits a working couple.  ".to_string(),
        ))));
        let rec = recommender.recommend(&request(60.0, mixed_scores())).await;
        assert_eq!(rec.source, RecommendationSource::Generated);
        assert_eq!(rec.text, "Kondapur suits a working couple.");
    }

    #[tokio::test]
    async fn test_recommender_recovers_from_errors_and_blank_text() {
        let req = request(60.0, mixed_scores());

        let failing = Recommender::new(Some(FixedGenerator(Err(LocalityError::GenerationError {
            message: "quota exceeded".to_string(),
        }))));
        let rec = failing.recommend(&req).await;
        assert_eq!(rec.source, RecommendationSource::Fallback);
        assert_eq!(rec.text, fallback_recommendation(&req));

        let blank = Recommender::new(Some(FixedGenerator(Ok("   ".to_string()))));
        assert_eq!(blank.recommend(&req).await.source, RecommendationSource::Fallback);

        let none: Recommender<FixedGenerator> = Recommender::fallback_only();
        assert_eq!(none.recommend(&req).await.source, RecommendationSource::Fallback);
    }
}
