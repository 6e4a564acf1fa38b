use crate::domain::model::{EmploymentStatus, InfrastructureCounts, MaritalStatus};
use serde::{Deserialize, Serialize};

/// The five lifestyle dimensions an area is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreCategory {
    Transport,
    Healthcare,
    Education,
    Lifestyle,
    Grocery,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Transport,
        ScoreCategory::Healthcare,
        ScoreCategory::Education,
        ScoreCategory::Lifestyle,
        ScoreCategory::Grocery,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ScoreCategory::Transport => "transport",
            ScoreCategory::Healthcare => "healthcare",
            ScoreCategory::Education => "education",
            ScoreCategory::Lifestyle => "lifestyle",
            ScoreCategory::Grocery => "grocery",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::Transport => "Transport",
            ScoreCategory::Healthcare => "Healthcare",
            ScoreCategory::Education => "Education",
            ScoreCategory::Lifestyle => "Lifestyle",
            ScoreCategory::Grocery => "Grocery",
        }
    }
}

/// One `f64` per score category. Used for raw scores, normalized scores and weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryValues {
    pub transport: f64,
    pub healthcare: f64,
    pub education: f64,
    pub lifestyle: f64,
    pub grocery: f64,
}

impl CategoryValues {
    pub fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Transport => self.transport,
            ScoreCategory::Healthcare => self.healthcare,
            ScoreCategory::Education => self.education,
            ScoreCategory::Lifestyle => self.lifestyle,
            ScoreCategory::Grocery => self.grocery,
        }
    }

    pub fn get_mut(&mut self, category: ScoreCategory) -> &mut f64 {
        match category {
            ScoreCategory::Transport => &mut self.transport,
            ScoreCategory::Healthcare => &mut self.healthcare,
            ScoreCategory::Education => &mut self.education,
            ScoreCategory::Lifestyle => &mut self.lifestyle,
            ScoreCategory::Grocery => &mut self.grocery,
        }
    }

    pub fn map(&self, f: impl Fn(ScoreCategory, f64) -> f64) -> Self {
        let mut out = Self::default();
        for category in ScoreCategory::ALL {
            *out.get_mut(category) = f(category, self.get(category));
        }
        out
    }

    pub fn sum(&self) -> f64 {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// First category holding the maximum value, in category order.
    pub fn best(&self) -> ScoreCategory {
        let mut best = ScoreCategory::Transport;
        for category in ScoreCategory::ALL {
            if self.get(category) > self.get(best) {
                best = category;
            }
        }
        best
    }

    /// First category holding the minimum value, in category order.
    pub fn worst(&self) -> ScoreCategory {
        let mut worst = ScoreCategory::Transport;
        for category in ScoreCategory::ALL {
            if self.get(category) < self.get(worst) {
                worst = category;
            }
        }
        worst
    }
}

pub type CategoryScores = CategoryValues;
pub type WeightVector = CategoryValues;

/// The profile fields that fed weighting, plus the human-readable trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileContext {
    pub marital_status: MaritalStatus,
    pub has_parents: bool,
    pub employment_status: EmploymentStatus,
    pub has_vehicle: bool,
    pub has_elderly: bool,
    pub has_children: bool,
    pub income_range: Option<String>,
    pub adjustments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub category_scores: CategoryScores,
    pub weights_used: WeightVector,
    pub final_score: f64,
    pub infrastructure: InfrastructureCounts,
    /// Adjustment trail. Duplicated inside `profile_context` when a profile was supplied.
    pub adjustments: Vec<String>,
    pub profile_context: Option<ProfileContext>,
}

/// A scored area as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaScore {
    pub area_id: u64,
    pub area_name: String,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
}

/// Input handed to the text-generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub locality_name: String,
    pub final_score: f64,
    pub category_scores: CategoryScores,
    pub infrastructure: InfrastructureCounts,
    pub profile: Option<ProfileContext>,
}

impl RecommendationRequest {
    pub fn from_score(score: &AreaScore) -> Self {
        Self {
            locality_name: score.area_name.clone(),
            final_score: score.breakdown.final_score,
            category_scores: score.breakdown.category_scores,
            infrastructure: score.breakdown.infrastructure,
            profile: score.breakdown.profile_context.clone(),
        }
    }
}
