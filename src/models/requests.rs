use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::SpecimenRecord;

/// Request to score one specimen pair
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScorePairRequest {
    #[validate(nested)]
    pub first: SpecimenRecord,
    #[validate(nested)]
    pub second: SpecimenRecord,
    /// Strategy name; the configured default when absent
    #[serde(default)]
    pub strategy: Option<String>,
}

/// Request to score every pair of a specimen list
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchScoreRequest {
    #[validate(length(min = 2, max = 500), nested)]
    pub specimens: Vec<SpecimenRecord>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(rename = "minProbability", alias = "min_probability", default)]
    pub min_probability: Option<f64>,
    #[serde(default = "default_limit")]
    pub limit: u16,
}

fn default_limit() -> u16 {
    100
}
