use serde::{Deserialize, Serialize};

use crate::core::{ScoredPair, SkippedPair};
use crate::models::domain::Factors;

/// Response for the pair scoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PairingResponse {
    pub strategy: String,
    pub first: String,
    pub second: String,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    pub probability: f64,
}

/// Response for the factor inspection endpoint
#[derive(Debug, Clone, Serialize)]
pub struct FactorsResponse {
    pub strategy: String,
    pub first: String,
    pub second: String,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    pub factors: Factors,
    pub probability: f64,
}

/// Response for the batch scoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BatchScoreResponse {
    pub strategy: String,
    pub pairs: Vec<ScoredPair>,
    pub skipped: Vec<SkippedPair>,
    #[serde(rename = "totalPairs")]
    pub total_pairs: usize,
}

/// Response listing the registered strategies
#[derive(Debug, Clone, Serialize)]
pub struct StrategiesResponse {
    pub default: String,
    pub strategies: Vec<crate::core::Strategy>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
