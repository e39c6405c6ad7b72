// Core algorithm exports
pub mod batch;
pub mod distance;
pub mod error;
pub mod factors;
pub mod scoring;
pub mod strategy;

pub use batch::{BatchResult, BatchScorer, ScoredPair, SkippedPair};
pub use distance::{geodesic_distance, haversine_distance, DistanceProvider, Geodesic, Haversine};
pub use error::PairingError;
pub use factors::{CategoryRule, DistanceBands, Kernel};
pub use scoring::{
    calculate_factors, calculate_factors_with, pairing_probability, pairing_probability_with,
    score_pair, weighted_geometric_mean, PairingScore,
};
pub use strategy::{validate_strategy, MissingData, Strategy, StrategyRegistry, STRATEGY_NAMES};
