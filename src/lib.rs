//! Meteorite Pairing - pairing probability scoring for meteorite specimens
//!
//! This library scores how likely two recovered meteorite fragments are
//! pieces of the same fall. Per-criterion similarity factors (find distance,
//! petrographic type, weathering grade, olivine and pyroxene chemistry,
//! magnetic susceptibility) are combined into one probability by a weighted
//! geometric mean under a named scoring strategy.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;

// Re-export commonly used types
pub use crate::core::{
    calculate_factors, pairing_probability, BatchScorer, PairingError, Strategy, StrategyRegistry,
    distance::{geodesic_distance, haversine_distance},
};
pub use crate::models::{Criterion, Factors, Position, Specimen, SpecimenRecord};
