// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Criterion, Factors, Position, Specimen, SpecimenBuilder, SpecimenRecord};
pub use requests::{BatchScoreRequest, ScorePairRequest};
pub use responses::{
    BatchScoreResponse, ErrorResponse, FactorsResponse, HealthResponse, PairingResponse,
    StrategiesResponse,
};
