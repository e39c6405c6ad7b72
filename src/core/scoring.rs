use serde::Serialize;

use crate::core::distance::{DistanceProvider, Geodesic};
use crate::core::error::PairingError;
use crate::core::factors::{
    banded_category_factor, content_factor, distance_factor, is_exempt, kernel_category_factor,
    magnetic_factor, CategoryRule, FAYALITE_EXEMPT_TYPES, FERROSILITE_EXEMPT_TYPES,
};
use crate::core::strategy::{MissingData, Strategy};
use crate::models::{Criterion, Factors, Specimen};

/// Full breakdown of one scored pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingScore {
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    pub factors: Factors,
    pub probability: f64,
}

/// Calculate the per-criterion factors between two specimens using geodesic distance
pub fn calculate_factors(
    a: &Specimen,
    b: &Specimen,
    strategy: &Strategy,
) -> Result<Factors, PairingError> {
    calculate_factors_with(a, b, strategy, &Geodesic)
}

/// Calculate the per-criterion factors with a caller-supplied distance provider
pub fn calculate_factors_with<D: DistanceProvider + ?Sized>(
    a: &Specimen,
    b: &Specimen,
    strategy: &Strategy,
    provider: &D,
) -> Result<Factors, PairingError> {
    let distance_km = measure(a, b, provider)?;
    factors_at_distance(a, b, strategy, distance_km)
}

/// Pairing probability of two specimens using geodesic distance
pub fn pairing_probability(
    a: &Specimen,
    b: &Specimen,
    strategy: &Strategy,
) -> Result<f64, PairingError> {
    pairing_probability_with(a, b, strategy, &Geodesic)
}

/// Pairing probability with a caller-supplied distance provider
pub fn pairing_probability_with<D: DistanceProvider + ?Sized>(
    a: &Specimen,
    b: &Specimen,
    strategy: &Strategy,
    provider: &D,
) -> Result<f64, PairingError> {
    let factors = calculate_factors_with(a, b, strategy, provider)?;
    weighted_geometric_mean(&factors, strategy)
}

/// Score a pair and keep the intermediate values
pub fn score_pair<D: DistanceProvider + ?Sized>(
    a: &Specimen,
    b: &Specimen,
    strategy: &Strategy,
    provider: &D,
) -> Result<PairingScore, PairingError> {
    let distance_km = measure(a, b, provider)?;
    let factors = factors_at_distance(a, b, strategy, distance_km)?;
    let probability = weighted_geometric_mean(&factors, strategy)?;

    tracing::debug!(
        "Scored {} <-> {} with '{}': distance={:.3}km, probability={:.4}",
        a.name(),
        b.name(),
        strategy.name(),
        distance_km,
        probability
    );

    Ok(PairingScore {
        distance_km,
        factors,
        probability,
    })
}

/// Combine factors into a probability
///
/// probability = (Π factor_i ^ weight_i) ^ (1 / Σ weight_i)
///
/// Any zero factor makes the result exactly 0.
pub fn weighted_geometric_mean(
    factors: &Factors,
    strategy: &Strategy,
) -> Result<f64, PairingError> {
    let mut product = 1.0;
    let mut total_weight = 0.0;

    for (criterion, factor) in factors.iter() {
        let weight = strategy
            .weight(criterion)
            .ok_or_else(|| PairingError::InvalidStrategy {
                name: strategy.name().to_string(),
                problems: vec![format!("weights.{}: missing", criterion)],
            })?;

        if factor <= 0.0 {
            return Ok(0.0);
        }

        product *= factor.powf(weight);
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        return Err(PairingError::InvalidStrategy {
            name: strategy.name().to_string(),
            problems: vec!["weights: sum must be positive".to_string()],
        });
    }

    Ok(product.powf(1.0 / total_weight).clamp(0.0, 1.0))
}

/// Distance between two finds; both positions must be valid
fn measure<D: DistanceProvider + ?Sized>(
    a: &Specimen,
    b: &Specimen,
    provider: &D,
) -> Result<f64, PairingError> {
    for specimen in [a, b] {
        let position = specimen.position();
        if !position.is_valid() {
            return Err(PairingError::InvalidPosition {
                specimen: specimen.name().to_string(),
                latitude: position.latitude,
                longitude: position.longitude,
            });
        }
    }

    let distance_km = provider.distance_km(a.position(), b.position());
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(PairingError::InvalidDistance {
            first: a.name().to_string(),
            second: b.name().to_string(),
            distance_km,
        });
    }

    Ok(distance_km)
}

fn factors_at_distance(
    a: &Specimen,
    b: &Specimen,
    strategy: &Strategy,
    distance_km: f64,
) -> Result<Factors, PairingError> {
    let mut factors = Factors::new();

    factors.insert(
        Criterion::Distance,
        distance_factor(distance_km, strategy.distance_bands()),
    );

    let petrographic = category(
        Criterion::PetrographicType,
        a.petrographic_type(),
        b.petrographic_type(),
        strategy.petrographic(),
        strategy,
    )?;
    factors.insert(
        Criterion::PetrographicType,
        resolve(Criterion::PetrographicType, petrographic, a, b, strategy)?,
    );

    let weathering = category(
        Criterion::WeatheringGrade,
        a.weathering_grade(),
        b.weathering_grade(),
        strategy.weathering(),
        strategy,
    )?;
    factors.insert(
        Criterion::WeatheringGrade,
        resolve(Criterion::WeatheringGrade, weathering, a, b, strategy)?,
    );

    let fayalite = content_factor(
        a.fa_content(),
        b.fa_content(),
        is_exempt(a.petrographic_type(), b.petrographic_type(), FAYALITE_EXEMPT_TYPES),
        strategy.chemical_kernel(),
        strategy.sigma(Criterion::FayaliteContent)?,
    );
    factors.insert(
        Criterion::FayaliteContent,
        resolve(Criterion::FayaliteContent, fayalite, a, b, strategy)?,
    );

    let ferrosilite = content_factor(
        a.fs_content(),
        b.fs_content(),
        is_exempt(a.petrographic_type(), b.petrographic_type(), FERROSILITE_EXEMPT_TYPES),
        strategy.chemical_kernel(),
        strategy.sigma(Criterion::FerrosiliteContent)?,
    );
    factors.insert(
        Criterion::FerrosiliteContent,
        resolve(Criterion::FerrosiliteContent, ferrosilite, a, b, strategy)?,
    );

    let magnetic = magnetic_factor(
        a.mag_sus(),
        b.mag_sus(),
        strategy.magnetic_kernel(),
        strategy.sigma(Criterion::MagneticSusceptibility)?,
    );
    factors.insert(
        Criterion::MagneticSusceptibility,
        resolve(Criterion::MagneticSusceptibility, magnetic, a, b, strategy)?,
    );

    Ok(factors)
}

fn category(
    criterion: Criterion,
    a: Option<i32>,
    b: Option<i32>,
    rule: &CategoryRule,
    strategy: &Strategy,
) -> Result<Option<f64>, PairingError> {
    match rule {
        CategoryRule::Banded(bands) => Ok(banded_category_factor(a, b, bands)),
        CategoryRule::Kernel(kernel) => {
            let sigma = strategy.sigma(criterion)?;
            Ok(kernel_category_factor(a, b, *kernel, sigma))
        }
    }
}

/// Apply the strategy's missing-data policy to a factor computed from optional data
fn resolve(
    criterion: Criterion,
    factor: Option<f64>,
    a: &Specimen,
    b: &Specimen,
    strategy: &Strategy,
) -> Result<f64, PairingError> {
    if let Some(factor) = factor {
        return Ok(factor);
    }

    match strategy.missing_data(criterion) {
        MissingData::Neutral(value) => Ok(value),
        MissingData::Required => {
            let specimens: Vec<String> = [a, b]
                .iter()
                .filter(|s| !has_measurement(s, criterion))
                .map(|s| s.name().to_string())
                .collect();

            tracing::warn!(
                "Cannot score {} <-> {} with '{}': {} unknown for {:?}",
                a.name(),
                b.name(),
                strategy.name(),
                criterion,
                specimens
            );

            Err(PairingError::MissingMeasurement {
                criterion,
                specimens,
                strategy: strategy.name().to_string(),
            })
        }
    }
}

fn has_measurement(specimen: &Specimen, criterion: Criterion) -> bool {
    match criterion {
        Criterion::Distance => true,
        Criterion::PetrographicType => specimen.petrographic_type().is_some(),
        Criterion::WeatheringGrade => specimen.weathering_grade().is_some(),
        Criterion::FayaliteContent => specimen.fa_content().is_some(),
        Criterion::FerrosiliteContent => specimen.fs_content().is_some(),
        Criterion::MagneticSusceptibility => specimen.mag_sus().is_some(),
    }
}
