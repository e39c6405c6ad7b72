use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::error::PairingError;
use crate::core::factors::{CategoryRule, DistanceBands, Kernel};
use crate::models::Criterion;

pub const REVISED: &str = "revised";
pub const ORIGINAL: &str = "original";

/// Names of the built-in strategies
pub const STRATEGY_NAMES: [&str; 2] = [ORIGINAL, REVISED];

/// What a criterion contributes when either specimen lacks the data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "value")]
pub enum MissingData {
    /// Substitute this factor
    Neutral(f64),
    /// Scoring fails with a precondition error
    Required,
}

/// A complete scoring model
///
/// Bundles the weights and decay constants with the choice of band tables,
/// category rules and kernels. The aggregator only ever reads a strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    name: String,
    weights: BTreeMap<Criterion, f64>,
    sigma: BTreeMap<Criterion, f64>,
    distance_bands: DistanceBands,
    petrographic: CategoryRule,
    weathering: CategoryRule,
    chemical_kernel: Kernel,
    magnetic_kernel: Kernel,
    missing: BTreeMap<Criterion, MissingData>,
}

impl Strategy {
    /// Fine-grained distance bands, banded weathering, squared-difference kernels
    pub fn revised() -> Self {
        Self {
            name: REVISED.to_string(),
            weights: BTreeMap::from([
                (Criterion::Distance, 1.0),
                (Criterion::WeatheringGrade, 1.0),
                (Criterion::PetrographicType, 2.0),
                (Criterion::FayaliteContent, 2.0),
                (Criterion::FerrosiliteContent, 2.0),
                (Criterion::MagneticSusceptibility, 2.0),
            ]),
            sigma: BTreeMap::from([
                (Criterion::FayaliteContent, 0.63),
                (Criterion::FerrosiliteContent, 0.61),
                (Criterion::MagneticSusceptibility, 0.1),
            ]),
            distance_bands: DistanceBands::revised(),
            petrographic: CategoryRule::banded(&[(0, 1.0), (1, 0.75)]),
            weathering: CategoryRule::banded(&[(0, 1.0), (1, 0.75), (2, 0.5)]),
            chemical_kernel: Kernel::SquaredDifference,
            magnetic_kernel: Kernel::SquaredDifference,
            missing: all_neutral(),
        }
    }

    /// Coarse distance bands, exact petrographic match, absolute-difference kernels
    pub fn original() -> Self {
        let mut missing = all_neutral();
        missing.insert(Criterion::MagneticSusceptibility, MissingData::Required);

        Self {
            name: ORIGINAL.to_string(),
            weights: BTreeMap::from([
                (Criterion::Distance, 1.0),
                (Criterion::PetrographicType, 1.0),
                (Criterion::WeatheringGrade, 1.0),
                (Criterion::FayaliteContent, 2.0),
                (Criterion::FerrosiliteContent, 2.0),
                (Criterion::MagneticSusceptibility, 2.0),
            ]),
            sigma: BTreeMap::from([
                (Criterion::WeatheringGrade, 1.0),
                (Criterion::FayaliteContent, 0.6),
                (Criterion::FerrosiliteContent, 0.7),
                (Criterion::MagneticSusceptibility, 0.1),
            ]),
            distance_bands: DistanceBands::original(),
            petrographic: CategoryRule::banded(&[(0, 1.0)]),
            weathering: CategoryRule::Kernel(Kernel::HalvedGaussian),
            chemical_kernel: Kernel::AbsoluteDifference,
            magnetic_kernel: Kernel::AbsoluteDifference,
            missing,
        }
    }

    /// Look up a built-in strategy by name
    pub fn by_name(name: &str) -> Result<Self, PairingError> {
        match name.trim() {
            REVISED => Ok(Self::revised()),
            ORIGINAL => Ok(Self::original()),
            other => Err(unknown_strategy(other)),
        }
    }

    /// Copy of this strategy with one weight replaced
    pub fn with_weight(mut self, criterion: Criterion, weight: f64) -> Self {
        self.weights.insert(criterion, weight);
        self
    }

    /// Copy of this strategy with one decay constant replaced
    pub fn with_sigma(mut self, criterion: Criterion, sigma: f64) -> Self {
        self.sigma.insert(criterion, sigma);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weights(&self) -> &BTreeMap<Criterion, f64> {
        &self.weights
    }

    pub fn weight(&self, criterion: Criterion) -> Option<f64> {
        self.weights.get(&criterion).copied()
    }

    pub fn sigma(&self, criterion: Criterion) -> Result<f64, PairingError> {
        self.sigma
            .get(&criterion)
            .copied()
            .ok_or_else(|| PairingError::InvalidStrategy {
                name: self.name.clone(),
                problems: vec![format!("sigma.{}: not configured", criterion)],
            })
    }

    pub fn distance_bands(&self) -> &DistanceBands {
        &self.distance_bands
    }

    pub fn petrographic(&self) -> &CategoryRule {
        &self.petrographic
    }

    pub fn weathering(&self) -> &CategoryRule {
        &self.weathering
    }

    pub fn chemical_kernel(&self) -> Kernel {
        self.chemical_kernel
    }

    pub fn magnetic_kernel(&self) -> Kernel {
        self.magnetic_kernel
    }

    /// Missing-data policy for a criterion; undeclared criteria are required
    pub fn missing_data(&self, criterion: Criterion) -> MissingData {
        self.missing
            .get(&criterion)
            .copied()
            .unwrap_or(MissingData::Required)
    }

    /// Criteria that need a decay constant under this strategy
    fn kernel_criteria(&self) -> Vec<Criterion> {
        let mut criteria = vec![
            Criterion::FayaliteContent,
            Criterion::FerrosiliteContent,
            Criterion::MagneticSusceptibility,
        ];
        if matches!(self.petrographic, CategoryRule::Kernel(_)) {
            criteria.push(Criterion::PetrographicType);
        }
        if matches!(self.weathering, CategoryRule::Kernel(_)) {
            criteria.push(Criterion::WeatheringGrade);
        }
        criteria
    }
}

fn all_neutral() -> BTreeMap<Criterion, MissingData> {
    Criterion::ALL
        .iter()
        .filter(|c| **c != Criterion::Distance)
        .map(|c| (*c, MissingData::Neutral(1.0)))
        .collect()
}

fn unknown_strategy(name: &str) -> PairingError {
    PairingError::UnknownStrategy {
        name: name.to_string(),
        valid: STRATEGY_NAMES.join(", "),
    }
}

/// Validate a strategy before it is used for scoring.
/// Returns all validation errors at once (not just the first).
pub fn validate_strategy(strategy: &Strategy) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for criterion in Criterion::ALL {
        match strategy.weight(criterion) {
            Some(w) if w.is_finite() && w > 0.0 => {}
            Some(w) => errors.push(format!("weights.{}: must be positive, got {}", criterion, w)),
            None => errors.push(format!("weights.{}: missing", criterion)),
        }
    }

    for criterion in strategy.kernel_criteria() {
        match strategy.sigma.get(&criterion) {
            Some(s) if s.is_finite() && *s > 0.0 => {}
            Some(s) => errors.push(format!("sigma.{}: must be positive, got {}", criterion, s)),
            None => errors.push(format!("sigma.{}: missing", criterion)),
        }
    }

    let bands = strategy.distance_bands();
    for (i, pair) in bands.bands().windows(2).enumerate() {
        if pair[1].upper_km <= pair[0].upper_km {
            errors.push(format!(
                "distance_bands[{}]: upper bound {} is not above {}",
                i + 1,
                pair[1].upper_km,
                pair[0].upper_km
            ));
        }
    }
    let band_factors = bands
        .bands()
        .iter()
        .map(|b| b.factor)
        .chain(std::iter::once(bands.beyond()));
    for (i, factor) in band_factors.enumerate() {
        if !(0.0..=1.0).contains(&factor) {
            errors.push(format!("distance_bands[{}]: factor {} outside [0, 1]", i, factor));
        }
    }

    for (criterion, rule) in [
        (Criterion::PetrographicType, strategy.petrographic()),
        (Criterion::WeatheringGrade, strategy.weathering()),
    ] {
        if let CategoryRule::Banded(category_bands) = rule {
            for band in category_bands {
                if !(0.0..=1.0).contains(&band.factor) {
                    errors.push(format!(
                        "{}: factor {} for delta {} outside [0, 1]",
                        criterion, band.factor, band.delta
                    ));
                }
            }
        }
    }

    for (criterion, policy) in &strategy.missing {
        if let MissingData::Neutral(value) = policy {
            if !(0.0..=1.0).contains(value) {
                errors.push(format!(
                    "missing.{}: neutral value {} outside [0, 1]",
                    criterion, value
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Fixed set of named strategies with a default
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Strategy>,
    default: String,
}

impl StrategyRegistry {
    /// Registry of the built-in strategies
    pub fn builtin(default: &str) -> Result<Self, PairingError> {
        let strategies = builtin_strategies();

        let default = default.trim();
        if !strategies.contains_key(default) {
            return Err(unknown_strategy(default));
        }

        Ok(Self {
            strategies,
            default: default.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Result<&Strategy, PairingError> {
        self.strategies
            .get(name.trim())
            .ok_or_else(|| unknown_strategy(name.trim()))
    }

    /// Named strategy, or the default when no name is given
    pub fn resolve(&self, name: Option<&str>) -> Result<&Strategy, PairingError> {
        match name {
            Some(name) if !name.trim().is_empty() => self.get(name),
            _ => self.get(&self.default),
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    pub fn strategies(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.values()
    }

    /// Adjust weights and decay constants of a registered strategy
    ///
    /// The tuned strategy is validated before it replaces the registered one.
    pub fn tune(
        &mut self,
        name: &str,
        weights: &[(Criterion, f64)],
        sigma: &[(Criterion, f64)],
    ) -> Result<(), PairingError> {
        let current = self.get(name)?.clone();

        let tuned = weights
            .iter()
            .fold(current, |s, &(criterion, w)| s.with_weight(criterion, w));
        let tuned = sigma
            .iter()
            .fold(tuned, |s, &(criterion, v)| s.with_sigma(criterion, v));

        validate_strategy(&tuned).map_err(|problems| PairingError::InvalidStrategy {
            name: tuned.name().to_string(),
            problems,
        })?;

        tracing::info!(
            "Tuned strategy '{}': weights={:?}, sigma={:?}",
            tuned.name(),
            tuned.weights,
            tuned.sigma
        );
        self.strategies.insert(tuned.name().to_string(), tuned);
        Ok(())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self {
            strategies: builtin_strategies(),
            default: REVISED.to_string(),
        }
    }
}

fn builtin_strategies() -> BTreeMap<String, Strategy> {
    [Strategy::original(), Strategy::revised()]
        .into_iter()
        .map(|s| (s.name().to_string(), s))
        .collect()
}
