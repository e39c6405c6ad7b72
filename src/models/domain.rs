use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::core::error::PairingError;

/// Geographic position of a find, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite latitude in [-90, 90] and longitude in [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Scoring criteria, in the order factors are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Distance,
    PetrographicType,
    WeatheringGrade,
    FayaliteContent,
    FerrosiliteContent,
    MagneticSusceptibility,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::Distance,
        Criterion::PetrographicType,
        Criterion::WeatheringGrade,
        Criterion::FayaliteContent,
        Criterion::FerrosiliteContent,
        Criterion::MagneticSusceptibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Distance => "distance",
            Criterion::PetrographicType => "petrographic_type",
            Criterion::WeatheringGrade => "weathering_grade",
            Criterion::FayaliteContent => "fayalite_content",
            Criterion::FerrosiliteContent => "ferrosilite_content",
            Criterion::MagneticSusceptibility => "magnetic_susceptibility",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Criterion::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| PairingError::UnknownCriterion {
                name: name.to_string(),
                valid: Criterion::ALL
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Normalized meteorite specimen
///
/// Every optional attribute is either a finite measurement or unknown.
/// Unknown is never the same thing as zero: factor functions treat it as
/// "no evidence against pairing".
#[derive(Debug, Clone, PartialEq)]
pub struct Specimen {
    name: String,
    position: Position,
    petrographic_type: Option<i32>,
    weathering_grade: Option<i32>,
    fa_content: Option<f64>,
    fs_content: Option<f64>,
    mag_sus: Option<f64>,
}

impl Specimen {
    /// Start building a specimen; every optional attribute begins unknown
    pub fn builder(name: impl Into<String>, latitude: f64, longitude: f64) -> SpecimenBuilder {
        SpecimenBuilder {
            specimen: Specimen {
                name: name.into(),
                position: Position::new(latitude, longitude),
                petrographic_type: None,
                weathering_grade: None,
                fa_content: None,
                fs_content: None,
                mag_sus: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn petrographic_type(&self) -> Option<i32> {
        self.petrographic_type
    }

    pub fn weathering_grade(&self) -> Option<i32> {
        self.weathering_grade
    }

    /// Fayalite content (mol % Fa)
    pub fn fa_content(&self) -> Option<f64> {
        self.fa_content
    }

    /// Ferrosilite content (mol % Fs)
    pub fn fs_content(&self) -> Option<f64> {
        self.fs_content
    }

    /// Magnetic susceptibility (log chi)
    pub fn mag_sus(&self) -> Option<f64> {
        self.mag_sus
    }
}

impl fmt::Display for Specimen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder taking raw catalog values
///
/// NaN and infinite inputs normalize to unknown. Category values are
/// truncated toward zero.
#[derive(Debug, Clone)]
pub struct SpecimenBuilder {
    specimen: Specimen,
}

impl SpecimenBuilder {
    pub fn petrographic_type(mut self, raw: f64) -> Self {
        self.specimen.petrographic_type = normalize_category(raw);
        self
    }

    pub fn weathering_grade(mut self, raw: f64) -> Self {
        self.specimen.weathering_grade = normalize_category(raw);
        self
    }

    pub fn fa_content(mut self, raw: f64) -> Self {
        self.specimen.fa_content = normalize_measurement(raw);
        self
    }

    pub fn fs_content(mut self, raw: f64) -> Self {
        self.specimen.fs_content = normalize_measurement(raw);
        self
    }

    pub fn mag_sus(mut self, raw: f64) -> Self {
        self.specimen.mag_sus = normalize_measurement(raw);
        self
    }

    pub fn build(self) -> Specimen {
        self.specimen
    }
}

#[inline]
fn normalize_measurement(raw: f64) -> Option<f64> {
    raw.is_finite().then_some(raw)
}

#[inline]
fn normalize_category(raw: f64) -> Option<i32> {
    let truncated = normalize_measurement(raw)?.trunc();
    if truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
        return None;
    }
    Some(truncated as i32)
}

/// Only JSON numbers are measurements; strings, booleans and null are unknown
fn json_number(value: &Option<serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Lenient specimen shape handed over by catalog ingestion
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SpecimenRecord {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(rename = "petrographicType", alias = "petrographic_type", default)]
    pub petrographic_type: Option<serde_json::Value>,
    #[serde(rename = "weatheringGrade", alias = "weathering_grade", default)]
    pub weathering_grade: Option<serde_json::Value>,
    #[serde(rename = "faContent", alias = "fa_content", default)]
    pub fa_content: Option<serde_json::Value>,
    #[serde(rename = "fsContent", alias = "fs_content", default)]
    pub fs_content: Option<serde_json::Value>,
    #[serde(rename = "magSus", alias = "mag_sus", default)]
    pub mag_sus: Option<serde_json::Value>,
}

impl SpecimenRecord {
    pub fn to_specimen(&self) -> Specimen {
        Specimen::builder(self.name.clone(), self.latitude, self.longitude)
            .petrographic_type(json_number(&self.petrographic_type))
            .weathering_grade(json_number(&self.weathering_grade))
            .fa_content(json_number(&self.fa_content))
            .fs_content(json_number(&self.fs_content))
            .mag_sus(json_number(&self.mag_sus))
            .build()
    }
}

impl From<SpecimenRecord> for Specimen {
    fn from(record: SpecimenRecord) -> Self {
        record.to_specimen()
    }
}

/// Per-criterion factor values for one specimen pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Factors(BTreeMap<Criterion, f64>);

impl Factors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, criterion: Criterion, factor: f64) {
        self.0.insert(criterion, factor);
    }

    pub fn get(&self, criterion: Criterion) -> Option<f64> {
        self.0.get(&criterion).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        self.0.iter().map(|(c, f)| (*c, *f))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
