//! Per-criterion similarity factors
//!
//! Every factor lies in [0, 1]: 1 means no evidence against pairing, 0 is a
//! disqualifying mismatch. Functions comparing optional attributes return
//! `None` when either side is unknown; the aggregator then applies the
//! strategy's missing-data policy for that criterion.

use serde::Serialize;

/// Petrographic types whose olivine composition carries no pairing signal
pub const FAYALITE_EXEMPT_TYPES: &[i32] = &[3];

/// Petrographic types whose pyroxene composition carries no pairing signal
pub const FERROSILITE_EXEMPT_TYPES: &[i32] = &[3, 4];

/// One step of a distance table: distances below `upper_km` score `factor`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceBand {
    pub upper_km: f64,
    pub factor: f64,
}

/// Monotonically decreasing step function over find distance
///
/// Bands are scanned in ascending order and the first band whose upper
/// bound exceeds the distance wins, so every band is closed below and open
/// above.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceBands {
    bands: Vec<DistanceBand>,
    beyond: f64,
}

impl DistanceBands {
    pub fn new(bands: &[(f64, f64)], beyond: f64) -> Self {
        Self {
            bands: bands
                .iter()
                .map(|&(upper_km, factor)| DistanceBand { upper_km, factor })
                .collect(),
            beyond,
        }
    }

    /// Fine-grained table used by the revised model
    pub fn revised() -> Self {
        Self::new(
            &[
                (0.2, 1.0),
                (0.3, 0.9),
                (0.4, 0.8),
                (0.5, 0.7),
                (0.7, 0.6),
                (0.9, 0.5),
                (1.0, 0.4),
                (1.5, 0.3),
                (2.0, 0.2),
                (3.0, 0.1),
            ],
            0.05,
        )
    }

    /// Coarse table used by the original model
    pub fn original() -> Self {
        Self::new(
            &[(0.2, 1.0), (0.5, 0.9), (1.0, 0.8), (2.0, 0.7), (3.0, 0.6), (5.0, 0.3)],
            0.1,
        )
    }

    pub fn bands(&self) -> &[DistanceBand] {
        &self.bands
    }

    /// Factor for distances past the last band
    pub fn beyond(&self) -> f64 {
        self.beyond
    }
}

/// Exponential similarity kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// `exp(-Δ² / (2σ)²)`
    SquaredDifference,
    /// `exp(-|Δ| / (2σ²))`
    AbsoluteDifference,
    /// `exp(-(Δ/2)² / (2σ²))`
    HalvedGaussian,
}

impl Kernel {
    #[inline]
    pub fn evaluate(self, delta: f64, sigma: f64) -> f64 {
        match self {
            Kernel::SquaredDifference => (-(delta * delta) / (2.0 * sigma).powi(2)).exp(),
            Kernel::AbsoluteDifference => (-delta.abs() / (2.0 * sigma.powi(2))).exp(),
            Kernel::HalvedGaussian => (-(delta / 2.0).powi(2) / (2.0 * sigma.powi(2))).exp(),
        }
    }
}

/// Factor for an exact category distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryBand {
    pub delta: u32,
    pub factor: f64,
}

/// How two integer categories are compared
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryRule {
    /// Lookup on |delta|; deltas not listed are disqualifying
    Banded(Vec<CategoryBand>),
    /// Kernel over the category difference, using the criterion's sigma
    Kernel(Kernel),
}

impl CategoryRule {
    pub fn banded(bands: &[(u32, f64)]) -> Self {
        CategoryRule::Banded(
            bands
                .iter()
                .map(|&(delta, factor)| CategoryBand { delta, factor })
                .collect(),
        )
    }
}

/// Distance factor from the band table
#[inline]
pub fn distance_factor(distance_km: f64, bands: &DistanceBands) -> f64 {
    bands
        .bands
        .iter()
        .find(|band| distance_km < band.upper_km)
        .map(|band| band.factor)
        .unwrap_or(bands.beyond)
}

/// Absolute difference between two categories, if both are known
#[inline]
pub fn category_delta(a: Option<i32>, b: Option<i32>) -> Option<u32> {
    Some(a?.abs_diff(b?))
}

/// Banded category factor
pub fn banded_category_factor(
    a: Option<i32>,
    b: Option<i32>,
    bands: &[CategoryBand],
) -> Option<f64> {
    let delta = category_delta(a, b)?;
    Some(
        bands
            .iter()
            .find(|band| band.delta == delta)
            .map(|band| band.factor)
            .unwrap_or(0.0),
    )
}

/// Kernel category factor
pub fn kernel_category_factor(
    a: Option<i32>,
    b: Option<i32>,
    kernel: Kernel,
    sigma: f64,
) -> Option<f64> {
    let delta = category_delta(a, b)?;
    Some(kernel.evaluate(f64::from(delta), sigma))
}

/// Whether either petrographic type is in the exemption set
#[inline]
pub fn is_exempt(a: Option<i32>, b: Option<i32>, exempt_types: &[i32]) -> bool {
    [a, b]
        .iter()
        .flatten()
        .any(|petro_type| exempt_types.contains(petro_type))
}

/// Chemical content factor (fayalite or ferrosilite)
///
/// When both contents are known and either specimen's type is exempt, the
/// content carries no discriminating power and the factor is 1.
pub fn content_factor(
    a: Option<f64>,
    b: Option<f64>,
    exempt: bool,
    kernel: Kernel,
    sigma: f64,
) -> Option<f64> {
    let (a, b) = (a?, b?);
    if exempt {
        return Some(1.0);
    }
    Some(kernel.evaluate(a - b, sigma))
}

/// Magnetic susceptibility factor
pub fn magnetic_factor(a: Option<f64>, b: Option<f64>, kernel: Kernel, sigma: f64) -> Option<f64> {
    Some(kernel.evaluate(a? - b?, sigma))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revised_bands_are_closed_below() {
        let bands = DistanceBands::revised();
        assert_eq!(distance_factor(0.0, &bands), 1.0);
        assert_eq!(distance_factor(0.199, &bands), 1.0);
        assert_eq!(distance_factor(0.2, &bands), 0.9);
        assert_eq!(distance_factor(0.95, &bands), 0.4);
        assert_eq!(distance_factor(1.0, &bands), 0.3);
        assert_eq!(distance_factor(2.999, &bands), 0.1);
        assert_eq!(distance_factor(3.0, &bands), 0.05);
        assert_eq!(distance_factor(250.0, &bands), 0.05);
    }

    #[test]
    fn test_original_bands() {
        let bands = DistanceBands::original();
        assert_eq!(distance_factor(0.1, &bands), 1.0);
        assert_eq!(distance_factor(0.2, &bands), 0.9);
        assert_eq!(distance_factor(0.5, &bands), 0.8);
        assert_eq!(distance_factor(1.9, &bands), 0.7);
        assert_eq!(distance_factor(2.0, &bands), 0.6);
        assert_eq!(distance_factor(4.0, &bands), 0.3);
        assert_eq!(distance_factor(5.0, &bands), 0.1);
    }

    #[test]
    fn test_bands_decrease_monotonically() {
        for bands in [DistanceBands::revised(), DistanceBands::original()] {
            let factors: Vec<f64> = bands.bands().iter().map(|b| b.factor).collect();
            assert!(factors.windows(2).all(|w| w[0] > w[1]));
            assert!(bands.beyond() < *factors.last().unwrap());
        }
    }

    #[test]
    fn test_kernels_at_zero_delta() {
        for kernel in [
            Kernel::SquaredDifference,
            Kernel::AbsoluteDifference,
            Kernel::HalvedGaussian,
        ] {
            assert_eq!(kernel.evaluate(0.0, 0.63), 1.0);
        }
    }

    #[test]
    fn test_kernel_forms() {
        let squared = Kernel::SquaredDifference.evaluate(1.0, 0.5);
        assert!((squared - (-1.0f64).exp()).abs() < 1e-12);

        let absolute = Kernel::AbsoluteDifference.evaluate(-1.0, 0.5);
        assert!((absolute - (-2.0f64).exp()).abs() < 1e-12);

        let halved = Kernel::HalvedGaussian.evaluate(2.0, 1.0);
        assert!((halved - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_kernel_vanishes_for_large_delta() {
        assert_eq!(Kernel::SquaredDifference.evaluate(1e6, 0.63), 0.0);
        assert_eq!(Kernel::AbsoluteDifference.evaluate(1e6, 0.6), 0.0);
    }

    #[test]
    fn test_category_delta_is_absolute() {
        assert_eq!(category_delta(Some(3), Some(4)), Some(1));
        assert_eq!(category_delta(Some(4), Some(3)), Some(1));
        assert_eq!(category_delta(None, Some(3)), None);
        assert_eq!(category_delta(None, None), None);
    }

    #[test]
    fn test_banded_category_factor() {
        let rule = CategoryRule::banded(&[(0, 1.0), (1, 0.75), (2, 0.5)]);
        let CategoryRule::Banded(bands) = rule else {
            panic!("expected banded rule");
        };

        assert_eq!(banded_category_factor(Some(2), Some(2), &bands), Some(1.0));
        assert_eq!(banded_category_factor(Some(1), Some(2), &bands), Some(0.75));
        assert_eq!(banded_category_factor(Some(4), Some(2), &bands), Some(0.5));
        assert_eq!(banded_category_factor(Some(0), Some(5), &bands), Some(0.0));
        assert_eq!(banded_category_factor(None, Some(5), &bands), None);
    }

    #[test]
    fn test_exemption_checks_both_specimens() {
        assert!(is_exempt(Some(4), Some(5), FERROSILITE_EXEMPT_TYPES));
        assert!(is_exempt(Some(5), Some(4), FERROSILITE_EXEMPT_TYPES));
        assert!(!is_exempt(Some(4), Some(5), FAYALITE_EXEMPT_TYPES));
        assert!(is_exempt(Some(3), None, FAYALITE_EXEMPT_TYPES));
        assert!(!is_exempt(None, None, FAYALITE_EXEMPT_TYPES));
    }

    #[test]
    fn test_content_factor() {
        let squared = Kernel::SquaredDifference;
        assert_eq!(content_factor(Some(20.0), None, false, squared, 0.63), None);
        assert_eq!(content_factor(Some(20.0), Some(30.0), true, squared, 0.63), Some(1.0));

        let factor = content_factor(Some(20.0), Some(20.5), false, squared, 0.63).unwrap();
        assert!(factor > 0.0 && factor < 1.0);
    }

    #[test]
    fn test_magnetic_factor() {
        let absolute = Kernel::AbsoluteDifference;
        assert_eq!(magnetic_factor(None, Some(4.0), absolute, 0.1), None);
        assert_eq!(magnetic_factor(Some(4.0), Some(4.0), absolute, 0.1), Some(1.0));

        let squared =
            magnetic_factor(Some(4.0), Some(4.2), Kernel::SquaredDifference, 0.1).unwrap();
        assert!((squared - (-1.0f64).exp()).abs() < 1e-9);

        let absolute = magnetic_factor(Some(4.0), Some(4.2), absolute, 0.1).unwrap();
        assert!((absolute - (-10.0f64).exp()).abs() < 1e-9);
    }
}
