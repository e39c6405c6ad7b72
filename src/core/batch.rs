use serde::Serialize;
use std::sync::Arc;

use crate::core::distance::{DistanceProvider, Geodesic};
use crate::core::scoring::score_pair;
use crate::core::strategy::Strategy;
use crate::models::{Factors, Specimen};

/// One scored specimen pair
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPair {
    pub first: String,
    pub second: String,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    pub probability: f64,
    pub factors: Factors,
}

/// A pair that could not be scored
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPair {
    pub first: String,
    pub second: String,
    pub reason: String,
}

/// Result of scoring a whole specimen list
#[derive(Debug)]
pub struct BatchResult {
    pub pairs: Vec<ScoredPair>,
    pub skipped: Vec<SkippedPair>,
    pub total_pairs: usize,
}

/// Scores every unordered pair of a specimen list
///
/// Pairs are ranked, not matched: the same specimen may appear in many
/// results.
#[derive(Clone)]
pub struct BatchScorer {
    strategy: Strategy,
    provider: Arc<dyn DistanceProvider>,
}

impl BatchScorer {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            provider: Arc::new(Geodesic),
        }
    }

    pub fn with_provider(strategy: Strategy, provider: Arc<dyn DistanceProvider>) -> Self {
        Self { strategy, provider }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Score all pairs and keep those at or above `min_probability`
    ///
    /// # Returns
    /// Pairs sorted by probability (descending) then distance (ascending),
    /// truncated to `limit`
    pub fn score_all(
        &self,
        specimens: &[Specimen],
        min_probability: f64,
        limit: usize,
    ) -> BatchResult {
        let mut pairs = Vec::new();
        let mut skipped = Vec::new();
        let mut total_pairs = 0;

        for (i, a) in specimens.iter().enumerate() {
            for b in &specimens[i + 1..] {
                total_pairs += 1;

                match score_pair(a, b, &self.strategy, self.provider.as_ref()) {
                    Ok(score) if score.probability >= min_probability => pairs.push(ScoredPair {
                        first: a.name().to_string(),
                        second: b.name().to_string(),
                        distance_km: score.distance_km,
                        probability: score.probability,
                        factors: score.factors,
                    }),
                    Ok(_) => {}
                    Err(e) => skipped.push(SkippedPair {
                        first: a.name().to_string(),
                        second: b.name().to_string(),
                        reason: e.to_string(),
                    }),
                }
            }
        }

        pairs.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    a.distance_km
                        .partial_cmp(&b.distance_km)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        pairs.truncate(limit);

        tracing::debug!(
            "Scored {} pairs with '{}': {} kept, {} skipped",
            total_pairs,
            self.strategy.name(),
            pairs.len(),
            skipped.len()
        );

        BatchResult {
            pairs,
            skipped,
            total_pairs,
        }
    }
}

impl Default for BatchScorer {
    fn default() -> Self {
        Self::new(Strategy::revised())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::Haversine;

    fn create_specimen(name: &str, lat: f64, lon: f64, petro: f64, fa: f64) -> Specimen {
        Specimen::builder(name, lat, lon)
            .petrographic_type(petro)
            .weathering_grade(1.0)
            .fa_content(fa)
            .fs_content(16.0)
            .mag_sus(4.8)
            .build()
    }

    #[test]
    fn test_scores_every_unordered_pair() {
        let scorer = BatchScorer::default();
        let specimens = vec![
            create_specimen("A", 20.0, 57.0, 5.0, 24.0),
            create_specimen("B", 20.0, 57.001, 5.0, 24.1),
            create_specimen("C", 20.3, 57.2, 5.0, 24.0),
            create_specimen("D", 20.0, 57.002, 6.0, 24.0),
        ];

        let result = scorer.score_all(&specimens, 0.0, 100);
        assert_eq!(result.total_pairs, 6);
        assert_eq!(result.pairs.len() + result.skipped.len(), 6);
    }

    #[test]
    fn test_sorted_and_filtered() {
        let scorer = BatchScorer::with_provider(Strategy::revised(), Arc::new(Haversine));
        let specimens = vec![
            create_specimen("A", 20.0, 57.0, 5.0, 24.0),
            create_specimen("B", 20.0, 57.0005, 5.0, 24.0),
            create_specimen("C", 20.0, 57.02, 5.0, 24.0),
            create_specimen("D", 20.0, 57.0, 1.0, 24.0),
        ];

        let result = scorer.score_all(&specimens, 0.01, 10);

        // D is disqualified against everyone by petrographic type
        assert!(result.pairs.iter().all(|p| p.first != "D" && p.second != "D"));

        for i in 1..result.pairs.len() {
            assert!(result.pairs[i - 1].probability >= result.pairs[i].probability);
        }
        assert_eq!(result.pairs[0].first, "A");
        assert_eq!(result.pairs[0].second, "B");
        assert_eq!(result.pairs[0].probability, 1.0);
    }

    #[test]
    fn test_limit_truncates() {
        let scorer = BatchScorer::default();
        let specimens: Vec<Specimen> = (0..5)
            .map(|i| create_specimen(&format!("S{}", i), 20.0, 57.0 + i as f64 * 0.0001, 5.0, 24.0))
            .collect();

        let result = scorer.score_all(&specimens, 0.0, 3);
        assert_eq!(result.total_pairs, 10);
        assert_eq!(result.pairs.len(), 3);
    }

    #[test]
    fn test_precondition_failures_are_skipped() {
        let scorer = BatchScorer::new(Strategy::original());
        let specimens = vec![
            create_specimen("A", 20.0, 57.0, 5.0, 24.0),
            Specimen::builder("no-mag", 20.0, 57.0).petrographic_type(5.0).build(),
        ];

        let result = scorer.score_all(&specimens, 0.0, 10);
        assert!(result.pairs.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("magnetic_susceptibility"));
    }
}
