use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{
    score_pair, BatchScorer, DistanceProvider, PairingError, PairingScore, Strategy,
    StrategyRegistry,
};
use crate::models::{
    BatchScoreRequest, BatchScoreResponse, ErrorResponse, FactorsResponse, HealthResponse,
    PairingResponse, ScorePairRequest, StrategiesResponse,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StrategyRegistry>,
    pub provider: Arc<dyn DistanceProvider>,
    pub max_batch_results: usize,
}

/// Configure all pairing-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/strategies", web::get().to(list_strategies))
        .route("/pairing/score", web::post().to(score))
        .route("/pairing/factors", web::post().to(factors))
        .route("/pairing/batch", web::post().to(batch));
}

/// Map a scoring error to its JSON response
fn pairing_error_response(err: &PairingError) -> HttpResponse {
    match err {
        PairingError::MissingMeasurement { .. } => {
            HttpResponse::UnprocessableEntity().json(ErrorResponse {
                error: "missing_measurement".to_string(),
                message: err.to_string(),
                status_code: 422,
            })
        }
        PairingError::InvalidPosition { .. } => HttpResponse::BadRequest().json(ErrorResponse {
            error: "invalid_position".to_string(),
            message: err.to_string(),
            status_code: 400,
        }),
        PairingError::UnknownStrategy { .. } => HttpResponse::BadRequest().json(ErrorResponse {
            error: "unknown_strategy".to_string(),
            message: err.to_string(),
            status_code: 400,
        }),
        PairingError::UnknownCriterion { .. } => HttpResponse::BadRequest().json(ErrorResponse {
            error: "unknown_criterion".to_string(),
            message: err.to_string(),
            status_code: 400,
        }),
        PairingError::InvalidDistance { .. } => {
            tracing::error!("Distance provider failed: {}", err);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "invalid_distance".to_string(),
                message: err.to_string(),
                status_code: 500,
            })
        }
        PairingError::InvalidStrategy { .. } => {
            tracing::error!("Registered strategy is invalid: {}", err);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "invalid_strategy".to_string(),
                message: err.to_string(),
                status_code: 500,
            })
        }
    }
}

fn validation_error_response(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Validate a pair request and score it with the requested strategy
fn score_request(
    state: &AppState,
    req: &ScorePairRequest,
) -> Result<(Strategy, PairingScore), HttpResponse> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for pairing request: field_errors={:?}", errors);
        return Err(validation_error_response(errors));
    }

    let strategy = state
        .registry
        .resolve(req.strategy.as_deref())
        .map_err(|e| pairing_error_response(&e))?;

    let first = req.first.to_specimen();
    let second = req.second.to_specimen();

    let result = score_pair(&first, &second, strategy, state.provider.as_ref())
        .map_err(|e| pairing_error_response(&e))?;

    Ok((strategy.clone(), result))
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// List registered strategies with their full configuration
///
/// GET /api/v1/strategies
async fn list_strategies(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(StrategiesResponse {
        default: state.registry.default_name().to_string(),
        strategies: state.registry.strategies().cloned().collect(),
    })
}

/// Score a specimen pair
///
/// POST /api/v1/pairing/score
///
/// Request body:
/// ```json
/// {
///   "first": { "name": "string", "latitude": 0.0, "longitude": 0.0, "petrographicType": 5 },
///   "second": { "name": "string", "latitude": 0.0, "longitude": 0.0, "magSus": 4.9 },
///   "strategy": "revised"
/// }
/// ```
async fn score(state: web::Data<AppState>, req: web::Json<ScorePairRequest>) -> impl Responder {
    match score_request(&state, &req) {
        Ok((strategy, result)) => HttpResponse::Ok().json(PairingResponse {
            strategy: strategy.name().to_string(),
            first: req.first.name.clone(),
            second: req.second.name.clone(),
            distance_km: result.distance_km,
            probability: result.probability,
        }),
        Err(response) => response,
    }
}

/// Score a specimen pair and return every factor
///
/// POST /api/v1/pairing/factors
async fn factors(state: web::Data<AppState>, req: web::Json<ScorePairRequest>) -> impl Responder {
    match score_request(&state, &req) {
        Ok((strategy, result)) => HttpResponse::Ok().json(FactorsResponse {
            strategy: strategy.name().to_string(),
            first: req.first.name.clone(),
            second: req.second.name.clone(),
            distance_km: result.distance_km,
            factors: result.factors,
            probability: result.probability,
        }),
        Err(response) => response,
    }
}

/// Score every pair of a specimen list
///
/// POST /api/v1/pairing/batch
///
/// Scoring runs on the blocking thread pool.
async fn batch(state: web::Data<AppState>, req: web::Json<BatchScoreRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for batch request: field_errors={:?}", errors);
        return validation_error_response(errors);
    }

    let strategy = match state.registry.resolve(req.strategy.as_deref()) {
        Ok(strategy) => strategy.clone(),
        Err(e) => return pairing_error_response(&e),
    };

    let specimens: Vec<_> = req.specimens.iter().map(|r| r.to_specimen()).collect();
    let min_probability = req.min_probability.unwrap_or(0.0);
    let limit = (req.limit as usize).min(state.max_batch_results);

    tracing::info!(
        "Batch scoring {} specimens with '{}', min_probability: {}, limit: {}",
        specimens.len(),
        strategy.name(),
        min_probability,
        limit
    );

    let strategy_name = strategy.name().to_string();
    let scorer = BatchScorer::with_provider(strategy, state.provider.clone());

    match web::block(move || scorer.score_all(&specimens, min_probability, limit)).await {
        Ok(result) => HttpResponse::Ok().json(BatchScoreResponse {
            strategy: strategy_name,
            pairs: result.pairs,
            skipped: result.skipped,
            total_pairs: result.total_pairs,
        }),
        Err(e) => {
            tracing::error!("Batch scoring failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Batch scoring failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Geodesic;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn app_state(default: &str) -> AppState {
        AppState {
            registry: Arc::new(StrategyRegistry::builtin(default).unwrap()),
            provider: Arc::new(Geodesic),
            max_batch_results: 50,
        }
    }

    fn specimen_json(name: &str, mag: Value) -> Value {
        json!({
            "name": name,
            "latitude": 10.0,
            "longitude": 20.0,
            "petrographicType": 5,
            "weatheringGrade": 1,
            "faContent": 20.0,
            "fsContent": 15.0,
            "magSus": mag
        })
    }

    #[actix_web::test]
    async fn test_score_identical_pair() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state("revised")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/pairing/score")
            .set_json(json!({
                "first": specimen_json("A", json!(3.0)),
                "second": specimen_json("B", json!(3.0))
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["strategy"], "revised");
        assert_eq!(body["probability"], 1.0);
    }

    #[actix_web::test]
    async fn test_factors_endpoint_rejects_missing_measurement() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state("revised")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/pairing/factors")
            .set_json(json!({
                "first": specimen_json("A", json!(3.0)),
                "second": specimen_json("B", json!("nan")),
                "strategy": "original"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        // The original model has no neutral default for magnetic susceptibility
        assert_eq!(resp.status(), 422);
    }

    #[actix_web::test]
    async fn test_unknown_strategy_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state("revised")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/pairing/score")
            .set_json(json!({
                "first": specimen_json("A", json!(3.0)),
                "second": specimen_json("B", json!(3.0)),
                "strategy": "experimental"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unknown_strategy");
    }

    #[actix_web::test]
    async fn test_invalid_latitude_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state("revised")))
                .configure(configure),
        )
        .await;

        let mut first = specimen_json("A", json!(3.0));
        first["latitude"] = json!(123.0);

        let req = test::TestRequest::post()
            .uri("/pairing/score")
            .set_json(json!({ "first": first, "second": specimen_json("B", json!(3.0)) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_batch_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state("original")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/pairing/batch")
            .set_json(json!({
                "specimens": [
                    specimen_json("A", json!(3.0)),
                    specimen_json("B", json!(3.0)),
                    specimen_json("C", Value::Null)
                ],
                "minProbability": 0.5
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["strategy"], "original");
        assert_eq!(body["totalPairs"], 3);
        assert_eq!(body["pairs"].as_array().unwrap().len(), 1);
        assert_eq!(body["skipped"].as_array().unwrap().len(), 2);
    }

    #[::core::prelude::v1::test]
    fn test_position_errors_map_to_status() {
        let position = PairingError::InvalidPosition {
            specimen: "A".to_string(),
            latitude: f64::NAN,
            longitude: 0.0,
        };
        assert_eq!(pairing_error_response(&position).status(), 400);

        let distance = PairingError::InvalidDistance {
            first: "A".to_string(),
            second: "B".to_string(),
            distance_km: f64::NAN,
        };
        assert_eq!(pairing_error_response(&distance).status(), 500);
    }

    #[actix_web::test]
    async fn test_list_strategies() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state("revised")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/strategies").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["default"], "revised");
        assert_eq!(body["strategies"].as_array().unwrap().len(), 2);
    }
}
