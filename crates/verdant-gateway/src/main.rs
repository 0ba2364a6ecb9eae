//! Verdant Gateway Binary
//!
//! Thin REST facade over the control loop: every route delegates straight
//! to the [`Controller`] and maps its errors onto HTTP statuses. No
//! control logic lives here.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verdant_core::{
    ActuatorState, ControlConfig, ControlError, Controller, GatewayConfig, VERDANT_VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Verdant gateway v{}", VERDANT_VERSION);

    let control_config = ControlConfig::load()?;
    let gateway_config = GatewayConfig::load()?;
    info!(
        history_capacity = control_config.history_capacity,
        learning_rate = control_config.learning_rate,
        mapped_keys = control_config.mappings.len(),
        "loaded control configuration"
    );

    let controller = Arc::new(Controller::new(control_config)?);

    let addr: SocketAddr = format!("{}:{}", gateway_config.host, gateway_config.port).parse()?;
    let app = router(controller);

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal");
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Shutting down Verdant gateway");
    Ok(())
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

fn router(controller: Arc<Controller>) -> Router {
    // Allow dashboard connections from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
        .route("/api/v1/version", get(version))
        .route("/api/v1/readings", post(ingest_readings))
        .route("/api/v1/readings/latest", get(latest_readings))
        .route("/api/v1/history", get(history))
        .route("/api/v1/target", get(get_target).put(set_target))
        .route("/api/v1/recommendations/:key", get(recommendation))
        .route("/api/v1/actuators", get(list_actuators))
        .route(
            "/api/v1/actuators/:id",
            get(read_actuator).put(write_actuator),
        )
        .route("/api/v1/stats", get(stats))
        .layer(cors)
        .with_state(controller)
}

async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "service": "verdant-gateway",
        "version": VERDANT_VERSION,
        "description": "Adaptive actuator control loop for aquaponics environments",
    }))
}

/// Ingest a batch of readings and run one control pass over it
async fn ingest_readings(
    State(controller): State<Arc<Controller>>,
    Json(readings): Json<HashMap<String, f64>>,
) -> Json<serde_json::Value> {
    let count = controller.ingest(readings);
    let outcome = controller.tick();
    Json(json!({
        "ingested": count,
        "keys_stepped": outcome.keys_stepped,
    }))
}

async fn latest_readings(
    State(controller): State<Arc<Controller>>,
) -> Json<HashMap<String, f64>> {
    Json(controller.latest())
}

async fn history(
    State(controller): State<Arc<Controller>>,
    Query(query): Query<HistoryQuery>,
) -> Json<serde_json::Value> {
    let entries = controller.history(query.limit.unwrap_or(50));
    Json(json!({
        "count": entries.len(),
        "entries": entries,
    }))
}

async fn get_target(State(controller): State<Arc<Controller>>) -> Json<HashMap<String, f64>> {
    Json(controller.target())
}

async fn set_target(
    State(controller): State<Arc<Controller>>,
    Json(targets): Json<HashMap<String, f64>>,
) -> Json<serde_json::Value> {
    let keys = targets.len();
    controller.set_target(targets);
    Json(json!({"replaced": true, "keys": keys}))
}

async fn recommendation(
    State(controller): State<Arc<Controller>>,
    Path(key): Path<String>,
) -> Json<serde_json::Value> {
    let recommendation = controller.recommend(&key);
    Json(json!({
        "key": key,
        "recommendation": recommendation,
    }))
}

async fn list_actuators(
    State(controller): State<Arc<Controller>>,
) -> Json<HashMap<String, ActuatorState>> {
    Json(controller.actuators())
}

async fn read_actuator(
    State(controller): State<Arc<Controller>>,
    Path(id): Path<String>,
) -> Result<Json<ActuatorState>, (StatusCode, Json<serde_json::Value>)> {
    controller
        .read_actuator(&id)
        .map(Json)
        .map_err(error_response)
}

async fn write_actuator(
    State(controller): State<Arc<Controller>>,
    Path(id): Path<String>,
    Json(state): Json<ActuatorState>,
) -> Result<Json<ActuatorState>, (StatusCode, Json<serde_json::Value>)> {
    controller
        .write_actuator(&id, state)
        .map(Json)
        .map_err(error_response)
}

async fn stats(State(controller): State<Arc<Controller>>) -> Json<serde_json::Value> {
    let stats = controller.stats();
    Json(json!({
        "mapped_keys": stats.mapped_keys,
        "qtable_rows": stats.qtable_rows,
        "history_len": stats.history_len,
        "history_capacity": stats.history_capacity,
        "ticks_run": stats.ticks_run,
        "last_keys_stepped": stats.last_keys_stepped,
    }))
}

fn error_response(err: ControlError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        ControlError::ActuatorNotFound(_) => StatusCode::NOT_FOUND,
        ControlError::StateKindMismatch { .. } | ControlError::InvalidPercent { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ControlError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": err.to_string()})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_response(ControlError::ActuatorNotFound("x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(ControlError::InvalidPercent {
            id: "grow_lights".into(),
            value: f64::NAN,
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_router_builds() {
        let controller = Arc::new(Controller::new(ControlConfig::default()).unwrap());
        let _app = router(controller);
    }
}
