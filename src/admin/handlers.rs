use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::load_balancer::EndpointStatus;
use crate::orchestrator::{FailoverOrchestrator, ServiceStatus};

pub async fn get_status(
    State(orchestrator): State<Arc<FailoverOrchestrator>>,
) -> (StatusCode, Json<ServiceStatus>) {
    let status = orchestrator.service_status();
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn get_endpoints(
    State(orchestrator): State<Arc<FailoverOrchestrator>>,
) -> Json<Vec<EndpointStatus>> {
    let endpoints = orchestrator.load_balancer().endpoints();
    Json(endpoints.iter().map(|e| e.snapshot()).collect())
}

pub async fn get_endpoint(
    State(orchestrator): State<Arc<FailoverOrchestrator>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EndpointStatus>, StatusCode> {
    orchestrator
        .load_balancer()
        .get_endpoint(id)
        .map(|e| Json(e.snapshot()))
        .ok_or(StatusCode::NOT_FOUND)
}
