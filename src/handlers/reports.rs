// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::AdminOnly,
    models::reports::{ExportResponse, ReportsParams, ReportsResponse},
};

// GET /api/reports
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(ReportsParams),
    responses(
        (status = 200, description = "Estatísticas agregadas", body = ReportsResponse),
        (status = 400, description = "Intervalo de datas inválido"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_reports(
    State(app_state): State<AppState>,
    _admin: AdminOnly,
    WithRejection(Query(params), _): WithRejection<Query<ReportsParams>, AppError>,
) -> Result<Json<ReportsResponse>, AppError> {
    let reports = app_state.report_service.get_reports(params).await?;
    Ok(Json(reports))
}

// GET /api/export/customers
#[utoipa::path(
    get,
    path = "/api/export/customers",
    tag = "Reports",
    responses(
        (status = 200, description = "CSV com os clientes acompanhados", body = ExportResponse),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_customers(
    State(app_state): State<AppState>,
    _admin: AdminOnly,
) -> Result<Json<ExportResponse>, AppError> {
    let csv_data = app_state.report_service.export_customers_csv().await?;
    Ok(Json(ExportResponse { csv_data }))
}

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Servidor no ar"))
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
