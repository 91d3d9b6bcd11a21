// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::crm::{
        CreateCustomerPayload, CustomerDetails, ListCustomersParams, ListCustomersResponse,
        UpdateCustomerPayload,
    },
};

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = CustomerDetails),
        (status = 400, description = "Dados inválidos ou responsável inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCustomerPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    // Normaliza antes de validar: email "" vira None
    let payload = payload.normalized();
    payload.validate()?;

    let customer = app_state.crm_service.create_customer(payload).await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(ListCustomersParams),
    responses(
        (status = 200, description = "Página de clientes acompanhados", body = ListCustomersResponse),
        (status = 400, description = "Filtro, ordenação ou paginação inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<ListCustomersParams>, AppError>,
) -> Result<Json<ListCustomersResponse>, AppError> {
    params.validate()?;

    let response = app_state.crm_service.list_customers(params).await?;
    Ok(Json(response))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente com responsável e último contato", body = CustomerDetails),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<CustomerDetails>, AppError> {
    let customer = app_state.crm_service.get_customer(id).await?;
    Ok(Json(customer))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    request_body = UpdateCustomerPayload,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = CustomerDetails),
        (status = 400, description = "Nenhum campo para atualizar ou dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateCustomerPayload>, AppError>,
) -> Result<Json<CustomerDetails>, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let customer = app_state.crm_service.update_customer(id, payload).await?;
    Ok(Json(customer))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente deixou de ser acompanhado"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<StatusCode, AppError> {
    app_state.crm_service.stop_tracking(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
