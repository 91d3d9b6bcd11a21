// src/handlers/history.rs

use axum::{
    extract::{Path, State},
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
    models::history::{
        ContactHistory, ContactHistoryResponse, CreateContactPayload, CreatePaymentPayload,
        CreatePurchasePayload, PaymentHistory, PaymentHistoryResponse, PurchaseHistory,
        PurchaseHistoryResponse,
    },
};

// =============================================================================
//  CONTATOS
// =============================================================================

// POST /api/contact-history
#[utoipa::path(
    post,
    path = "/api/contact-history",
    tag = "History",
    request_body = CreateContactPayload,
    responses(
        (status = 201, description = "Contato registrado", body = ContactHistory),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_contact(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateContactPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let contact = app_state.history_service.add_contact(payload).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

// GET /api/customers/{id}/contact-history
#[utoipa::path(
    get,
    path = "/api/customers/{id}/contact-history",
    tag = "History",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Contatos, mais recentes primeiro", body = ContactHistoryResponse),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contacts(
    State(app_state): State<AppState>,
    WithRejection(Path(customer_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<ContactHistoryResponse>, AppError> {
    let contacts = app_state.history_service.list_contacts(customer_id).await?;
    Ok(Json(ContactHistoryResponse { contacts }))
}

// =============================================================================
//  COMPRAS
// =============================================================================

// POST /api/purchase-history
#[utoipa::path(
    post,
    path = "/api/purchase-history",
    tag = "History",
    request_body = CreatePurchasePayload,
    responses(
        (status = 201, description = "Compra registrada", body = PurchaseHistory),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePurchasePayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let purchase = app_state.history_service.add_purchase(payload).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

// GET /api/customers/{id}/purchase-history
#[utoipa::path(
    get,
    path = "/api/customers/{id}/purchase-history",
    tag = "History",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Compras, mais recentes primeiro", body = PurchaseHistoryResponse),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    WithRejection(Path(customer_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<PurchaseHistoryResponse>, AppError> {
    let purchases = app_state.history_service.list_purchases(customer_id).await?;
    Ok(Json(PurchaseHistoryResponse { purchases }))
}

// =============================================================================
//  PAGAMENTOS
// =============================================================================

// POST /api/payment-history
#[utoipa::path(
    post,
    path = "/api/payment-history",
    tag = "History",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado", body = PaymentHistory),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePaymentPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let payment = app_state.history_service.add_payment(payload).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/customers/{id}/payment-history
#[utoipa::path(
    get,
    path = "/api/customers/{id}/payment-history",
    tag = "History",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Pagamentos, mais recentes primeiro", body = PaymentHistoryResponse),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    WithRejection(Path(customer_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<PaymentHistoryResponse>, AppError> {
    let payments = app_state.history_service.list_payments(customer_id).await?;
    Ok(Json(PaymentHistoryResponse { payments }))
}
