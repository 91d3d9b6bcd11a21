// src/models/history.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Registros de histórico são imutáveis: só existem create e list.

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ContactHistory {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contact_date: DateTime<Utc>,
    #[schema(example = "phone")]
    pub contact_type: String,
    pub notes: Option<String>,
    pub staff_id: Option<Uuid>,
    // Vem do JOIN com users
    pub staff_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PurchaseHistory {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "PM HKD")]
    pub product: String,
    #[schema(value_type = f64, example = 1500.0)]
    pub amount: Decimal,
    pub purchase_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PaymentHistory {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(value_type = f64, example = 750.0)]
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Amount cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateContactPayload {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Contact type is required"))]
    #[schema(example = "phone")]
    pub contact_type: String,
    pub notes: Option<String>,
    pub staff_id: Option<Uuid>,
    // Se não vier, usa o horário atual
    pub contact_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchasePayload {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Product is required"))]
    pub product: String,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub purchase_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentPayload {
    pub customer_id: Uuid,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactHistoryResponse {
    pub contacts: Vec<ContactHistory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseHistoryResponse {
    pub purchases: Vec<PurchaseHistory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentHistoryResponse {
    pub payments: Vec<PaymentHistory>,
}
