// src/models/reports.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::crm::{empty_string_as_none, CustomerType};

// 1. Clientes por responsável
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StaffCustomerStats {
    // None = clientes sem responsável
    pub staff_id: Option<Uuid>,
    #[schema(example = "Unassigned")]
    pub staff_name: String,
    pub customer_count: i64,
}

// 2. Interações por dia
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct InteractionStats {
    pub date: NaiveDate,
    pub interaction_count: i64,
}

// 3. Clientes por tipo
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CustomerTypeStats {
    pub customer_type: CustomerType,
    pub count: i64,
}

// 4. Clientes por produto (unnest do array)
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ProductStats {
    pub product: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportsResponse {
    pub staff_customer_stats: Vec<StaffCustomerStats>,
    pub interaction_stats: Vec<InteractionStats>,
    pub customer_type_stats: Vec<CustomerTypeStats>,
    pub product_type_stats: Vec<ProductStats>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportsParams {
    /// YYYY-MM-DD, padrão: 30 dias antes do fim
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    /// YYYY-MM-DD inclusivo, padrão: hoje
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    pub csv_data: String,
}
