// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::history::ContactHistory;

// --- ENUMS (mapeiam os CREATE TYPE do banco) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "customer_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Corporate,
    Service,
    Individual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "customer_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Care,
    SendQuote,
    Consideration,
    Purchase,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "customer_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Cold,
    Warm,
    Hot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "contact_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    NotCalled,
    Called,
    Following,
    Unreachable,
}

// Valor textual igual ao do banco/JSON, usado no CSV.
macro_rules! impl_as_str {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }
    };
}

impl_as_str!(CustomerType { Corporate => "corporate", Service => "service", Individual => "individual" });
impl_as_str!(Stage { Care => "care", SendQuote => "send_quote", Consideration => "consideration", Purchase => "purchase" });
impl_as_str!(Level { Cold => "cold", Warm => "warm", Hot => "hot" });
impl_as_str!(ContactStatus { NotCalled => "not_called", Called => "called", Following => "following", Unreachable => "unreachable" });

// --- CATÁLOGO DE PRODUTOS ---

pub const AVAILABLE_PRODUCTS: [&str; 4] = ["PM Accounting", "PM HKD", "PM Shopnet", "Equipment"];

fn validate_products(products: &[String]) -> Result<(), ValidationError> {
    if let Some(unknown) = products.iter().find(|p| !AVAILABLE_PRODUCTS.contains(&p.as_str())) {
        let mut err = ValidationError::new("unknown_product");
        err.message = Some(format!("Unknown product '{}'", unknown).into());
        return Err(err);
    }
    Ok(())
}

/// Remove duplicados mantendo a ordem da primeira ocorrência.
pub fn dedup_products(products: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(products.len());
    for product in products {
        if !unique.contains(&product) {
            unique.push(product);
        }
    }
    unique
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Acme")]
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub customer_type: CustomerType,
    pub business_type: Option<String>,
    #[schema(example = json!(["PM HKD"]))]
    pub products: Vec<String>,
    pub scale: Option<String>,
    pub province_city: Option<String>,
    pub customer_source: Option<String>,
    pub staff_in_charge_id: Option<Uuid>,
    pub stage: Stage,
    pub level: Level,
    pub contact_status: ContactStatus,
    pub customer_feedback: Option<String>,
    pub notes: Option<String>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub appointment_reminder: Option<String>,
    pub is_tracking: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cliente + campos derivados na leitura (nunca gravados)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerDetails {
    #[serde(flatten)]
    pub customer: Customer,
    pub staff_in_charge_name: Option<String>,
    pub latest_contact: Option<ContactHistory>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Acme")]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub customer_type: CustomerType,
    pub business_type: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_products"))]
    #[schema(example = json!(["PM HKD"]))]
    pub products: Vec<String>,
    pub scale: Option<String>,
    pub province_city: Option<String>,
    pub customer_source: Option<String>,
    pub staff_in_charge_id: Option<Uuid>,
    pub stage: Stage,
    pub level: Level,
    pub contact_status: ContactStatus,
    pub customer_feedback: Option<String>,
    pub notes: Option<String>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub appointment_reminder: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CreateCustomerPayload {
    // O formulário envia "" para campos opcionais não preenchidos.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: blank_to_none(self.phone),
            email: blank_to_none(self.email),
            address: blank_to_none(self.address),
            company_name: blank_to_none(self.company_name),
            business_type: blank_to_none(self.business_type),
            products: dedup_products(self.products),
            scale: blank_to_none(self.scale),
            province_city: blank_to_none(self.province_city),
            customer_source: blank_to_none(self.customer_source),
            customer_feedback: blank_to_none(self.customer_feedback),
            notes: blank_to_none(self.notes),
            appointment_reminder: blank_to_none(self.appointment_reminder),
            ..self
        }
    }
}

// Campo ausente = não mexe na coluna. Nas colunas que aceitam NULL,
// `null` explícito limpa o valor (Some(None)).
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerPayload {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(email(message = "Invalid email address"))]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub company_name: Option<Option<String>>,
    pub customer_type: Option<CustomerType>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub business_type: Option<Option<String>>,
    #[validate(custom(function = "validate_products"))]
    pub products: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub scale: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub province_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub customer_source: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub staff_in_charge_id: Option<Option<Uuid>>,
    pub stage: Option<Stage>,
    pub level: Option<Level>,
    pub contact_status: Option<ContactStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub customer_feedback: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub appointment_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub appointment_reminder: Option<Option<String>>,
    pub is_tracking: Option<bool>,
}

impl UpdateCustomerPayload {
    // E-mail em branco limpa a coluna em vez de gravar "".
    pub fn normalized(self) -> Self {
        let email = match self.email {
            Some(Some(email)) if email.trim().is_empty() => Some(None),
            Some(Some(email)) => Some(Some(email.trim().to_string())),
            other => other,
        };
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email,
            products: self.products.map(dedup_products),
            ..self
        }
    }
}

/// Distingue campo ausente (`None`, via `#[serde(default)]`) de `null`
/// explícito (`Some(None)`).
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- LISTAGEM ---

/// Colunas ordenáveis. Qualquer outro valor é rejeitado na desserialização.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSortColumn {
    Name,
    CompanyName,
    CustomerType,
    Stage,
    Level,
    ContactStatus,
    AppointmentDate,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl CustomerSortColumn {
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "c.name",
            Self::CompanyName => "c.company_name",
            Self::CustomerType => "c.customer_type",
            Self::Stage => "c.stage",
            Self::Level => "c.level",
            Self::ContactStatus => "c.contact_status",
            Self::AppointmentDate => "c.appointment_date",
            Self::CreatedAt => "c.created_at",
            Self::UpdatedAt => "c.updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 50;

/// Parâmetros de query de GET /api/customers.
/// Parâmetros vazios (`?stage=`) contam como ausentes.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCustomersParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub staff_id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub customer_type: Option<CustomerType>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub stage: Option<Stage>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub level: Option<Level>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub contact_status: Option<ContactStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_by: Option<CustomerSortColumn>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_order: Option<SortOrder>,
    #[validate(range(min = 1, max = 1_000_000, message = "Page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,
}

/// Filtros já resolvidos (defaults aplicados) que o repositório consome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerFilter {
    pub staff_id: Option<Uuid>,
    pub search: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub stage: Option<Stage>,
    pub level: Option<Level>,
    pub contact_status: Option<ContactStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + self.limit - 1) / self.limit
    }
}

impl ListCustomersParams {
    pub fn into_parts(self) -> (CustomerFilter, CustomerSortColumn, SortOrder, Pagination) {
        let filter = CustomerFilter {
            staff_id: self.staff_id,
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            customer_type: self.customer_type,
            stage: self.stage,
            level: self.level,
            contact_status: self.contact_status,
        };
        let pagination = Pagination {
            page: self.page.unwrap_or(DEFAULT_PAGE),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
        };
        (
            filter,
            self.sort_by.unwrap_or_default(),
            self.sort_order.unwrap_or_default(),
            pagination,
        )
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCustomersResponse {
    pub customers: Vec<CustomerDetails>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let de = serde::de::value::StrDeserializer::<D::Error>::new(value);
            T::deserialize(de).map(Some)
        }
    }
}
