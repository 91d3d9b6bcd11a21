// src/db/crm_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{is_foreign_key_violation, PartialUpdate},
        error::AppError,
    },
    models::{
        crm::{
            dedup_products, CreateCustomerPayload, Customer, CustomerDetails, CustomerFilter,
            CustomerSortColumn, Pagination, SortOrder, UpdateCustomerPayload,
        },
        history::ContactHistory,
    },
};

const CUSTOMER_COLUMNS: &str = r#"
    c.id, c.name, c.phone, c.email, c.address, c.company_name, c.customer_type,
    c.business_type, c.products, c.scale, c.province_city, c.customer_source,
    c.staff_in_charge_id, c.stage, c.level, c.contact_status, c.customer_feedback,
    c.notes, c.appointment_date, c.appointment_reminder, c.is_tracking,
    c.created_at, c.updated_at"#;

// Nome do responsável + último contato (LATERAL ordenado por contact_date)
const CUSTOMER_DETAILS_JOINS: &str = r#"
    u.name AS staff_in_charge_name,
    lc.id AS latest_contact_id,
    lc.contact_date AS latest_contact_date,
    lc.contact_type AS latest_contact_type,
    lc.notes AS latest_contact_notes,
    lc.staff_id AS latest_contact_staff_id,
    lc.staff_name AS latest_contact_staff_name,
    lc.created_at AS latest_contact_created_at
FROM customers c
LEFT JOIN users u ON u.id = c.staff_in_charge_id
LEFT JOIN LATERAL (
    SELECT ch.id, ch.contact_date, ch.contact_type, ch.notes, ch.staff_id,
           ch.created_at, su.name AS staff_name
    FROM contact_history ch
    LEFT JOIN users su ON su.id = ch.staff_id
    WHERE ch.customer_id = c.id
    ORDER BY ch.contact_date DESC, ch.created_at DESC
    LIMIT 1
) lc ON TRUE"#;

// Linha "achatada" do SELECT acima
#[derive(Debug, FromRow)]
struct CustomerDetailsRow {
    #[sqlx(flatten)]
    customer: Customer,
    staff_in_charge_name: Option<String>,
    latest_contact_id: Option<Uuid>,
    latest_contact_date: Option<DateTime<Utc>>,
    latest_contact_type: Option<String>,
    latest_contact_notes: Option<String>,
    latest_contact_staff_id: Option<Uuid>,
    latest_contact_staff_name: Option<String>,
    latest_contact_created_at: Option<DateTime<Utc>>,
}

impl From<CustomerDetailsRow> for CustomerDetails {
    fn from(row: CustomerDetailsRow) -> Self {
        let latest_contact = match (
            row.latest_contact_id,
            row.latest_contact_date,
            row.latest_contact_type,
            row.latest_contact_created_at,
        ) {
            (Some(id), Some(contact_date), Some(contact_type), Some(created_at)) => {
                Some(ContactHistory {
                    id,
                    customer_id: row.customer.id,
                    contact_date,
                    contact_type,
                    notes: row.latest_contact_notes,
                    staff_id: row.latest_contact_staff_id,
                    staff_name: row.latest_contact_staff_name,
                    created_at,
                })
            }
            _ => None,
        };

        CustomerDetails {
            customer: row.customer,
            staff_in_charge_name: row.staff_in_charge_name,
            latest_contact,
        }
    }
}

fn details_select<'args>() -> QueryBuilder<'args, Postgres> {
    let mut query = QueryBuilder::new("SELECT ");
    query.push(CUSTOMER_COLUMNS).push(",").push(CUSTOMER_DETAILS_JOINS);
    query
}

/// `%` e `_` do termo de busca valem como caracteres literais.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// WHERE comum à contagem e à página. Filtros ausentes não entram na query.
fn push_customer_filters<'args>(query: &mut QueryBuilder<'args, Postgres>, filter: &CustomerFilter) {
    query.push(" WHERE c.is_tracking = TRUE");

    if let Some(staff_id) = filter.staff_id {
        query.push(" AND c.staff_in_charge_id = ").push_bind(staff_id);
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        query
            .push(" AND (c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR c.company_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR c.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR c.phone ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(customer_type) = filter.customer_type {
        query.push(" AND c.customer_type = ").push_bind(customer_type);
    }

    if let Some(stage) = filter.stage {
        query.push(" AND c.stage = ").push_bind(stage);
    }

    if let Some(level) = filter.level {
        query.push(" AND c.level = ").push_bind(level);
    }

    if let Some(contact_status) = filter.contact_status {
        query.push(" AND c.contact_status = ").push_bind(contact_status);
    }
}

fn build_count_query<'args>(filter: &CustomerFilter) -> QueryBuilder<'args, Postgres> {
    let mut query = QueryBuilder::new("SELECT COUNT(*) FROM customers c");
    push_customer_filters(&mut query, filter);
    query
}

fn build_page_query<'args>(
    filter: &CustomerFilter,
    sort_by: CustomerSortColumn,
    sort_order: SortOrder,
    pagination: Pagination,
) -> QueryBuilder<'args, Postgres> {
    let mut query = details_select();
    push_customer_filters(&mut query, filter);

    // Coluna e direção vêm de enums, nunca do texto da requisição.
    // c.id desempata para a paginação ser estável.
    query
        .push(" ORDER BY ")
        .push(sort_by.column())
        .push(" ")
        .push(sort_order.keyword())
        .push(" NULLS LAST, c.id ")
        .push(sort_order.keyword())
        .push(" LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    query
}

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    /// Insere o cliente e devolve o id gerado.
    pub async fn create_customer(&self, input: CreateCustomerPayload) -> Result<Uuid, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO customers (
                name, phone, email, address, company_name, customer_type, business_type,
                products, scale, province_city, customer_source, staff_in_charge_id,
                stage, level, contact_status, customer_feedback, notes,
                appointment_date, appointment_reminder
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.company_name)
        .bind(input.customer_type)
        .bind(&input.business_type)
        .bind(&input.products)
        .bind(&input.scale)
        .bind(&input.province_city)
        .bind(&input.customer_source)
        .bind(input.staff_in_charge_id)
        .bind(input.stage)
        .bind(input.level)
        .bind(input.contact_status)
        .bind(&input.customer_feedback)
        .bind(&input.notes)
        .bind(input.appointment_date)
        .bind(&input.appointment_reminder)
        .fetch_one(&self.pool)
        .await
        .map_err(map_staff_reference_error)?;

        Ok(id)
    }

    /// UPDATE parcial. Só alcança clientes com is_tracking = TRUE;
    /// devolve None se o cliente não existe ou não é mais acompanhado.
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomerPayload,
    ) -> Result<Option<Uuid>, AppError> {
        let mut update = PartialUpdate::new("customers");
        update
            .set_non_empty("name", input.name)
            .set("phone", input.phone)
            .set("email", input.email)
            .set("address", input.address)
            .set("company_name", input.company_name)
            .set("customer_type", input.customer_type)
            .set("business_type", input.business_type)
            .set("products", input.products.map(dedup_products))
            .set("scale", input.scale)
            .set("province_city", input.province_city)
            .set("customer_source", input.customer_source)
            .set("staff_in_charge_id", input.staff_in_charge_id)
            .set("stage", input.stage)
            .set("level", input.level)
            .set("contact_status", input.contact_status)
            .set("customer_feedback", input.customer_feedback)
            .set("notes", input.notes)
            .set("appointment_date", input.appointment_date)
            .set("appointment_reminder", input.appointment_reminder)
            .set("is_tracking", input.is_tracking);

        tracing::debug!("UPDATE customers {} com {} campo(s)", id, update.field_count());
        let mut query = update.finish()?;
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND is_tracking = TRUE RETURNING id");

        let updated = query
            .build_query_scalar::<Uuid>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_staff_reference_error)?;

        Ok(updated)
    }

    /// Soft delete: só vira a flag. Devolve false se nada foi alterado.
    pub async fn stop_tracking(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE customers SET is_tracking = FALSE, updated_at = NOW() WHERE id = $1 AND is_tracking = TRUE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn is_tracked(&self, id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1 AND is_tracking = TRUE)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Cliente com nome do responsável e último contato.
    /// `tracked_only = false` é usado logo após um UPDATE que pode ter desligado a flag.
    pub async fn find_details(
        &self,
        id: Uuid,
        tracked_only: bool,
    ) -> Result<Option<CustomerDetails>, AppError> {
        let mut query = details_select();
        query.push(" WHERE c.id = ").push_bind(id);
        if tracked_only {
            query.push(" AND c.is_tracking = TRUE");
        }

        let row = query
            .build_query_as::<CustomerDetailsRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CustomerDetails::from))
    }

    /// Devolve a página pedida e o total de linhas que casam com os filtros.
    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
        sort_by: CustomerSortColumn,
        sort_order: SortOrder,
        pagination: Pagination,
    ) -> Result<(Vec<CustomerDetails>, i64), AppError> {
        let total = build_count_query(filter)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let rows = build_page_query(filter, sort_by, sort_order, pagination)
            .build_query_as::<CustomerDetailsRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(CustomerDetails::from).collect(), total))
    }

    /// Todos os clientes acompanhados, mais recentes primeiro (exportação).
    pub async fn list_for_export(&self) -> Result<Vec<CustomerDetails>, AppError> {
        let mut query = details_select();
        query.push(" WHERE c.is_tracking = TRUE ORDER BY c.created_at DESC");

        let rows = query
            .build_query_as::<CustomerDetailsRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CustomerDetails::from).collect())
    }
}

// staff_in_charge_id apontando para usuário inexistente
fn map_staff_reference_error(e: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&e) {
        return AppError::InvalidArgument("Staff in charge not found".to_string());
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crm::{ContactStatus, CustomerType, Level, Stage};

    fn normalize(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn count_query_without_filters_only_checks_tracking() {
        let query = build_count_query(&CustomerFilter::default());
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM customers c WHERE c.is_tracking = TRUE"
        );
    }

    #[test]
    fn filters_are_anded_and_bound() {
        let filter = CustomerFilter {
            staff_id: Some(Uuid::nil()),
            search: Some("acme".into()),
            customer_type: Some(CustomerType::Corporate),
            stage: Some(Stage::Care),
            level: Some(Level::Cold),
            contact_status: Some(ContactStatus::NotCalled),
        };
        let query = build_count_query(&filter);
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM customers c WHERE c.is_tracking = TRUE \
             AND c.staff_in_charge_id = $1 \
             AND (c.name ILIKE $2 ESCAPE '\\' OR c.company_name ILIKE $3 ESCAPE '\\' \
             OR c.email ILIKE $4 ESCAPE '\\' OR c.phone ILIKE $5 ESCAPE '\\') \
             AND c.customer_type = $6 AND c.stage = $7 AND c.level = $8 AND c.contact_status = $9"
        );
    }

    #[test]
    fn like_wildcards_in_search_are_escaped() {
        assert_eq!(escape_like("acme"), "acme");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
    }

    #[test]
    fn page_query_orders_and_paginates() {
        let filter = CustomerFilter {
            stage: Some(Stage::Purchase),
            ..Default::default()
        };
        let query = build_page_query(
            &filter,
            CustomerSortColumn::Name,
            SortOrder::Asc,
            Pagination { page: 2, limit: 10 },
        );
        let sql = normalize(query.sql());

        assert!(sql.starts_with("SELECT c.id, c.name,"));
        assert!(sql.contains("LEFT JOIN LATERAL"));
        assert!(sql.ends_with(
            "WHERE c.is_tracking = TRUE AND c.stage = $1 \
             ORDER BY c.name ASC NULLS LAST, c.id ASC LIMIT $2 OFFSET $3"
        ));
    }

    #[test]
    fn default_sort_is_updated_at_desc() {
        let query = build_page_query(
            &CustomerFilter::default(),
            CustomerSortColumn::default(),
            SortOrder::default(),
            Pagination { page: 1, limit: 50 },
        );
        assert!(normalize(query.sql()).contains("ORDER BY c.updated_at DESC NULLS LAST, c.id DESC"));
    }
}
