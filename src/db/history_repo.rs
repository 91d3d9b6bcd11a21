// src/db/history_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::is_foreign_key_violation, error::AppError},
    models::history::{
        ContactHistory, CreatePaymentPayload, CreatePurchasePayload, PaymentHistory,
        PurchaseHistory,
    },
};

// Os INSERTs usam `SELECT ... WHERE EXISTS` para que cliente inexistente ou
// não acompanhado resulte em zero linhas, sem gravar nada.

#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CONTATOS
    // =========================================================================

    pub async fn create_contact(
        &self,
        customer_id: Uuid,
        contact_type: &str,
        notes: Option<&str>,
        staff_id: Option<Uuid>,
        contact_date: DateTime<Utc>,
    ) -> Result<Option<ContactHistory>, AppError> {
        let contact = sqlx::query_as::<_, ContactHistory>(
            r#"
            WITH inserted AS (
                INSERT INTO contact_history (customer_id, contact_type, notes, staff_id, contact_date)
                SELECT $1, $2, $3, $4, $5
                WHERE EXISTS (SELECT 1 FROM customers WHERE id = $1 AND is_tracking = TRUE)
                RETURNING id, customer_id, contact_date, contact_type, notes, staff_id, created_at
            )
            SELECT i.id, i.customer_id, i.contact_date, i.contact_type, i.notes, i.staff_id,
                   u.name AS staff_name, i.created_at
            FROM inserted i
            LEFT JOIN users u ON u.id = i.staff_id
            "#,
        )
        .bind(customer_id)
        .bind(contact_type)
        .bind(notes)
        .bind(staff_id)
        .bind(contact_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::InvalidArgument("Staff not found".to_string());
            }
            e.into()
        })?;

        Ok(contact)
    }

    pub async fn list_contacts(&self, customer_id: Uuid) -> Result<Vec<ContactHistory>, AppError> {
        let contacts = sqlx::query_as::<_, ContactHistory>(
            r#"
            SELECT ch.id, ch.customer_id, ch.contact_date, ch.contact_type, ch.notes,
                   ch.staff_id, u.name AS staff_name, ch.created_at
            FROM contact_history ch
            LEFT JOIN users u ON u.id = ch.staff_id
            WHERE ch.customer_id = $1
            ORDER BY ch.contact_date DESC, ch.created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    // =========================================================================
    //  COMPRAS
    // =========================================================================

    pub async fn create_purchase(
        &self,
        input: &CreatePurchasePayload,
    ) -> Result<Option<PurchaseHistory>, AppError> {
        let purchase = sqlx::query_as::<_, PurchaseHistory>(
            r#"
            INSERT INTO purchase_history (customer_id, product, amount, purchase_date, notes)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM customers WHERE id = $1 AND is_tracking = TRUE)
            RETURNING id, customer_id, product, amount, purchase_date, notes, created_at
            "#,
        )
        .bind(input.customer_id)
        .bind(&input.product)
        .bind(input.amount)
        .bind(input.purchase_date)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    pub async fn list_purchases(&self, customer_id: Uuid) -> Result<Vec<PurchaseHistory>, AppError> {
        let purchases = sqlx::query_as::<_, PurchaseHistory>(
            r#"
            SELECT id, customer_id, product, amount, purchase_date, notes, created_at
            FROM purchase_history
            WHERE customer_id = $1
            ORDER BY purchase_date DESC, created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    pub async fn create_payment(
        &self,
        input: &CreatePaymentPayload,
    ) -> Result<Option<PaymentHistory>, AppError> {
        let payment = sqlx::query_as::<_, PaymentHistory>(
            r#"
            INSERT INTO payment_history (customer_id, amount, payment_date, payment_method, notes)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM customers WHERE id = $1 AND is_tracking = TRUE)
            RETURNING id, customer_id, amount, payment_date, payment_method, notes, created_at
            "#,
        )
        .bind(input.customer_id)
        .bind(input.amount)
        .bind(input.payment_date)
        .bind(&input.payment_method)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn list_payments(&self, customer_id: Uuid) -> Result<Vec<PaymentHistory>, AppError> {
        let payments = sqlx::query_as::<_, PaymentHistory>(
            r#"
            SELECT id, customer_id, amount, payment_date, payment_method, notes, created_at
            FROM payment_history
            WHERE customer_id = $1
            ORDER BY payment_date DESC, created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}
