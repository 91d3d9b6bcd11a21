// src/db/report_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::reports::{CustomerTypeStats, InteractionStats, ProductStats, StaffCustomerStats},
};

// Quatro agregações independentes; cada chamada recalcula tudo.
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Clientes acompanhados por responsável
    pub async fn staff_customer_stats(&self) -> Result<Vec<StaffCustomerStats>, AppError> {
        let data = sqlx::query_as::<_, StaffCustomerStats>(
            r#"
            SELECT
                c.staff_in_charge_id AS staff_id,
                COALESCE(u.name, 'Unassigned') AS staff_name,
                COUNT(c.id) AS customer_count
            FROM customers c
            LEFT JOIN users u ON c.staff_in_charge_id = u.id
            WHERE c.is_tracking = TRUE
            GROUP BY c.staff_in_charge_id, u.name
            ORDER BY customer_count DESC, staff_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // 2. Interações (contact_history) por dia no intervalo [start, end)
    pub async fn interaction_stats(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InteractionStats>, AppError> {
        let data = sqlx::query_as::<_, InteractionStats>(
            r#"
            SELECT
                (ch.contact_date AT TIME ZONE 'UTC')::date AS date,
                COUNT(*) AS interaction_count
            FROM contact_history ch
            WHERE ch.contact_date >= $1 AND ch.contact_date < $2
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // 3. Clientes acompanhados por tipo
    pub async fn customer_type_stats(&self) -> Result<Vec<CustomerTypeStats>, AppError> {
        let data = sqlx::query_as::<_, CustomerTypeStats>(
            r#"
            SELECT customer_type, COUNT(*) AS count
            FROM customers
            WHERE is_tracking = TRUE
            GROUP BY customer_type
            ORDER BY count DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // 4. Clientes acompanhados por produto (unnest do array)
    pub async fn product_stats(&self) -> Result<Vec<ProductStats>, AppError> {
        let data = sqlx::query_as::<_, ProductStats>(
            r#"
            SELECT product, COUNT(*) AS count
            FROM customers c
            CROSS JOIN LATERAL unnest(c.products) AS product
            WHERE c.is_tracking = TRUE
            GROUP BY product
            ORDER BY count DESC, product ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }
}
