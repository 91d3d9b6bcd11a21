// src/services/crm_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CrmRepository,
    models::crm::{
        CreateCustomerPayload, CustomerDetails, ListCustomersParams, ListCustomersResponse,
        UpdateCustomerPayload,
    },
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    pub async fn create_customer(&self, input: CreateCustomerPayload) -> Result<CustomerDetails, AppError> {
        let id = self.repo.create_customer(input.normalized()).await?;

        tracing::info!("📇 Cliente {} criado", id);

        // Relê com os campos derivados (nome do responsável, último contato)
        self.repo
            .find_details(id, false)
            .await?
            .ok_or_else(|| missing_after_write(id))
    }

    pub async fn list_customers(&self, params: ListCustomersParams) -> Result<ListCustomersResponse, AppError> {
        let (filter, sort_by, sort_order, pagination) = params.into_parts();

        let (customers, total) = self.repo
            .list_customers(&filter, sort_by, sort_order, pagination)
            .await?;

        Ok(ListCustomersResponse {
            customers,
            total,
            page: pagination.page,
            total_pages: pagination.total_pages(total),
        })
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<CustomerDetails, AppError> {
        self.repo
            .find_details(id, true)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn update_customer(&self, id: Uuid, input: UpdateCustomerPayload) -> Result<CustomerDetails, AppError> {
        let updated_id = self.repo
            .update_customer(id, input)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        // O próprio UPDATE pode ter desligado o acompanhamento
        self.repo
            .find_details(updated_id, false)
            .await?
            .ok_or_else(|| missing_after_write(updated_id))
    }

    pub async fn stop_tracking(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.stop_tracking(id).await? {
            return Err(AppError::CustomerNotFound);
        }

        tracing::info!("🗑️ Cliente {} deixou de ser acompanhado", id);
        Ok(())
    }
}

// A linha acabou de ser gravada: não encontrá-la é falha interna, não 404.
fn missing_after_write(id: Uuid) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Cliente {} não encontrado após a escrita", id))
}
