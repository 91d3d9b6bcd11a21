// src/services/history_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, HistoryRepository},
    models::history::{
        ContactHistory, CreateContactPayload, CreatePaymentPayload, CreatePurchasePayload,
        PaymentHistory, PurchaseHistory,
    },
};

#[derive(Clone)]
pub struct HistoryService {
    repo: HistoryRepository,
    crm_repo: CrmRepository,
}

impl HistoryService {
    pub fn new(repo: HistoryRepository, crm_repo: CrmRepository) -> Self {
        Self { repo, crm_repo }
    }

    // Escritas: o próprio INSERT confere se o cliente é acompanhado.

    pub async fn add_contact(&self, input: CreateContactPayload) -> Result<ContactHistory, AppError> {
        let notes = input.notes.as_deref().filter(|n| !n.trim().is_empty());
        let contact_date = input.contact_date.unwrap_or_else(Utc::now);

        self.repo
            .create_contact(input.customer_id, input.contact_type.trim(), notes, input.staff_id, contact_date)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn add_purchase(&self, input: CreatePurchasePayload) -> Result<PurchaseHistory, AppError> {
        self.repo
            .create_purchase(&input)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn add_payment(&self, input: CreatePaymentPayload) -> Result<PaymentHistory, AppError> {
        self.repo
            .create_payment(&input)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    // Leituras: cliente fora de acompanhamento é tratado como inexistente.

    pub async fn list_contacts(&self, customer_id: Uuid) -> Result<Vec<ContactHistory>, AppError> {
        self.ensure_tracked(customer_id).await?;
        self.repo.list_contacts(customer_id).await
    }

    pub async fn list_purchases(&self, customer_id: Uuid) -> Result<Vec<PurchaseHistory>, AppError> {
        self.ensure_tracked(customer_id).await?;
        self.repo.list_purchases(customer_id).await
    }

    pub async fn list_payments(&self, customer_id: Uuid) -> Result<Vec<PaymentHistory>, AppError> {
        self.ensure_tracked(customer_id).await?;
        self.repo.list_payments(customer_id).await
    }

    async fn ensure_tracked(&self, customer_id: Uuid) -> Result<(), AppError> {
        if !self.crm_repo.is_tracked(customer_id).await? {
            return Err(AppError::CustomerNotFound);
        }
        Ok(())
    }
}
