// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Users ---
        handlers::auth::list_users,
        handlers::auth::create_user,
        handlers::auth::update_user,
        handlers::auth::update_password,

        // --- Customers ---
        handlers::crm::create_customer,
        handlers::crm::list_customers,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,

        // --- History ---
        handlers::history::create_contact,
        handlers::history::list_contacts,
        handlers::history::create_purchase,
        handlers::history::list_purchases,
        handlers::history::create_payment,
        handlers::history::list_payments,

        // --- Reports ---
        handlers::reports::get_reports,
        handlers::reports::export_customers,
        handlers::reports::health,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::LoginResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::UpdatePasswordPayload,
            models::auth::UsersResponse,

            // --- CRM ---
            models::crm::CustomerType,
            models::crm::Stage,
            models::crm::Level,
            models::crm::ContactStatus,
            models::crm::Customer,
            models::crm::CustomerDetails,
            models::crm::CreateCustomerPayload,
            models::crm::UpdateCustomerPayload,
            models::crm::CustomerSortColumn,
            models::crm::SortOrder,
            models::crm::ListCustomersResponse,

            // --- History ---
            models::history::ContactHistory,
            models::history::PurchaseHistory,
            models::history::PaymentHistory,
            models::history::CreateContactPayload,
            models::history::CreatePurchasePayload,
            models::history::CreatePaymentPayload,
            models::history::ContactHistoryResponse,
            models::history::PurchaseHistoryResponse,
            models::history::PaymentHistoryResponse,

            // --- Reports ---
            models::reports::StaffCustomerStats,
            models::reports::InteractionStats,
            models::reports::CustomerTypeStats,
            models::reports::ProductStats,
            models::reports::ReportsResponse,
            models::reports::ExportResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Login e sessão"),
        (name = "Users", description = "Gestão de usuários (admin)"),
        (name = "Customers", description = "Cadastro e acompanhamento de clientes"),
        (name = "History", description = "Históricos de contato, compra e pagamento"),
        (name = "Reports", description = "Relatórios e exportação CSV"),
        (name = "Health", description = "Verificação de saúde")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
