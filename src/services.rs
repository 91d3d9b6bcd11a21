pub mod auth;
pub mod crm_service;
pub mod history_service;
pub mod report_service;
