pub mod auth;
pub mod crm;
pub mod history;
pub mod reports;
