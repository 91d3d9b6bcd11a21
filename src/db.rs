pub mod user_repo;
pub use user_repo::UserRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod history_repo;
pub use history_repo::HistoryRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
