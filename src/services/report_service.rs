// src/services/report_service.rs

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::{
    common::error::AppError,
    db::{CrmRepository, ReportRepository},
    models::{
        crm::CustomerDetails,
        reports::{ReportsParams, ReportsResponse},
    },
};

pub const DEFAULT_REPORT_DAYS: u64 = 30;

const CSV_HEADER: [&str; 22] = [
    "ID",
    "Name",
    "Phone",
    "Email",
    "Address",
    "Company Name",
    "Customer Type",
    "Business Type",
    "Products",
    "Scale",
    "Province/City",
    "Customer Source",
    "Staff in Charge",
    "Stage",
    "Level",
    "Contact Status",
    "Customer Feedback",
    "Notes",
    "Appointment Date",
    "Appointment Reminder",
    "Created At",
    "Updated At",
];

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    crm_repo: CrmRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository, crm_repo: CrmRepository) -> Self {
        Self { repo, crm_repo }
    }

    pub async fn get_reports(&self, params: ReportsParams) -> Result<ReportsResponse, AppError> {
        let today = Utc::now().date_naive();
        let (start, end) = resolve_date_range(&params, today)?;

        // As quatro consultas são independentes entre si
        let (staff_customer_stats, interaction_stats, customer_type_stats, product_type_stats) = tokio::try_join!(
            self.repo.staff_customer_stats(),
            self.repo.interaction_stats(start, end),
            self.repo.customer_type_stats(),
            self.repo.product_stats(),
        )?;

        Ok(ReportsResponse {
            staff_customer_stats,
            interaction_stats,
            customer_type_stats,
            product_type_stats,
        })
    }

    pub async fn export_customers_csv(&self) -> Result<String, AppError> {
        let customers = self.crm_repo.list_for_export().await?;
        tracing::info!("📤 Exportando {} clientes para CSV", customers.len());
        customers_to_csv(&customers)
    }
}

/// Converte as datas do filtro em um intervalo semiaberto [início, fim + 1 dia).
pub fn resolve_date_range(
    params: &ReportsParams,
    today: NaiveDate,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let end = params.end_date.unwrap_or(today);
    let start = match params.start_date {
        Some(start) => start,
        None => end
            .checked_sub_days(Days::new(DEFAULT_REPORT_DAYS))
            .ok_or_else(|| AppError::InvalidArgument("end_date is out of range".to_string()))?,
    };

    if start > end {
        return Err(AppError::InvalidArgument(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let end_exclusive = end
        .succ_opt()
        .ok_or_else(|| AppError::InvalidArgument("end_date is out of range".to_string()))?;

    Ok((
        start.and_time(NaiveTime::MIN).and_utc(),
        end_exclusive.and_time(NaiveTime::MIN).and_utc(),
    ))
}

/// Gera o CSV de exportação: todos os campos entre aspas, linhas separadas por `\n`.
pub fn customers_to_csv(customers: &[CustomerDetails]) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;

    for details in customers {
        writer.write_record(customer_record(details))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar o CSV: {}", e))?;
    let csv_data = String::from_utf8(bytes).map_err(anyhow::Error::from)?;

    Ok(csv_data)
}

fn customer_record(details: &CustomerDetails) -> [String; 22] {
    let c = &details.customer;
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let timestamp = |v: &DateTime<Utc>| v.to_rfc3339();

    [
        c.id.to_string(),
        c.name.clone(),
        text(&c.phone),
        text(&c.email),
        text(&c.address),
        text(&c.company_name),
        c.customer_type.as_str().to_string(),
        text(&c.business_type),
        c.products.join("; "),
        text(&c.scale),
        text(&c.province_city),
        text(&c.customer_source),
        text(&details.staff_in_charge_name),
        c.stage.as_str().to_string(),
        c.level.as_str().to_string(),
        c.contact_status.as_str().to_string(),
        text(&c.customer_feedback),
        text(&c.notes),
        c.appointment_date.as_ref().map(timestamp).unwrap_or_default(),
        text(&c.appointment_reminder),
        timestamp(&c.created_at),
        timestamp(&c.updated_at),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crm::{ContactStatus, Customer, CustomerType, Level, Stage};
    use chrono::TimeZone;
    use rstest::rstest;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(name: &str) -> CustomerDetails {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        CustomerDetails {
            customer: Customer {
                id: Uuid::nil(),
                name: name.to_string(),
                phone: Some("0901".into()),
                email: None,
                address: None,
                company_name: Some("Acme Ltd".into()),
                customer_type: CustomerType::Corporate,
                business_type: None,
                products: vec!["PM HKD".into(), "Equipment".into()],
                scale: None,
                province_city: None,
                customer_source: None,
                staff_in_charge_id: None,
                stage: Stage::SendQuote,
                level: Level::Hot,
                contact_status: ContactStatus::NotCalled,
                customer_feedback: None,
                notes: None,
                appointment_date: None,
                appointment_reminder: None,
                is_tracking: true,
                created_at: created,
                updated_at: created,
            },
            staff_in_charge_name: Some("Ana".into()),
            latest_contact: None,
        }
    }

    #[test]
    fn default_range_is_last_thirty_days_including_today() {
        let (start, end) = resolve_date_range(&ReportsParams::default(), date(2025, 3, 31)).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
    }

    #[rstest]
    #[case(Some(date(2025, 1, 10)), Some(date(2025, 1, 10)), date(2025, 1, 10), date(2025, 1, 11))]
    #[case(Some(date(2025, 1, 1)), Some(date(2025, 1, 31)), date(2025, 1, 1), date(2025, 2, 1))]
    #[case(None, Some(date(2025, 2, 28)), date(2025, 1, 29), date(2025, 3, 1))]
    fn explicit_dates_are_inclusive(
        #[case] start_date: Option<NaiveDate>,
        #[case] end_date: Option<NaiveDate>,
        #[case] expected_start: NaiveDate,
        #[case] expected_end: NaiveDate,
    ) {
        let params = ReportsParams { start_date, end_date };
        let (start, end) = resolve_date_range(&params, date(2025, 6, 1)).unwrap();
        assert_eq!(start.date_naive(), expected_start);
        assert_eq!(end.date_naive(), expected_end);
    }

    #[test]
    fn start_after_end_is_rejected() {
        let params = ReportsParams {
            start_date: Some(date(2025, 2, 1)),
            end_date: Some(date(2025, 1, 1)),
        };
        assert!(matches!(
            resolve_date_range(&params, date(2025, 6, 1)),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn csv_has_header_and_fixed_layout() {
        let csv_data = customers_to_csv(&[customer("Acme")]).unwrap();
        let lines: Vec<&str> = csv_data.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\"ID\",\"Name\",\"Phone\""));
        assert!(lines[0].ends_with("\"Created At\",\"Updated At\""));
        assert_eq!(lines[1].matches("\",\"").count(), 21);
        assert!(lines[1].contains("\"PM HKD; Equipment\""));
        assert!(lines[1].contains("\"send_quote\",\"hot\",\"not_called\""));
        assert!(lines[1].contains("\"Ana\""));
        assert!(lines[1].contains("\"2025-03-01T09:30:00+00:00\""));
        assert!(!csv_data.contains('\r'));
    }

    #[test]
    fn csv_escapes_embedded_quotes() {
        let csv_data = customers_to_csv(&[customer("The \"Best\" Shop")]).unwrap();
        assert!(csv_data.contains("\"The \"\"Best\"\" Shop\""));
    }

    #[test]
    fn csv_without_customers_is_only_the_header() {
        let csv_data = customers_to_csv(&[]).unwrap();
        assert_eq!(csv_data.lines().count(), 1);
        assert!(csv_data.ends_with('\n'));
    }
}
