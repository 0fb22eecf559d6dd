pub mod billing_engine;
pub mod export;
pub mod reminder_service;

pub use billing_engine::{
    aggregate, classify_status, monthly_equivalent, next_billing_date, AggregateReport,
    CategoryTotal, RecordIssue, UpcomingRenewal, DEFAULT_RENEWING_SOON_DAYS,
};
pub use export::export_to_csv;
pub use reminder_service::{run_reminder_scan, ReminderDispatcher, ReminderRunSummary};
