use crate::infra::{seed_demo_ledger, InMemoryPaymentStore, LoggingSmsGateway};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use rent_ops::error::AppError;
use rent_ops::workflows::accounting::{
    estimate, summarize, DateRange, DeductionBreakdown, PaymentCsvImporter,
};
use rent_ops::workflows::reminders::{ReminderDispatcher, TemplateCatalog};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date for classification (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct AccountingReportArgs {
    /// Payment statement export to import
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Start of the reporting range (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: NaiveDate,
    /// End of the reporting range (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: NaiveDate,
    /// Evaluation date for classification (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_accounting_report(args: AccountingReportArgs) -> Result<(), AppError> {
    let AccountingReportArgs {
        csv,
        start,
        end,
        as_of,
    } = args;

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let records = PaymentCsvImporter::from_path(csv)?;
    let summary = summarize(&records, DateRange::new(start, end), as_of);

    println!("Accounting summary {start} .. {end} (as of {as_of})");
    println!("  collected : KES {:>10}  ({} payments)", summary.total_collected, summary.completed_count);
    println!("  pending   : KES {:>10}  ({} payments)", summary.pending_amount, summary.pending_count);
    println!("  overdue   : KES {:>10}  ({} payments)", summary.overdue_amount, summary.overdue_count);
    if summary.failed_count > 0 {
        println!("  failed    : {} payments", summary.failed_count);
    }
    if summary.malformed_count > 0 {
        println!("  malformed : {} records excluded (missing due date)", summary.malformed_count);
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    println!("Rent operations demo (as of {as_of})");

    let store = Arc::new(InMemoryPaymentStore::default());
    seed_demo_ledger(&store, as_of);

    let range = DateRange::new(as_of - chrono::Duration::days(60), as_of + chrono::Duration::days(30));
    let records = store_records(&store)?;
    let summary = summarize(&records, range, as_of);
    println!("\nAccounting summary");
    println!("  collected : KES {} ({} payments)", summary.total_collected, summary.completed_count);
    println!("  pending   : KES {} ({} payments)", summary.pending_amount, summary.pending_count);
    println!("  overdue   : KES {} ({} payments)", summary.overdue_amount, summary.overdue_count);

    let deductions = DeductionBreakdown {
        maintenance: 8_000,
        insurance: 4_000,
        property_tax: 3_000,
        other: 0,
    };
    let tax = estimate(
        as_of.year(),
        summary.total_collected as i64,
        deductions,
        20.0,
    )?;
    println!("\nTax estimate {}", tax.year);
    println!("  net income    : KES {}", tax.net_income);
    println!("  estimated tax : KES {} at {}%", tax.estimated_tax, tax.tax_rate);

    let dispatcher = ReminderDispatcher::new(
        Arc::clone(&store),
        Arc::new(LoggingSmsGateway::default()),
        TemplateCatalog::standard(),
    );
    let outcome = dispatcher
        .send_bulk_overdue("rent_overdue", as_of, &CancellationToken::new())
        .await?;

    println!("\nBulk overdue reminders");
    println!("  targeted  : {} tenants", outcome.targeted);
    println!("  delivered : {}", outcome.delivered.len());
    for failure in &outcome.failures {
        println!("  failed    : {} ({})", failure.tenant_id, failure.reason);
    }

    Ok(())
}

fn store_records(
    store: &InMemoryPaymentStore,
) -> Result<Vec<rent_ops::workflows::accounting::PaymentRecord>, AppError> {
    use rent_ops::workflows::reminders::{DispatchError, PaymentFilter, PaymentStore};
    store
        .list(&PaymentFilter::default())
        .map_err(|err| AppError::from(DispatchError::Store(err)))
}
