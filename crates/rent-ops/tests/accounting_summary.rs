use chrono::NaiveDate;
use std::io::Cursor;

use rent_ops::workflows::accounting::{
    classify, estimate, summarize, DateRange, DeductionBreakdown, PaymentCsvImporter,
    PaymentStatus,
};

const STATEMENT: &str = "\
Payment ID,Tenant ID,Property ID,Unit,Amount,Due Date,Paid Date,Method,Reference,Notes,Status
pay-001,ten-amina,prop-001,1A,25000,2025-06-01,2025-06-01,M-Pesa,MPESA-XK12,June rent,Completed
pay-002,ten-brian,prop-001,1B,18000,2025-06-05,,,,Second reminder sent,
pay-003,ten-wanja,prop-002,2C,30000,2025-06-25,,,,,
pay-004,ten-amina,prop-001,1A,25000,2025-05-01,2025-06-03,Bank Transfer,EFT-88,Late May rent,Completed
pay-005,ten-noel,prop-002,2D,12000,2025-06-02,2025-06-02,M-Pesa,MPESA-QQ71,,Reversed
pay-006,ten-lost,prop-003,3A,9000,,,,,,
";

fn date(raw: &str) -> NaiveDate {
    raw.parse().expect("valid test date")
}

#[test]
fn imported_statement_summarizes_into_expected_buckets() {
    let records =
        PaymentCsvImporter::from_reader(Cursor::new(STATEMENT)).expect("statement imports");
    assert_eq!(records.len(), 6);

    let june = DateRange::new(date("2025-06-01"), date("2025-06-30"));
    let summary = summarize(&records, june, date("2025-06-15"));

    // pay-001 and pay-004 settled in June; pay-002 overdue; pay-003 pending;
    // pay-005 reversed; pay-006 malformed.
    assert_eq!(summary.total_collected, 50_000);
    assert_eq!(summary.overdue_amount, 18_000);
    assert_eq!(summary.pending_amount, 30_000);
    assert_eq!(summary.completed_count, 2);
    assert_eq!(summary.overdue_count, 1);
    assert_eq!(summary.pending_count, 1);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.malformed_count, 1);
    assert_eq!(
        summary.classified_count() + summary.malformed_count,
        records.len()
    );
}

#[test]
fn classification_matches_summary_buckets() {
    let records =
        PaymentCsvImporter::from_reader(Cursor::new(STATEMENT)).expect("statement imports");
    let as_of = date("2025-06-15");

    let statuses: Vec<_> = records
        .iter()
        .filter_map(|record| classify(record, as_of).ok())
        .collect();

    assert_eq!(
        statuses,
        vec![
            PaymentStatus::Completed,
            PaymentStatus::Overdue,
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ]
    );
}

#[test]
fn collected_income_feeds_the_tax_estimate() {
    let records =
        PaymentCsvImporter::from_reader(Cursor::new(STATEMENT)).expect("statement imports");
    let whole_year = DateRange::new(date("2025-01-01"), date("2025-12-31"));
    let summary = summarize(&records, whole_year, date("2025-06-15"));

    let deductions = DeductionBreakdown {
        maintenance: 8_000,
        insurance: 4_000,
        property_tax: 3_000,
        other: 0,
    };
    let tax = estimate(2025, summary.total_collected as i64, deductions, 20.0)
        .expect("estimate from aggregated income");

    assert_eq!(tax.total_income, 50_000);
    assert_eq!(tax.net_income, 35_000);
    assert_eq!(tax.estimated_tax, 7_000);
}
