use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::classifier::classify;
use super::domain::{DateRange, PaymentRecord, PaymentStatus};

/// Aggregated financials for a date range, computed fresh per request and
/// never cached.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingSummary {
    pub total_collected: u64,
    pub pending_amount: u64,
    pub overdue_amount: u64,
    pub completed_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub failed_count: usize,
    pub malformed_count: usize,
}

impl AccountingSummary {
    /// Number of records that were classified into a status bucket.
    pub fn classified_count(&self) -> usize {
        self.completed_count + self.pending_count + self.overdue_count + self.failed_count
    }
}

/// Fold payment records into an accounting summary for the given range.
///
/// A record's relevant date (paid date when settled, due date otherwise) must
/// fall inside the inclusive range. Records missing a due date cannot be
/// classified; when their paid date falls in the range, or they carry no date
/// at all, they surface through `malformed_count` instead of a bucket.
/// Empty input yields an all-zero summary.
pub fn summarize(records: &[PaymentRecord], range: DateRange, as_of: NaiveDate) -> AccountingSummary {
    let mut summary = AccountingSummary::default();

    for record in records {
        let status = match classify(record, as_of) {
            Ok(status) => status,
            Err(malformed) => {
                // Range-filter on the paid date when there is one; a record
                // with no dates at all cannot be placed and always counts.
                if record
                    .relevant_date()
                    .map_or(true, |date| range.contains(date))
                {
                    tracing::debug!(payment = %malformed.payment_id, "excluding malformed record");
                    summary.malformed_count += 1;
                }
                continue;
            }
        };

        let relevant = match record.relevant_date() {
            Some(date) => date,
            None => continue,
        };
        if !range.contains(relevant) {
            continue;
        }

        match status {
            PaymentStatus::Completed => {
                summary.total_collected += record.amount;
                summary.completed_count += 1;
            }
            PaymentStatus::Pending => {
                summary.pending_amount += record.amount;
                summary.pending_count += 1;
            }
            PaymentStatus::Overdue => {
                summary.overdue_amount += record.amount;
                summary.overdue_count += 1;
            }
            PaymentStatus::Failed => {
                summary.failed_count += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::accounting::domain::PaymentMethod;

    fn date(raw: &str) -> NaiveDate {
        raw.parse().expect("valid test date")
    }

    fn record(id: &str, amount: u64, due: Option<&str>, paid: Option<&str>) -> PaymentRecord {
        PaymentRecord {
            id: id.to_string(),
            tenant_id: format!("ten-{id}"),
            property_id: "prop-001".to_string(),
            unit_id: "unit-1a".to_string(),
            amount,
            due_date: due.map(date),
            paid_date: paid.map(date),
            method: PaymentMethod::BankTransfer,
            reference: None,
            notes: None,
            reversed: false,
        }
    }

    fn june() -> DateRange {
        DateRange::new(date("2025-06-01"), date("2025-06-30"))
    }

    #[test]
    fn empty_input_yields_all_zero_summary() {
        let summary = summarize(&[], june(), date("2025-06-15"));
        assert_eq!(summary, AccountingSummary::default());
        assert_eq!(summary.malformed_count, 0);
    }

    #[test]
    fn buckets_amounts_by_classified_status() {
        let records = vec![
            record("001", 25_000, Some("2025-06-01"), Some("2025-06-01")),
            record("002", 18_000, Some("2025-06-05"), None),
            record("003", 30_000, Some("2025-06-25"), None),
            record("004", 12_000, Some("2025-06-10"), Some("2025-06-12")),
        ];

        let summary = summarize(&records, june(), date("2025-06-15"));

        assert_eq!(summary.total_collected, 37_000);
        assert_eq!(summary.overdue_amount, 18_000);
        assert_eq!(summary.pending_amount, 30_000);
        assert_eq!(summary.completed_count, 2);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.classified_count(), 4);
    }

    #[test]
    fn malformed_records_are_counted_not_dropped() {
        let records = vec![
            record("001", 25_000, Some("2025-06-01"), Some("2025-06-01")),
            record("002", 18_000, None, None),
            record("003", 9_000, None, Some("2025-06-03")),
        ];

        let summary = summarize(&records, june(), date("2025-06-15"));

        assert_eq!(summary.malformed_count, 2);
        assert_eq!(summary.classified_count(), 1);
        assert_eq!(
            summary.classified_count() + summary.malformed_count,
            records.len()
        );
    }

    #[test]
    fn malformed_records_outside_the_range_are_skipped() {
        let records = vec![
            // Paid in May: outside the June window, counted nowhere.
            record("001", 9_000, None, Some("2025-05-03")),
            // No dates at all: cannot be placed, always counted.
            record("002", 7_000, None, None),
        ];

        let summary = summarize(&records, june(), date("2025-06-15"));

        assert_eq!(summary.malformed_count, 1);
        assert_eq!(summary.classified_count(), 0);
    }

    #[test]
    fn records_outside_the_range_are_skipped() {
        let records = vec![
            record("001", 25_000, Some("2025-05-01"), Some("2025-05-02")),
            record("002", 18_000, Some("2025-07-15"), None),
            record("003", 30_000, Some("2025-06-10"), None),
        ];

        let summary = summarize(&records, june(), date("2025-06-15"));

        assert_eq!(summary.total_collected, 0);
        assert_eq!(summary.pending_amount, 0);
        assert_eq!(summary.overdue_amount, 30_000);
        assert_eq!(summary.classified_count(), 1);
    }

    #[test]
    fn settled_payments_filter_on_paid_date() {
        // Due in May, paid in June: belongs to the June window.
        let records = vec![record("001", 25_000, Some("2025-05-28"), Some("2025-06-02"))];

        let summary = summarize(&records, june(), date("2025-06-15"));
        assert_eq!(summary.total_collected, 25_000);

        let may = DateRange::new(date("2025-05-01"), date("2025-05-31"));
        let summary = summarize(&records, may, date("2025-06-15"));
        assert_eq!(summary.total_collected, 0);
    }

    #[test]
    fn reversed_payments_count_as_failed_without_amounts() {
        let mut reversed = record("001", 25_000, Some("2025-06-01"), Some("2025-06-01"));
        reversed.reversed = true;

        let summary = summarize(&[reversed], june(), date("2025-06-15"));

        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.total_collected, 0);
        assert_eq!(summary.overdue_amount, 0);
    }
}
