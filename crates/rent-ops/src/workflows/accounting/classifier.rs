use chrono::NaiveDate;

use super::domain::{MalformedRecord, PaymentRecord, PaymentStatus};

/// Derive the lifecycle status of a payment as of a given date.
///
/// Priority order: a provider reversal always classifies as `Failed`; a
/// settled payment is `Completed` regardless of its due date; an unsettled
/// payment whose due date has passed is `Overdue`; anything else is
/// `Pending`. Pure and deterministic so the aggregator can rely on it.
pub fn classify(record: &PaymentRecord, as_of: NaiveDate) -> Result<PaymentStatus, MalformedRecord> {
    let due_date = record.due_date.ok_or_else(|| MalformedRecord {
        payment_id: record.id.clone(),
    })?;

    if record.reversed {
        return Ok(PaymentStatus::Failed);
    }

    if record.paid_date.is_some() {
        return Ok(PaymentStatus::Completed);
    }

    if due_date < as_of {
        Ok(PaymentStatus::Overdue)
    } else {
        Ok(PaymentStatus::Pending)
    }
}
