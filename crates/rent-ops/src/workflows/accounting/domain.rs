use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// All monetary values in the ledger are whole Kenyan shillings. The source
/// data mixed `$` and `KES` labels for the same records; the ledger carries a
/// single denomination and leaves display formatting to callers.
pub const CURRENCY: &str = "KES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney,
    BankTransfer,
    Cash,
    Check,
    Card,
    NoneYet,
}

impl PaymentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MobileMoney => "Mobile Money",
            Self::BankTransfer => "Bank Transfer",
            Self::Cash => "Cash",
            Self::Check => "Check",
            Self::Card => "Card",
            Self::NoneYet => "Pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Overdue,
    Failed,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
            Self::Failed => "Failed",
        }
    }
}

/// A single rent payment as recorded by the external payment flows.
///
/// `due_date` is required by the classification rules; records missing it are
/// counted as malformed rather than silently dropped. `reversed` marks a
/// provider-side reversal (e.g. a clawed-back mobile-money transaction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub tenant_id: String,
    pub property_id: String,
    pub unit_id: String,
    pub amount: u64,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub reversed: bool,
}

impl PaymentRecord {
    /// Date used for range filtering: the paid date when settled, the due
    /// date otherwise.
    pub fn relevant_date(&self) -> Option<NaiveDate> {
        self.paid_date.or(self.due_date)
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A record excluded from classification because a required field is absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("payment {payment_id} is missing a due date")]
pub struct MalformedRecord {
    pub payment_id: String,
}
