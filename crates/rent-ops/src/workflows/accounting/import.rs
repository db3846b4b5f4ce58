use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use super::domain::{PaymentMethod, PaymentRecord};

#[derive(Debug)]
pub enum PaymentImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { row: usize, reason: String },
}

impl std::fmt::Display for PaymentImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentImportError::Io(err) => write!(f, "failed to read payment export: {}", err),
            PaymentImportError::Csv(err) => write!(f, "invalid payment CSV data: {}", err),
            PaymentImportError::Row { row, reason } => {
                write!(f, "payment export row {} is invalid: {}", row, reason)
            }
        }
    }
}

impl std::error::Error for PaymentImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaymentImportError::Io(err) => Some(err),
            PaymentImportError::Csv(err) => Some(err),
            PaymentImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for PaymentImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PaymentImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads provider/bank statement exports into payment records.
///
/// Payments are recorded by external flows; this importer is the boundary
/// where their CSV shape becomes the internal domain type. Rows with an
/// unusable amount or date fail with their row number so operators can fix
/// the export; a missing due date is tolerated here and surfaced later as a
/// malformed record by the aggregator.
pub struct PaymentCsvImporter;

impl PaymentCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<PaymentRecord>, PaymentImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<PaymentRecord>, PaymentImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, row) in csv_reader.deserialize::<PaymentRow>().enumerate() {
            // Header is line 1; the first data row is line 2.
            let row_number = index + 2;
            let row = row?;
            records.push(row.into_record(row_number)?);
        }

        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct PaymentRow {
    #[serde(rename = "Payment ID")]
    id: String,
    #[serde(rename = "Tenant ID")]
    tenant_id: String,
    #[serde(rename = "Property ID")]
    property_id: String,
    #[serde(rename = "Unit")]
    unit_id: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Due Date", default, deserialize_with = "empty_string_as_none")]
    due_date: Option<String>,
    #[serde(rename = "Paid Date", default, deserialize_with = "empty_string_as_none")]
    paid_date: Option<String>,
    #[serde(rename = "Method", default, deserialize_with = "empty_string_as_none")]
    method: Option<String>,
    #[serde(rename = "Reference", default, deserialize_with = "empty_string_as_none")]
    reference: Option<String>,
    #[serde(rename = "Notes", default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
}

impl PaymentRow {
    fn into_record(self, row: usize) -> Result<PaymentRecord, PaymentImportError> {
        let amount = parse_amount(&self.amount).ok_or_else(|| PaymentImportError::Row {
            row,
            reason: format!("unparseable amount '{}'", self.amount),
        })?;

        let due_date = parse_optional_date(self.due_date.as_deref(), row, "due date")?;
        let paid_date = parse_optional_date(self.paid_date.as_deref(), row, "paid date")?;

        let reversed = matches!(
            self.status.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("reversed") | Some("failed")
        );

        Ok(PaymentRecord {
            id: self.id,
            tenant_id: self.tenant_id,
            property_id: self.property_id,
            unit_id: self.unit_id,
            amount,
            due_date,
            paid_date,
            method: parse_method(self.method.as_deref()),
            reference: self.reference,
            notes: self.notes,
            reversed,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_amount(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("KES")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<u64>().ok()
}

fn parse_optional_date(
    value: Option<&str>,
    row: usize,
    field: &str,
) -> Result<Option<NaiveDate>, PaymentImportError> {
    match value {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| PaymentImportError::Row {
                row,
                reason: format!("unparseable {field} '{raw}'"),
            }),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn parse_method(value: Option<&str>) -> PaymentMethod {
    let Some(raw) = value else {
        return PaymentMethod::NoneYet;
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "m-pesa" | "mpesa" | "mobile money" | "mobile-money" => PaymentMethod::MobileMoney,
        "bank transfer" | "bank-transfer" | "eft" => PaymentMethod::BankTransfer,
        "cash" => PaymentMethod::Cash,
        "check" | "cheque" => PaymentMethod::Check,
        "card" | "credit card" | "debit card" => PaymentMethod::Card,
        _ => PaymentMethod::NoneYet,
    }
}
