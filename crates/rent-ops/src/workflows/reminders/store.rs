use serde::{Deserialize, Serialize};

use crate::workflows::accounting::{DateRange, PaymentRecord};

/// Criteria for listing payment records from the store.
#[derive(Debug, Default, Clone)]
pub struct PaymentFilter {
    pub tenant_id: Option<String>,
    pub property_id: Option<String>,
    pub range: Option<DateRange>,
}

impl PaymentFilter {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &PaymentRecord) -> bool {
        if let Some(tenant_id) = &self.tenant_id {
            if &record.tenant_id != tenant_id {
                return false;
            }
        }
        if let Some(property_id) = &self.property_id {
            if &record.property_id != property_id {
                return false;
            }
        }
        if let Some(range) = &self.range {
            match record.relevant_date() {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Contact details needed to address and render a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContact {
    pub tenant_id: String,
    pub name: String,
    pub phone: String,
    pub property_name: String,
}

/// Read-side abstraction over the external payment record store. Payments
/// are written by external flows; this core only queries.
pub trait PaymentStore: Send + Sync {
    fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentRecord>, StoreError>;
    fn contact(&self, tenant_id: &str) -> Result<Option<TenantContact>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("payment store unavailable: {0}")]
    Unavailable(String),
}
