use async_trait::async_trait;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

use rent_ops::workflows::accounting::{PaymentMethod, PaymentRecord};
use rent_ops::workflows::reminders::{
    DeliveryError, DeliveryReceipt, MessageGateway, PaymentFilter, PaymentStore, ReminderDispatcher,
    StoreError, TenantContact,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared handles the payment endpoints operate on.
#[derive(Clone)]
pub(crate) struct PaymentState {
    pub(crate) store: Arc<InMemoryPaymentStore>,
    pub(crate) dispatcher: Arc<ReminderDispatcher<InMemoryPaymentStore, LoggingSmsGateway>>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPaymentStore {
    records: Arc<Mutex<Vec<PaymentRecord>>>,
    contacts: Arc<Mutex<HashMap<String, TenantContact>>>,
}

impl InMemoryPaymentStore {
    pub(crate) fn insert_records(&self, new_records: Vec<PaymentRecord>) {
        let mut guard = self.records.lock().expect("payment mutex poisoned");
        guard.extend(new_records);
    }

    pub(crate) fn upsert_contact(&self, contact: TenantContact) {
        let mut guard = self.contacts.lock().expect("contact mutex poisoned");
        guard.insert(contact.tenant_id.clone(), contact);
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentRecord>, StoreError> {
        let guard = self.records.lock().expect("payment mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn contact(&self, tenant_id: &str) -> Result<Option<TenantContact>, StoreError> {
        let guard = self.contacts.lock().expect("contact mutex poisoned");
        Ok(guard.get(tenant_id).cloned())
    }
}

/// Stand-in for the SMS provider: logs every message and acknowledges with a
/// synthetic reference. The real provider integration sits behind the same
/// trait.
#[derive(Default)]
pub(crate) struct LoggingSmsGateway {
    sequence: AtomicU64,
}

#[async_trait]
impl MessageGateway for LoggingSmsGateway {
    async fn send(
        &self,
        recipient_phone: &str,
        message: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let provider_ref = format!("log-{id:06}");
        info!(recipient = %recipient_phone, provider_ref = %provider_ref, %message, "sms (logged)");
        Ok(DeliveryReceipt { provider_ref })
    }
}

/// A small ledger for demos and tests, anchored on `today` so every status
/// bucket is populated whenever it runs.
pub(crate) fn seed_demo_ledger(store: &InMemoryPaymentStore, today: NaiveDate) {
    let contacts = [
        ("ten-amina", "Amina Odhiambo", "+254700000001", "Kilimani Heights"),
        ("ten-brian", "Brian Kiprotich", "+254700000002", "Kilimani Heights"),
        ("ten-wanja", "Wanja Muthoni", "+254700000003", "Lavington Court"),
        ("ten-noel", "Noel Baraka", "+254700000004", "Lavington Court"),
    ];
    for (tenant_id, name, phone, property_name) in contacts {
        store.upsert_contact(TenantContact {
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            property_name: property_name.to_string(),
        });
    }

    let record = |id: &str,
                  tenant: &str,
                  property: &str,
                  unit: &str,
                  amount: u64,
                  due: NaiveDate,
                  paid: Option<NaiveDate>,
                  method: PaymentMethod,
                  reference: Option<&str>| PaymentRecord {
        id: id.to_string(),
        tenant_id: tenant.to_string(),
        property_id: property.to_string(),
        unit_id: unit.to_string(),
        amount,
        due_date: Some(due),
        paid_date: paid,
        method,
        reference: reference.map(str::to_string),
        notes: None,
        reversed: false,
    };

    let days = chrono::Duration::days;
    store.insert_records(vec![
        record(
            "pay-001",
            "ten-amina",
            "prop-kilimani",
            "1A",
            25_000,
            today - days(14),
            Some(today - days(14)),
            PaymentMethod::MobileMoney,
            Some("MPESA-XK12"),
        ),
        record(
            "pay-002",
            "ten-brian",
            "prop-kilimani",
            "1B",
            18_000,
            today - days(10),
            None,
            PaymentMethod::NoneYet,
            None,
        ),
        record(
            "pay-003",
            "ten-wanja",
            "prop-lavington",
            "2C",
            30_000,
            today - days(5),
            None,
            PaymentMethod::NoneYet,
            None,
        ),
        record(
            "pay-004",
            "ten-wanja",
            "prop-lavington",
            "2D",
            15_000,
            today - days(35),
            None,
            PaymentMethod::NoneYet,
            None,
        ),
        record(
            "pay-005",
            "ten-noel",
            "prop-lavington",
            "3A",
            22_000,
            today + days(10),
            None,
            PaymentMethod::NoneYet,
            None,
        ),
    ]);
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
