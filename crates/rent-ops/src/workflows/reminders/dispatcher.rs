use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::gateway::{DeliveryError, DeliveryReceipt, MessageGateway};
use super::store::{PaymentFilter, PaymentStore, StoreError, TenantContact};
use super::template::{TemplateCatalog, TemplateError, TemplateVars};
use crate::config::ReminderConfig;
use crate::workflows::accounting::{classify, PaymentRecord, PaymentStatus};

/// Concurrency and timeout bounds for outbound delivery.
#[derive(Debug, Clone, Copy)]
pub struct DispatchLimits {
    pub max_in_flight: usize,
    pub delivery_timeout: Duration,
}

impl DispatchLimits {
    pub fn from_config(config: &ReminderConfig) -> Self {
        Self {
            max_in_flight: config.max_in_flight.max(1),
            delivery_timeout: Duration::from_millis(config.delivery_timeout_ms),
        }
    }
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            delivery_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of one delivered reminder.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub tenant_id: String,
    pub recipient: String,
    pub template_key: String,
    pub provider_ref: String,
    pub sent_at: DateTime<Utc>,
}

/// One recipient the bulk dispatch could not reach, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchFailure {
    pub tenant_id: String,
    pub recipient: String,
    pub reason: String,
}

/// Consolidated tally for a bulk dispatch. Every targeted tenant appears in
/// exactly one of `delivered`, `failures`, or the `cancelled` count.
#[derive(Debug, Default, Serialize)]
pub struct BulkDispatchOutcome {
    pub targeted: usize,
    pub delivered: Vec<DispatchResult>,
    pub failures: Vec<DispatchFailure>,
    pub cancelled: usize,
}

impl BulkDispatchOutcome {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("tenant {0} has no outstanding payment to remind about")]
    RecipientNotFound(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Selects reminder recipients from live payment records, renders their
/// messages, and submits them to the messaging provider.
///
/// The dispatcher never mutates payment state and applies no cross-call
/// deduplication or rate limiting; repeat sends for the same balance are the
/// caller's responsibility.
pub struct ReminderDispatcher<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    templates: TemplateCatalog,
    limits: DispatchLimits,
}

impl<S, G> ReminderDispatcher<S, G>
where
    S: PaymentStore + 'static,
    G: MessageGateway + 'static,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>, templates: TemplateCatalog) -> Self {
        Self::with_limits(store, gateway, templates, DispatchLimits::default())
    }

    pub fn with_limits(
        store: Arc<S>,
        gateway: Arc<G>,
        templates: TemplateCatalog,
        limits: DispatchLimits,
    ) -> Self {
        Self {
            store,
            gateway,
            templates,
            limits,
        }
    }

    /// Send one reminder to a tenant about their outstanding payment.
    ///
    /// The tenant's most pressing record is used for the template variables:
    /// the earliest-due overdue payment, or the earliest pending one when
    /// nothing is overdue yet. Delivery failures propagate to the caller.
    pub async fn send_single(
        &self,
        tenant_id: &str,
        template_key: &str,
        as_of: NaiveDate,
    ) -> Result<DispatchResult, DispatchError> {
        if !self.templates.contains(template_key) {
            return Err(TemplateError::NotFound(template_key.to_string()).into());
        }

        let records = self.store.list(&PaymentFilter::for_tenant(tenant_id))?;
        let outstanding = outstanding_records(&records, as_of);
        let target = pick_most_pressing(&outstanding)
            .ok_or_else(|| DispatchError::RecipientNotFound(tenant_id.to_string()))?;
        let contact = self
            .store
            .contact(tenant_id)?
            .ok_or_else(|| DispatchError::RecipientNotFound(tenant_id.to_string()))?;

        let balance: u64 = outstanding.iter().map(|(_, record)| record.amount).sum();
        let vars = template_vars(&contact, target, target.amount, balance, as_of);
        let message = self.templates.render(template_key, &vars)?;

        match deliver(
            self.gateway.as_ref(),
            &contact.phone,
            &message,
            self.limits.delivery_timeout,
        )
        .await
        {
            Ok(receipt) => {
                let result = dispatch_result(&contact, template_key, receipt);
                info!(
                    tenant = %result.tenant_id,
                    recipient = %result.recipient,
                    template = %template_key,
                    provider_ref = %result.provider_ref,
                    "reminder delivered"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(
                    tenant = %tenant_id,
                    recipient = %contact.phone,
                    template = %template_key,
                    error = %err,
                    "reminder delivery failed"
                );
                Err(err.into())
            }
        }
    }

    /// Send one consolidated reminder to every tenant with an overdue
    /// payment.
    ///
    /// A tenant with several overdue units receives a single message covering
    /// the summed balance. Delivery attempts fan out concurrently up to the
    /// in-flight limit; one recipient's failure never aborts the rest.
    /// Cancelling the token stops new submissions while in-flight attempts
    /// run to completion, and skipped tenants are reported in `cancelled`.
    pub async fn send_bulk_overdue(
        &self,
        template_key: &str,
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<BulkDispatchOutcome, DispatchError> {
        if !self.templates.contains(template_key) {
            return Err(TemplateError::NotFound(template_key.to_string()).into());
        }

        let records = self.store.list(&PaymentFilter::default())?;
        let overdue_by_tenant = group_overdue_by_tenant(&records, as_of);

        let mut outcome = BulkDispatchOutcome {
            targeted: overdue_by_tenant.len(),
            ..BulkDispatchOutcome::default()
        };

        let mut targets = Vec::new();
        for (tenant_id, tenant_records) in overdue_by_tenant {
            match self.prepare_target(&tenant_id, &tenant_records, template_key, as_of) {
                Ok(target) => targets.push(target),
                Err(failure) => {
                    warn!(
                        tenant = %failure.tenant_id,
                        template = %template_key,
                        reason = %failure.reason,
                        "reminder skipped"
                    );
                    outcome.failures.push(failure);
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.limits.max_in_flight));
        let mut handles = Vec::with_capacity(targets.len());

        for target in targets {
            if cancel.is_cancelled() {
                outcome.cancelled += 1;
                continue;
            }

            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let timeout = self.limits.delivery_timeout;
            let tenant_id = target.tenant_id.clone();
            let recipient = target.recipient.clone();

            let handle = tokio::spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return AttemptOutcome::Cancelled;
                };

                match deliver(gateway.as_ref(), &target.recipient, &target.message, timeout).await {
                    Ok(receipt) => AttemptOutcome::Delivered(receipt),
                    Err(err) => AttemptOutcome::Failed(err),
                }
            });

            handles.push((tenant_id, recipient, handle));
        }

        for (tenant_id, recipient, handle) in handles {
            match handle.await {
                Ok(AttemptOutcome::Delivered(receipt)) => {
                    info!(
                        tenant = %tenant_id,
                        recipient = %recipient,
                        template = %template_key,
                        provider_ref = %receipt.provider_ref,
                        "reminder delivered"
                    );
                    outcome.delivered.push(DispatchResult {
                        tenant_id,
                        recipient,
                        template_key: template_key.to_string(),
                        provider_ref: receipt.provider_ref,
                        sent_at: Utc::now(),
                    });
                }
                Ok(AttemptOutcome::Failed(err)) => {
                    warn!(
                        tenant = %tenant_id,
                        recipient = %recipient,
                        template = %template_key,
                        error = %err,
                        "reminder delivery failed"
                    );
                    outcome.failures.push(DispatchFailure {
                        tenant_id,
                        recipient,
                        reason: err.to_string(),
                    });
                }
                Ok(AttemptOutcome::Cancelled) => outcome.cancelled += 1,
                Err(join_error) => {
                    outcome.failures.push(DispatchFailure {
                        tenant_id,
                        recipient,
                        reason: format!("dispatch task failed: {join_error}"),
                    });
                }
            }
        }

        Ok(outcome)
    }

    fn prepare_target(
        &self,
        tenant_id: &str,
        records: &[&PaymentRecord],
        template_key: &str,
        as_of: NaiveDate,
    ) -> Result<ReminderTarget, DispatchFailure> {
        let contact = match self.store.contact(tenant_id) {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                return Err(DispatchFailure {
                    tenant_id: tenant_id.to_string(),
                    recipient: String::new(),
                    reason: "no contact on file".to_string(),
                })
            }
            Err(err) => {
                return Err(DispatchFailure {
                    tenant_id: tenant_id.to_string(),
                    recipient: String::new(),
                    reason: err.to_string(),
                })
            }
        };

        // Consolidated message: summed balance, anchored on the oldest due
        // date.
        let balance: u64 = records.iter().map(|record| record.amount).sum();
        let earliest = records
            .iter()
            .min_by_key(|record| record.due_date)
            .copied()
            .ok_or_else(|| DispatchFailure {
                tenant_id: tenant_id.to_string(),
                recipient: contact.phone.clone(),
                reason: "no overdue records".to_string(),
            })?;

        let vars = template_vars(&contact, earliest, balance, balance, as_of);
        let message = self
            .templates
            .render(template_key, &vars)
            .map_err(|err| DispatchFailure {
                tenant_id: tenant_id.to_string(),
                recipient: contact.phone.clone(),
                reason: err.to_string(),
            })?;

        Ok(ReminderTarget {
            tenant_id: tenant_id.to_string(),
            recipient: contact.phone,
            message,
        })
    }
}

struct ReminderTarget {
    tenant_id: String,
    recipient: String,
    message: String,
}

enum AttemptOutcome {
    Delivered(DeliveryReceipt),
    Failed(DeliveryError),
    Cancelled,
}

async fn deliver<G: MessageGateway + ?Sized>(
    gateway: &G,
    recipient: &str,
    message: &str,
    limit: Duration,
) -> Result<DeliveryReceipt, DeliveryError> {
    match tokio::time::timeout(limit, gateway.send(recipient, message)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout {
            recipient: recipient.to_string(),
            waited_ms: limit.as_millis() as u64,
        }),
    }
}

fn outstanding_records(
    records: &[PaymentRecord],
    as_of: NaiveDate,
) -> Vec<(PaymentStatus, &PaymentRecord)> {
    records
        .iter()
        .filter_map(|record| match classify(record, as_of) {
            Ok(status @ (PaymentStatus::Overdue | PaymentStatus::Pending)) => {
                Some((status, record))
            }
            _ => None,
        })
        .collect()
}

fn pick_most_pressing<'a>(
    outstanding: &[(PaymentStatus, &'a PaymentRecord)],
) -> Option<&'a PaymentRecord> {
    let earliest = |wanted: PaymentStatus| {
        outstanding
            .iter()
            .filter(|(status, _)| *status == wanted)
            .map(|(_, record)| *record)
            .min_by_key(|record| record.due_date)
    };

    earliest(PaymentStatus::Overdue).or_else(|| earliest(PaymentStatus::Pending))
}

fn group_overdue_by_tenant(
    records: &[PaymentRecord],
    as_of: NaiveDate,
) -> BTreeMap<String, Vec<&PaymentRecord>> {
    let mut grouped: BTreeMap<String, Vec<&PaymentRecord>> = BTreeMap::new();
    for record in records {
        if classify(record, as_of) == Ok(PaymentStatus::Overdue) {
            grouped
                .entry(record.tenant_id.clone())
                .or_default()
                .push(record);
        }
    }
    grouped
}

fn template_vars(
    contact: &TenantContact,
    record: &PaymentRecord,
    amount: u64,
    balance: u64,
    as_of: NaiveDate,
) -> TemplateVars {
    let due_date = record.due_date.unwrap_or(as_of);
    TemplateVars {
        tenant_name: contact.name.clone(),
        amount,
        due_date,
        property_name: contact.property_name.clone(),
        balance,
        days_overdue: (as_of - due_date).num_days().max(0),
        receipt_number: record.reference.clone(),
    }
}

fn dispatch_result(
    contact: &TenantContact,
    template_key: &str,
    receipt: DeliveryReceipt,
) -> DispatchResult {
    DispatchResult {
        tenant_id: contact.tenant_id.clone(),
        recipient: contact.phone.clone(),
        template_key: template_key.to_string(),
        provider_ref: receipt.provider_ref,
        sent_at: Utc::now(),
    }
}
