use crate::infra::{deserialize_date, deserialize_optional_date, AppState, PaymentState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use rent_ops::error::AppError;
use rent_ops::workflows::accounting::{
    estimate, summarize, AccountingSummary, DateRange, DeductionBreakdown, TaxSummary,
};
use rent_ops::workflows::reminders::{
    DispatchError, DispatchFailure, DispatchResult, PaymentFilter, PaymentStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryRequest {
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) start: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) end: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
    pub(crate) as_of: NaiveDate,
    #[serde(flatten)]
    pub(crate) summary: AccountingSummary,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaxEstimateRequest {
    pub(crate) year: i32,
    pub(crate) income: i64,
    #[serde(default)]
    pub(crate) deductions: DeductionBreakdown,
    pub(crate) tax_rate: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SingleReminderRequest {
    pub(crate) tenant_id: String,
    #[serde(default = "default_template")]
    pub(crate) template: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkReminderRequest {
    #[serde(default = "default_template")]
    pub(crate) template: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkReminderResponse {
    pub(crate) template: String,
    pub(crate) as_of: NaiveDate,
    pub(crate) targeted: usize,
    pub(crate) attempted: usize,
    pub(crate) delivered: Vec<DispatchResult>,
    pub(crate) failures: Vec<DispatchFailure>,
    pub(crate) cancelled: usize,
}

fn default_template() -> String {
    "rent_overdue".to_string()
}

pub(crate) fn with_payment_routes(payments: PaymentState) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/accounting/summary",
            axum::routing::post(accounting_summary_endpoint),
        )
        .route(
            "/api/v1/accounting/tax",
            axum::routing::post(tax_estimate_endpoint),
        )
        .route(
            "/api/v1/reminders/single",
            axum::routing::post(single_reminder_endpoint),
        )
        .route(
            "/api/v1/reminders/bulk",
            axum::routing::post(bulk_reminder_endpoint),
        )
        .layer(Extension(payments))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn accounting_summary_endpoint(
    Extension(payments): Extension<PaymentState>,
    Json(payload): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let SummaryRequest { start, end, as_of } = payload;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    let records = payments
        .store
        .list(&PaymentFilter::default())
        .map_err(DispatchError::Store)?;
    let summary = summarize(&records, DateRange::new(start, end), as_of);

    Ok(Json(SummaryResponse {
        start,
        end,
        as_of,
        summary,
    }))
}

pub(crate) async fn tax_estimate_endpoint(
    Json(payload): Json<TaxEstimateRequest>,
) -> Result<Json<TaxSummary>, AppError> {
    let TaxEstimateRequest {
        year,
        income,
        deductions,
        tax_rate,
    } = payload;

    let summary = estimate(year, income, deductions, tax_rate)?;
    Ok(Json(summary))
}

pub(crate) async fn single_reminder_endpoint(
    Extension(payments): Extension<PaymentState>,
    Json(payload): Json<SingleReminderRequest>,
) -> Result<Json<DispatchResult>, AppError> {
    let SingleReminderRequest {
        tenant_id,
        template,
        as_of,
    } = payload;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    let result = payments
        .dispatcher
        .send_single(&tenant_id, &template, as_of)
        .await?;
    Ok(Json(result))
}

pub(crate) async fn bulk_reminder_endpoint(
    Extension(payments): Extension<PaymentState>,
    Json(payload): Json<BulkReminderRequest>,
) -> Result<Json<BulkReminderResponse>, AppError> {
    let BulkReminderRequest { template, as_of } = payload;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    let outcome = payments
        .dispatcher
        .send_bulk_overdue(&template, as_of, &CancellationToken::new())
        .await?;

    Ok(Json(BulkReminderResponse {
        template,
        as_of,
        targeted: outcome.targeted,
        attempted: outcome.attempted(),
        delivered: outcome.delivered,
        failures: outcome.failures,
        cancelled: outcome.cancelled,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{seed_demo_ledger, InMemoryPaymentStore, LoggingSmsGateway};
    use rent_ops::workflows::reminders::{ReminderDispatcher, TemplateCatalog};
    use std::sync::Arc;

    fn today() -> NaiveDate {
        "2025-06-15".parse().expect("valid date")
    }

    fn payment_state() -> PaymentState {
        let store = Arc::new(InMemoryPaymentStore::default());
        seed_demo_ledger(&store, today());
        let dispatcher = Arc::new(ReminderDispatcher::new(
            Arc::clone(&store),
            Arc::new(LoggingSmsGateway::default()),
            TemplateCatalog::standard(),
        ));
        PaymentState { store, dispatcher }
    }

    async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn summary_route_executes_through_the_router() {
        use tower::ServiceExt;

        let router = with_payment_routes(payment_state());
        let payload = json!({
            "start": "2025-04-16",
            "end": "2025-07-15",
            "as_of": "2025-06-15",
        });

        let response = router
            .oneshot(
                axum::http::Request::post("/api/v1/accounting/summary")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(
                        serde_json::to_vec(&payload).unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(
            body.get("total_collected").and_then(serde_json::Value::as_u64),
            Some(25_000)
        );
        assert_eq!(
            body.get("overdue_amount").and_then(serde_json::Value::as_u64),
            Some(63_000)
        );
    }

    #[tokio::test]
    async fn summary_endpoint_aggregates_the_seeded_ledger() {
        let request = SummaryRequest {
            start: today() - chrono::Duration::days(60),
            end: today() + chrono::Duration::days(30),
            as_of: Some(today()),
        };

        let Json(body) = accounting_summary_endpoint(Extension(payment_state()), Json(request))
            .await
            .expect("summary builds");

        assert_eq!(body.summary.total_collected, 25_000);
        assert_eq!(body.summary.overdue_amount, 18_000 + 30_000 + 15_000);
        assert_eq!(body.summary.pending_amount, 22_000);
        assert_eq!(body.summary.malformed_count, 0);
    }

    #[tokio::test]
    async fn tax_endpoint_estimates_from_request_values() {
        let request = TaxEstimateRequest {
            year: 2025,
            income: 10_000,
            deductions: DeductionBreakdown {
                maintenance: 2_000,
                insurance: 500,
                property_tax: 500,
                other: 0,
            },
            tax_rate: 20.0,
        };

        let Json(body) = tax_estimate_endpoint(Json(request))
            .await
            .expect("estimate builds");

        assert_eq!(body.net_income, 7_000);
        assert_eq!(body.estimated_tax, 1_400);
    }

    #[tokio::test]
    async fn tax_endpoint_rejects_negative_income() {
        let request = TaxEstimateRequest {
            year: 2025,
            income: -1,
            deductions: DeductionBreakdown::default(),
            tax_rate: 20.0,
        };

        let error = tax_estimate_endpoint(Json(request))
            .await
            .expect_err("negative income rejected");
        assert!(matches!(error, AppError::Tax(_)));
    }

    #[tokio::test]
    async fn single_reminder_endpoint_dispatches_for_overdue_tenant() {
        let request = SingleReminderRequest {
            tenant_id: "ten-brian".to_string(),
            template: default_template(),
            as_of: Some(today()),
        };

        let Json(body) = single_reminder_endpoint(Extension(payment_state()), Json(request))
            .await
            .expect("reminder dispatches");

        assert_eq!(body.tenant_id, "ten-brian");
        assert!(body.provider_ref.starts_with("log-"));
    }

    #[tokio::test]
    async fn bulk_reminder_endpoint_deduplicates_tenants() {
        let request = BulkReminderRequest {
            template: default_template(),
            as_of: Some(today()),
        };

        let Json(body) = bulk_reminder_endpoint(Extension(payment_state()), Json(request))
            .await
            .expect("bulk dispatch runs");

        // Seeded ledger: ten-brian overdue once, ten-wanja overdue twice.
        assert_eq!(body.targeted, 2);
        assert_eq!(body.attempted, 2);
        assert_eq!(body.delivered.len(), 2);
        assert!(body.failures.is_empty());
    }
}
