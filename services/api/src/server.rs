use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_ledger, AppState, InMemoryPaymentStore, LoggingSmsGateway, PaymentState,
};
use crate::routes::with_payment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use rent_ops::config::AppConfig;
use rent_ops::error::AppError;
use rent_ops::telemetry;
use rent_ops::workflows::reminders::{DispatchLimits, ReminderDispatcher, TemplateCatalog};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryPaymentStore::default());
    if args.seed_demo {
        seed_demo_ledger(&store, Local::now().date_naive());
    }

    let dispatcher = Arc::new(ReminderDispatcher::with_limits(
        Arc::clone(&store),
        Arc::new(LoggingSmsGateway::default()),
        TemplateCatalog::standard(),
        DispatchLimits::from_config(&config.reminders),
    ));
    let payment_state = PaymentState { store, dispatcher };

    let app = with_payment_routes(payment_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "payment operations service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
