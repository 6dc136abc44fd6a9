use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use flight_risk::clock::SystemClock;
use flight_risk::config::AppConfig;
use flight_risk::error::AppError;
use flight_risk::telemetry;
use flight_risk::workflows::frat::AssessmentLifecycle;
use flight_risk::workflows::fuel::FuelRequestLifecycle;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAssessmentRepository, InMemoryFuelRequestRepository};
use crate::routes::with_engine_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.catalog.take() {
        config.frat.catalog_path = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let catalog = Arc::new(config.frat.load_catalog()?);
    info!(
        sections = catalog.sections().len(),
        max_total = catalog.max_total(),
        source = ?config.frat.catalog_path,
        "checklist catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let clock = Arc::new(SystemClock);
    let assessments = Arc::new(AssessmentLifecycle::new(
        Arc::new(InMemoryAssessmentRepository::default()),
        catalog,
        clock.clone(),
    ));
    let fuel = Arc::new(FuelRequestLifecycle::new(
        Arc::new(InMemoryFuelRequestRepository::default()),
        clock,
    ));

    let app = with_engine_routes(assessments, fuel)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "flight risk engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
