use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAssessmentRepository, InMemoryGradeHistory, InMemoryOverseasRepository,
    InMemoryScholarshipRepository,
};
use crate::routes::with_eligibility_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use exam_portal::config::AppConfig;
use exam_portal::eligibility::{
    AssessmentRegistry, AssessmentService, OverseasStudentService, ScholarshipService,
};
use exam_portal::error::AppError;
use exam_portal::telemetry;
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

    let assessments = Arc::new(InMemoryAssessmentRepository::default());
    let evaluation_config = config.eligibility.evaluation_config();
    let assessment_service = Arc::new(AssessmentService::new(
        assessments.clone(),
        evaluation_config,
    ));
    let overseas_service = Arc::new(OverseasStudentService::new(
        Arc::new(InMemoryOverseasRepository::default()),
        AssessmentRegistry::for_repository(assessments),
    ));
    let scholarship_service = Arc::new(ScholarshipService::new(
        Arc::new(InMemoryScholarshipRepository::default()),
        Arc::new(InMemoryGradeHistory::default()),
    ));

    let app = with_eligibility_routes(assessment_service, overseas_service, scholarship_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        average_basis = ?config.eligibility.average_basis,
        "scholarship eligibility service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
