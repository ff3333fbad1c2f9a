use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use exam_portal::eligibility::{
    assessment_router, overseas_router, scholarship_router, AssessmentRepository,
    AssessmentService, GradeHistory, OverseasStudentRepository, OverseasStudentService,
    ScholarshipRepository, ScholarshipService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_eligibility_routes<R, O, S, G>(
    assessments: Arc<AssessmentService<R>>,
    overseas: Arc<OverseasStudentService<O>>,
    scholarships: Arc<ScholarshipService<S, G>>,
) -> axum::Router
where
    R: AssessmentRepository + 'static,
    O: OverseasStudentRepository + 'static,
    S: ScholarshipRepository + 'static,
    G: GradeHistory + 'static,
{
    assessment_router(assessments)
        .merge(overseas_router(overseas))
        .merge(scholarship_router(scholarships))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        InMemoryAssessmentRepository, InMemoryGradeHistory, InMemoryOverseasRepository,
        InMemoryScholarshipRepository,
    };
    use axum::body::Body;
    use axum::http::Request;
    use exam_portal::eligibility::{AssessmentRegistry, EvaluationConfig};
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let assessments = Arc::new(InMemoryAssessmentRepository::default());
        let assessment_service = Arc::new(AssessmentService::new(
            assessments.clone(),
            EvaluationConfig::standard(),
        ));
        let overseas_service = Arc::new(OverseasStudentService::new(
            Arc::new(InMemoryOverseasRepository::default()),
            AssessmentRegistry::for_repository(assessments),
        ));
        let scholarship_service = Arc::new(ScholarshipService::new(
            Arc::new(InMemoryScholarshipRepository::default()),
            Arc::new(InMemoryGradeHistory::default()),
        ));
        with_eligibility_routes(assessment_service, overseas_service, scholarship_service)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn merged_router_serves_every_surface() {
        let router = app();

        for uri in [
            "/health",
            "/api/v1/assessments",
            "/api/v1/eligibility/priority-students",
            "/api/v1/eligibility/exceptional-cases?status=Pending",
        ] {
            let response = router
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
                .await
                .expect("router response");
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }

        let missing = router
            .oneshot(
                Request::get("/api/v1/overseas-students/ovs-unknown")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_route_is_reachable_through_merged_router() {
        let payload = json!({
            "student_id": "S1",
            "academic_year": "2024",
            "assessment_type": "DAEU",
            "student_track": "Science",
            "subjects_enrolled": [
                { "subject_name": "French", "score": 12.0 },
                { "subject_name": "Mathematics", "score": 15.0 },
                { "subject_name": "History", "score": 13.0 }
            ]
        });

        let response = app()
            .oneshot(
                Request::post("/api/v1/assessments")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-actor-id", "teacher-07")
                    .header("x-actor-role", "teacher")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
