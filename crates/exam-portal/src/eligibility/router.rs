use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    Actor, AssessmentId, AssessmentSubmission, AssessmentUpdate, ExceptionalCaseReview,
    NstbApproval, Role, StudentId,
};
use super::overseas::{
    ExaminationResultsUpdate, OverseasServiceError, OverseasStudentId,
    OverseasStudentRegistration, OverseasStudentService,
};
use super::repository::{
    AssessmentFilter, AssessmentRepository, GradeHistory, OverseasStudentRepository,
    ScholarshipRepository,
};
use super::scholarship::{
    ScholarshipId, ScholarshipRegistration, ScholarshipService, ScholarshipServiceError,
};
use super::service::{AssessmentService, AssessmentServiceError};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Router builder exposing assessment management and board review endpoints.
pub fn assessment_router<R>(service: Arc<AssessmentService<R>>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments",
            post(create_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/assessments/:assessment_id",
            get(get_handler::<R>)
                .patch(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/review",
            post(review_handler::<R>),
        )
        .route(
            "/api/v1/eligibility/priority-students",
            get(priority_handler::<R>),
        )
        .route(
            "/api/v1/eligibility/exceptional-cases",
            get(exceptional_handler::<R>),
        )
        .with_state(service)
}

/// Router builder for overseas applications.
pub fn overseas_router<O>(service: Arc<OverseasStudentService<O>>) -> Router
where
    O: OverseasStudentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/overseas-students",
            post(register_overseas_handler::<O>),
        )
        .route(
            "/api/v1/overseas-students/:student_id",
            get(get_overseas_handler::<O>),
        )
        .route(
            "/api/v1/overseas-students/:student_id/results",
            put(record_results_handler::<O>),
        )
        .route(
            "/api/v1/overseas-students/:student_id/eligibility",
            post(assess_overseas_handler::<O>),
        )
        .with_state(service)
}

/// Router builder for scholarship criteria matching.
pub fn scholarship_router<S, G>(service: Arc<ScholarshipService<S, G>>) -> Router
where
    S: ScholarshipRepository + 'static,
    G: GradeHistory + 'static,
{
    Router::new()
        .route(
            "/api/v1/scholarships",
            post(register_scholarship_handler::<S, G>),
        )
        .route(
            "/api/v1/scholarships/:scholarship_id",
            get(get_scholarship_handler::<S, G>),
        )
        .route(
            "/api/v1/scholarships/:scholarship_id/eligibility/:student_id",
            get(check_scholarship_handler::<S, G>),
        )
        .route(
            "/api/v1/students/:student_id/eligible-scholarships",
            get(eligible_scholarships_handler::<S, G>),
        )
        .with_state(service)
}

/// Builds the caller identity forwarded by the authentication gateway.
pub(crate) fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let id = headers
        .get(ACTOR_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let role = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse);

    match (id, role) {
        (Some(id), Some(role)) => Ok(Actor::new(id, role)),
        _ => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "missing or unrecognised actor headers".to_string(),
        )),
    }
}

pub(crate) fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "not_found" => StatusCode::NOT_FOUND,
        "duplicate_record" | "invalid_state" => StatusCode::CONFLICT,
        "unauthorized" => StatusCode::FORBIDDEN,
        "validation_error" => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(kind, %message, "eligibility request failed");
    }
    let payload = json!({
        "error": message,
        "kind": kind,
    });
    (status, Json(payload)).into_response()
}

fn service_error(kind: &'static str, message: String) -> Response {
    error_response(status_for_kind(kind), kind, message)
}

impl IntoResponse for AssessmentServiceError {
    fn into_response(self) -> Response {
        service_error(self.kind(), self.to_string())
    }
}

impl IntoResponse for OverseasServiceError {
    fn into_response(self) -> Response {
        service_error(self.kind(), self.to_string())
    }
}

impl IntoResponse for ScholarshipServiceError {
    fn into_response(self) -> Response {
        service_error(self.kind(), self.to_string())
    }
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Json(submission): Json<AssessmentSubmission>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.create(&actor, submission) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Query(filter): Query<AssessmentFilter>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    match service.list(&filter) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    match service.get(&AssessmentId(assessment_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Path(assessment_id): Path<String>,
    Json(update): Json<AssessmentUpdate>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.update(&actor, &AssessmentId(assessment_id), update) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.delete(&actor, &AssessmentId(assessment_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn review_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Path(assessment_id): Path<String>,
    Json(review): Json<ExceptionalCaseReview>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.review_exceptional_case(&actor, &AssessmentId(assessment_id), review, Utc::now())
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PriorityQuery {
    #[serde(default)]
    academic_year: Option<String>,
}

pub(crate) async fn priority_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Query(query): Query<PriorityQuery>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    match service.priority_students(query.academic_year) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExceptionalQuery {
    #[serde(default)]
    status: Option<NstbApproval>,
}

pub(crate) async fn exceptional_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Query(query): Query<ExceptionalQuery>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let status = query.status.unwrap_or(NstbApproval::Pending);
    match service.exceptional_cases(status) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn register_overseas_handler<O>(
    State(service): State<Arc<OverseasStudentService<O>>>,
    Json(registration): Json<OverseasStudentRegistration>,
) -> Response
where
    O: OverseasStudentRepository + 'static,
{
    match service.register(registration) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_overseas_handler<O>(
    State(service): State<Arc<OverseasStudentService<O>>>,
    Path(student_id): Path<String>,
) -> Response
where
    O: OverseasStudentRepository + 'static,
{
    match service.get(&OverseasStudentId(student_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn record_results_handler<O>(
    State(service): State<Arc<OverseasStudentService<O>>>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
    Json(update): Json<ExaminationResultsUpdate>,
) -> Response
where
    O: OverseasStudentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.record_results(&actor, &OverseasStudentId(student_id), update, Utc::now()) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn assess_overseas_handler<O>(
    State(service): State<Arc<OverseasStudentService<O>>>,
    Path(student_id): Path<String>,
) -> Response
where
    O: OverseasStudentRepository + 'static,
{
    match service.assess(&OverseasStudentId(student_id), Utc::now()) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn register_scholarship_handler<S, G>(
    State(service): State<Arc<ScholarshipService<S, G>>>,
    headers: HeaderMap,
    Json(registration): Json<ScholarshipRegistration>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    G: GradeHistory + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.register(&actor, registration) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_scholarship_handler<S, G>(
    State(service): State<Arc<ScholarshipService<S, G>>>,
    Path(scholarship_id): Path<String>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    G: GradeHistory + 'static,
{
    match service.get(&ScholarshipId(scholarship_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn check_scholarship_handler<S, G>(
    State(service): State<Arc<ScholarshipService<S, G>>>,
    Path((scholarship_id, student_id)): Path<(String, String)>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    G: GradeHistory + 'static,
{
    match service.check(&ScholarshipId(scholarship_id), &StudentId(student_id)) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EligibleScholarshipsQuery {
    #[serde(default)]
    on: Option<NaiveDate>,
}

pub(crate) async fn eligible_scholarships_handler<S, G>(
    State(service): State<Arc<ScholarshipService<S, G>>>,
    Path(student_id): Path<String>,
    Query(query): Query<EligibleScholarshipsQuery>,
) -> Response
where
    S: ScholarshipRepository + 'static,
    G: GradeHistory + 'static,
{
    let today = query.on.unwrap_or_else(|| Utc::now().date_naive());
    match service.eligible_scholarships(&StudentId(student_id), today) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error.into_response(),
    }
}
