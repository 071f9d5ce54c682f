//! Medical record handlers.
//!
//! Every route here runs behind the JWT middleware; the doctor is the
//! `CurrentUser` it inserts.

use axum::{
    extract::{
        multipart::Multipart, rejection::QueryRejection, Path, Query, State,
    },
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{ConsultationMetrics, EntityAnalysis, Visualization};
use crate::errors::{AppError, AppResult};
use crate::services::{ClosedConsultation, ProcessedRecord};

/// Question about the current record
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "Question is required"))]
    #[schema(example = "Is the haemoglobin trend concerning?")]
    pub question: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VisualizationsResponse {
    pub visualizations: Vec<Visualization>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LabResultsResponse {
    #[schema(value_type = Vec<Object>)]
    pub lab_results: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestNamesResponse {
    pub test_names: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionClearedResponse {
    pub message: String,
    pub keys_removed: u64,
}

#[derive(Debug, Deserialize)]
pub struct LabResultsQuery {
    pub name: Option<String>,
}

/// Multipart upload body, documented for Swagger only
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RecordUpload {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Create medical record routes
pub fn medical_routes() -> Router<AppState> {
    Router::new()
        .route("/process-medical-record", post(process_medical_record))
        .route("/close-consultation/:consultation_id", post(close_consultation))
        .route("/metrics", get(metrics))
        .route("/chat-with-ai", post(chat_with_ai))
        .route("/analyze-entities", post(analyze_entities))
        .route("/visualize", post(visualize))
        .route("/visualizations/:title", get(visualization_by_title))
        .route("/lab-results", get(lab_results))
        .route("/lab-results/names", get(test_names))
        .route("/session", delete(clear_session))
}

/// Upload a record, summarize it and start a consultation
#[utoipa::path(
    post,
    path = "/api/process-medical-record",
    tag = "Medical Records",
    request_body(content = RecordUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record processed", body = ProcessedRecord),
        (status = 400, description = "Missing file, active consultation or no extractable text"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Language model failure"),
        (status = 504, description = "Processing timed out")
    ),
    security(("bearer_auth" = []))
)]
pub async fn process_medical_record(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<ProcessedRecord>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| AppError::bad_request("No file provided"))?;
    tracing::info!(
        username = %current_user.username,
        file_name = %file_name,
        size = bytes.len(),
        "Processing medical record"
    );

    let processed = state
        .medical_service
        .process_record(&current_user.username, &file_name, bytes.to_vec())
        .await?;

    Ok(Json(processed))
}

/// Close an active consultation
#[utoipa::path(
    post,
    path = "/api/close-consultation/{consultation_id}",
    tag = "Consultations",
    params(("consultation_id" = String, Path, description = "Consultation ID")),
    responses(
        (status = 200, description = "Consultation closed", body = ClosedConsultation),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Consultation not found or already closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn close_consultation(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(consultation_id): Path<String>,
) -> AppResult<Json<ClosedConsultation>> {
    let closed = state
        .consultation_service
        .close(&consultation_id, &current_user.username)
        .await?;

    Ok(Json(closed))
}

/// Aggregate consultation durations
#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "Consultations",
    responses(
        (status = 200, description = "Consultation metrics", body = ConsultationMetrics),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn metrics(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ConsultationMetrics>> {
    let metrics = state
        .consultation_service
        .metrics(&current_user.username)
        .await?;
    Ok(Json(metrics))
}

/// Ask the assistant about the current record
#[utoipa::path(
    post,
    path = "/api/chat-with-ai",
    tag = "Medical Records",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant answer", body = ChatResponse),
        (status = 400, description = "No active consultation, no record or no question"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Language model failure")
    ),
    security(("bearer_auth" = []))
)]
pub async fn chat_with_ai(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let response = state
        .medical_service
        .chat(&current_user.username, &payload.question)
        .await?;
    Ok(Json(ChatResponse { response }))
}

/// Conditions, correlations and risk assessments
#[utoipa::path(
    post,
    path = "/api/analyze-entities",
    tag = "Medical Records",
    responses(
        (status = 200, description = "Entity analysis", body = EntityAnalysis),
        (status = 400, description = "No active consultation or no analysis"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analyze_entities(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<EntityAnalysis>> {
    let analysis = state.medical_service.entities(&current_user.username).await?;
    Ok(Json(analysis))
}

/// Charts derived from the record
#[utoipa::path(
    post,
    path = "/api/visualize",
    tag = "Medical Records",
    responses(
        (status = 200, description = "Visualizations", body = VisualizationsResponse),
        (status = 400, description = "No active consultation or no analysis"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn visualize(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<VisualizationsResponse>> {
    let visualizations = state
        .medical_service
        .visualizations(&current_user.username)
        .await?;
    Ok(Json(VisualizationsResponse { visualizations }))
}

/// One chart by title (case-insensitive)
#[utoipa::path(
    get,
    path = "/api/visualizations/{title}",
    tag = "Medical Records",
    params(("title" = String, Path, description = "Visualization title")),
    responses(
        (status = 200, description = "Visualization"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Visualization not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn visualization_by_title(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(title): Path<String>,
) -> AppResult<Json<Value>> {
    let visualization = state
        .medical_service
        .visualization_by_title(&current_user.username, &title)
        .await?;
    Ok(Json(visualization))
}

/// Lab results, optionally for a single test
#[utoipa::path(
    get,
    path = "/api/lab-results",
    tag = "Medical Records",
    params(("name" = Option<String>, Query, description = "Test name (case-insensitive)")),
    responses(
        (status = 200, description = "Lab results", body = LabResultsResponse),
        (status = 400, description = "No active consultation or no analysis"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn lab_results(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    query: Result<Query<LabResultsQuery>, QueryRejection>,
) -> AppResult<Json<LabResultsResponse>> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let username = &current_user.username;

    let lab_results = match query.name.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(name) => state.medical_service.tests_by_name(username, name).await?,
        None => state.medical_service.lab_results(username).await?,
    };
    Ok(Json(LabResultsResponse { lab_results }))
}

/// Distinct lab test names
#[utoipa::path(
    get,
    path = "/api/lab-results/names",
    tag = "Medical Records",
    responses(
        (status = 200, description = "Test names", body = TestNamesResponse),
        (status = 400, description = "No active consultation or no analysis"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn test_names(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<TestNamesResponse>> {
    let test_names = state
        .medical_service
        .test_names(&current_user.username)
        .await?;
    Ok(Json(TestNamesResponse { test_names }))
}

/// Drop the cached record and summary
#[utoipa::path(
    delete,
    path = "/api/session",
    tag = "Medical Records",
    responses(
        (status = 200, description = "Session data cleared", body = SessionClearedResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn clear_session(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<SessionClearedResponse>> {
    let keys_removed = state
        .medical_service
        .clear_session(&current_user.username)
        .await?;
    Ok(Json(SessionClearedResponse {
        message: "Session data cleared".to_string(),
        keys_removed,
    }))
}
