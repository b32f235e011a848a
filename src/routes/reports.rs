use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::reports::{
        GenerateReportRequest, ReportList, ReportSummaryList, ReportWithLines,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::ReportRangeQuery,
    services::report_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(generate_report))
        .route("/range", get(reports_by_range))
        .route("/user/{id}", get(reports_by_user))
        .route("/{id}", get(report_detail))
        .route("/{id}", delete(delete_report))
}

#[utoipa::path(
    get,
    path = "/api/reports",
    responses(
        (status = 200, description = "All reports, newest first", body = ApiResponse<ReportSummaryList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ReportSummaryList>>> {
    let resp = report_service::list_reports(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = GenerateReportRequest,
    responses(
        (status = 200, description = "Generate a report over selected orders", body = ApiResponse<ReportWithLines>),
        (status = 400, description = "Invalid selection or dates"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn generate_report(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<GenerateReportRequest>,
) -> AppResult<Json<ApiResponse<ReportWithLines>>> {
    let resp = report_service::generate_report(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/range",
    params(
        ("start" = String, Query, description = "Inclusive start date, YYYY-MM-DD"),
        ("end" = String, Query, description = "Inclusive end date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Reports generated in the window, newest first", body = ApiResponse<ReportList>),
        (status = 400, description = "Missing or malformed dates"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn reports_by_range(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportRangeQuery>,
) -> AppResult<Json<ApiResponse<ReportList>>> {
    let resp = report_service::reports_by_range(
        &state,
        &user,
        query.start.as_deref(),
        query.end.as_deref(),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Reports generated by one user, newest first", body = ApiResponse<ReportList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn reports_by_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReportList>>> {
    let resp = report_service::reports_by_user(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report with its lines", body = ApiResponse<ReportWithLines>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn report_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReportWithLines>>> {
    let resp = report_service::report_detail(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Delete report and its lines"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn delete_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = report_service::delete_report(&state, &user, id).await?;
    Ok(Json(resp))
}
