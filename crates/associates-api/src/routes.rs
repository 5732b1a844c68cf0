//! Route definitions
//!
//! - `GET /health`
//! - `POST /admin/associates` - register a pending associate and mint its token
//! - `GET /admin/associates` - list associates, optionally `?status=`
//! - `POST /admin/associates/:id/reject`
//! - `POST /admin/associates/:id/token` - replace the access token
//! - `GET|POST /associate/field/:token`
//! - `GET|POST /associate/form/:token`
//!
//! GET on an associate page resolves the token before the page is rendered;
//! POST hands the payload to the submission gateway.

use associates_core::{
    AccessToken, AssociateDirectory, AssociateId, AssociateStatus, CoreConfig, CreatedAssociate,
    NewAssociate, RecordStore, SubmissionGateway, SubmissionPayload,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::response::{ApiResponse, AssociateView, HealthResponse, Page, PageResponse};

/// State shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<SubmissionGateway>,
    pub directory: Arc<AssociateDirectory>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: CoreConfig) -> Self {
        Self {
            gateway: Arc::new(SubmissionGateway::new(store.clone(), config.clone())),
            directory: Arc::new(AssociateDirectory::new(store, config)),
            start_time: Instant::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Admin endpoints
        .route("/admin/associates", post(create_associate).get(list_associates))
        .route("/admin/associates/:id/reject", post(reject_associate))
        .route("/admin/associates/:id/token", post(reissue_token))
        // Token-gated associate pages
        .route("/associate/field/:token", get(show_field).post(submit_field))
        .route("/associate/form/:token", get(show_form).post(submit_form))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn parse_id(raw: &str) -> Result<AssociateId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid associate id '{raw}'")))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// POST /admin/associates
pub async fn create_associate(
    State(state): State<AppState>,
    Json(request): Json<NewAssociate>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedAssociate>>), ApiError> {
    let created = state.directory.create_associate(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(created, request_id())),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<AssociateStatus>,
}

/// GET /admin/associates
pub async fn list_associates(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AssociateView>>>, ApiError> {
    let records = state.directory.list_associates(query.status).await?;
    let views: Vec<AssociateView> = records.iter().map(AssociateView::from).collect();
    Ok(Json(ApiResponse::success(views, request_id())))
}

/// POST /admin/associates/:id/reject
pub async fn reject_associate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AssociateView>>, ApiError> {
    let id = parse_id(&id)?;
    let record = state.directory.reject_associate(&id).await?;
    Ok(Json(ApiResponse::success(
        AssociateView::from(&record),
        request_id(),
    )))
}

/// POST /admin/associates/:id/token
pub async fn reissue_token(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AccessToken>>, ApiError> {
    let id = parse_id(&id)?;
    let token = state.directory.reissue_token(&id).await?;
    Ok(Json(ApiResponse::success(token, request_id())))
}

async fn show_page(
    state: &AppState,
    page: Page,
    token: &str,
) -> Result<Json<ApiResponse<PageResponse>>, ApiError> {
    let record = state.gateway.preview(token).await?;
    Ok(Json(ApiResponse::success(
        PageResponse {
            page,
            associate: AssociateView::from(&record),
        },
        request_id(),
    )))
}

async fn submit_page(
    state: &AppState,
    page: Page,
    token: &str,
    payload: &SubmissionPayload,
) -> Result<Json<ApiResponse<PageResponse>>, ApiError> {
    let record = state.gateway.submit(token, payload).await?;
    Ok(Json(ApiResponse::success(
        PageResponse {
            page,
            associate: AssociateView::from(&record),
        },
        request_id(),
    )))
}

/// GET /associate/field/:token
pub async fn show_field(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<PageResponse>>, ApiError> {
    show_page(&state, Page::Field, &token).await
}

/// GET /associate/form/:token
pub async fn show_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<PageResponse>>, ApiError> {
    show_page(&state, Page::Form, &token).await
}

/// POST /associate/field/:token
pub async fn submit_field(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<SubmissionPayload>,
) -> Result<Json<ApiResponse<PageResponse>>, ApiError> {
    submit_page(&state, Page::Field, &token, &payload).await
}

/// POST /associate/form/:token
pub async fn submit_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<SubmissionPayload>,
) -> Result<Json<ApiResponse<PageResponse>>, ApiError> {
    submit_page(&state, Page::Form, &token, &payload).await
}
