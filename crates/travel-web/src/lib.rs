pub mod pages;

use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use travel_core::{warning, AgentError, DashboardRequest, Season, Theme, TripRequest};
use travel_memory::{PlanStore, SavedPlan, StoreError};
use travel_runtime::TripPlanner;
use travel_telemetry::{Span, Telemetry};
use travel_tools::mcp::{handle_request, JsonRpcRequest, JsonRpcResponse, SESSION_HEADER};
use travel_tools::ToolProvider;

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TripPlanner>,
    pub plans: Arc<dyn PlanStore>,
    pub telemetry: Arc<Telemetry>,
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Planning(#[from] AgentError),
    #[error("plan store failure: {0}")]
    Store(#[from] StoreError),
    #[error("unreadable form: {0}")]
    InvalidForm(String),
    #[error("plan not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            WebError::Planning(AgentError::Validation(_)) | WebError::InvalidForm(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WebError::Planning(_) => StatusCode::BAD_GATEWAY,
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Store(_) | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FormRejection> for WebError {
    fn from(rejection: FormRejection) -> Self {
        WebError::InvalidForm(rejection.body_text())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let message = match &self {
            WebError::Planning(err) => err.user_message(),
            WebError::InvalidForm(_) => {
                warning("Please fill in every required field; numbers must be whole numbers.")
            }
            WebError::NotFound => warning("That travel plan is no longer available."),
            WebError::Store(_) | WebError::Internal(_) => {
                "❌ Something went wrong on our side. Please try again later.".to_string()
            }
        };
        (status, Html(pages::error_page(status.as_u16(), &message))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct PlanForm {
    pub destination: String,
    pub days: u32,
    pub travelers: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub budget: String,
}

impl From<PlanForm> for TripRequest {
    fn from(form: PlanForm) -> Self {
        TripRequest {
            destination: form.destination,
            days: form.days,
            travelers: form.travelers,
            interests: form.interests,
            budget: form.budget,
        }
    }
}

/// Dashboard widgets as submitted. `translate_to` carries "None" for no translation.
#[derive(Debug, Deserialize)]
pub struct DashboardForm {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub additional_cities: String,
    pub duration: u32,
    #[serde(default)]
    pub season: Season,
    #[serde(default)]
    pub nationality: String,
    pub budget: u32,
    pub budget_currency: String,
    #[serde(default)]
    pub translate_to: String,
    #[serde(default)]
    pub theme: Theme,
}

impl From<DashboardForm> for DashboardRequest {
    fn from(form: DashboardForm) -> Self {
        let translate_to = match form.translate_to.trim() {
            "" | "None" => None,
            lang => Some(lang.to_string()),
        };
        DashboardRequest {
            city: form.city,
            additional_cities: form.additional_cities,
            duration: form.duration,
            season: form.season,
            nationality: form.nationality,
            budget: form.budget,
            budget_currency: form.budget_currency,
            translate_to,
            theme: form.theme,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plan", post(plan_trip))
        .route("/dashboard", get(dashboard).post(generate_dashboard))
        .route("/dashboard/download/:id", get(download_plan))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Hosts a tool provider for remote planners at `POST /mcp`.
pub fn tool_server_router(provider: Arc<dyn ToolProvider>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(provider)
}

async fn index() -> Html<String> {
    Html(pages::index_page())
}

fn outcome_label<T>(result: &Result<T, AgentError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(AgentError::Validation(_)) => "invalid",
        Err(_) => "error",
    }
}

fn record_planning<T>(
    telemetry: &Telemetry,
    span: Span,
    frontend: &str,
    started: Instant,
    result: &Result<T, AgentError>,
) {
    let outcome = outcome_label(result);
    telemetry.record_planning(frontend, outcome, started.elapsed().as_secs_f64() * 1_000.0);
    Telemetry::end_span(span, outcome);
}

async fn plan_trip(
    State(state): State<AppState>,
    form: Result<Form<PlanForm>, FormRejection>,
) -> Result<Html<String>, WebError> {
    let Form(form) = form?;
    let request = TripRequest::from(form);
    let started = Instant::now();
    let span = state.telemetry.start_span("plan_trip");
    let result = state.planner.plan_form(&request).await;
    record_planning(&state.telemetry, span, "form", started, &result);
    let plan = result?;
    Ok(Html(pages::itinerary_page(&request, &plan.itinerary)))
}

async fn dashboard() -> Html<String> {
    Html(pages::dashboard_page(&DashboardRequest::default(), None))
}

async fn generate_dashboard(
    State(state): State<AppState>,
    form: Result<Form<DashboardForm>, FormRejection>,
) -> Result<Html<String>, WebError> {
    let Form(form) = form?;
    let request = DashboardRequest::from(form);
    let started = Instant::now();
    let span = state.telemetry.start_span("plan_dashboard");
    let result = state.planner.plan_dashboard(&request).await;
    record_planning(&state.telemetry, span, "dashboard", started, &result);
    let plan = result?;

    let saved = SavedPlan::new(plan.file_name.clone(), plan.answer.clone());
    let download_url = format!("/dashboard/download/{}", saved.id);
    state.plans.put(saved)?;
    Ok(Html(pages::dashboard_page(&request, Some((&plan, &download_url)))))
}

async fn download_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let plan = state.plans.get(&id)?.ok_or(WebError::NotFound)?;
    // Header values must be visible ASCII.
    let file_name: String = plan
        .file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| WebError::Internal(e.to_string()))?;
    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (CONTENT_DISPOSITION, disposition),
        ],
        plan.content,
    )
        .into_response())
}

async fn metrics(State(state): State<AppState>) -> Result<Response, WebError> {
    let body = state
        .telemetry
        .export_metrics()
        .map_err(|e| WebError::Internal(e.to_string()))?;
    Ok((
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"))],
        body,
    )
        .into_response())
}

async fn mcp_endpoint(
    State(provider): State<Arc<dyn ToolProvider>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "malformed JSON-RPC request");
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::parse_error(err.to_string())),
            )
                .into_response();
        }
    };

    // Initialize opens a session; later requests echo the id the client sends.
    let session = if request.method == "initialize" {
        Some(Uuid::new_v4().to_string())
    } else {
        headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let Some(response) = handle_request(provider.as_ref(), request).await else {
        return StatusCode::ACCEPTED.into_response();
    };
    let mut resp = Json(response).into_response();
    if let Some(value) = session.and_then(|s| HeaderValue::from_str(&s).ok()) {
        resp.headers_mut().insert(SESSION_HEADER, value);
    }
    resp
}
