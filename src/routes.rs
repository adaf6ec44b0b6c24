use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{
        HeaderMap,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    auth::verify_admin,
    error::AppError,
    export::{CsvExport, to_csv},
    records::{
        ContactPayload, ContactSubmission, EmailSignup, Record, SignupPayload, SiteVisit,
        VisitPayload, now_timestamp, storage_key,
    },
    state::AppState,
    stats::{VisitSummary, summarize},
};

#[derive(Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl Ack {
    fn with_message(message: &'static str) -> Self {
        Self {
            success: true,
            message: Some(message),
        }
    }

    fn bare() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<Ack>, AppError> {
    let record = payload.into_record(now_timestamp())?;
    let key = persist(&state, &record, "Failed to submit contact form").await?;

    info!("Contact form submission saved: {key}");
    Ok(Json(Ack::with_message("Contact form submitted successfully")))
}

pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupPayload>,
) -> Result<Json<Ack>, AppError> {
    let record = payload.into_record(now_timestamp())?;
    let key = persist(&state, &record, "Failed to save email signup").await?;

    info!("Email signup saved: {key}");
    Ok(Json(Ack::with_message("Email signup successful")))
}

pub async fn visit_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VisitPayload>,
) -> Result<Json<Ack>, AppError> {
    let record = payload.into_record(now_timestamp())?;
    let key = persist(&state, &record, "Failed to record visit").await?;

    info!("Site visit saved: {key}");
    Ok(Json(Ack::bare()))
}

pub async fn visit_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VisitSummary>, AppError> {
    let visits: Vec<SiteVisit> = load_records(&state, "Failed to load visit statistics").await?;

    Ok(Json(summarize(&visits, Utc::now())))
}

pub async fn export_contacts_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    export_csv::<ContactSubmission>(&state, &headers, "Failed to export contacts").await
}

pub async fn export_signups_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    export_csv::<EmailSignup>(&state, &headers, "Failed to export signups").await
}

pub async fn export_visits_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    export_csv::<SiteVisit>(&state, &headers, "Failed to export visits").await
}

async fn persist<R: Record>(
    state: &AppState,
    record: &R,
    context: &'static str,
) -> Result<String, AppError> {
    let key = storage_key(R::PREFIX, record.timestamp());

    let value = serde_json::to_value(record)
        .map_err(Into::into)
        .map_err(AppError::store(context))?;

    state
        .kv
        .set(&key, value)
        .await
        .map_err(AppError::store(context))?;

    Ok(key)
}

async fn load_records<R: Record>(
    state: &AppState,
    context: &'static str,
) -> Result<Vec<R>, AppError> {
    let values = state
        .kv
        .get_by_prefix(R::PREFIX)
        .await
        .map_err(AppError::store(context))?;

    let mut records = Vec::with_capacity(values.len());
    for value in values {
        let record = serde_json::from_value(value)
            .map_err(Into::into)
            .map_err(AppError::store(context))?;
        records.push(record);
    }

    Ok(records)
}

async fn export_csv<R: CsvExport>(
    state: &AppState,
    headers: &HeaderMap,
    context: &'static str,
) -> Result<Response, AppError> {
    verify_admin(&state.config, headers)?;

    let mut records: Vec<R> = load_records(state, context).await?;
    if records.is_empty() {
        return Err(AppError::NotFound(R::EMPTY_MESSAGE));
    }

    // Scan order is store-defined, the download should read chronologically.
    records.sort_by(|a, b| a.timestamp().cmp(b.timestamp()));

    info!("Exported {} rows to {}", records.len(), R::FILENAME);

    let response_headers = [
        (CONTENT_TYPE, "text/csv".to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename={}", R::FILENAME),
        ),
    ];

    Ok((response_headers, to_csv(&records)).into_response())
}
