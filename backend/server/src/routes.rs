use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use ledger::{
    collections::{
        all_sales, fetch_relevant_data, sales_since, sales_summary, store_ai_log, store_feedback,
    },
    models::SalesRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    analytics::{
        cards::insight_cards, dashboard::dashboard, recommendations::recommendations,
        trends::trends,
    },
    error::AppError,
    insight::generate_insight,
    notify::Notification,
    state::AppState,
    utils::{parse_json, prompt_from_body, since_hours},
};

/// Envelope shared by the read views.
#[derive(Serialize)]
pub struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
pub struct DataQuery {
    hours: Option<String>,
}

pub async fn data_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DataQuery>,
) -> Result<impl IntoResponse, AppError> {
    let records = match since_hours(query.hours.as_deref(), Utc::now())? {
        Some(since) => sales_since(state.store.as_ref(), since).await?,
        None => all_sales(state.store.as_ref()).await?,
    };

    state.notifier.publish(Notification::DataUpdate {
        count: records.len(),
    });

    Ok((StatusCode::OK, Json(records)))
}

pub async fn generate_handler(body: Bytes) -> Result<impl IntoResponse, AppError> {
    let prompt = prompt_from_body(&body)?;

    Ok(Json(json!({ "response": generate_insight(&prompt) })))
}

pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let records = all_sales(state.store.as_ref()).await?;

    Ok(Json(Data {
        data: dashboard(&records),
    }))
}

pub async fn trends_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let records = all_sales(state.store.as_ref()).await?;

    Ok(Json(Data {
        data: trends(&records),
    }))
}

pub async fn insight_cards_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let records = all_sales(state.store.as_ref()).await?;

    Ok(Json(Data {
        data: insight_cards(&records)?,
    }))
}

pub async fn recommendations_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let records = all_sales(state.store.as_ref()).await?;

    Ok(Json(Data {
        data: recommendations(&records),
    }))
}

pub async fn sales_summary_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let summary = sales_summary(state.store.as_ref()).await?;

    Ok(Json(Data { data: summary }))
}

pub async fn feedback_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let feedback: Value = parse_json(&body)?;
    if !feedback.is_object() {
        return Err(AppError::MalformedPayload(
            "feedback must be a JSON object".to_string(),
        ));
    }

    // Held across the insert so the log and the collection keep the same order
    let mut log = state.feedback_log.lock().await;
    store_feedback(state.store.as_ref(), feedback.clone()).await?;
    log.push(feedback);

    info!(entries = log.len(), "Feedback received");

    Ok(Json(json!({ "status": "received" })))
}

pub async fn feedback_log_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let log = state.feedback_log.lock().await;

    Json(Data { data: log.clone() })
}

pub async fn ai_log_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let log: Value = parse_json(&body)?;
    store_ai_log(state.store.as_ref(), log).await?;

    Ok(Json(json!({ "status": "logged" })))
}

pub async fn notify_new_sale_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let sale: SalesRecord = parse_json(&body)?;

    let receivers = state.notifier.publish(Notification::NewSale(sale));
    info!(receivers, "Relayed new sale");

    Ok(Json(json!({ "status": "notified" })))
}

pub async fn generate_insight_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let prompt = prompt_from_body(&body)?;

    let relevant = fetch_relevant_data(state.store.as_ref(), &prompt).await?;
    let full_prompt = format!("{prompt}\n\nRelevant Data:\n{relevant}");

    Ok(Json(json!({ "insight": generate_insight(&full_prompt) })))
}
