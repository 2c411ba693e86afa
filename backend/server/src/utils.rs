use axum::body::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::AppError::{self, MalformedPayload, MissingPayload, MissingPrompt};

#[derive(Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    prompt: Option<String>,
}

/// Reads a JSON body by hand so that an empty or broken body maps onto
/// `AppError` instead of axum's own rejection text.
pub fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(MissingPayload);
    }

    serde_json::from_slice(body).map_err(|e| MalformedPayload(e.to_string()))
}

pub fn prompt_from_body(body: &Bytes) -> Result<String, AppError> {
    let request: PromptRequest = parse_json(body)?;

    match request.prompt {
        Some(prompt) if !prompt.is_empty() => Ok(prompt),
        _ => Err(MissingPrompt),
    }
}

/// Lower bound for `/data?hours=N`. A missing, zero or non-integer value
/// means no filter. A negative value puts the bound in the future.
pub fn since_hours(hours: Option<&str>, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(hours) = hours.and_then(|raw| raw.trim().parse::<i64>().ok()) else {
        return Ok(None);
    };

    if hours == 0 {
        return Ok(None);
    }

    Duration::try_hours(hours)
        .and_then(|window| now.checked_sub_signed(window))
        .map(Some)
        .ok_or_else(|| MalformedPayload(format!("hours out of range: {hours}")))
}
