//! Request helpers shared by the task handlers

use axum::http::{HeaderMap, header};
use http_body_util::BodyExt;

use super::models::SubmitTaskRequest;
use crate::api::error::ApiError;
use crate::tasks::TaskKind;

/// Require an `application/json` Content-Type (charset parameter allowed).
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let raw = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;

    let media_type: mime::Mime = raw
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid Content-Type: {raw}")))?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(())
}

/// Collect the request body, rejecting anything over `max_bytes`.
pub async fn read_body(body: axum::body::Body, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let data = body
        .collect()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .to_bytes();

    if data.len() > max_bytes {
        return Err(ApiError::PayloadTooLarge(data.len()));
    }
    Ok(data.to_vec())
}

/// Decode a submission into `(url, kind)`.
///
/// The url is passed through untrimmed; emptiness is checked at
/// registration. A missing or unknown `type` means video.
pub fn parse_submission(bytes: &[u8]) -> Result<(String, TaskKind), ApiError> {
    let request: SubmitTaskRequest = serde_json::from_slice(bytes)?;
    let kind = TaskKind::from_lenient(request.kind.as_ref().and_then(serde_json::Value::as_str));
    Ok((request.url.unwrap_or_default(), kind))
}
