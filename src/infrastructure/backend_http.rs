use crate::domain::models::SessionToken;
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Utc};
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

/// Joins path segments onto the configured backend URL, tolerating a trailing
/// slash on the base.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, InfraError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| InfraError::InvalidConfig(format!("backend URL cannot be a base: {base}")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

pub fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
    if value.trim().is_empty() {
        return Err(InfraError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn with_session(request: RequestBuilder, session: &SessionToken) -> RequestBuilder {
    request.header(COOKIE, session.cookie.as_str())
}

/// Collects the `name=value` part of every `Set-Cookie` header.
pub fn session_from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Option<SessionToken> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, value)| !name.trim().is_empty() && !value.is_empty())
        })
        .collect();
    if pairs.is_empty() {
        return None;
    }
    Some(SessionToken {
        cookie: pairs.join("; "),
        stored_at: now,
    })
}

fn http_error(action: &str, status: StatusCode, body: &str) -> InfraError {
    let message = if body.trim().is_empty() {
        format!("{action}: http {}", status.as_u16())
    } else {
        format!("{action}: http {}; body={body}", status.as_u16())
    };
    InfraError::Http(message)
}

/// Checks the `{success, message, ...}` envelope every backend route answers
/// with and returns the whole object for field extraction.
pub fn parse_envelope(
    action: &str,
    status: StatusCode,
    body: &str,
) -> Result<serde_json::Value, InfraError> {
    let parsed = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) if value.is_object() => value,
        Ok(_) | Err(_) if !status.is_success() => return Err(http_error(action, status, body)),
        Ok(_) => {
            return Err(InfraError::Http(format!(
                "{action}: response is not a JSON object; body={body}"
            )));
        }
        Err(error) => {
            return Err(InfraError::Http(format!(
                "{action}: invalid response payload: {error}; body={body}"
            )));
        }
    };

    let success = parsed
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    if !success {
        let message = envelope_message(&parsed).unwrap_or_else(|| format!("{action} failed"));
        return Err(InfraError::Backend(message));
    }
    if !status.is_success() {
        return Err(http_error(action, status, body));
    }
    Ok(parsed)
}

pub fn envelope_message(envelope: &serde_json::Value) -> Option<String> {
    envelope
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}

pub fn required_field<T: DeserializeOwned>(
    envelope: &serde_json::Value,
    key: &str,
    action: &str,
) -> Result<T, InfraError> {
    let value = envelope
        .get(key)
        .cloned()
        .ok_or_else(|| InfraError::Http(format!("{action}: response did not include {key}")))?;
    serde_json::from_value(value)
        .map_err(|error| InfraError::Http(format!("{action}: invalid {key} payload: {error}")))
}

pub fn optional_field<T: DeserializeOwned>(
    envelope: &serde_json::Value,
    key: &str,
    action: &str,
) -> Result<Option<T>, InfraError> {
    match envelope.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(_) => required_field(envelope, key, action).map(Some),
    }
}
