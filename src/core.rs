//! Shared runtime-agnostic logic for the async and blocking clients.
//!
//! Both clients build the same requests and read the same responses; only the
//! I/O differs. Everything here is pure so it can be tested without a server.

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    StatusCode, Url,
};

use crate::{
    credentials::ApiKey,
    errors::{Error, ErrorEnvelope, Result},
    identifiers::{ClientId, WorkflowId},
    status::{self, PollOutcome},
    types::{SubmitResponse, WorkflowHandle},
    API_KEY_HEADER, CLIENT_ID_HEADER, WORKFLOWS_PATH,
};

/// Parses and validates a configured base URL.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim().trim_end_matches('/'))
        .map_err(|err| Error::Config(format!("invalid base url: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("invalid base url: {raw}")));
    }
    Ok(url)
}

/// `<base>/workflows`
pub(crate) fn submission_url(base: &Url) -> Result<Url> {
    endpoint(base, &[WORKFLOWS_PATH])
}

/// `<base>/workflows/{workflow_id}`, with the id percent-encoded as one segment.
pub(crate) fn status_url(base: &Url, workflow_id: &WorkflowId) -> Result<Url> {
    endpoint(base, &[WORKFLOWS_PATH, workflow_id.as_str()])
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("invalid base url: {base}")))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Headers sent on every request of a workflow's lifecycle.
pub(crate) fn workflow_headers(
    api_key: &ApiKey,
    client_id: ClientId,
    json_body: bool,
) -> Result<HeaderMap> {
    let mut key = HeaderValue::from_str(api_key.as_str())
        .map_err(|_| Error::Config("API key contains invalid header characters".into()))?;
    key.set_sensitive(true);

    let client_id = HeaderValue::from_str(&client_id.to_string())
        .map_err(|err| Error::Config(format!("invalid client id header: {err}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, key);
    headers.insert(CLIENT_ID_HEADER, client_id);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if json_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(headers)
}

/// Turns a submission response into a handle, or a submission error.
pub(crate) fn decode_submission(
    status: StatusCode,
    body: &[u8],
    client_id: ClientId,
) -> Result<WorkflowHandle> {
    if !status.is_success() {
        return Err(Error::Submission(status_failure(status, body)));
    }

    let parsed: SubmitResponse = serde_json::from_slice(body).map_err(|err| {
        Error::Submission(
            ErrorEnvelope::malformed(
                format!("invalid submission response: {err}"),
                Some(body_text(body)),
            )
            .with_http_status(status.as_u16()),
        )
    })?;

    match parsed.workflow_id {
        Some(id) if !id.is_empty() => Ok(WorkflowHandle::new(id, client_id)),
        _ => Err(Error::Submission(
            ErrorEnvelope::malformed(
                "submission response is missing workflowId",
                Some(body_text(body)),
            )
            .with_http_status(status.as_u16()),
        )),
    }
}

/// Turns a status response into an outcome. Only non-2xx statuses fail; the
/// body itself is always interpreted leniently.
pub(crate) fn decode_status(
    workflow_id: &WorkflowId,
    status: StatusCode,
    body: &[u8],
) -> Result<PollOutcome> {
    if !status.is_success() {
        return Err(Error::Poll {
            workflow_id: workflow_id.clone(),
            envelope: status_failure(status, body),
        });
    }
    Ok(status::interpret(body))
}

/// Builds an envelope for a non-2xx response, preferring the service's own
/// error message when the body carries one.
pub(crate) fn status_failure(status: StatusCode, body: &[u8]) -> ErrorEnvelope {
    let status_text = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let text = body_text(body);

    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|err| err.get("message").or(Some(err)))
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or(status_text);

    ErrorEnvelope::status(status.as_u16(), message, Some(text))
}

fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}
