use std::{fmt, sync::Arc, time::Duration};

use crate::{
    core,
    credentials::{self, ApiKey, API_KEY_ENV},
    delay::{CancelHandle, Delay, TokioDelay},
    errors::{Error, ErrorEnvelope, Result},
    identifiers::ClientId,
    status::PollOutcome,
    types::{WorkflowHandle, WorkflowRequest},
    BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};

#[derive(Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
    /// Orchestrator API key. Checked on first use, not at construction.
    pub api_key: Option<String>,
    /// Override the User-Agent header.
    pub client_header: Option<String>,
    pub http_client: Option<reqwest::Client>,
    /// Override the connect timeout (defaults to 5s).
    pub connect_timeout: Option<Duration>,
    /// Override the per-request timeout (defaults to 60s). Does not bound polling.
    pub timeout: Option<Duration>,
    /// Interval between status polls (defaults to 15s).
    pub poll_interval: Option<Duration>,
    /// Sleep source used between polls (defaults to the Tokio timer).
    pub delay: Option<Arc<dyn Delay>>,
}

impl Config {
    /// Reads `EMERGENCE_API_KEY` and `EMERGENCE_BASE_URL` from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            base_url: std::env::var(BASE_URL_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            ..Default::default()
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("client_header", &self.client_header)
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("delay", &self.delay.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// Async client for the workflow orchestrator.
///
/// Cheap to clone; clones share read-only configuration and the connection
/// pool, never workflow state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    base_url: reqwest::Url,
    api_key: Option<String>,
    http: reqwest::Client,
    request_timeout: Duration,
    poll_interval: Duration,
    delay: Arc<dyn Delay>,
}

impl Client {
    pub fn new(cfg: Config) -> Result<Self> {
        let base_url =
            core::parse_base_url(cfg.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let connect_timeout = cfg.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let user_agent = cfg
            .client_header
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let http = match cfg.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .user_agent(user_agent)
                .build()
                .map_err(|err| Error::Config(format!("failed to build http client: {err}")))?,
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                api_key: cfg.api_key,
                http,
                request_timeout: cfg.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
                poll_interval: cfg.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
                delay: cfg.delay.unwrap_or_else(|| Arc::new(TokioDelay)),
            }),
        })
    }

    /// Builds a client from [`Config::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env())
    }

    pub fn workflows(&self) -> WorkflowsClient {
        WorkflowsClient {
            inner: self.inner.clone(),
        }
    }
}

impl ClientInner {
    fn ensure_auth(&self) -> Result<ApiKey> {
        credentials::check(self.api_key.as_deref())
    }
}

#[derive(Clone)]
pub struct WorkflowsClient {
    inner: Arc<ClientInner>,
}

impl WorkflowsClient {
    /// Submits a prompt as a new workflow.
    ///
    /// Each call mints a fresh `Client-ID`; nothing is cached, so identical
    /// prompts produce independent workflows.
    pub async fn submit(&self, prompt: impl Into<String>) -> Result<WorkflowHandle> {
        let api_key = self.inner.ensure_auth()?;
        let client_id = ClientId::generate();
        let url = core::submission_url(&self.inner.base_url)?;
        let headers = core::workflow_headers(&api_key, client_id, true)?;
        let request = WorkflowRequest::new(prompt);

        #[cfg(feature = "tracing")]
        tracing::debug!(client_id = %client_id, "submitting workflow");

        let resp = self
            .inner
            .http
            .post(url)
            .headers(headers)
            .json(&request)
            .timeout(self.inner.request_timeout)
            .send()
            .await
            .map_err(|err| Error::Submission(err.into()))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|err| {
            Error::Submission(ErrorEnvelope::from(err).with_http_status(status.as_u16()))
        })?;

        let result = core::decode_submission(status, &body, client_id);
        #[cfg(feature = "tracing")]
        match &result {
            Ok(handle) => tracing::debug!(
                workflow_id = %handle.workflow_id(),
                client_id = %client_id,
                "workflow submitted"
            ),
            Err(err) => tracing::warn!(error = %err, "workflow submission failed"),
        }
        result
    }

    /// Fetches the current status once.
    pub async fn status(&self, handle: &WorkflowHandle) -> Result<PollOutcome> {
        let api_key = self.inner.ensure_auth()?;
        let url = core::status_url(&self.inner.base_url, handle.workflow_id())?;
        let headers = core::workflow_headers(&api_key, handle.client_id(), false)?;
        let poll_error = |envelope: ErrorEnvelope| Error::Poll {
            workflow_id: handle.workflow_id().clone(),
            envelope,
        };

        let resp = self
            .inner
            .http
            .get(url)
            .headers(headers)
            .timeout(self.inner.request_timeout)
            .send()
            .await
            .map_err(|err| poll_error(err.into()))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|err| poll_error(ErrorEnvelope::from(err).with_http_status(status.as_u16())))?;

        core::decode_status(handle.workflow_id(), status, &body)
    }

    /// Polls until the workflow reaches a terminal status.
    ///
    /// Non-terminal statuses (including `UNKNOWN`) are retried after the poll
    /// interval with no attempt limit. A failed request ends the loop at once.
    pub async fn poll(&self, handle: &WorkflowHandle) -> Result<PollOutcome> {
        self.poll_with_cancel(handle, &CancelHandle::default()).await
    }

    /// Like [`poll`](Self::poll), but stops with [`Error::Cancelled`] when
    /// `cancel` is set during a sleep.
    pub async fn poll_with_cancel(
        &self,
        handle: &WorkflowHandle,
        cancel: &CancelHandle,
    ) -> Result<PollOutcome> {
        let mut attempt: u64 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let outcome = match self.status(handle).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        workflow_id = %handle.workflow_id(),
                        attempt,
                        error = %err,
                        "workflow poll failed"
                    );
                    return Err(err);
                }
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(
                workflow_id = %handle.workflow_id(),
                attempt,
                status = %outcome.status,
                "workflow polled"
            );

            if outcome.is_terminal() {
                return Ok(outcome);
            }

            self.inner.delay.sleep(self.inner.poll_interval).await;
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    workflow_id: handle.workflow_id().clone(),
                });
            }
        }
    }

    /// Submits `prompt` and polls it to completion.
    pub async fn run(&self, prompt: impl Into<String>) -> Result<PollOutcome> {
        let handle = self.submit(prompt).await?;
        self.poll(&handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_does_not_fail_construction() {
        let client = Client::new(Config::default()).expect("client");
        assert!(matches!(client.inner.ensure_auth(), Err(Error::Config(_))));
    }

    #[test]
    fn defaults_apply() {
        let client = Client::new(Config {
            api_key: Some("em_test".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.inner.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(client.inner.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(client.inner.base_url.as_str().starts_with(DEFAULT_BASE_URL));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Client::new(Config {
            base_url: Some("::nope::".into()),
            ..Default::default()
        })
        .err()
        .expect("invalid url should fail");
        assert!(err.to_string().contains("invalid base url"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = Config {
            api_key: Some("em_secret".into()),
            ..Default::default()
        };
        assert!(!format!("{cfg:?}").contains("em_secret"));
    }

    #[tokio::test]
    async fn submit_without_key_short_circuits() {
        // Port 9 is never contacted: the guard fails first.
        let client = Client::new(Config {
            base_url: Some("http://127.0.0.1:9".into()),
            ..Default::default()
        })
        .unwrap();
        let err = client.workflows().submit("book a flight").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
