use std::{fmt, sync::Arc, time::Duration};

use reqwest::blocking::Client as HttpClient;

use crate::{
    core,
    credentials::{self, ApiKey, API_KEY_ENV},
    delay::{BlockingDelay, CancelHandle, ThreadDelay},
    errors::{Error, ErrorEnvelope, Result},
    identifiers::ClientId,
    status::PollOutcome,
    types::{WorkflowHandle, WorkflowRequest},
    BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};

#[derive(Clone, Default)]
pub struct BlockingConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub client_header: Option<String>,
    pub http_client: Option<HttpClient>,
    /// Override the connect timeout (defaults to 5s).
    pub connect_timeout: Option<Duration>,
    /// Override the per-request timeout (defaults to 60s).
    pub timeout: Option<Duration>,
    /// Interval between status polls (defaults to 15s).
    pub poll_interval: Option<Duration>,
    /// Sleep source used between polls (defaults to `std::thread::sleep`).
    pub delay: Option<Arc<dyn BlockingDelay>>,
}

impl BlockingConfig {
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

impl fmt::Debug for BlockingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingConfig")
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

/// Blocking client for the workflow orchestrator.
///
/// Must not be constructed or used from inside an async runtime.
#[derive(Clone)]
pub struct BlockingClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: reqwest::Url,
    api_key: Option<String>,
    http: HttpClient,
    request_timeout: Duration,
    poll_interval: Duration,
    delay: Arc<dyn BlockingDelay>,
}

impl BlockingClient {
    pub fn new(cfg: BlockingConfig) -> Result<Self> {
        let base_url =
            core::parse_base_url(cfg.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let connect_timeout = cfg.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let user_agent = cfg
            .client_header
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let http = match cfg.http_client {
            Some(client) => client,
            None => HttpClient::builder()
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
                delay: cfg.delay.unwrap_or_else(|| Arc::new(ThreadDelay)),
            }),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(BlockingConfig::from_env())
    }

    pub fn workflows(&self) -> BlockingWorkflowsClient {
        BlockingWorkflowsClient {
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
pub struct BlockingWorkflowsClient {
    inner: Arc<ClientInner>,
}

impl BlockingWorkflowsClient {
    pub fn submit(&self, prompt: impl Into<String>) -> Result<WorkflowHandle> {
        let api_key = self.inner.ensure_auth()?;
        let client_id = ClientId::generate();
        let url = core::submission_url(&self.inner.base_url)?;
        let headers = core::workflow_headers(&api_key, client_id, true)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(client_id = %client_id, "submitting workflow");

        let resp = self
            .inner
            .http
            .post(url)
            .headers(headers)
            .json(&WorkflowRequest::new(prompt))
            .timeout(self.inner.request_timeout)
            .send()
            .map_err(|err| Error::Submission(err.into()))?;
        let status = resp.status();
        let body = resp.bytes().map_err(|err| {
            Error::Submission(ErrorEnvelope::from(err).with_http_status(status.as_u16()))
        })?;

        let result = core::decode_submission(status, &body, client_id);
        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            tracing::warn!(error = %err, "workflow submission failed");
        }
        result
    }

    pub fn status(&self, handle: &WorkflowHandle) -> Result<PollOutcome> {
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
            .map_err(|err| poll_error(err.into()))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .map_err(|err| poll_error(ErrorEnvelope::from(err).with_http_status(status.as_u16())))?;

        core::decode_status(handle.workflow_id(), status, &body)
    }

    /// Blocks until the workflow reaches a terminal status or a poll fails.
    pub fn poll(&self, handle: &WorkflowHandle) -> Result<PollOutcome> {
        self.poll_with_cancel(handle, &CancelHandle::default())
    }

    pub fn poll_with_cancel(
        &self,
        handle: &WorkflowHandle,
        cancel: &CancelHandle,
    ) -> Result<PollOutcome> {
        let mut attempt: u64 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let outcome = match self.status(handle) {
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

            self.inner.delay.sleep(self.inner.poll_interval);
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    workflow_id: handle.workflow_id().clone(),
                });
            }
        }
    }

    pub fn run(&self, prompt: impl Into<String>) -> Result<PollOutcome> {
        let handle = self.submit(prompt)?;
        self.poll(&handle)
    }
}
