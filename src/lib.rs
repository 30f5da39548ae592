//! Rust client for the Emergence web-automation workflow orchestrator, and an
//! agent tool built on it.
//!
//! A prompt is submitted as a workflow, the workflow is polled until it
//! reaches `SUCCESS`, `FAILED` or `TIMEOUT`, and the result comes back as
//! plain text:
//!
//! ```no_run
//! # #[cfg(feature = "blocking")]
//! # fn main() -> Result<(), emergence::Error> {
//! use emergence::{BlockingClient, BlockingWorkflowTool};
//!
//! let client = BlockingClient::from_env()?;
//! let tool = BlockingWorkflowTool::new(&client);
//! println!("{}", tool.invoke("Find the cheapest flight from SFO to JFK next Friday"));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "blocking"))]
//! # fn main() {}
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::time::Duration;

/// Default orchestrator base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.emergence.ai/v0/orchestrators/em-web-automation";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "EMERGENCE_BASE_URL";

/// Default User-Agent header value.
pub(crate) const DEFAULT_USER_AGENT: &str = concat!("emergence-rust/", env!("CARGO_PKG_VERSION"));

/// Default connection timeout (5 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default per-request timeout (60 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between status polls (15 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// HTTP header carrying the API key.
pub const API_KEY_HEADER: &str = "apikey";

/// HTTP header carrying the per-submission correlation token (`Client-ID`).
pub const CLIENT_ID_HEADER: &str = "client-id";

pub(crate) const WORKFLOWS_PATH: &str = "workflows";

#[cfg(feature = "blocking")]
mod blocking;
#[cfg(feature = "client")]
mod client;
mod core;
pub mod credentials;
mod delay;
mod errors;
mod identifiers;
mod status;
pub mod testing;
pub mod tools;
mod types;

#[cfg(feature = "blocking")]
pub use blocking::{BlockingClient, BlockingConfig, BlockingWorkflowsClient};
#[cfg(feature = "client")]
pub use client::{Client, Config, WorkflowsClient};
pub use credentials::ApiKey;
#[cfg(feature = "client")]
pub use delay::TokioDelay;
pub use delay::{BlockingDelay, BoxFuture, CancelHandle, Delay, ThreadDelay};
pub use errors::{Error, ErrorEnvelope, FailureKind, Result};
pub use identifiers::{ClientId, WorkflowId};
pub use status::{interpret, interpret_value, PollOutcome, StatusKind};
#[cfg(feature = "blocking")]
pub use tools::BlockingWorkflowTool;
#[cfg(feature = "client")]
pub use tools::WorkflowTool;
pub use tools::{
    function_tool_from_type, render, ToolDefinition, ToolHandler, ToolRegistry,
    WorkflowToolArgs, TOOL_NAME,
};
pub use types::{WorkflowHandle, WorkflowRequest};
