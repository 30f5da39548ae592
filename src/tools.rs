//! The orchestrator exposed as an agent tool.
//!
//! Agent frameworks expect tools that take a string and return a string, so
//! every outcome here (including configuration and transport failures) is
//! flattened to text. Nothing in this module panics or returns an error.

use std::{collections::HashMap, sync::Arc};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "blocking")]
use crate::blocking::{BlockingClient, BlockingWorkflowsClient};
#[cfg(feature = "client")]
use crate::client::{Client, WorkflowsClient};
use crate::{
    delay::BoxFuture,
    errors::{Error, Result},
    status::{PollOutcome, StatusKind},
};

/// Name the tool is registered under.
pub const TOOL_NAME: &str = "emergence_web_orchestrator";

/// Description shown to the model.
pub const TOOL_DESCRIPTION: &str = "Create and poll an Emergence web-automation workflow for the \
    given prompt. Returns the final text result on success, or a status message if the workflow \
    failed or timed out.";

/// Arguments accepted by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowToolArgs {
    /// Natural-language description of the web task to perform.
    pub prompt: String,
}

/// Function-tool definition in the shape agent frameworks consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Builds a function-tool definition whose parameter schema is derived from `T`.
pub fn function_tool_from_type<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDefinition {
    let schema = schemars::schema_for!(T);
    ToolDefinition {
        kind: "function".to_string(),
        function: FunctionDefinition {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::to_value(&schema).unwrap_or(Value::Null),
        },
    }
}

/// The definition of the orchestrator tool.
pub fn workflow_tool_definition() -> ToolDefinition {
    function_tool_from_type::<WorkflowToolArgs>(TOOL_NAME, TOOL_DESCRIPTION)
}

/// Renders the result of a run as the text handed back to the agent.
pub fn render(result: Result<PollOutcome>) -> String {
    match result {
        Ok(outcome) => match outcome.status {
            StatusKind::Success => outcome.output.unwrap_or_default(),
            status => format!("Workflow ended with status {status}"),
        },
        Err(Error::Config(message)) => format!("Configuration error: {message}"),
        Err(Error::Submission(envelope)) => format!("Error creating workflow: {envelope}"),
        Err(Error::Poll {
            workflow_id,
            envelope,
        }) => format!("Error polling workflow {workflow_id}: {envelope}"),
        Err(Error::Cancelled { workflow_id }) => {
            format!("Workflow {workflow_id} was cancelled before completion")
        }
    }
}

/// Parses raw tool-call arguments.
pub fn parse_args(args: Value) -> std::result::Result<WorkflowToolArgs, String> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|err| format!("invalid arguments for tool '{TOOL_NAME}': {err}"))
}

/// Async tool adapter over [`WorkflowsClient`].
#[cfg(feature = "client")]
#[derive(Clone)]
pub struct WorkflowTool {
    workflows: WorkflowsClient,
}

#[cfg(feature = "client")]
impl WorkflowTool {
    pub fn new(client: &Client) -> Self {
        Self {
            workflows: client.workflows(),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        workflow_tool_definition()
    }

    /// Runs `prompt` to completion and returns the text result.
    pub async fn invoke(&self, prompt: impl Into<String>) -> String {
        render(self.workflows.run(prompt).await)
    }

    /// Entry point for raw tool-call arguments (`{"prompt": "..."}`).
    pub async fn call(&self, args: Value) -> String {
        match parse_args(args) {
            Ok(args) => self.invoke(args.prompt).await,
            Err(message) => message,
        }
    }

    /// A boxed handler suitable for [`ToolRegistry::register`].
    pub fn handler(&self) -> ToolHandler {
        let tool = self.clone();
        Arc::new(move |args: Value| {
            let tool = tool.clone();
            Box::pin(async move { tool.call(args).await })
        })
    }
}

/// Blocking tool adapter over [`BlockingWorkflowsClient`].
#[cfg(feature = "blocking")]
#[derive(Clone)]
pub struct BlockingWorkflowTool {
    workflows: BlockingWorkflowsClient,
}

#[cfg(feature = "blocking")]
impl BlockingWorkflowTool {
    pub fn new(client: &BlockingClient) -> Self {
        Self {
            workflows: client.workflows(),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        workflow_tool_definition()
    }

    /// Runs `prompt` to completion, blocking the caller throughout.
    pub fn invoke(&self, prompt: impl Into<String>) -> String {
        render(self.workflows.run(prompt))
    }

    pub fn call(&self, args: Value) -> String {
        match parse_args(args) {
            Ok(args) => self.invoke(args.prompt),
            Err(message) => message,
        }
    }
}

/// Handler function type for tool execution: JSON arguments in, text out.
pub type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, String> + Send + Sync>;

/// Error message returned for calls to unregistered tools.
#[derive(Debug, Clone)]
pub struct UnknownToolError {
    pub tool_name: String,
    pub available: Vec<String>,
}

impl std::fmt::Display for UnknownToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.available.is_empty() {
            write!(f, "unknown tool: '{}'. No tools registered.", self.tool_name)
        } else {
            write!(
                f,
                "unknown tool: '{}'. Available: {}",
                self.tool_name,
                self.available.join(", ")
            )
        }
    }
}

impl std::error::Error for UnknownToolError {}

/// Registry mapping tool names to definitions and handlers.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, (ToolDefinition, ToolHandler)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its definition's name, replacing any previous one.
    pub fn register(mut self, definition: ToolDefinition, handler: ToolHandler) -> Self {
        self.tools
            .insert(definition.name().to_string(), (definition, handler));
        self
    }

    #[cfg(feature = "client")]
    pub fn register_workflow_tool(self, tool: &WorkflowTool) -> Self {
        self.register(tool.definition(), tool.handler())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn registered_tools(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|(def, _)| def.clone()).collect();
        defs.sort_by(|a, b| a.name().cmp(b.name()));
        defs
    }

    /// Executes a tool by name. Unknown names produce an explanatory string.
    pub async fn execute(&self, name: &str, args: Value) -> String {
        match self.tools.get(name) {
            Some((_, handler)) => handler(args).await,
            None => UnknownToolError {
                tool_name: name.to_string(),
                available: self.registered_tools(),
            }
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::ErrorEnvelope, identifiers::WorkflowId};
    use serde_json::json;

    fn outcome(status: StatusKind, output: Option<&str>) -> PollOutcome {
        PollOutcome {
            status,
            output: output.map(str::to_string),
            raw: Value::Null,
        }
    }

    #[test]
    fn success_renders_output_verbatim() {
        let text = render(Ok(outcome(StatusKind::Success, Some("Flight booked"))));
        assert_eq!(text, "Flight booked");
        assert_eq!(render(Ok(outcome(StatusKind::Success, None))), "");
    }

    #[test]
    fn terminal_failures_render_status() {
        assert_eq!(
            render(Ok(outcome(StatusKind::Failed, Some("partial")))),
            "Workflow ended with status FAILED"
        );
        assert_eq!(
            render(Ok(outcome(StatusKind::Timeout, None))),
            "Workflow ended with status TIMEOUT"
        );
    }

    #[test]
    fn errors_render_as_text() {
        let text = render(Err(Error::Config("no key".into())));
        assert_eq!(text, "Configuration error: no key");

        let text = render(Err(Error::Submission(ErrorEnvelope::status(
            401,
            "Unauthorized",
            None,
        ))));
        assert_eq!(text, "Error creating workflow: 401: Unauthorized");

        let text = render(Err(Error::Poll {
            workflow_id: WorkflowId::new("abc123"),
            envelope: ErrorEnvelope::transport("connection failed"),
        }));
        assert_eq!(
            text,
            "Error polling workflow abc123: transport: connection failed"
        );
    }

    #[test]
    fn definition_schema_requires_prompt() {
        let def = workflow_tool_definition();
        assert_eq!(def.kind, "function");
        assert_eq!(def.name(), TOOL_NAME);
        assert_eq!(def.function.parameters["properties"]["prompt"]["type"], "string");
        assert_eq!(def.function.parameters["required"], json!(["prompt"]));
    }

    #[test]
    fn args_parse_or_explain() {
        assert_eq!(
            parse_args(json!({ "prompt": "book a flight" })).unwrap().prompt,
            "book a flight"
        );
        let err = parse_args(Value::Null).unwrap_err();
        assert!(err.starts_with("invalid arguments for tool 'emergence_web_orchestrator'"));
        assert!(parse_args(json!({ "prompt": 3 })).is_err());
    }

    #[tokio::test]
    async fn registry_dispatches_by_name() {
        let echo: ToolHandler = Arc::new(|args: Value| {
            Box::pin(async move { args["prompt"].as_str().unwrap_or_default().to_uppercase() })
        });
        let registry = ToolRegistry::new().register(workflow_tool_definition(), echo);

        assert!(registry.has(TOOL_NAME));
        assert_eq!(registry.registered_tools(), vec![TOOL_NAME.to_string()]);
        assert_eq!(
            registry.execute(TOOL_NAME, json!({ "prompt": "hi" })).await,
            "HI"
        );

        let missing = registry.execute("search", json!({})).await;
        assert_eq!(
            missing,
            "unknown tool: 'search'. Available: emergence_web_orchestrator"
        );
    }

    #[tokio::test]
    async fn empty_registry_reports_no_tools() {
        let text = ToolRegistry::new().execute("anything", json!({})).await;
        assert_eq!(text, "unknown tool: 'anything'. No tools registered.");
    }
}
