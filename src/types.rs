use serde::{Deserialize, Serialize};

use crate::identifiers::{ClientId, WorkflowId};

/// Body of a workflow submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub prompt: String,
}

impl WorkflowRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// A submitted workflow: the service-assigned id plus the correlation token
/// minted for that submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowHandle {
    workflow_id: WorkflowId,
    client_id: ClientId,
}

impl WorkflowHandle {
    /// Rebuilds a handle for a workflow submitted elsewhere.
    pub fn new(workflow_id: impl Into<WorkflowId>, client_id: ClientId) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            client_id,
        }
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }
}

/// Successful submission response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmitResponse {
    #[serde(rename = "workflowId", default)]
    pub(crate) workflow_id: Option<WorkflowId>,
}
