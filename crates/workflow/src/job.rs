//! Job (executable step) definition within a workflow.

use serde::{Deserialize, Serialize};
use tapestry_core::{CredentialId, JobId};

/// A single executable step inside a workflow graph.
///
/// A job never shares identity across workflows: the owning [`Workflow`]
/// (see [`crate::Workflow`]) holds its jobs by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier within this workflow.
    pub id: JobId,
    /// Human-readable label. Must not be blank.
    pub name: String,
    /// Executable expression text. Must not be blank for jobs the trigger
    /// can reach.
    pub body: String,
    /// Which adaptor runs this job's body.
    pub adaptor: String,
    /// Optional credential used by the adaptor at run time.
    #[serde(default)]
    pub credential_id: Option<CredentialId>,
}

impl Job {
    /// Create a job with an empty body.
    #[must_use]
    pub fn new(id: JobId, name: impl Into<String>, adaptor: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            body: String::new(),
            adaptor: adaptor.into(),
            credential_id: None,
        }
    }

    /// Set the executable body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach a credential reference.
    #[must_use]
    pub fn with_credential(mut self, credential_id: CredentialId) -> Self {
        self.credential_id = Some(credential_id);
        self
    }

    /// Returns `true` if the name is empty or whitespace-only.
    #[must_use]
    pub fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Returns `true` if the body is empty or whitespace-only.
    #[must_use]
    pub fn has_blank_body(&self) -> bool {
        self.body.trim().is_empty()
    }
}
