use crate::backend::Backend;
use crate::policy::{ExecutionPolicies, ExecutionPolicy, PolicyKind};
use std::sync::Arc;

/// Open connection plus the policies bound to it. Both executors borrow the
/// same session; nothing in it changes after construction.
#[derive(Clone)]
pub struct Session {
    backend: Arc<dyn Backend>,
    policies: ExecutionPolicies,
    keyspace: String,
}

impl Session {
    pub fn new(backend: Arc<dyn Backend>, policies: ExecutionPolicies, keyspace: impl Into<String>) -> Self {
        Self {
            backend,
            policies,
            keyspace: keyspace.into(),
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub const fn policy(&self, kind: PolicyKind) -> &ExecutionPolicy {
        self.policies.get(kind)
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// `keyspace.table`
    pub fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.keyspace, table)
    }
}
