//! Graph source serving a fixed context.

use async_trait::async_trait;

use crate::ports::{BoxError, GraphSource};
use crate::types::{RawContext, SubjectId};

/// Graph source that serves the same context for every subject.
#[derive(Debug, Clone, Default)]
pub struct StaticGraph {
    context: RawContext,
}

impl StaticGraph {
    /// Serve `context` for every request.
    pub fn new(context: impl Into<RawContext>) -> Self {
        Self {
            context: context.into(),
        }
    }
}

#[async_trait]
impl GraphSource for StaticGraph {
    async fn build_context(
        &self,
        subject_id: &SubjectId,
        subject_type: &str,
        _intent: &str,
        _role: &str,
    ) -> Result<RawContext, BoxError> {
        tracing::trace!(%subject_id, subject_type, "Serving static context");
        Ok(self.context.clone())
    }
}
