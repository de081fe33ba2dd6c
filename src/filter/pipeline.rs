//! Sequential filter pipeline.
//!
//! Steps run strictly in order; step k+1 starts only after step k has
//! answered. The first `Drop` ends the run.

use std::sync::Arc;

use super::{Filter, FilterOutcome, Passthrough};
use crate::error::Result;
use crate::request::WorkingRequest;

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every step passed; this is the request to dispatch.
    Complete(WorkingRequest),
    /// A step dropped the tick.
    Dropped {
        /// Index of the dropping step
        step: usize,
        /// Name of the dropping filter
        filter: String,
    },
}

impl PipelineOutcome {
    pub fn completed(&self) -> bool {
        matches!(self, PipelineOutcome::Complete(_))
    }

    pub fn into_request(self) -> Option<WorkingRequest> {
        match self {
            PipelineOutcome::Complete(request) => Some(request),
            PipelineOutcome::Dropped { .. } => None,
        }
    }
}

/// Ordered chain of filters.
#[derive(Clone, Default)]
pub struct FilterPipeline {
    steps: Vec<Arc<dyn Filter>>,
}

impl FilterPipeline {
    /// Pipeline with exactly these steps. An empty list completes at once.
    pub fn new(steps: Vec<Arc<dyn Filter>>) -> Self {
        Self { steps }
    }

    /// Single pass-through step; used when no filters were configured.
    pub fn passthrough() -> Self {
        Self::new(vec![Arc::new(Passthrough)])
    }

    /// `None` means the caller configured nothing and gets the pass-through.
    pub fn from_configured(steps: Option<Vec<Arc<dyn Filter>>>) -> Self {
        match steps {
            Some(steps) => Self::new(steps),
            None => Self::passthrough(),
        }
    }

    /// Append a step.
    pub fn add_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.steps.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps in order.
    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run every step over `request`.
    ///
    /// A filter error ends the run and is returned unchanged.
    pub async fn run(&self, request: WorkingRequest) -> Result<PipelineOutcome> {
        let mut current = request;

        for (index, step) in self.steps.iter().enumerate() {
            match step.apply(current).await? {
                FilterOutcome::Continue(request) => current = request,
                FilterOutcome::Replace(replacement) => {
                    tracing::trace!(step = index, filter = step.name(), "Request replaced");
                    current = replacement;
                }
                FilterOutcome::Drop => {
                    tracing::debug!(step = index, filter = step.name(), "Request dropped");
                    return Ok(PipelineOutcome::Dropped {
                        step: index,
                        filter: step.name().to_string(),
                    });
                }
            }
        }

        Ok(PipelineOutcome::Complete(current))
    }
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline").field("steps", &self.names()).finish()
    }
}
