//! Filter chain run over every tick's request before dispatch.
//!
//! A filter takes ownership of the working request and answers with a
//! [`FilterOutcome`]: keep going with the (possibly mutated) request, swap
//! in a replacement, or drop the tick. [`FilterPipeline`] runs filters in
//! order and stops at the first drop.
//!
//! Standard filters are addressable by name (see [`FilterKind`]) so they can
//! be selected from a config file or the command line.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Result, WorkloadError};
use crate::request::WorkingRequest;

pub mod expand;
pub mod hours;
mod pipeline;
mod standard;

pub use expand::{MAX_EXPANSIONS, expand};
pub use hours::{HourBand, WorkingHoursProfile};
pub use pipeline::{FilterPipeline, PipelineOutcome};
pub use standard::{Expand, WEEKEND_ODDS, Workdays, WorkingHours};

/// What a filter decided for the current tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Continue with this request (the one passed in, possibly mutated)
    Continue(WorkingRequest),
    /// Continue with a different request object
    Replace(WorkingRequest),
    /// Stop here; nothing is dispatched and no event is emitted
    Drop,
}

impl FilterOutcome {
    pub fn is_drop(&self) -> bool {
        matches!(self, FilterOutcome::Drop)
    }

    /// The request the next step receives, if any.
    pub fn into_request(self) -> Option<WorkingRequest> {
        match self {
            FilterOutcome::Continue(request) | FilterOutcome::Replace(request) => Some(request),
            FilterOutcome::Drop => None,
        }
    }
}

/// One step of the filter chain.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Inspect, mutate, replace or drop the request.
    async fn apply(&self, request: WorkingRequest) -> Result<FilterOutcome>;

    /// Name used in logs
    fn name(&self) -> &str {
        "filter"
    }
}

/// Filter that hands the request on untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl Filter for Passthrough {
    async fn apply(&self, request: WorkingRequest) -> Result<FilterOutcome> {
        Ok(FilterOutcome::Continue(request))
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Adapts a synchronous closure into a [`Filter`].
pub struct FnFilter<F> {
    name: String,
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(WorkingRequest) -> Result<FilterOutcome> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F> Filter for FnFilter<F>
where
    F: Fn(WorkingRequest) -> Result<FilterOutcome> + Send + Sync,
{
    async fn apply(&self, request: WorkingRequest) -> Result<FilterOutcome> {
        (self.f)(request)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Shorthand for `Arc::new(FnFilter::new(name, f))`.
pub fn filter_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Filter>
where
    F: Fn(WorkingRequest) -> Result<FilterOutcome> + Send + Sync + 'static,
{
    Arc::new(FnFilter::new(name, f))
}

/// The standard filters by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// Mostly silent at weekends
    #[serde(rename = "WD", alias = "workdays")]
    Workdays,
    /// Follows office hours
    #[serde(rename = "WH", alias = "workingHours", alias = "working_hours")]
    WorkingHours,
    /// Brace-expand the url and pick one expansion
    #[serde(rename = "EX", alias = "expand")]
    Expand,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Workdays => "WD",
            FilterKind::WorkingHours => "WH",
            FilterKind::Expand => "EX",
        }
    }

    /// Instantiate the filter.
    pub fn build(&self, clock: Arc<dyn Clock>, profile: &WorkingHoursProfile) -> Arc<dyn Filter> {
        match self {
            FilterKind::Workdays => Arc::new(Workdays::new(clock)),
            FilterKind::WorkingHours => Arc::new(WorkingHours::new(clock, profile.clone())),
            FilterKind::Expand => Arc::new(Expand),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WD" | "workdays" => Ok(FilterKind::Workdays),
            "WH" | "workingHours" | "working_hours" => Ok(FilterKind::WorkingHours),
            "EX" | "expand" => Ok(FilterKind::Expand),
            other => Err(WorkloadError::Config(format!(
                "unknown filter '{}' (expected WD, WH or EX)",
                other
            ))),
        }
    }
}
