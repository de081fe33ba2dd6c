//! Workload - realistic, irregular HTTP traffic from a set of weighted requests
//!
//! A [`Scheduler`] fires on a fixed interval derived from a requests-per-minute
//! rate. Each tick picks a [`RequestTemplate`] by weight, runs a copy through a
//! [`FilterPipeline`] that may rewrite or drop it, and hands the survivor to
//! the [`Dispatcher`], which reports a visit or an error on the event channel.

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod request;
pub mod scheduler;
pub mod select;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::WorkloadConfig;
pub use dispatch::{
    AgentHeader, Dispatcher, ErrorEvent, EventReceiver, ReqwestTransport, Transport, TransportError,
    TransportResponse, Visit, WorkloadEvent,
};
pub use error::{Result, WorkloadError};
pub use filter::{Filter, FilterKind, FilterOutcome, FilterPipeline, PipelineOutcome};
pub use request::{Headers, RequestTemplate, WorkingRequest};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerState, TickStats};
pub use select::WeightedSelector;
