//! Notifications emitted for every dispatched request.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use super::transport::TransportError;
use crate::request::{Headers, WorkingRequest};

/// Response metadata of a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseMeta {
    pub status: u16,
    /// Repeated headers such as `set-cookie` arrive joined with `", "`
    pub headers: Headers,
}

/// A request that got a response.
#[derive(Debug, Clone, Serialize)]
pub struct Visit {
    /// The request exactly as dispatched, merged headers included
    pub request: WorkingRequest,
    pub response: ResponseMeta,
    pub body: String,
}

/// A request for which the transport produced no response.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub request: WorkingRequest,
    pub error: Arc<TransportError>,
}

/// Everything a running workload reports.
#[derive(Debug, Clone)]
pub enum WorkloadEvent {
    Visit(Visit),
    Error(ErrorEvent),
}

impl WorkloadEvent {
    pub fn is_visit(&self) -> bool {
        matches!(self, WorkloadEvent::Visit(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, WorkloadEvent::Error(_))
    }

    /// The request this event is about.
    pub fn request(&self) -> &WorkingRequest {
        match self {
            WorkloadEvent::Visit(visit) => &visit.request,
            WorkloadEvent::Error(error) => &error.request,
        }
    }
}

/// Receiving half of the event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<WorkloadEvent>;

/// Sending half of the event channel.
pub type EventSender = mpsc::UnboundedSender<WorkloadEvent>;

/// Create an event channel. Sends never wait on the consumer.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
