//! Dispatch of filtered requests and reporting of their outcome.
//!
//! The [`Dispatcher`] merges headers, calls the [`Transport`] and sends a
//! [`WorkloadEvent`] down the event channel: a `Visit` when a response came
//! back (whatever its status), an `Error` when none did.

use std::sync::Arc;

pub mod event;
pub mod transport;

pub use event::{ErrorEvent, EventReceiver, EventSender, ResponseMeta, Visit, WorkloadEvent, event_channel};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportResponse};

use crate::request::{Headers, WorkingRequest, set_header};

/// Default identifying header name.
pub const DEFAULT_AGENT_HEADER: &str = "user-agent";

/// Default identifying header value: `workload/<version>`.
pub const DEFAULT_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The fixed header naming this tool on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHeader {
    pub name: String,
    pub value: String,
}

impl AgentHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Default for AgentHeader {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT_HEADER, DEFAULT_AGENT)
    }
}

/// Sends requests and reports the outcome.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    default_headers: Headers,
    agent: AgentHeader,
    events: EventSender,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, default_headers: Headers, agent: AgentHeader, events: EventSender) -> Self {
        Self {
            transport,
            default_headers,
            agent,
            events,
        }
    }

    /// Effective headers: defaults, then the request's own, then the
    /// identifying header. Later layers replace earlier ones ignoring case.
    pub fn merge_headers(&self, request_headers: &Headers) -> Headers {
        let mut merged = Headers::new();
        for (name, value) in self.default_headers.iter().chain(request_headers.iter()) {
            set_header(&mut merged, name, value);
        }
        set_header(&mut merged, &self.agent.name, &self.agent.value);
        merged
    }

    /// Send `request` and emit one event for it.
    pub async fn dispatch(&self, mut request: WorkingRequest) {
        request.headers = self.merge_headers(&request.headers);

        tracing::debug!(method = %request.method, url = %request.url, "Dispatching request");

        let event = match self.transport.send(&request).await {
            Ok(response) => WorkloadEvent::Visit(Visit {
                request,
                response: ResponseMeta {
                    status: response.status,
                    headers: response.headers,
                },
                body: response.body,
            }),
            Err(error) => {
                tracing::warn!(method = %request.method, url = %request.url, error = %error, "Request failed");
                WorkloadEvent::Error(ErrorEvent {
                    request,
                    error: Arc::new(error),
                })
            }
        };

        if self.events.send(event).is_err() {
            tracing::debug!("Event receiver dropped, discarding event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestTemplate;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Transport that records what it was asked to send.
    struct RecordingTransport {
        sent: Mutex<Vec<WorkingRequest>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: &WorkingRequest) -> Result<TransportResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(TransportError::ConnectionReset("ECONNRESET".to_string()));
            }
            Ok(TransportResponse {
                status: 200,
                headers: Headers::new(),
                body: "ok".to_string(),
            })
        }
    }

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_default_agent() {
        let agent = AgentHeader::default();
        assert_eq!(agent.name, "user-agent");
        assert!(agent.value.starts_with("workload/"));
    }

    #[test]
    fn test_merge_headers_layers() {
        let (tx, _rx) = event_channel();
        let dispatcher = Dispatcher::new(
            RecordingTransport::new(false),
            headers(&[("a", "1"), ("shared", "default")]),
            AgentHeader::new("X-Agent", "workload/test"),
            tx,
        );

        let merged = dispatcher.merge_headers(&headers(&[("b", "2"), ("Shared", "request"), ("x-agent", "spoofed")]));
        assert_eq!(
            merged,
            headers(&[("a", "1"), ("b", "2"), ("Shared", "request"), ("X-Agent", "workload/test")])
        );
    }

    #[tokio::test]
    async fn test_dispatch_emits_visit_with_merged_headers() {
        let (tx, mut rx) = event_channel();
        let transport = RecordingTransport::new(false);
        let dispatcher = Dispatcher::new(
            transport.clone(),
            headers(&[("a", "1")]),
            AgentHeader::new("X-Agent", "workload/test"),
            tx,
        );

        let request = RequestTemplate::new("http://h/")
            .with_header("b", "2")
            .with_header("X-Agent", "filter-set")
            .to_working();
        dispatcher.dispatch(request).await;

        let expected = headers(&[("a", "1"), ("b", "2"), ("X-Agent", "workload/test")]);
        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headers, expected);

        match rx.recv().await.unwrap() {
            WorkloadEvent::Visit(visit) => {
                assert_eq!(visit.request.headers, expected);
                assert_eq!(visit.response.status, 200);
                assert_eq!(visit.body, "ok");
            }
            other => panic!("expected visit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_failure_emits_error_only() {
        let (tx, mut rx) = event_channel();
        let dispatcher = Dispatcher::new(RecordingTransport::new(true), Headers::new(), AgentHeader::default(), tx);

        dispatcher.dispatch(RequestTemplate::new("http://h/").to_working()).await;
        drop(dispatcher);

        let event = rx.recv().await.unwrap();
        match event {
            WorkloadEvent::Error(error) => {
                assert!(matches!(*error.error, TransportError::ConnectionReset(_)));
                assert_eq!(error.request.url, "http://h/");
            }
            other => panic!("expected error, got {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_without_receiver_does_not_panic() {
        let (tx, rx) = event_channel();
        drop(rx);
        let dispatcher = Dispatcher::new(RecordingTransport::new(false), Headers::new(), AgentHeader::default(), tx);
        dispatcher.dispatch(RequestTemplate::new("http://h/").to_working()).await;
    }
}
