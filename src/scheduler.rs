//! Rate-controlled scheduler driving the workload.
//!
//! One timer fires every `60000ms / max_per_minute` (rounded to the
//! millisecond). Each tick:
//! 1. picks a template by weight
//! 2. clones it into a fresh working request
//! 3. runs the filter pipeline
//! 4. dispatches whatever comes out, unless it was dropped
//!
//! Steps 3 and 4 run as their own task, so a slow filter or a slow server
//! never delays the next tick and ticks may finish out of order. Filter
//! errors are logged and counted; they end that tick only.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::dispatch::{AgentHeader, Dispatcher, EventReceiver, Transport, event_channel};
use crate::error::{Result, WorkloadError};
use crate::filter::{Filter, FilterPipeline, PipelineOutcome};
use crate::request::{Headers, RequestTemplate, WorkingRequest};
use crate::select::WeightedSelector;

/// Requests per minute when nothing else is configured.
pub const DEFAULT_MAX_PER_MINUTE: f64 = 12.0;

/// Tick interval for a requests-per-minute rate.
///
/// Rates so high that the interval rounds to zero are clamped to 1ms.
pub fn tick_interval(max_per_minute: f64) -> Result<Duration> {
    if !max_per_minute.is_finite() || max_per_minute <= 0.0 {
        return Err(WorkloadError::InvalidRate(format!(
            "max requests per minute must be a positive number, got {}",
            max_per_minute
        )));
    }
    let millis = (60_000.0 / max_per_minute).round().max(1.0);
    Ok(Duration::from_millis(millis as u64))
}

/// Everything a scheduler needs besides its templates and transport.
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Requests per minute
    pub max_per_minute: f64,
    /// Filter chain; `None` installs a single pass-through step
    pub filters: Option<Vec<Arc<dyn Filter>>>,
    /// Headers applied to every request before its own
    pub default_headers: Headers,
    /// Header that always wins
    pub agent: AgentHeader,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_per_minute: DEFAULT_MAX_PER_MINUTE,
            filters: None,
            default_headers: Headers::new(),
            agent: AgentHeader::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_max_per_minute(mut self, max_per_minute: f64) -> Self {
        self.max_per_minute = max_per_minute;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Arc<dyn Filter>>) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters = Some(vec![filter]);
        self
    }

    pub fn with_default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_agent(mut self, agent: AgentHeader) -> Self {
        self.agent = agent;
        self
    }
}

impl std::fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("max_per_minute", &self.max_per_minute)
            .field(
                "filters",
                &self
                    .filters
                    .as_ref()
                    .map(|fs| fs.iter().map(|f| f.name().to_string()).collect::<Vec<_>>()),
            )
            .field("default_headers", &self.default_headers)
            .field("agent", &self.agent)
            .finish()
    }
}

/// Lifecycle of a scheduler. There is no way back from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Counters updated by ticks as they progress.
#[derive(Debug, Default)]
pub struct TickCounters {
    ticks: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    dispatched: AtomicU64,
}

impl TickCounters {
    pub fn snapshot(&self) -> TickStats {
        TickStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`TickCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks started
    pub ticks: u64,
    /// Ticks a filter dropped
    pub dropped: u64,
    /// Ticks a filter failed or panicked
    pub failed: u64,
    /// Requests handed to the transport
    pub dispatched: u64,
}

impl TickStats {
    /// Ticks whose pipeline has not finished yet. Panicked ticks are
    /// counted as failed, so they leave this count too.
    pub fn in_pipeline(&self) -> u64 {
        self.ticks.saturating_sub(self.dropped + self.failed + self.dispatched)
    }
}

/// Read-only state shared by the timer and every tick task.
struct TickContext {
    selector: WeightedSelector,
    pipeline: FilterPipeline,
    dispatcher: Dispatcher,
    counters: TickCounters,
}

impl TickContext {
    fn next_request(&self) -> WorkingRequest {
        let mut rng = rand::rng();
        self.selector.select(&mut rng).to_working()
    }

    async fn run_tick(&self, tick: u64, request: WorkingRequest) {
        match self.pipeline.run(request).await {
            Ok(PipelineOutcome::Complete(request)) => {
                self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
                self.dispatcher.dispatch(request).await;
            }
            Ok(PipelineOutcome::Dropped { step, filter }) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(tick, step, filter = %filter, "Tick dropped by filter");
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(tick, error = %e, "Filter failed, skipping tick");
            }
        }
    }

    /// Run one tick on its own task; a panic inside it counts as a failure.
    async fn run_tick_isolated(self: Arc<Self>, tick: u64, request: WorkingRequest) {
        let context = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            context.run_tick(tick, request).await;
        });

        if let Err(e) = handle.await
            && e.is_panic()
        {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(tick, "Tick panicked, skipping tick");
        }
    }

    fn begin_tick(&self) -> (u64, WorkingRequest) {
        let tick = self.counters.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let request = self.next_request();
        tracing::debug!(tick, method = %request.method, url = %request.url, "Tick");
        (tick, request)
    }

    fn spawn_tick(self: &Arc<Self>) {
        let (tick, request) = self.begin_tick();
        tokio::spawn(Arc::clone(self).run_tick_isolated(tick, request));
    }
}

/// Drives ticks on a fixed interval until stopped.
pub struct Scheduler {
    context: Arc<TickContext>,
    interval: Duration,
    state: SchedulerState,
    timer: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Validate the configuration and build an idle scheduler.
    ///
    /// Returns the receiving end of the event channel alongside it; the
    /// channel closes once the scheduler and all in-flight ticks are gone.
    pub fn new(
        templates: Vec<RequestTemplate>,
        config: SchedulerConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<(Self, EventReceiver)> {
        let interval = tick_interval(config.max_per_minute)?;
        let selector = WeightedSelector::new(templates)?;
        let pipeline = FilterPipeline::from_configured(config.filters);
        let (events_tx, events_rx) = event_channel();
        let dispatcher = Dispatcher::new(transport, config.default_headers, config.agent, events_tx);

        log::info!(
            "Scheduler ready: {} request(s), one tick every {:?}, filters {:?}",
            selector.len(),
            interval,
            pipeline.names()
        );

        let context = Arc::new(TickContext {
            selector,
            pipeline,
            dispatcher,
            counters: TickCounters::default(),
        });

        Ok((
            Self {
                context,
                interval,
                state: SchedulerState::Idle,
                timer: None,
            },
            events_rx,
        ))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn stats(&self) -> TickStats {
        self.context.counters.snapshot()
    }

    /// Arm the timer. The first tick fires one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SchedulerState::Running => {
                return Err(WorkloadError::InvalidState("scheduler is already running".to_string()));
            }
            SchedulerState::Stopped => {
                return Err(WorkloadError::InvalidState(
                    "a stopped scheduler cannot be restarted".to_string(),
                ));
            }
            SchedulerState::Idle => {}
        }

        let context = Arc::clone(&self.context);
        let period = self.interval;
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                context.spawn_tick();
            }
        }));
        self.state = SchedulerState::Running;

        log::info!("Scheduler started");
        Ok(())
    }

    /// Disarm the timer. Ticks already in flight run to completion and may
    /// still emit events. Calling it again does nothing.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            log::info!("Scheduler stopped after {} tick(s)", self.stats().ticks);
        }
        self.state = SchedulerState::Stopped;
    }

    /// Run one complete tick inline, bypassing the timer.
    pub async fn run_once(&self) -> Result<()> {
        if self.state == SchedulerState::Stopped {
            return Err(WorkloadError::InvalidState("scheduler is stopped".to_string()));
        }
        let (tick, request) = self.context.begin_tick();
        Arc::clone(&self.context).run_tick_isolated(tick, request).await;
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
