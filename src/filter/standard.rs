//! The standard filters: workday bias, working-hours bias, URL expansion.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use super::hours::WorkingHoursProfile;
use super::{Filter, FilterOutcome, expand};
use crate::clock::{Clock, is_weekend};
use crate::error::{Result, WorkloadError};
use crate::request::WorkingRequest;

/// Chance of a request getting through on a Saturday or Sunday.
pub const WEEKEND_ODDS: f64 = 0.2;

/// One uniform draw against `odds`.
fn roll(odds: f64) -> bool {
    rand::rng().random::<f64>() < odds
}

/// Lets every request through on weekdays and one in five at weekends.
pub struct Workdays {
    clock: Arc<dyn Clock>,
}

impl Workdays {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Odds for the current day.
    pub fn odds(&self) -> f64 {
        if is_weekend(&self.clock.now()) { WEEKEND_ODDS } else { 1.0 }
    }
}

#[async_trait]
impl Filter for Workdays {
    async fn apply(&self, request: WorkingRequest) -> Result<FilterOutcome> {
        if roll(self.odds()) {
            Ok(FilterOutcome::Continue(request))
        } else {
            Ok(FilterOutcome::Drop)
        }
    }

    fn name(&self) -> &str {
        "workdays"
    }
}

/// Lets requests through with the odds the hours profile gives for now.
pub struct WorkingHours {
    clock: Arc<dyn Clock>,
    profile: WorkingHoursProfile,
}

impl WorkingHours {
    pub fn new(clock: Arc<dyn Clock>, profile: WorkingHoursProfile) -> Self {
        Self { clock, profile }
    }

    pub fn odds(&self) -> f64 {
        self.profile.odds(&self.clock.now())
    }
}

#[async_trait]
impl Filter for WorkingHours {
    async fn apply(&self, request: WorkingRequest) -> Result<FilterOutcome> {
        if roll(self.odds()) {
            Ok(FilterOutcome::Continue(request))
        } else {
            Ok(FilterOutcome::Drop)
        }
    }

    fn name(&self) -> &str {
        "working-hours"
    }
}

/// Replaces a brace pattern in the url with one of its expansions, chosen
/// uniformly. Never drops.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expand;

#[async_trait]
impl Filter for Expand {
    async fn apply(&self, mut request: WorkingRequest) -> Result<FilterOutcome> {
        let mut urls = expand(&request.url)?;
        if urls.is_empty() {
            return Err(WorkloadError::InvalidPattern(format!("'{}' has no expansions", request.url)));
        }
        let index = rand::rng().random_range(0..urls.len());
        request.url = urls.swap_remove(index);
        Ok(FilterOutcome::Continue(request))
    }

    fn name(&self) -> &str {
        "expand"
    }
}
