//! Periodic refresh of recurring series.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::core::clock::Clock;
use crate::core::services::{RecordService, RefreshReport, ServiceResult};
use crate::records::DatedAmountRecord;
use crate::storage::Repository;

/// Tracks when the last refresh ran and whether another one is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub interval: Duration,
    pub last_run: Option<DateTime<Utc>>,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self::every(Duration::hours(24))
    }
}

impl RefreshSchedule {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Runs a refresh when due and stamps `now` as the last run.
    pub fn run_if_due<R, C>(
        &mut self,
        now: DateTime<Utc>,
        service: &mut RecordService<R, C>,
    ) -> ServiceResult<Option<RefreshReport>>
    where
        R: Repository<DatedAmountRecord>,
        C: Clock,
    {
        if !self.is_due(now) {
            debug!(last_run = ?self.last_run, "refresh not due yet");
            return Ok(None);
        }
        let report = service.refresh()?;
        self.last_run = Some(now);
        Ok(Some(report))
    }
}
