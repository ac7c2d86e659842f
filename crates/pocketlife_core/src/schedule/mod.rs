//! Startup and periodic expiry sweeps.
//!
//! # Responsibility
//! - Run `sweep_expired` for every registered record kind on application
//!   start and on each interval tick.
//! - Keep timer mechanics out of the lifecycle service (`periodic` owns
//!   the background thread).
//!
//! # Invariants
//! - A failing kind never prevents later kinds from being swept.

use crate::clock::Clock;
use crate::model::deletion::RecordKind;
use crate::repo::RecordStore;
use crate::service::lifecycle_service::{LifecycleService, SweepReport};
use log::info;
use std::time::{Duration, Instant};

pub mod periodic;

/// Anything that can sweep expired trash for one record kind.
pub trait ExpirySweep {
    fn kind(&self) -> RecordKind;
    fn sweep_expired(&self, retention: Duration) -> SweepReport;
}

impl<S: RecordStore, C: Clock> ExpirySweep for LifecycleService<S, C> {
    fn kind(&self) -> RecordKind {
        LifecycleService::kind(self)
    }

    fn sweep_expired(&self, retention: Duration) -> SweepReport {
        LifecycleService::sweep_expired(self, retention)
    }
}

/// Why a sweep pass ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepTrigger {
    Startup,
    Interval,
    /// Requested explicitly by the user.
    Manual,
}

impl SweepTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Interval => "interval",
            Self::Manual => "manual",
        }
    }
}

/// `ok` when every report is clean, `partial` otherwise.
pub fn pass_status(reports: &[SweepReport]) -> &'static str {
    if reports.iter().all(SweepReport::is_clean) {
        "ok"
    } else {
        "partial"
    }
}

/// Set of record kinds swept together with one retention period.
pub struct SweepSchedule<'a> {
    retention: Duration,
    targets: Vec<&'a dyn ExpirySweep>,
}

impl<'a> SweepSchedule<'a> {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            targets: Vec::new(),
        }
    }

    pub fn register(&mut self, target: &'a dyn ExpirySweep) -> &mut Self {
        self.targets.push(target);
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Sweeps every registered kind once at application start.
    pub fn on_application_start(&self) -> Vec<SweepReport> {
        self.run(SweepTrigger::Startup)
    }

    /// Sweeps every registered kind for one interval tick.
    pub fn on_interval(&self) -> Vec<SweepReport> {
        self.run(SweepTrigger::Interval)
    }

    /// Sweeps every registered kind once, outside the schedule.
    pub fn on_demand(&self) -> Vec<SweepReport> {
        self.run(SweepTrigger::Manual)
    }

    pub fn run(&self, trigger: SweepTrigger) -> Vec<SweepReport> {
        let started_at = Instant::now();
        let reports: Vec<SweepReport> = self
            .targets
            .iter()
            .map(|target| target.sweep_expired(self.retention))
            .collect();

        let purged: usize = reports.iter().map(|report| report.purged).sum();
        let failed: usize = reports.iter().map(|report| report.failures.len()).sum();
        info!(
            "event=sweep_pass module=schedule status={} trigger={} kinds={} purged={} failed={} retention_secs={} duration_ms={}",
            pass_status(&reports),
            trigger.as_str(),
            reports.len(),
            purged,
            failed,
            self.retention.as_secs(),
            started_at.elapsed().as_millis()
        );
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::{pass_status, ExpirySweep, SweepSchedule, SweepTrigger};
    use crate::service::lifecycle_service::PurgeFailure;
    use crate::model::deletion::RecordKind;
    use crate::service::lifecycle_service::SweepReport;
    use std::cell::RefCell;
    use std::time::Duration;

    struct Recorder {
        kind: RecordKind,
        seen: RefCell<Vec<Duration>>,
    }

    impl ExpirySweep for Recorder {
        fn kind(&self) -> RecordKind {
            self.kind
        }

        fn sweep_expired(&self, retention: Duration) -> SweepReport {
            self.seen.borrow_mut().push(retention);
            SweepReport {
                kind: self.kind,
                attempted: 1,
                purged: 1,
                already_absent: 0,
                failures: Vec::new(),
            }
        }
    }

    #[test]
    fn every_registered_kind_is_swept_with_schedule_retention() {
        let notes = Recorder {
            kind: RecordKind::Note,
            seen: RefCell::new(Vec::new()),
        };
        let budget = Recorder {
            kind: RecordKind::BudgetItem,
            seen: RefCell::new(Vec::new()),
        };
        let retention = Duration::from_secs(3_600);
        let mut schedule = SweepSchedule::new(retention);
        schedule.register(&notes).register(&budget);

        let startup = schedule.on_application_start();
        let tick = schedule.on_interval();

        let kinds: Vec<_> = startup.iter().map(|report| report.kind).collect();
        assert_eq!(kinds, vec![RecordKind::Note, RecordKind::BudgetItem]);
        assert_eq!(tick.len(), 2);
        assert_eq!(*notes.seen.borrow(), vec![retention, retention]);
        assert_eq!(*budget.seen.borrow(), vec![retention, retention]);
    }

    #[test]
    fn manual_pass_sweeps_every_kind() {
        let notes = Recorder {
            kind: RecordKind::Note,
            seen: RefCell::new(Vec::new()),
        };
        let mut schedule = SweepSchedule::new(Duration::from_secs(60));
        schedule.register(&notes);

        let reports = schedule.on_demand();

        assert_eq!(reports.len(), 1);
        assert_eq!(notes.seen.borrow().len(), 1);
        assert_eq!(SweepTrigger::Manual.as_str(), "manual");
    }

    #[test]
    fn pass_status_is_partial_when_any_report_failed() {
        let clean = SweepReport {
            kind: RecordKind::Note,
            attempted: 1,
            purged: 1,
            already_absent: 0,
            failures: Vec::new(),
        };
        let failed = SweepReport {
            kind: RecordKind::BudgetItem,
            failures: vec![PurgeFailure {
                id: None,
                error: "disk full".to_string(),
            }],
            ..clean.clone()
        };

        assert_eq!(pass_status(&[clean.clone()]), "ok");
        assert_eq!(pass_status(&[clean, failed]), "partial");
        assert_eq!(pass_status(&[]), "ok");
    }
}
