//! Thread bodies for realtime mode.
//!
//! Each zone gets its own thread running [`ZoneThreadState::run`] at the
//! configured tick rate. Tick reports go to a single migrator thread
//! ([`MigratorState::run`]), which applies them between ticks. There
//! is no global tick: zones drift relative to each other by up to one
//! interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use fray_core::ZoneId;
use tracing::{debug, trace};

use crate::coordinator::Coordinator;
use crate::zone::TickReport;

/// State owned by one zone's tick thread.
pub(crate) struct ZoneThreadState {
    zone: ZoneId,
    coordinator: Arc<Coordinator>,
    clock: Instant,
    reports: Sender<TickReport>,
    shutdown_flag: Arc<AtomicBool>,
    tick_budget: Duration,
}

impl ZoneThreadState {
    pub(crate) fn new(
        zone: ZoneId,
        coordinator: Arc<Coordinator>,
        clock: Instant,
        reports: Sender<TickReport>,
        shutdown_flag: Arc<AtomicBool>,
    ) -> Self {
        let tick_budget = Duration::from_millis(coordinator.rules().tick_interval_ms);
        Self {
            zone,
            coordinator,
            clock,
            reports,
            shutdown_flag,
            tick_budget,
        }
    }

    /// Tick until the shutdown flag is set. Returns the number of ticks
    /// run.
    pub(crate) fn run(self) -> u64 {
        let mut ticks = 0;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            let start = Instant::now();
            let now_ms = self.clock.elapsed().as_millis() as u64;
            let Some(report) = self.coordinator.tick_zone(self.zone, now_ms) else {
                break;
            };
            ticks += 1;
            if self.reports.send(report).is_err() {
                // Migrator is gone; nothing can apply our reports.
                break;
            }

            let elapsed = start.elapsed();
            match self.tick_budget.checked_sub(elapsed) {
                // park_timeout so shutdown can wake us with unpark().
                Some(remaining) => thread::park_timeout(remaining),
                None => debug!(
                    zone = %self.zone,
                    elapsed_us = elapsed.as_micros() as u64,
                    "tick overran its budget"
                ),
            }
        }
        trace!(zone = %self.zone, ticks, "zone thread exiting");
        ticks
    }
}

/// State owned by the migrator thread.
pub(crate) struct MigratorState {
    coordinator: Arc<Coordinator>,
    reports: Receiver<TickReport>,
}

impl MigratorState {
    pub(crate) fn new(coordinator: Arc<Coordinator>, reports: Receiver<TickReport>) -> Self {
        Self {
            coordinator,
            reports,
        }
    }

    /// Apply reports until every zone thread has exited. Returns the
    /// number of migrations carried out.
    pub(crate) fn run(self) -> u64 {
        let mut migrations = 0;
        for report in self.reports.iter() {
            migrations += self.coordinator.apply_report(&report).len() as u64;
        }
        trace!(migrations, "migrator exiting");
        migrations
    }
}
