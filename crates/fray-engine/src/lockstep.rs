//! Lockstep (synchronous) server.
//!
//! [`LockstepServer`] ticks every zone on the caller's thread, in
//! topology order, then applies all tick reports. The clock advances by
//! exactly one tick interval per [`step_sync`](LockstepServer::step_sync),
//! which makes runs reproducible for a given seed. Tests, benches and
//! replays use this mode; live servers use
//! [`RealtimeServer`](crate::RealtimeServer).

use crate::config::{ConfigError, ServerConfig};
use crate::coordinator::Coordinator;
use crate::metrics::TickMetrics;
use crate::rules::Rules;
use crate::zone::{MigrationRequest, TickReport};
use fray_core::{PlayerId, Progression, ZoneId};
use fray_space::WorldTopology;
use std::sync::Arc;

// ── StepReport ──────────────────────────────────────────────────

/// Outcome of one [`LockstepServer::step_sync`] call.
#[derive(Clone, Debug, Default)]
pub struct StepReport {
    /// Clock the zones ticked at.
    pub now_ms: u64,
    /// Migrations carried out after the tick.
    pub migrations: Vec<MigrationRequest>,
    /// Players dropped after a transport failure.
    pub dropped: Vec<PlayerId>,
    /// Per-zone metrics, in tick order.
    pub zones: Vec<(ZoneId, TickMetrics)>,
}

// ── LockstepServer ──────────────────────────────────────────────

/// Single-threaded server that ticks all zones on demand.
pub struct LockstepServer {
    coordinator: Coordinator,
    now_ms: u64,
}

impl LockstepServer {
    /// Validate `config` against `topology` and build every zone.
    pub fn new(config: ServerConfig, topology: WorldTopology) -> Result<Self, ConfigError> {
        Self::from_rules(Rules::new(config, topology)?)
    }

    /// Like [`new`](Self::new) with a custom level curve.
    pub fn with_progression(
        config: ServerConfig,
        topology: WorldTopology,
        progression: Arc<dyn Progression>,
    ) -> Result<Self, ConfigError> {
        Self::from_rules(Rules::with_progression(config, topology, progression)?)
    }

    /// Build from already validated rules.
    pub fn from_rules(rules: Rules) -> Result<Self, ConfigError> {
        Ok(Self {
            coordinator: Coordinator::new(rules)?,
            now_ms: 0,
        })
    }

    /// Connection, routing and zone access.
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Clock of the last step.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance the clock by one interval, tick every zone, then apply
    /// the reports.
    ///
    /// All zones tick before any report is applied, so migrations never
    /// interleave with a tick.
    pub fn step_sync(&mut self) -> StepReport {
        self.now_ms += self.coordinator.rules().tick_interval_ms;
        let now_ms = self.now_ms;
        let coordinator = &self.coordinator;
        let reports: Vec<TickReport> = coordinator
            .zone_ids()
            .filter_map(|zone| coordinator.tick_zone(zone, now_ms))
            .collect();

        let mut step = StepReport {
            now_ms,
            ..Default::default()
        };
        for report in reports {
            step.migrations.extend(self.coordinator.apply_report(&report));
            step.dropped.extend_from_slice(&report.dropped);
            step.zones.push((report.zone, report.metrics));
        }
        step
    }

    /// Run `ticks` steps and return the last report.
    pub fn run(&mut self, ticks: u64) -> StepReport {
        let mut last = StepReport::default();
        for _ in 0..ticks {
            last = self.step_sync();
        }
        last
    }
}
