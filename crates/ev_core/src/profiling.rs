//! Event processing counters, used to profile runs and benches.

use std::collections::HashMap;
use std::time::Instant;

use bevy_ecs::prelude::Resource;

use crate::clock::EventKind;

/// Event processing rate metrics. The runner updates it when present.
#[derive(Debug, Default, Resource)]
pub struct EventMetrics {
    pub events_processed: u64,
    /// Wall-clock start, for rate calculation.
    pub start_time: Option<Instant>,
    pub events_by_kind: HashMap<EventKind, u64>,
}

impl EventMetrics {
    pub fn record_event(&mut self, kind: EventKind) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.events_processed += 1;
        *self.events_by_kind.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.events_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Events per wall-clock second since the first recorded event.
    pub fn events_per_second(&self) -> f64 {
        let Some(start) = self.start_time else {
            return 0.0;
        };
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.events_processed as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        log::info!(
            "processed {} events ({:.0}/s)",
            self.events_processed,
            self.events_per_second()
        );
        let mut entries: Vec<_> = self.events_by_kind.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in entries {
            log::debug!("  {:20} : {}", format!("{kind:?}"), count);
        }
    }
}
