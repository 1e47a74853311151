//! Anti-replay transaction counters.

use crate::domain::entities::{ModuleId, TransactionCounter};
use crate::domain::errors::AdminError;
use crate::ports::outbound::{SystemTimeSource, TimeSource, TransactionCounterSource};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Per-module strictly increasing counter seeded from the wall clock.
///
/// Each value is `max(now_micros, last + 1)`, so restarts keep moving
/// forward as long as the clock does, and a clock that steps backwards never
/// produces a repeat within one process.
pub struct MonotonicCounterSource<TS = SystemTimeSource> {
    time_source: TS,
    last: Mutex<HashMap<ModuleId, u64>>,
}

impl MonotonicCounterSource<SystemTimeSource> {
    pub fn new() -> Self {
        Self::with_time_source(SystemTimeSource)
    }
}

impl Default for MonotonicCounterSource<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<TS: TimeSource> MonotonicCounterSource<TS> {
    pub fn with_time_source(time_source: TS) -> Self {
        Self {
            time_source,
            last: Mutex::new(HashMap::new()),
        }
    }
}

impl<TS: TimeSource> TransactionCounterSource for MonotonicCounterSource<TS> {
    fn next(&self, module: ModuleId) -> Result<TransactionCounter, AdminError> {
        let now = self.time_source.now_micros();
        let mut last = self.last.lock();
        let value = match last.get(&module) {
            Some(&previous) => {
                let successor = previous.checked_add(1).ok_or_else(|| {
                    AdminError::invalid_state(format!(
                        "transaction counter exhausted for module {}",
                        module.0
                    ))
                })?;
                successor.max(now)
            }
            // zero is the unset placeholder
            None => now.max(1),
        };
        last.insert(module, value);
        Ok(TransactionCounter(value))
    }
}
