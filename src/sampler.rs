//! Host resource sampling for the `system` measurement.

use parking_lot::Mutex;
use sysinfo::System;

use crate::error::{Result, TelemetryError};

/// Point-in-time utilisation, both as percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemUsage {
    pub cpu_percent: f64,
    pub mem_percent: f64,
}

/// Source of fresh CPU / memory readings, queried once per flush.
pub trait Sampler: Send + Sync {
    fn sample(&self) -> Result<SystemUsage>;
}

/// `sysinfo`-backed sampler.
///
/// CPU is the 1-minute load average spread over the logical CPU count, so
/// a saturated box reads ~100 and an overloaded one can exceed it.
pub struct HostSampler {
    system: Mutex<System>,
}

impl HostSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for HostSampler {
    fn sample(&self) -> Result<SystemUsage> {
        let mut sys = self.system.lock();
        sys.refresh_memory();

        let cpus = sys.cpus().len();
        if cpus == 0 {
            return Err(TelemetryError::Sampler("no CPUs reported".into()));
        }
        let total = sys.total_memory();
        if total == 0 {
            return Err(TelemetryError::Sampler("total memory reported as 0".into()));
        }

        let load = System::load_average().one;
        let free = sys.free_memory().min(total);

        Ok(SystemUsage {
            cpu_percent: load / cpus as f64 * 100.0,
            mem_percent: (total - free) as f64 / total as f64 * 100.0,
        })
    }
}
