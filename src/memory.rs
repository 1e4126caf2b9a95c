// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Memory sampling for the demotion trigger.
//!
//! A sampler reports one number: bytes currently in use. The demotion worker
//! compares it with `max_mem_bytes` before every check.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sysinfo::{Pid, System};
use tracing::warn;

pub trait MemorySampler: Send + Sync {
    /// Current memory usage in bytes.
    fn used_bytes(&self) -> u64;
}

/// Resident set size of the current process, read through `sysinfo`.
pub struct ProcessMemory {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemory {
    #[must_use]
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(error = %e, "Cannot resolve current pid; memory sampling disabled");
                None
            }
        };
        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for ProcessMemory {
    fn used_bytes(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        let mut system = self.system.lock();
        if !system.refresh_process(pid) {
            return 0;
        }
        system.process(pid).map_or(0, |p| p.memory())
    }
}

/// Sampler that reports whatever it was last told.
///
/// Useful in tests, and for embedders that account memory themselves.
#[derive(Debug, Default)]
pub struct ManualMemory {
    bytes: AtomicU64,
}

impl ManualMemory {
    #[must_use]
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: AtomicU64::new(bytes),
        }
    }

    pub fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::Release);
    }
}

impl MemorySampler for ManualMemory {
    fn used_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_memory_reports_nonzero() {
        let sampler = ProcessMemory::new();
        assert!(sampler.used_bytes() > 0, "a running test process has resident memory");
    }

    #[test]
    fn test_manual_memory_set() {
        let sampler = ManualMemory::new(10);
        assert_eq!(sampler.used_bytes(), 10);
        sampler.set(1 << 30);
        assert_eq!(sampler.used_bytes(), 1 << 30);
    }

    #[test]
    fn test_samplers_are_object_safe() {
        let samplers: Vec<Box<dyn MemorySampler>> =
            vec![Box::new(ManualMemory::new(1)), Box::new(ProcessMemory::new())];
        assert_eq!(samplers[0].used_bytes(), 1);
    }
}
