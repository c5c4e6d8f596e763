//! Stats Module - Collector Performance Monitoring
//!
//! Collects per-heap statistics:
//! - Cycle counts and reclaimed bytes
//! - Allocation counts, bytes, and failures
//! - Peak occupancy and last pause time
//!
//! The heap is single-mutator by construction, so counters are plain
//! fields updated through `&mut`.

use serde::Serialize;
use std::time::{Duration, Instant};

/// GcStats - statistics collector for one heap
#[derive(Debug)]
pub struct GcStats {
    /// Completed collection cycles
    cycles: u64,
    /// Bytes reclaimed over all cycles
    total_reclaimed: u64,
    /// Successful allocations
    allocations: u64,
    /// Bytes handed out, rounded sizes
    allocated_bytes: u64,
    /// Refused allocations
    allocation_failures: u64,
    /// Highest observed occupancy
    peak_used: usize,
    /// Duration of the most recent cycle
    last_pause: Duration,
    /// Construction time
    start_time: Instant,
    /// Recording enabled
    enabled: bool,
}

impl GcStats {
    /// Create a stats collector
    pub fn new(enabled: bool) -> Self {
        Self {
            cycles: 0,
            total_reclaimed: 0,
            allocations: 0,
            allocated_bytes: 0,
            allocation_failures: 0,
            peak_used: 0,
            last_pause: Duration::ZERO,
            start_time: Instant::now(),
            enabled,
        }
    }

    /// Record a completed collection cycle
    pub fn record_cycle(&mut self, reclaimed: usize, pause: Duration) {
        if !self.enabled {
            return;
        }
        self.cycles += 1;
        self.total_reclaimed += reclaimed as u64;
        self.last_pause = pause;
    }

    /// Record a successful allocation of `bytes` (rounded size)
    pub fn record_allocation(&mut self, bytes: usize, used_after: usize) {
        if !self.enabled {
            return;
        }
        self.allocations += 1;
        self.allocated_bytes += bytes as u64;
        self.peak_used = self.peak_used.max(used_after);
    }

    /// Record a refused allocation
    pub fn record_allocation_failure(&mut self) {
        if !self.enabled {
            return;
        }
        self.allocation_failures += 1;
    }

    /// Completed cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Bytes reclaimed over all cycles
    pub fn total_reclaimed(&self) -> u64 {
        self.total_reclaimed
    }

    /// Successful allocations
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Refused allocations
    pub fn allocation_failures(&self) -> u64 {
        self.allocation_failures
    }

    /// Take a serializable snapshot
    pub fn summary(&self) -> GcSummary {
        GcSummary {
            cycles: self.cycles,
            total_reclaimed_bytes: self.total_reclaimed,
            allocations: self.allocations,
            allocated_bytes: self.allocated_bytes,
            allocation_failures: self.allocation_failures,
            peak_used_bytes: self.peak_used,
            last_pause_ms: self.last_pause.as_secs_f64() * 1000.0,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

/// Summary statistics snapshot
#[derive(Debug, Default, Clone, Serialize)]
pub struct GcSummary {
    /// Completed collection cycles
    pub cycles: u64,
    /// Bytes reclaimed over all cycles
    pub total_reclaimed_bytes: u64,
    /// Successful allocations
    pub allocations: u64,
    /// Bytes handed out
    pub allocated_bytes: u64,
    /// Refused allocations
    pub allocation_failures: u64,
    /// Highest observed occupancy
    pub peak_used_bytes: usize,
    /// Duration of the most recent cycle (ms)
    pub last_pause_ms: f64,
    /// Seconds since heap creation
    pub uptime_secs: u64,
}

/// GcTimer - timer for measuring collector operations
pub struct GcTimer {
    start: Instant,
}

impl GcTimer {
    /// Start a timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get elapsed milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for GcTimer {
    fn default() -> Self {
        Self::new()
    }
}
