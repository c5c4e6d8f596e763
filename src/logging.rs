//! GC Logging - Structured Collection Events
//!
//! Event log for collector activity, useful for:
//! - Debugging reclamation behavior
//! - Test assertions on cycle activity
//! - Production monitoring
//!
//! Log Levels:
//! - ERROR: allocation failures
//! - INFO: cycle start/end, heap statistics
//! - DEBUG: root scans, page reclamation
//!
//! Console output goes through one renderer: events describe
//! themselves as a message line, or serialize to tagged JSON when the
//! logger is configured for machine consumption.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Log level for collector events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Info = 1,
    Debug = 2,
}

/// Collector event types
///
/// Serializes with a `type` tag (`cycle_start`, `page_reclaimed`, ...)
/// so JSON consumers can dispatch on one field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GcEvent {
    /// Collection cycle started
    CycleStart {
        cycle: u64,
        unsafe_stack: bool,
        used_bytes: usize,
    },

    /// Collection cycle completed
    CycleEnd {
        cycle: u64,
        duration_ms: f64,
        reclaimed_bytes: usize,
    },

    /// Root enumeration finished
    RootScan {
        stack_roots: usize,
        live_refs: usize,
    },

    /// A transition page was reset to passive
    PageReclaimed { page: usize },

    /// Allocation refused
    AllocationFailure { size: usize, heap_used: usize },

    /// Heap occupancy snapshot
    HeapStats {
        used_bytes: usize,
        total_bytes: usize,
        utilization: f64,
    },
}

impl GcEvent {
    /// One-line human description of the event
    fn describe(&self) -> String {
        match self {
            GcEvent::CycleStart {
                cycle,
                unsafe_stack,
                used_bytes,
            } => format!(
                "cycle {} begins with {} bytes live (unsafe_stack={})",
                cycle, used_bytes, unsafe_stack
            ),
            GcEvent::CycleEnd {
                cycle,
                duration_ms,
                reclaimed_bytes,
            } => format!(
                "cycle {} done in {:.2}ms, {} bytes reclaimed",
                cycle, duration_ms, reclaimed_bytes
            ),
            GcEvent::RootScan {
                stack_roots,
                live_refs,
            } => format!(
                "{} stack roots expanded to {} live references",
                stack_roots, live_refs
            ),
            GcEvent::PageReclaimed { page } => {
                format!("page {} returned to the passive pool", page)
            },
            GcEvent::AllocationFailure { size, heap_used } => format!(
                "refused {}-byte request with {} bytes in use",
                size, heap_used
            ),
            GcEvent::HeapStats {
                used_bytes,
                total_bytes,
                utilization,
            } => format!(
                "occupancy {}/{} bytes ({:.1}%)",
                used_bytes,
                total_bytes,
                utilization * 100.0
            ),
        }
    }
}

/// GC Logger configuration
#[derive(Debug, Clone)]
pub struct GcLoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Enable console output
    pub console: bool,

    /// Emit JSON instead of human-readable lines
    pub json: bool,

    /// Prefix lines with timestamps
    pub timestamps: bool,
}

impl Default for GcLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: false,
            json: false,
            timestamps: true,
        }
    }
}

/// GcLogger - centralized event log for collector operations
pub struct GcLogger {
    config: GcLoggerConfig,
    events: Mutex<Vec<(Instant, GcEvent)>>,
    enabled: AtomicBool,
}

impl GcLogger {
    /// Create a logger
    pub fn new(config: GcLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Enable logging
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable logging
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Log a collector event
    pub fn log(&self, event: GcEvent) {
        if !self.is_enabled() {
            return;
        }

        if event_level(&event) > self.config.level {
            return;
        }

        self.events.lock().push((Instant::now(), event.clone()));

        if self.config.console {
            self.output_console(&event);
        }
    }

    /// Render one event to the console
    ///
    /// Errors go to stderr, everything else to stdout.
    fn output_console(&self, event: &GcEvent) {
        let prefix = if self.config.timestamps {
            format!("[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        } else {
            String::new()
        };

        if self.config.json {
            if let Ok(json) = serde_json::to_string(event) {
                println!("{}{}", prefix, json);
            }
            return;
        }

        let line = format!("{}[GC] {}", prefix, event.describe());
        if event_level(event) == LogLevel::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    /// Get all recorded events
    pub fn events(&self) -> Vec<GcEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Clear all recorded events
    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Get recorded event count
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl Default for GcLogger {
    fn default() -> Self {
        Self::new(GcLoggerConfig::default())
    }
}

/// Level an event is reported at
fn event_level(event: &GcEvent) -> LogLevel {
    match event {
        GcEvent::AllocationFailure { .. } => LogLevel::Error,
        GcEvent::CycleStart { .. } | GcEvent::CycleEnd { .. } | GcEvent::HeapStats { .. } => {
            LogLevel::Info
        },
        GcEvent::RootScan { .. } | GcEvent::PageReclaimed { .. } => LogLevel::Debug,
    }
}

/// Global collector logger
lazy_static::lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<GcLogger> = Mutex::new(GcLogger::default());
}

/// Log an event to the global logger
pub fn log_event(event: GcEvent) {
    GLOBAL_LOGGER.lock().log(event);
}

/// Replace the global logger configuration
pub fn configure_logger(config: GcLoggerConfig) {
    *GLOBAL_LOGGER.lock() = GcLogger::new(config);
}

/// Get the global logger's recorded event count
pub fn event_count() -> usize {
    GLOBAL_LOGGER.lock().event_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_records_events() {
        let logger = GcLogger::default();

        logger.log(GcEvent::CycleStart {
            cycle: 1,
            unsafe_stack: false,
            used_bytes: 4096,
        });

        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_logger_disable() {
        let logger = GcLogger::default();

        logger.disable();
        logger.log(GcEvent::PageReclaimed { page: 0 });

        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn test_level_filter() {
        let logger = GcLogger::new(GcLoggerConfig {
            level: LogLevel::Error,
            ..Default::default()
        });

        logger.log(GcEvent::RootScan {
            stack_roots: 1,
            live_refs: 2,
        });
        logger.log(GcEvent::AllocationFailure {
            size: 64,
            heap_used: 4096,
        });

        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = GcEvent::PageReclaimed { page: 3 };
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"type\":\"page_reclaimed\""));
        assert!(json.contains("\"page\":3"));
    }

    #[test]
    fn test_describe_mentions_the_numbers() {
        let event = GcEvent::CycleEnd {
            cycle: 7,
            duration_ms: 1.25,
            reclaimed_bytes: 2048,
        };

        let line = event.describe();
        assert!(line.contains('7'));
        assert!(line.contains("2048"));
    }

    #[test]
    fn test_global_logger() {
        log_event(GcEvent::HeapStats {
            used_bytes: 0,
            total_bytes: 4096,
            utilization: 0.0,
        });

        assert!(event_count() > 0);
    }
}
