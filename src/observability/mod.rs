//! Observability: structured logging and pipeline counters

pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, parse_level, LogFormat};
pub use metrics::{MetricsSnapshot, PipelineMetrics, StageTimingSnapshot};

// Span macros for structured logging
pub use logging::{run_span, stage_span};
