//! Graded exam sheet -> spreadsheet report.
//!
//! Marks from a detector are ordered into questions, merged with their
//! topics, aggregated per topic and written into a copy of a user template
//! (or a fresh workbook) together with an accuracy chart.

pub mod config;
pub mod detector;
pub mod error;
pub mod excel;
pub mod models;
pub mod report;
pub mod services;
pub mod sink;
pub mod types;

pub use config::{DetectorConfig, ReportConfig, ReportLabels};
pub use detector::{Detector, HttpDetector, StaticDetector};
pub use error::{ReportError, Result};
pub use models::{CellPosition, ColumnMap, ColumnRole, LayoutSource, SheetLayout};
pub use report::{ReportBuilder, ReportNotice, ReportOutcome};
pub use services::template_locator::HeaderRules;
pub use sink::{ArtifactId, ArtifactSink, DirectorySink, MemorySink};
pub use types::{
    DetectorLabel, GradingEntry, MarkClass, MarkRecord, RawDetection, ReportSummary, TopicAggregate,
    TopicAggregates,
};

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
