pub mod grading;
pub mod ingest;
pub mod report_writer;
pub mod template_locator;
