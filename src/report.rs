//! Report builder: marks + topics (+ template) -> saved workbook.

use serde::Serialize;
use std::path::Path;

use crate::config::ReportConfig;
use crate::detector::Detector;
use crate::error::Result;
use crate::excel::{open_template, FreshSheet, ReportWorkbook};
use crate::models::{LayoutSource, SheetLayout};
use crate::services::grading::{aggregate, order_and_merge, summarize};
use crate::services::ingest::normalize_detections;
use crate::services::report_writer::ReportWriter;
use crate::services::template_locator::{locate_or_default, RangeGrid};
use crate::sink::ArtifactId;
use crate::sink::ArtifactSink;
use crate::types::{GradingEntry, MarkRecord, ReportSummary, TopicAggregates};

/// Recoverable condition met while building a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReportNotice {
    /// Template could not be opened; a fresh workbook was used.
    TemplateUnreadable { reason: String },
    /// Template opened but no header row matched; default layout used.
    TemplateNotRecognized,
    /// No template given; a fresh workbook was used.
    NoTemplate,
    NoMarks,
    ChartSkipped { reason: String },
    /// Template pictures, charts or notes that could not be carried over.
    TemplateContentDropped { parts: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub artifact: ArtifactId,
    pub entries: Vec<GradingEntry>,
    pub aggregates: TopicAggregates,
    pub summary: ReportSummary,
    pub layout: SheetLayout,
    pub notices: Vec<ReportNotice>,
}

impl ReportOutcome {
    pub fn has_notice(&self, notice: &ReportNotice) -> bool {
        self.notices.contains(notice)
    }
}

pub struct ReportBuilder<S> {
    config: ReportConfig,
    sink: S,
}

impl<S: ArtifactSink> ReportBuilder<S> {
    pub fn new(config: ReportConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Grades `marks` against `topics` and saves the report. The template,
    /// when given, is read but never modified. Only failures to produce or
    /// store the artifact are errors.
    pub fn build_report(
        &self,
        marks: &[MarkRecord],
        topics: &[String],
        template: Option<&Path>,
        student_name: Option<&str>,
    ) -> Result<ReportOutcome> {
        let mut notices = Vec::new();
        let entries = order_and_merge(marks, topics, &self.config.labels);
        let aggregates = aggregate(&entries);
        let summary = summarize(&entries);
        if entries.is_empty() {
            tracing::info!("No marks, writing empty report");
            notices.push(ReportNotice::NoMarks);
        }

        let (mut workbook, layout) = self.open_workbook(template, &mut notices)?;
        let written = ReportWriter::new(&self.config.labels, self.config.student_name_cell).write(
            &mut workbook,
            &layout,
            &entries,
            &aggregates,
            &summary,
            student_name,
        )?;
        let rendered = workbook.render()?;
        if let Some(reason) = written.chart_skipped.or(rendered.chart_skipped) {
            notices.push(ReportNotice::ChartSkipped { reason });
        }
        if !rendered.dropped_parts.is_empty() {
            notices.push(ReportNotice::TemplateContentDropped {
                parts: rendered.dropped_parts,
            });
        }

        let artifact = self.sink.save(&rendered.bytes)?;
        tracing::info!(
            artifact = %artifact,
            questions = summary.questions,
            score = %summary.score_text(),
            "Report built"
        );
        Ok(ReportOutcome {
            artifact,
            entries,
            aggregates,
            summary,
            layout,
            notices,
        })
    }

    /// Runs `detector` on `image`, normalizes with the configured checkmark
    /// policy and builds the report. A detector that finds nothing yields an
    /// empty report.
    pub fn grade_image(
        &self,
        detector: &dyn Detector,
        image: &[u8],
        topics: &[String],
        template: Option<&Path>,
        student_name: Option<&str>,
    ) -> Result<ReportOutcome> {
        let raw = detector.detect(image);
        let marks = normalize_detections(&raw, self.config.checkmark_policy);
        self.build_report(&marks, topics, template, student_name)
    }

    fn open_workbook(
        &self,
        template: Option<&Path>,
        notices: &mut Vec<ReportNotice>,
    ) -> Result<(ReportWorkbook, SheetLayout)> {
        match template {
            Some(path) => match open_template(path) {
                Ok((sheet, range)) => {
                    let layout = locate_or_default(&RangeGrid(&range), &self.config.header_rules);
                    if layout.source == LayoutSource::Default {
                        tracing::info!(template = %path.display(), "Template header not recognized");
                        notices.push(ReportNotice::TemplateNotRecognized);
                    }
                    return Ok((ReportWorkbook::Template(sheet), layout));
                }
                Err(e) => {
                    tracing::warn!(template = %path.display(), error = %e, "Template unreadable, using fresh workbook");
                    notices.push(ReportNotice::TemplateUnreadable {
                        reason: e.to_string(),
                    });
                }
            },
            None => notices.push(ReportNotice::NoTemplate),
        }

        let labels = &self.config.labels;
        let sheet = FreshSheet::new(&labels.sheet_name, &labels.default_headers)?;
        let layout = locate_or_default(&sheet.header_grid(), &self.config.header_rules);
        Ok((ReportWorkbook::Fresh(sheet), layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::StaticDetector;
    use crate::sink::MemorySink;
    use crate::types::{MarkClass, RawDetection};

    fn topics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_template_builds_fresh_workbook() {
        let builder = ReportBuilder::new(ReportConfig::default(), MemorySink::new());
        let marks = vec![
            MarkRecord::new(MarkClass::Incorrect, 800.0, 0.0, 0.9),
            MarkRecord::new(MarkClass::Correct, 100.0, 0.0, 0.9),
            MarkRecord::new(MarkClass::Correct, 400.0, 0.0, 0.9),
        ];
        let outcome = builder
            .build_report(&marks, &topics(&["Algebra", "Geometry", "Calc"]), None, None)
            .unwrap();
        assert_eq!(outcome.notices, vec![ReportNotice::NoTemplate]);
        assert_eq!(outcome.layout.header_row, 1);
        assert_eq!(outcome.layout.source, LayoutSource::Discovered);
        assert_eq!(outcome.summary.score_text(), "2/3");
        assert_eq!(builder.sink().len(), 1);
        assert!(builder.sink().get(&outcome.artifact).is_some());
    }

    #[test]
    fn missing_template_falls_back() {
        let builder = ReportBuilder::new(ReportConfig::default(), MemorySink::new());
        let outcome = builder
            .build_report(&[], &[], Some(Path::new("/nonexistent/template.xlsx")), None)
            .unwrap();
        assert!(matches!(
            outcome.notices.first(),
            Some(ReportNotice::NoMarks)
        ));
        assert!(outcome
            .notices
            .iter()
            .any(|n| matches!(n, ReportNotice::TemplateUnreadable { .. })));
        assert!(outcome
            .notices
            .iter()
            .any(|n| matches!(n, ReportNotice::ChartSkipped { .. })));
        assert!(outcome.entries.is_empty());
    }

    #[test]
    fn grade_image_applies_checkmark_policy() {
        let mut config = ReportConfig::default();
        config.checkmark_policy = MarkClass::Correct;
        let builder = ReportBuilder::new(config, MemorySink::new());
        let detector = StaticDetector(vec![
            RawDetection::new("✓", 20.0, 0.0, 0.7),
            RawDetection::new("cross", 10.0, 0.0, 0.9),
        ]);
        let outcome = builder
            .grade_image(&detector, b"img", &topics(&["Sets", "Logic"]), None, Some("Ren"))
            .unwrap();
        assert_eq!(outcome.entries[0].outcome, MarkClass::Incorrect);
        assert_eq!(outcome.entries[1].outcome, MarkClass::Correct);
        assert_eq!(outcome.entries[1].topic, "Logic");
    }

    #[test]
    fn empty_detector_output_is_empty_report() {
        let builder = ReportBuilder::new(ReportConfig::default(), MemorySink::new());
        let outcome = builder
            .grade_image(&StaticDetector::default(), b"img", &topics(&["A"]), None, None)
            .unwrap();
        assert!(outcome.has_notice(&ReportNotice::NoMarks));
        assert_eq!(outcome.summary.questions, 0);
        assert!(outcome.aggregates.is_empty());
    }
}
