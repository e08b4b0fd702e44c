use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::CellPosition;
use crate::services::template_locator::HeaderRules;
use crate::types::MarkClass;

fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Everything a report build needs besides its inputs. Passed explicitly to
/// [`crate::ReportBuilder`]; nothing is read from globals afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub labels: ReportLabels,
    pub header_rules: HeaderRules,
    /// How a detected checkmark is graded.
    pub checkmark_policy: MarkClass,
    pub student_name_cell: CellPosition,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            file_prefix: "score_report".to_string(),
            labels: ReportLabels::default(),
            header_rules: HeaderRules::default(),
            checkmark_policy: MarkClass::Incorrect,
            student_name_cell: CellPosition::new(1, 2),
        }
    }
}

impl ReportConfig {
    /// Defaults overridden by `.env` / process environment:
    /// GRADE_REPORT_OUTPUT_DIR, GRADE_REPORT_PREFIX, GRADE_REPORT_LOCALE (en|ja),
    /// GRADE_REPORT_CHECKMARK (correct|incorrect|partial|unknown).
    pub fn from_env() -> Self {
        load_env();
        let mut config = Self::default();
        if let Some(dir) = non_empty_var("GRADE_REPORT_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = non_empty_var("GRADE_REPORT_PREFIX") {
            config.file_prefix = prefix;
        }
        if let Some(locale) = non_empty_var("GRADE_REPORT_LOCALE") {
            match locale.to_lowercase().as_str() {
                "ja" | "jp" | "japanese" => config.labels = ReportLabels::japanese(),
                "en" | "english" => {}
                other => tracing::warn!(locale = other, "Unknown GRADE_REPORT_LOCALE, using English labels"),
            }
        }
        if let Some(policy) = non_empty_var("GRADE_REPORT_CHECKMARK") {
            match MarkClass::parse(&policy) {
                Some(class) => config.checkmark_policy = class,
                None => tracing::warn!(value = %policy, "Invalid GRADE_REPORT_CHECKMARK, keeping default"),
            }
        }
        config
    }
}

/// Display strings written into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLabels {
    pub question_prefix: String,
    pub status_correct: String,
    pub status_incorrect: String,
    pub status_partial: String,
    pub unassigned_topic: String,
    pub mark_correct: String,
    pub mark_incorrect: String,
    pub mark_partial: String,
    pub mark_unknown: String,
    /// Header texts of a synthesized workbook: number, topic, mark, status.
    pub default_headers: [String; 4],
    pub aggregate_topic_header: String,
    pub aggregate_rate_header: String,
    pub score_label: String,
    pub chart_title: String,
    pub sheet_name: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self {
            question_prefix: "Q".to_string(),
            status_correct: "Correct".to_string(),
            status_incorrect: "Incorrect".to_string(),
            status_partial: "Partial credit".to_string(),
            unassigned_topic: "Unassigned".to_string(),
            mark_correct: "○".to_string(),
            mark_incorrect: "×".to_string(),
            mark_partial: "△".to_string(),
            mark_unknown: "?".to_string(),
            default_headers: [
                "No.".to_string(),
                "Unit".to_string(),
                "Result".to_string(),
                "Status".to_string(),
            ],
            aggregate_topic_header: "Unit".to_string(),
            aggregate_rate_header: "Accuracy (%)".to_string(),
            score_label: "Score".to_string(),
            chart_title: "Accuracy by unit".to_string(),
            sheet_name: "Report".to_string(),
        }
    }
}

impl ReportLabels {
    pub fn japanese() -> Self {
        Self {
            question_prefix: "問".to_string(),
            status_correct: "正解".to_string(),
            status_incorrect: "不正解".to_string(),
            status_partial: "部分点".to_string(),
            unassigned_topic: "未設定".to_string(),
            mark_correct: "◯".to_string(),
            mark_incorrect: "❌".to_string(),
            mark_partial: "△".to_string(),
            mark_unknown: "?".to_string(),
            default_headers: [
                "問題".to_string(),
                "単元".to_string(),
                "結果".to_string(),
                "判定".to_string(),
            ],
            aggregate_topic_header: "単元".to_string(),
            aggregate_rate_header: "正答率".to_string(),
            score_label: "得点".to_string(),
            chart_title: "単元別正答率".to_string(),
            sheet_name: "採点結果".to_string(),
        }
    }

    pub fn status_label(&self, outcome: MarkClass) -> &str {
        match outcome {
            MarkClass::Correct => &self.status_correct,
            MarkClass::Partial => &self.status_partial,
            MarkClass::Incorrect | MarkClass::Unknown => &self.status_incorrect,
        }
    }

    pub fn mark_symbol(&self, outcome: MarkClass) -> &str {
        match outcome {
            MarkClass::Correct => &self.mark_correct,
            MarkClass::Incorrect => &self.mark_incorrect,
            MarkClass::Partial => &self.mark_partial,
            MarkClass::Unknown => &self.mark_unknown,
        }
    }

    pub fn question_label(&self, question_number: u32) -> String {
        format!("{}{}", self.question_prefix, question_number)
    }
}

/// Endpoint of the hosted mark detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl DetectorConfig {
    /// MARK_DETECTOR_ENDPOINT (required), MARK_DETECTOR_KEY, MARK_DETECTOR_TIMEOUT_SECS.
    pub fn from_env() -> Option<Self> {
        load_env();
        let endpoint = non_empty_var("MARK_DETECTOR_ENDPOINT")?;
        let api_key = non_empty_var("MARK_DETECTOR_KEY");
        let timeout_secs = non_empty_var("MARK_DETECTOR_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);
        Some(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_grade_unknown_as_incorrect() {
        let labels = ReportLabels::default();
        assert_eq!(labels.status_label(MarkClass::Correct), "Correct");
        assert_eq!(labels.status_label(MarkClass::Partial), "Partial credit");
        assert_eq!(labels.status_label(MarkClass::Incorrect), "Incorrect");
        assert_eq!(labels.status_label(MarkClass::Unknown), "Incorrect");
    }

    #[test]
    fn question_label_uses_prefix() {
        assert_eq!(ReportLabels::default().question_label(3), "Q3");
        assert_eq!(ReportLabels::japanese().question_label(12), "問12");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"file_prefix":"exam","checkmark_policy":"partial"}"#).unwrap();
        assert_eq!(config.file_prefix, "exam");
        assert_eq!(config.checkmark_policy, MarkClass::Partial);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.labels, ReportLabels::default());
        assert_eq!(config.student_name_cell, CellPosition::new(1, 2));
    }

    #[test]
    fn zero_student_name_cell_is_rejected() {
        let err = serde_json::from_str::<ReportConfig>(r#"{"student_name_cell":{"row":0,"col":2}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("1-based"), "{}", err);
    }
}
