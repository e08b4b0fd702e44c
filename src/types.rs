use serde::{Deserialize, Serialize};

/// One detection as delivered by the mark-detection collaborator.
/// Unknown JSON keys are ignored; `class` is kept verbatim until normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class: String,
    pub y: f64,
    pub x: f64,
    #[serde(default)]
    pub confidence: f64,
}

impl RawDetection {
    pub fn new(class: impl Into<String>, y: f64, x: f64, confidence: f64) -> Self {
        Self {
            class: class.into(),
            y,
            x,
            confidence,
        }
    }
}

/// Source-side label of a detected grading symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorLabel {
    Circle,
    Cross,
    Triangle,
    Checkmark,
    Unrecognized,
}

impl DetectorLabel {
    /// Accepts English names (any case) and the glyphs graders and detectors emit.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        match s {
            "◯" | "○" | "〇" | "⭕" => return DetectorLabel::Circle,
            "❌" | "×" | "✗" | "✕" | "x" | "X" => return DetectorLabel::Cross,
            "△" | "▲" => return DetectorLabel::Triangle,
            "✓" | "✔" | "☑" => return DetectorLabel::Checkmark,
            _ => {}
        }
        match s.to_lowercase().as_str() {
            "circle" | "maru" | "hanamaru" | "correct" => DetectorLabel::Circle,
            "cross" | "batsu" | "incorrect" | "wrong" => DetectorLabel::Cross,
            "triangle" | "sankaku" | "partial" => DetectorLabel::Triangle,
            "checkmark" | "check" | "tick" => DetectorLabel::Checkmark,
            _ => DetectorLabel::Unrecognized,
        }
    }
}

/// Grading class of a mark, and the outcome of the question it grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkClass {
    Correct,
    Incorrect,
    Partial,
    Unknown,
}

impl MarkClass {
    /// Contribution to a topic's score sum.
    pub fn score(self) -> f64 {
        match self {
            MarkClass::Correct => 1.0,
            MarkClass::Partial => 0.5,
            MarkClass::Incorrect | MarkClass::Unknown => 0.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "correct" => Some(MarkClass::Correct),
            "incorrect" => Some(MarkClass::Incorrect),
            "partial" => Some(MarkClass::Partial),
            "unknown" => Some(MarkClass::Unknown),
            _ => None,
        }
    }
}

/// A normalized grading mark in image pixel space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkRecord {
    pub mark_class: MarkClass,
    pub y: f64,
    pub x: f64,
    pub confidence: f64,
}

impl MarkRecord {
    pub fn new(mark_class: MarkClass, y: f64, x: f64, confidence: f64) -> Self {
        Self {
            mark_class,
            y,
            x,
            confidence,
        }
    }
}

/// One question's graded record, in question order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingEntry {
    pub question_number: u32,
    pub topic: String,
    pub outcome: MarkClass,
    pub status_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAggregate {
    pub topic: String,
    pub score_sum: f64,
    pub question_count: u32,
}

impl TopicAggregate {
    /// Percentage in 0..=100; an empty topic reports 0.
    pub fn accuracy(&self) -> f64 {
        if self.question_count == 0 {
            return 0.0;
        }
        self.score_sum / f64::from(self.question_count) * 100.0
    }
}

/// Per-topic aggregates in first-seen topic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicAggregates {
    topics: Vec<TopicAggregate>,
}

impl TopicAggregates {
    pub(crate) fn from_vec(topics: Vec<TopicAggregate>) -> Self {
        Self { topics }
    }

    pub fn get(&self, topic: &str) -> Option<&TopicAggregate> {
        self.topics.iter().find(|t| t.topic == topic)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TopicAggregate> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl<'a> IntoIterator for &'a TopicAggregates {
    type Item = &'a TopicAggregate;
    type IntoIter = std::slice::Iter<'a, TopicAggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.iter()
    }
}

/// Whole-sheet correctness summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub questions: u32,
    pub correct: u32,
    pub partial: u32,
    pub incorrect: u32,
    pub unknown: u32,
    pub points: f64,
}

impl ReportSummary {
    pub fn accuracy(&self) -> f64 {
        if self.questions == 0 {
            return 0.0;
        }
        self.points / f64::from(self.questions) * 100.0
    }

    /// "2/3", "2.5/4".
    pub fn score_text(&self) -> String {
        format!("{}/{}", format_points(self.points), self.questions)
    }
}

fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{}", points as i64)
    } else {
        format!("{}", points)
    }
}
