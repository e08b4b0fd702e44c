//! Grading assembler: ordered marks + topic list -> graded entries and per-topic aggregates.

use std::collections::HashMap;

use crate::config::ReportLabels;
use crate::types::{GradingEntry, MarkClass, MarkRecord, ReportSummary, TopicAggregate, TopicAggregates};

/// Orders marks top to bottom (y, then x, then input order) and numbers them
/// 1..=n. The i-th topic names the i-th question; missing topics become the
/// unassigned label and surplus topics are ignored.
///
/// Assumes a single column of marks per page.
pub fn order_and_merge(marks: &[MarkRecord], topics: &[String], labels: &ReportLabels) -> Vec<GradingEntry> {
    let mut order: Vec<usize> = (0..marks.len()).collect();
    // sort_by is stable, so equal (y, x) keep their input order
    order.sort_by(|&a, &b| {
        marks[a]
            .y
            .total_cmp(&marks[b].y)
            .then(marks[a].x.total_cmp(&marks[b].x))
    });

    order
        .into_iter()
        .enumerate()
        .map(|(rank, idx)| {
            let outcome = marks[idx].mark_class;
            let topic = topics
                .get(rank)
                .cloned()
                .unwrap_or_else(|| labels.unassigned_topic.clone());
            GradingEntry {
                question_number: rank as u32 + 1,
                topic,
                outcome,
                status_label: labels.status_label(outcome).to_string(),
            }
        })
        .collect()
}

/// Single pass; topics keep first-seen order.
pub fn aggregate(entries: &[GradingEntry]) -> TopicAggregates {
    let mut topics: Vec<TopicAggregate> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        let slot = *index.entry(entry.topic.as_str()).or_insert_with(|| {
            topics.push(TopicAggregate {
                topic: entry.topic.clone(),
                score_sum: 0.0,
                question_count: 0,
            });
            topics.len() - 1
        });
        let agg = &mut topics[slot];
        agg.score_sum += entry.outcome.score();
        agg.question_count += 1;
    }
    TopicAggregates::from_vec(topics)
}

pub fn summarize(entries: &[GradingEntry]) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for entry in entries {
        summary.questions += 1;
        summary.points += entry.outcome.score();
        match entry.outcome {
            MarkClass::Correct => summary.correct += 1,
            MarkClass::Partial => summary.partial += 1,
            MarkClass::Incorrect => summary.incorrect += 1,
            MarkClass::Unknown => summary.unknown += 1,
        }
    }
    summary
}
