use crate::models::{EnrichedEngagement, RawEngagement};
use crate::scorer::TextScorer;

/// Scores every raw record with the given scorer. Order-preserving and
/// total: one output per input, never drops a record.
pub fn enrich(scorer: &TextScorer, records: &[RawEngagement]) -> Vec<EnrichedEngagement> {
    records
        .iter()
        .map(|record| {
            let text = scoring_text(record);
            EnrichedEngagement {
                sentiment: scorer.score(&text),
                topic: scorer.classify(&text),
                record: record.clone(),
            }
        })
        .collect()
}

/// Notes and feedback joined with a single space; a missing side
/// contributes nothing.
fn scoring_text(record: &RawEngagement) -> String {
    format!("{} {}", record.notes, record.feedback)
        .trim()
        .to_string()
}
