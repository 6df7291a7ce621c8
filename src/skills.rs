use std::collections::HashMap;

use crate::models::{EnrichedEngagement, SkillsGapEntry};

/// Default cap on how many technologies the analysis keeps.
pub const DEFAULT_TOP_N: usize = 10;

const DEFAULT_PROFICIENCY: f64 = 50.0;

/// Sort direction for the gap ranking. Ascending puts surplus capacity
/// first; descending puts the largest training needs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapOrder {
    #[default]
    Ascending,
    Descending,
}

/// The team's reference proficiency table (0-100 per technology).
/// Technologies absent from the table score the neutral default of 50.
pub fn default_proficiency() -> HashMap<String, f64> {
    [
        ("Delta Lake", 85.0),
        ("Auto Loader", 40.0),
        ("PySpark", 90.0),
        ("Unity Catalog", 30.0),
        ("Databricks SQL", 70.0),
        ("MLflow", 60.0),
        ("Structured Streaming", 50.0),
        ("Photon", 45.0),
        ("Serverless", 35.0),
        ("Terraform", 25.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Compares technology demand (tag frequency across engagements,
/// normalized to 0-100 against the most-tagged technology) with team
/// proficiency. Positive gap = training need, negative = surplus.
///
/// The set is capped to the top `top_n` technologies by demand before gaps
/// are computed. Returns an empty vec for an empty input set.
pub fn analyze(
    records: &[EnrichedEngagement],
    proficiency: &HashMap<String, f64>,
    top_n: usize,
    order: GapOrder,
) -> Vec<SkillsGapEntry> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for record in records {
        for tech in &record.record.technologies {
            *counts.entry(tech.as_str()).or_insert(0) += 1;
        }
    }
    if counts.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(top_n);

    // The most-tagged technology survives the cap, so the max is unchanged.
    let max_count = ranked[0].1 as f64;

    let mut entries: Vec<SkillsGapEntry> = ranked
        .into_iter()
        .map(|(technology, count)| {
            let demand_score = count as f64 / max_count * 100.0;
            let proficiency_score = proficiency
                .get(technology)
                .copied()
                .unwrap_or(DEFAULT_PROFICIENCY);
            SkillsGapEntry {
                technology: technology.to_string(),
                engagement_count: count,
                demand_score,
                proficiency_score,
                gap: demand_score - proficiency_score,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        let by_gap = match order {
            GapOrder::Ascending => a.gap.partial_cmp(&b.gap),
            GapOrder::Descending => b.gap.partial_cmp(&a.gap),
        };
        by_gap
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.technology.cmp(&b.technology))
    });
    entries
}
