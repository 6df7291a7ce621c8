use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::aggregate::{self, AggregateOptions, StalenessReference};
use crate::enrich;
use crate::models::{PipelineOutput, RawEngagement};
use crate::scorer::{ScorerBackend, TextScorer};
use crate::skills::{self, GapOrder};
use crate::summary;

/// Everything the caller can tune about a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub scorer_backend: ScorerBackend,
    /// Optional `{word: weight}` JSON lexicon for the rich backend.
    pub lexicon_path: Option<PathBuf>,
    pub proficiency_table: HashMap<String, f64>,
    pub top_n_topics: usize,
    pub top_n_technologies: usize,
    pub staleness_reference: StalenessReference,
    pub gap_order: GapOrder,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            scorer_backend: ScorerBackend::Fallback,
            lexicon_path: None,
            proficiency_table: skills::default_proficiency(),
            top_n_topics: 10,
            top_n_technologies: skills::DEFAULT_TOP_N,
            staleness_reference: StalenessReference::MaxDateInSet,
            gap_order: GapOrder::Ascending,
        }
    }
}

/// Stages a run moves through, in order. `Failed` is reserved for the one
/// fatal condition (unreadable input), which the loaders surface before a
/// run begins; every in-run stage degrades to its fallback instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Enriching,
    Aggregating,
    Summarizing,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Enriching => "enriching",
            PipelineStage::Aggregating => "aggregating",
            PipelineStage::Summarizing => "summarizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs enrichment, aggregation, skills-gap analysis, and summary
/// generation over an in-memory record set.
///
/// Never fails: scorer-backend trouble is absorbed inside the scorer, the
/// empty set aggregates to the documented empty report, and the summary is
/// template-generated. Independent runs share no mutable state.
pub fn run(records: &[RawEngagement], config: &PipelineConfig) -> PipelineOutput {
    let mut stage = PipelineStage::Idle;
    debug!(stage = %stage, records = records.len(), "pipeline start");

    stage = PipelineStage::Enriching;
    debug!(stage = %stage, backend = ?config.scorer_backend, "scoring records");
    let scorer = TextScorer::new(config.scorer_backend, config.lexicon_path.as_deref());
    let engagements = enrich::enrich(&scorer, records);

    stage = PipelineStage::Aggregating;
    debug!(stage = %stage, "reducing enriched set");
    let options = AggregateOptions {
        top_n_topics: config.top_n_topics,
        staleness_reference: config.staleness_reference,
    };
    let report = aggregate::aggregate(&engagements, &options);
    let skills_gap = skills::analyze(
        &engagements,
        &config.proficiency_table,
        config.top_n_technologies,
        config.gap_order,
    );

    stage = PipelineStage::Summarizing;
    debug!(stage = %stage, "generating weekly brief");
    let weekly_summary = summary::generate(&report);

    stage = PipelineStage::Done;
    info!(
        stage = %stage,
        total = report.total_count,
        dateless = report.excluded_dateless,
        ranked = report.priority_ranking.len(),
        "pipeline complete"
    );

    PipelineOutput {
        engagements,
        weekly_summary,
        report,
        skills_gap,
    }
}
