use std::fmt::Write;

use crate::models::{PipelineOutput, SentimentType};

/// Dashboard health zones over the average sentiment score. Presentation
/// constants, not algorithmic ones.
const HEALTHY_THRESHOLD: f64 = 0.55;
const MONITOR_THRESHOLD: f64 = 0.35;

fn sentiment_zone(avg: f64) -> &'static str {
    if avg >= HEALTHY_THRESHOLD {
        "healthy"
    } else if avg >= MONITOR_THRESHOLD {
        "monitor"
    } else {
        "needs attention"
    }
}

/// Renders the markdown report for one pipeline run.
pub fn build_report(scope: Option<&str>, output: &PipelineOutput) -> String {
    let report = &output.report;
    let mut out = String::new();
    let scope_label = scope.unwrap_or("all engagements");

    let _ = writeln!(out, "# Engagement Insights Report");
    let _ = writeln!(out, "Generated for {scope_label}");
    let _ = writeln!(out);

    let _ = writeln!(out, "## Headline");
    let _ = writeln!(out, "- Engagements analyzed: {}", report.total_count);
    match report.avg_sentiment {
        Some(avg) => {
            let _ = writeln!(
                out,
                "- Average sentiment: {:.2} ({})",
                avg,
                sentiment_zone(avg)
            );
        }
        None => {
            let _ = writeln!(out, "- Average sentiment: n/a (no engagements)");
        }
    }
    if report.excluded_dateless > 0 {
        let _ = writeln!(
            out,
            "- {} record(s) without a usable date were excluded from the timeline",
            report.excluded_dateless
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Sentiment Mix");
    if report.sentiment_distribution.is_empty() {
        let _ = writeln!(out, "No engagements in this selection.");
    } else {
        for sentiment_type in [
            SentimentType::Positive,
            SentimentType::Neutral,
            SentimentType::Negative,
        ] {
            let count = report
                .sentiment_distribution
                .get(&sentiment_type)
                .copied()
                .unwrap_or(0);
            let label = match sentiment_type {
                SentimentType::Positive => "positive",
                SentimentType::Neutral => "neutral",
                SentimentType::Negative => "negative",
            };
            let _ = writeln!(out, "- {label}: {count}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Top Topics");
    if report.topic_distribution.is_empty() {
        let _ = writeln!(out, "No topics extracted for this selection.");
    } else {
        for topic in &report.topic_distribution {
            let _ = writeln!(out, "- {}: {} engagements", topic.topic, topic.count);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Needs Attention");
    if report.priority_ranking.is_empty() {
        let _ = writeln!(out, "No engagements need attention in this selection.");
    } else {
        for entry in &report.priority_ranking {
            let date = entry
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "undated".to_string());
            let _ = writeln!(
                out,
                "- {} ({}, {}, {}) priority {:.1}, sentiment {:.2}, {} day(s) stale",
                entry.id,
                entry.customer,
                entry.status,
                date,
                entry.priority_score,
                entry.sentiment_score,
                entry.days_stale
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Skills Gap");
    if output.skills_gap.is_empty() {
        let _ = writeln!(out, "No technology tags in this selection.");
    } else {
        for entry in &output.skills_gap {
            let direction = if entry.gap > 0.0 {
                "training need"
            } else {
                "surplus"
            };
            let _ = writeln!(
                out,
                "- {}: demand {:.0}, proficiency {:.0}, gap {:+.0} ({})",
                entry.technology,
                entry.demand_score,
                entry.proficiency_score,
                entry.gap,
                direction
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Weekly Brief");
    let _ = writeln!(out, "```");
    let _ = write!(out, "{}", output.weekly_summary);
    let _ = writeln!(out, "```");

    let mut recent: Vec<_> = output
        .engagements
        .iter()
        .filter(|e| e.record.date.is_some())
        .collect();
    recent.sort_by(|a, b| b.record.date.cmp(&a.record.date));

    let _ = writeln!(out);
    let _ = writeln!(out, "## Recent Notes");
    if recent.is_empty() {
        let _ = writeln!(out, "No dated engagements in this selection.");
    } else {
        for engagement in recent.iter().take(5) {
            let _ = writeln!(
                out,
                "- {} ({}) on {}: {}",
                engagement.record.customer,
                engagement.topic.topic,
                engagement.record.date.unwrap(),
                engagement.record.notes
            );
        }
    }

    out
}
