use crate::models::{AggregateReport, SentimentType};

/// Renders the weekly brief from an aggregate report. Pure template
/// expansion; a richer generation backend is a drop-in as long as it
/// degrades to this template on failure.
pub fn generate(report: &AggregateReport) -> String {
    let top_topic = report
        .topic_distribution
        .first()
        .map(|t| t.topic.as_str())
        .unwrap_or("N/A");
    let positive = sentiment_count(report, SentimentType::Positive);
    let negative = sentiment_count(report, SentimentType::Negative);

    format!(
        "WEEKLY ENGAGEMENT SUMMARY\n\
         - {count} engagements analyzed this week\n\
         - Top topic: {top_topic}\n\
         - Sentiment: {positive} positive, {negative} negative\n\
         - Recommended focus: Address recurring issues in {top_topic} and ensure the team is upskilled.\n",
        count = report.total_count,
    )
}

fn sentiment_count(report: &AggregateReport, sentiment_type: SentimentType) -> u64 {
    report
        .sentiment_distribution
        .get(&sentiment_type)
        .copied()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TopicCount;

    #[test]
    fn summary_names_count_topic_and_sentiment_mix() {
        let mut report = AggregateReport::empty();
        report.total_count = 12;
        report.topic_distribution = vec![
            TopicCount {
                topic: "governance".to_string(),
                count: 5,
            },
            TopicCount {
                topic: "streaming".to_string(),
                count: 4,
            },
        ];
        report.sentiment_distribution.insert(SentimentType::Positive, 7);
        report.sentiment_distribution.insert(SentimentType::Negative, 2);

        let summary = generate(&report);
        assert!(summary.contains("12 engagements analyzed"));
        assert!(summary.contains("Top topic: governance"));
        assert!(summary.contains("7 positive, 2 negative"));
        assert!(summary.contains("recurring issues in governance"));
    }

    #[test]
    fn empty_report_still_yields_a_brief() {
        let summary = generate(&AggregateReport::empty());
        assert!(!summary.is_empty());
        assert!(summary.contains("0 engagements analyzed"));
        assert!(summary.contains("Top topic: N/A"));
    }

    #[test]
    fn summary_is_deterministic() {
        let report = AggregateReport::empty();
        assert_eq!(generate(&report), generate(&report));
    }
}
