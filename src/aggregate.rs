use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};

use crate::models::{
    AggregateReport, EnrichedEngagement, PriorityEntry, RollingPoint, Status, TimelinePoint,
    TopicCount,
};

/// Window of the trailing rolling mean over the per-record chronological
/// sequence. The first points use however many records exist (minimum
/// periods of one) rather than being dropped.
const ROLLING_WINDOW: usize = 7;

/// Engagements below this sentiment score qualify for the needs-attention
/// ranking. Product constant, shared with the dashboard's zone colors.
const SENTIMENT_ATTENTION_THRESHOLD: f64 = 0.55;

/// Engagements untouched for more than this many days qualify for the
/// needs-attention ranking.
const STALE_DAYS_THRESHOLD: i64 = 7;

/// The needs-attention ranking is capped to this many entries.
const PRIORITY_CAP: usize = 10;

/// What staleness is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessReference {
    /// The most recent date present in the filtered set. Keeps reports
    /// reproducible for historical data.
    #[default]
    MaxDateInSet,
    /// Today's calendar date.
    WallClock,
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub top_n_topics: usize,
    pub staleness_reference: StalenessReference,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            top_n_topics: 10,
            staleness_reference: StalenessReference::MaxDateInSet,
        }
    }
}

/// Reduces an enriched engagement set to its summary report. The empty set
/// produces a zeroed report, never a fault.
pub fn aggregate(records: &[EnrichedEngagement], options: &AggregateOptions) -> AggregateReport {
    if records.is_empty() {
        return AggregateReport::empty();
    }

    let total_count = records.len();
    let score_sum: f64 = records.iter().map(|r| r.sentiment.sentiment_score).sum();
    let avg_sentiment = Some(score_sum / total_count as f64);

    let mut sentiment_distribution = BTreeMap::new();
    for record in records {
        *sentiment_distribution
            .entry(record.sentiment.sentiment_type)
            .or_insert(0u64) += 1;
    }

    let topic_distribution = topic_counts(records, options.top_n_topics);

    // Records without a usable date are enriched and counted, but excluded
    // from the timeline and the staleness term.
    let dated: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.record.date.map(|d| (d, r.sentiment.sentiment_score)))
        .collect();
    let excluded_dateless = total_count - dated.len();

    let sentiment_timeline = timeline(&dated);
    let rolling_sentiment = rolling_mean(&dated);
    let priority_ranking = priority_ranking(records, options.staleness_reference);

    AggregateReport {
        total_count,
        avg_sentiment,
        sentiment_distribution,
        topic_distribution,
        sentiment_timeline,
        rolling_sentiment,
        priority_ranking,
        excluded_dateless,
    }
}

/// Frequency counts in first-seen order, then a stable sort by count so
/// ties keep their first appearance, truncated to the top N.
fn topic_counts(records: &[EnrichedEngagement], top_n: usize) -> Vec<TopicCount> {
    let mut counts: Vec<TopicCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        match index.get(&record.topic.topic) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(record.topic.topic.clone(), counts.len());
                counts.push(TopicCount {
                    topic: record.topic.topic.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);
    counts
}

/// Mean sentiment per calendar day, ascending. Day granularity only; no
/// timezone conversion happens anywhere in the pipeline.
fn timeline(dated: &[(NaiveDate, f64)]) -> Vec<TimelinePoint> {
    let mut buckets: BTreeMap<NaiveDate, (f64, u64)> = BTreeMap::new();
    for (date, score) in dated {
        let bucket = buckets.entry(*date).or_insert((0.0, 0));
        bucket.0 += score;
        bucket.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(date, (sum, count))| TimelinePoint {
            date,
            mean_score: sum / count as f64,
            count,
        })
        .collect()
}

/// Trailing rolling mean over the chronologically sorted per-record
/// scores, not the per-date means.
fn rolling_mean(dated: &[(NaiveDate, f64)]) -> Vec<RollingPoint> {
    let mut chronological = dated.to_vec();
    chronological.sort_by_key(|(date, _)| *date);

    chronological
        .iter()
        .enumerate()
        .map(|(i, (date, _))| {
            let start = i.saturating_sub(ROLLING_WINDOW - 1);
            let window = &chronological[start..=i];
            let mean = window.iter().map(|(_, s)| s).sum::<f64>() / window.len() as f64;
            RollingPoint {
                date: *date,
                value: mean,
            }
        })
        .collect()
}

fn priority_ranking(
    records: &[EnrichedEngagement],
    reference: StalenessReference,
) -> Vec<PriorityEntry> {
    let reference_date = match reference {
        StalenessReference::MaxDateInSet => records.iter().filter_map(|r| r.record.date).max(),
        StalenessReference::WallClock => Some(Utc::now().date_naive()),
    };

    let days_stale = |record: &EnrichedEngagement| -> i64 {
        match (record.record.date, reference_date) {
            (Some(date), Some(reference)) => (reference - date).num_days().max(0),
            _ => 0,
        }
    };

    let max_days_stale = records
        .iter()
        .filter(|r| r.record.date.is_some())
        .map(|r| days_stale(r))
        .max()
        .unwrap_or(0);

    let mut ranking: Vec<PriorityEntry> = records
        .iter()
        .filter_map(|record| {
            let stale = days_stale(record);
            let score = record.sentiment.sentiment_score;
            let needs_attention = score < SENTIMENT_ATTENTION_THRESHOLD
                || stale > STALE_DAYS_THRESHOLD
                || record.record.status == Status::AtRisk;
            if !needs_attention {
                return None;
            }

            let staleness_term = if max_days_stale > 0 && record.record.date.is_some() {
                stale as f64 / max_days_stale as f64 * 50.0
            } else {
                0.0
            };
            Some(PriorityEntry {
                id: record.record.id.clone(),
                customer: record.record.customer.clone(),
                status: record.record.status,
                date: record.record.date,
                sentiment_score: score,
                days_stale: stale,
                priority_score: (1.0 - score) * 50.0 + staleness_term,
            })
        })
        .collect();

    // Vec::sort_by is stable, so ties keep input order.
    ranking.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranking.truncate(PRIORITY_CAP);
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawEngagement, SentimentResult, TopicResult};

    fn enriched(
        id: &str,
        date: Option<NaiveDate>,
        score: f64,
        topic: &str,
        status: Status,
    ) -> EnrichedEngagement {
        EnrichedEngagement {
            record: RawEngagement {
                id: id.to_string(),
                customer: "RetailGiant".to_string(),
                notes: String::new(),
                feedback: String::new(),
                technologies: Vec::new(),
                status,
                date,
            },
            sentiment: SentimentResult::from_score(score),
            topic: TopicResult {
                topic: topic.to_string(),
                confidence: 0.85,
            },
        }
    }

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2023, 1, d)
    }

    #[test]
    fn empty_set_yields_zeroed_report() {
        let report = aggregate(&[], &AggregateOptions::default());
        assert_eq!(report.total_count, 0);
        assert_eq!(report.avg_sentiment, None);
        assert!(report.sentiment_distribution.is_empty());
        assert!(report.topic_distribution.is_empty());
        assert!(report.sentiment_timeline.is_empty());
        assert!(report.priority_ranking.is_empty());
    }

    #[test]
    fn three_record_scenario() {
        let records = vec![
            enriched("ENG-001", day(1), -0.5, "performance", Status::Completed),
            enriched("ENG-002", day(2), 0.0, "governance", Status::Completed),
            enriched("ENG-003", day(3), 0.8, "performance", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());

        assert_eq!(report.total_count, 3);
        assert!((report.avg_sentiment.unwrap() - 0.1).abs() < 1e-9);

        use crate::models::SentimentType::*;
        assert_eq!(report.sentiment_distribution[&Negative], 1);
        assert_eq!(report.sentiment_distribution[&Neutral], 1);
        assert_eq!(report.sentiment_distribution[&Positive], 1);

        assert_eq!(report.topic_distribution[0].topic, "performance");
        assert_eq!(report.topic_distribution[0].count, 2);
    }

    #[test]
    fn topic_ties_keep_first_seen_order() {
        let records = vec![
            enriched("ENG-001", day(1), 0.0, "migration", Status::Completed),
            enriched("ENG-002", day(1), 0.0, "streaming", Status::Completed),
            enriched("ENG-003", day(1), 0.0, "streaming", Status::Completed),
            enriched("ENG-004", day(1), 0.0, "migration", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        assert_eq!(report.topic_distribution[0].topic, "migration");
        assert_eq!(report.topic_distribution[1].topic, "streaming");
    }

    #[test]
    fn timeline_groups_by_day_ascending() {
        let records = vec![
            enriched("ENG-001", day(2), 0.4, "general", Status::Completed),
            enriched("ENG-002", day(1), 0.0, "general", Status::Completed),
            enriched("ENG-003", day(2), 0.8, "general", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        assert_eq!(report.sentiment_timeline.len(), 2);
        assert_eq!(report.sentiment_timeline[0].date, day(1).unwrap());
        assert_eq!(report.sentiment_timeline[1].date, day(2).unwrap());
        assert!((report.sentiment_timeline[1].mean_score - 0.6).abs() < 1e-9);
        assert_eq!(report.sentiment_timeline[1].count, 2);
    }

    #[test]
    fn rolling_mean_uses_minimum_periods_of_one() {
        let records = vec![
            enriched("ENG-001", day(1), 0.2, "general", Status::Completed),
            enriched("ENG-002", day(2), 0.4, "general", Status::Completed),
            enriched("ENG-003", day(3), 0.6, "general", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        let values: Vec<f64> = report.rolling_sentiment.iter().map(|p| p.value).collect();
        assert_eq!(values.len(), 3);
        assert!((values[0] - 0.2).abs() < 1e-9);
        assert!((values[1] - 0.3).abs() < 1e-9);
        assert!((values[2] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn rolling_window_caps_at_seven_records() {
        let records: Vec<EnrichedEngagement> = (1..=9)
            .map(|d| {
                let score = if d <= 2 { 1.0 } else { 0.0 };
                enriched(&format!("ENG-{d:03}"), day(d as u32), score, "general", Status::Completed)
            })
            .collect();
        let report = aggregate(&records, &AggregateOptions::default());
        // The ninth point covers records 3..=9, all zero.
        let last = report.rolling_sentiment.last().unwrap();
        assert!(last.value.abs() < 1e-9);
    }

    #[test]
    fn priority_formula_splits_sentiment_and_staleness() {
        let records = vec![
            enriched("ENG-001", day(1), 0.2, "general", Status::Completed),
            enriched("ENG-002", day(11), 0.2, "general", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        // Reference date is 2023-01-11; ENG-001 is 10 days stale, the max.
        let stale = report
            .priority_ranking
            .iter()
            .find(|e| e.id == "ENG-001")
            .unwrap();
        assert_eq!(stale.days_stale, 10);
        assert!((stale.priority_score - ((1.0 - 0.2) * 50.0 + 50.0)).abs() < 1e-9);

        let fresh = report
            .priority_ranking
            .iter()
            .find(|e| e.id == "ENG-002")
            .unwrap();
        assert_eq!(fresh.days_stale, 0);
        assert!((fresh.priority_score - (1.0 - 0.2) * 50.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_dates_zero_the_staleness_term() {
        let records = vec![
            enriched("ENG-001", day(5), 0.1, "general", Status::Completed),
            enriched("ENG-002", day(5), 0.3, "general", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        for entry in &report.priority_ranking {
            assert!(
                (entry.priority_score - (1.0 - entry.sentiment_score) * 50.0).abs() < 1e-9
            );
        }
    }

    #[test]
    fn healthy_recent_records_are_not_ranked() {
        let records = vec![
            enriched("ENG-001", day(10), 0.9, "general", Status::Completed),
            enriched("ENG-002", day(10), 0.2, "general", Status::Completed),
            enriched("ENG-003", day(1), 0.9, "general", Status::Completed),
            enriched("ENG-004", day(10), 0.9, "general", Status::AtRisk),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        let ids: Vec<&str> = report.priority_ranking.iter().map(|e| e.id.as_str()).collect();
        // ENG-001 is healthy and fresh; the others trip the sentiment,
        // staleness, and status arms respectively.
        assert!(!ids.contains(&"ENG-001"));
        assert!(ids.contains(&"ENG-002"));
        assert!(ids.contains(&"ENG-003"));
        assert!(ids.contains(&"ENG-004"));
    }

    #[test]
    fn ranking_caps_at_ten_with_stable_ties() {
        let records: Vec<EnrichedEngagement> = (0..15)
            .map(|i| enriched(&format!("ENG-{i:03}"), day(1), 0.0, "general", Status::Completed))
            .collect();
        let report = aggregate(&records, &AggregateOptions::default());
        assert_eq!(report.priority_ranking.len(), 10);
        // Identical priority scores keep input order.
        for (i, entry) in report.priority_ranking.iter().enumerate() {
            assert_eq!(entry.id, format!("ENG-{i:03}"));
        }
    }

    #[test]
    fn dateless_records_are_counted_and_excluded_from_date_math() {
        let records = vec![
            enriched("ENG-001", day(1), 0.8, "general", Status::Completed),
            enriched("ENG-002", None, -0.8, "general", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        assert_eq!(report.total_count, 2);
        assert_eq!(report.excluded_dateless, 1);
        assert_eq!(report.sentiment_timeline.len(), 1);
        assert_eq!(report.rolling_sentiment.len(), 1);

        // The dateless record still ranks via its sentiment, with no
        // staleness contribution.
        let entry = report
            .priority_ranking
            .iter()
            .find(|e| e.id == "ENG-002")
            .unwrap();
        assert_eq!(entry.days_stale, 0);
        assert!((entry.priority_score - (1.0 - -0.8) * 50.0).abs() < 1e-9);
    }

    #[test]
    fn avg_sentiment_stays_in_range() {
        let records = vec![
            enriched("ENG-001", day(1), 1.0, "general", Status::Completed),
            enriched("ENG-002", day(2), -1.0, "general", Status::Completed),
            enriched("ENG-003", day(3), 0.5, "general", Status::Completed),
        ];
        let report = aggregate(&records, &AggregateOptions::default());
        let avg = report.avg_sentiment.unwrap();
        assert!((-1.0..=1.0).contains(&avg));
    }
}
