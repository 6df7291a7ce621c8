use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle status of an engagement, as recorded by the source system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Completed,
    InProgress,
    AtRisk,
    Planned,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Completed => "completed",
            Status::InProgress => "in-progress",
            Status::AtRisk => "at-risk",
            Status::Planned => "planned",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Status::Completed),
            "in-progress" => Ok(Status::InProgress),
            "at-risk" => Ok(Status::AtRisk),
            "planned" => Ok(Status::Planned),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// One customer-engagement record as read from the source, before enrichment.
/// Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEngagement {
    pub id: String,
    pub customer: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub status: Status,
    /// `None` when the source date is missing or unparsable. Such records
    /// are still enriched but excluded from date-bucketed aggregates.
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
}

/// Parses an ISO `YYYY-MM-DD` date; anything else becomes `None` rather
/// than rejecting the whole record.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentType {
    Negative,
    Neutral,
    Positive,
}

/// Polarity of engagement text: a label plus a continuous score in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment_type: SentimentType,
    pub sentiment_score: f64,
}

impl SentimentResult {
    /// Derives the label from the score under the fixed thresholds:
    /// score > 0.1 is positive, score < -0.1 is negative, else neutral.
    pub fn from_score(score: f64) -> Self {
        let sentiment_type = if score > 0.1 {
            SentimentType::Positive
        } else if score < -0.1 {
            SentimentType::Negative
        } else {
            SentimentType::Neutral
        };
        SentimentResult {
            sentiment_type,
            sentiment_score: score,
        }
    }

    pub fn neutral() -> Self {
        SentimentResult {
            sentiment_type: SentimentType::Neutral,
            sentiment_score: 0.0,
        }
    }
}

/// Coarse technical category assigned to an engagement's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic: String,
    pub confidence: f64,
}

/// A raw engagement plus its derived sentiment and topic. Recomputed on
/// every pipeline run, never authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedEngagement {
    #[serde(flatten)]
    pub record: RawEngagement,
    pub sentiment: SentimentResult,
    pub topic: TopicResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: u64,
}

/// Mean sentiment over all engagements dated on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub mean_score: f64,
    pub count: u64,
}

/// One point of the 7-point trailing rolling mean over the per-record
/// chronological sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// An engagement surfaced in the needs-attention ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub id: String,
    pub customer: String,
    pub status: Status,
    pub date: Option<NaiveDate>,
    pub sentiment_score: f64,
    pub days_stale: i64,
    pub priority_score: f64,
}

/// Summary statistics over one enriched engagement set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_count: usize,
    /// Arithmetic mean of sentiment scores; `None` (serialized as null)
    /// for the empty set.
    pub avg_sentiment: Option<f64>,
    pub sentiment_distribution: BTreeMap<SentimentType, u64>,
    /// Top-N topics by count, ties broken by first appearance in input order.
    pub topic_distribution: Vec<TopicCount>,
    /// Per-date mean sentiment, ascending by date.
    pub sentiment_timeline: Vec<TimelinePoint>,
    pub rolling_sentiment: Vec<RollingPoint>,
    /// Needs-attention subset, priority descending, capped at ten.
    pub priority_ranking: Vec<PriorityEntry>,
    /// Records left out of the timeline and staleness terms because their
    /// date was missing or unparsable.
    pub excluded_dateless: usize,
}

impl AggregateReport {
    pub fn empty() -> Self {
        AggregateReport {
            total_count: 0,
            avg_sentiment: None,
            sentiment_distribution: BTreeMap::new(),
            topic_distribution: Vec::new(),
            sentiment_timeline: Vec::new(),
            rolling_sentiment: Vec::new(),
            priority_ranking: Vec::new(),
            excluded_dateless: 0,
        }
    }
}

/// Demand versus team proficiency for one technology, both on a 0-100
/// scale. Positive gap means a training need, negative means surplus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsGapEntry {
    pub technology: String,
    pub engagement_count: u64,
    pub demand_score: f64,
    pub proficiency_score: f64,
    pub gap: f64,
}

/// The serialized output contract consumed by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub engagements: Vec<EnrichedEngagement>,
    pub weekly_summary: String,
    pub report: AggregateReport,
    pub skills_gap: Vec<SkillsGapEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_type_follows_thresholds() {
        assert_eq!(
            SentimentResult::from_score(0.5).sentiment_type,
            SentimentType::Positive
        );
        assert_eq!(
            SentimentResult::from_score(-0.5).sentiment_type,
            SentimentType::Negative
        );
        assert_eq!(
            SentimentResult::from_score(0.1).sentiment_type,
            SentimentType::Neutral
        );
        assert_eq!(
            SentimentResult::from_score(-0.1).sentiment_type,
            SentimentType::Neutral
        );
        assert_eq!(
            SentimentResult::from_score(0.0).sentiment_type,
            SentimentType::Neutral
        );
    }

    #[test]
    fn raw_engagement_tolerates_missing_and_bad_dates() {
        let json = r#"{
            "id": "ENG-001",
            "customer": "FinTech Corp",
            "notes": "Initial setup",
            "status": "in-progress",
            "date": "not-a-date"
        }"#;
        let record: RawEngagement = serde_json::from_str(json).unwrap();
        assert_eq!(record.date, None);
        assert_eq!(record.feedback, "");
        assert!(record.technologies.is_empty());

        let json = r#"{
            "id": "ENG-002",
            "customer": "HealthPlus",
            "status": "completed",
            "date": "2023-04-09"
        }"#;
        let record: RawEngagement = serde_json::from_str(json).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 4, 9));
    }

    #[test]
    fn enriched_engagement_serializes_flat() {
        let record = RawEngagement {
            id: "ENG-001".to_string(),
            customer: "FinTech Corp".to_string(),
            notes: "ok".to_string(),
            feedback: String::new(),
            technologies: vec!["Delta Lake".to_string()],
            status: Status::Completed,
            date: NaiveDate::from_ymd_opt(2023, 1, 1),
        };
        let enriched = EnrichedEngagement {
            record,
            sentiment: SentimentResult::neutral(),
            topic: TopicResult {
                topic: "general".to_string(),
                confidence: 0.5,
            },
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["id"], "ENG-001");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["sentiment"]["sentiment_type"], "neutral");
        assert_eq!(value["topic"]["topic"], "general");
    }
}
