use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::warn;

use crate::models::{SentimentResult, TopicResult};

/// Character cap applied by backends with bounded input windows. Inputs
/// below the cap pass through untouched.
pub const MAX_SCORING_CHARS: usize = 2000;

/// Which scoring backend the pipeline should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorerBackend {
    /// Lexical bag-of-words polarity plus keyword topics. Zero external
    /// dependencies; the contract's floor.
    #[default]
    Fallback,
    /// Weighted lexicon with negation and intensifier handling, optionally
    /// loaded from a user-supplied lexicon file.
    Rich,
}

impl std::str::FromStr for ScorerBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fallback" => Ok(ScorerBackend::Fallback),
            "rich" => Ok(ScorerBackend::Rich),
            other => Err(format!("unknown scorer backend '{other}'")),
        }
    }
}

/// Topic keyword table, iterated in declaration order; the first topic with
/// any matching keyword wins, so order is part of the contract.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("streaming", &["streaming", "auto loader", "kafka", "real-time"]),
    (
        "governance",
        &["governance", "unity catalog", "permissions", "access control"],
    ),
    (
        "performance",
        &["performance", "slow", "optimize", "latency", "tuning"],
    ),
    ("migration", &["migration", "legacy", "convert", "move"]),
    (
        "infrastructure",
        &["terraform", "deployment", "setup", "configuration", "network"],
    ),
];

const DEFAULT_TOPIC: &str = "general";
const MATCH_CONFIDENCE: f64 = 0.85;
const DEFAULT_CONFIDENCE: f64 = 0.5;

const POSITIVE_WORDS: &[&str] = &[
    "great",
    "good",
    "excellent",
    "impressed",
    "impressive",
    "success",
    "successful",
    "successfully",
    "improved",
    "smooth",
    "helpful",
    "recommend",
    "resolved",
    "love",
    "happy",
    "easy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "issue",
    "issues",
    "problem",
    "problems",
    "error",
    "errors",
    "bug",
    "bugs",
    "struggling",
    "slow",
    "challenging",
    "difficult",
    "confusing",
    "failed",
    "failure",
    "frustrating",
];

/// Built-in weighted lexicon for the rich backend. Values are polarity
/// weights in [-1, 1]; stronger words carry larger magnitude than the
/// flat fallback lists can express.
const WEIGHTED_LEXICON: &[(&str, f64)] = &[
    ("excellent", 1.0),
    ("love", 0.9),
    ("great", 0.8),
    ("impressed", 0.8),
    ("impressive", 0.8),
    ("success", 0.7),
    ("successful", 0.7),
    ("successfully", 0.7),
    ("smooth", 0.6),
    ("improved", 0.6),
    ("helpful", 0.6),
    ("recommend", 0.6),
    ("happy", 0.6),
    ("good", 0.5),
    ("resolved", 0.5),
    ("easy", 0.4),
    ("challenging", -0.4),
    ("slow", -0.5),
    ("confusing", -0.5),
    ("difficult", -0.5),
    ("issue", -0.6),
    ("issues", -0.6),
    ("problem", -0.6),
    ("problems", -0.6),
    ("bug", -0.6),
    ("bugs", -0.6),
    ("struggling", -0.7),
    ("error", -0.7),
    ("errors", -0.7),
    ("frustrating", -0.8),
    ("failed", -0.9),
    ("failure", -0.9),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "cannot", "without"];
const INTENSIFIERS: &[&str] = &["very", "extremely", "really", "highly"];

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn classify_keywords(text: &str) -> TopicResult {
    let lower = text.to_lowercase();
    for (topic, keywords) in TOPIC_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return TopicResult {
                topic: (*topic).to_string(),
                confidence: MATCH_CONFIDENCE,
            };
        }
    }
    TopicResult {
        topic: DEFAULT_TOPIC.to_string(),
        confidence: DEFAULT_CONFIDENCE,
    }
}

/// Bag-of-sentiment-words polarity: (positive hits - negative hits) over
/// total sentiment hits, 0.0 when the text carries no sentiment words.
#[derive(Debug, Default)]
pub struct FallbackScorer;

impl FallbackScorer {
    pub fn score(&self, text: &str) -> SentimentResult {
        let tokens = tokenize(text);
        let positive = tokens
            .iter()
            .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
            .count() as f64;
        let negative = tokens
            .iter()
            .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
            .count() as f64;
        let hits = positive + negative;
        if hits == 0.0 {
            return SentimentResult::neutral();
        }
        SentimentResult::from_score((positive - negative) / hits)
    }

    pub fn classify(&self, text: &str) -> TopicResult {
        classify_keywords(text)
    }
}

/// Weighted-lexicon scorer. The lexicon is built exactly once on first use;
/// if a configured lexicon file cannot be loaded, every call falls back to
/// the baseline scorer instead of failing the pipeline.
#[derive(Debug)]
pub struct RichScorer {
    lexicon_path: Option<PathBuf>,
    lexicon: OnceCell<Option<HashMap<String, f64>>>,
    baseline: FallbackScorer,
}

impl RichScorer {
    pub fn new(lexicon_path: Option<&Path>) -> Self {
        RichScorer {
            lexicon_path: lexicon_path.map(Path::to_path_buf),
            lexicon: OnceCell::new(),
            baseline: FallbackScorer,
        }
    }

    /// First caller builds the lexicon; concurrent callers block until it
    /// is ready or known to have failed. A failed load is cached as `None`
    /// so the file is not retried per record.
    fn lexicon(&self) -> Option<&HashMap<String, f64>> {
        self.lexicon
            .get_or_init(|| match &self.lexicon_path {
                Some(path) => match Self::load_lexicon(path) {
                    Ok(lexicon) => Some(lexicon),
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "failed to load sentiment lexicon, using baseline scorer"
                        );
                        None
                    }
                },
                None => Some(Self::builtin_lexicon()),
            })
            .as_ref()
    }

    fn builtin_lexicon() -> HashMap<String, f64> {
        WEIGHTED_LEXICON
            .iter()
            .map(|(word, weight)| ((*word).to_string(), *weight))
            .collect()
    }

    fn load_lexicon(path: &Path) -> crate::error::Result<HashMap<String, f64>> {
        let data = std::fs::read_to_string(path)?;
        let lexicon: HashMap<String, f64> = serde_json::from_str(&data)?;
        Ok(lexicon)
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        let lexicon = match self.lexicon() {
            Some(lexicon) => lexicon,
            None => return self.baseline.score(text),
        };

        let tokens = tokenize(truncate_chars(text, MAX_SCORING_CHARS));
        let mut sum = 0.0;
        let mut hits = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(weight) = lexicon.get(token.as_str()) else {
                continue;
            };
            let mut weight = *weight;
            if let Some(prev) = i.checked_sub(1).map(|p| tokens[p].as_str()) {
                if NEGATIONS.contains(&prev) {
                    weight = -weight;
                } else if INTENSIFIERS.contains(&prev) {
                    weight *= 1.5;
                }
            }
            sum += weight;
            hits += 1;
        }

        if hits == 0 {
            return SentimentResult::neutral();
        }
        SentimentResult::from_score((sum / hits as f64).clamp(-1.0, 1.0))
    }

    pub fn classify(&self, text: &str) -> TopicResult {
        classify_keywords(truncate_chars(text, MAX_SCORING_CHARS))
    }
}

/// The two scorer capabilities the pipeline can be constructed with. Both
/// are safe for concurrent read-only use once built.
#[derive(Debug)]
pub enum TextScorer {
    Fallback(FallbackScorer),
    Rich(RichScorer),
}

impl TextScorer {
    pub fn new(backend: ScorerBackend, lexicon_path: Option<&Path>) -> Self {
        match backend {
            ScorerBackend::Fallback => TextScorer::Fallback(FallbackScorer),
            ScorerBackend::Rich => TextScorer::Rich(RichScorer::new(lexicon_path)),
        }
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() {
            return SentimentResult::neutral();
        }
        match self {
            TextScorer::Fallback(scorer) => scorer.score(text),
            TextScorer::Rich(scorer) => scorer.score(text),
        }
    }

    pub fn classify(&self, text: &str) -> TopicResult {
        if text.trim().is_empty() {
            return TopicResult {
                topic: DEFAULT_TOPIC.to_string(),
                confidence: DEFAULT_CONFIDENCE,
            };
        }
        match self {
            TextScorer::Fallback(scorer) => scorer.classify(text),
            TextScorer::Rich(scorer) => scorer.classify(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentType;

    #[test]
    fn empty_text_is_neutral_and_general() {
        let scorer = TextScorer::new(ScorerBackend::Fallback, None);
        let sentiment = scorer.score("");
        assert_eq!(sentiment.sentiment_type, SentimentType::Neutral);
        assert_eq!(sentiment.sentiment_score, 0.0);

        let topic = scorer.classify("   ");
        assert_eq!(topic.topic, "general");
        assert!(topic.confidence <= 0.6);
    }

    #[test]
    fn fallback_polarity_matches_thresholds() {
        let scorer = TextScorer::new(ScorerBackend::Fallback, None);

        let positive = scorer.score("Great experience, the team was very helpful.");
        assert_eq!(positive.sentiment_type, SentimentType::Positive);
        assert!(positive.sentiment_score > 0.1);

        let negative = scorer.score("Debugging errors took significant time, very frustrating.");
        assert_eq!(negative.sentiment_type, SentimentType::Negative);
        assert!(negative.sentiment_score < -0.1);

        let neutral = scorer.score("Customer requested a review of the architecture.");
        assert_eq!(neutral.sentiment_type, SentimentType::Neutral);
        assert_eq!(neutral.sentiment_score, 0.0);
    }

    #[test]
    fn mixed_polarity_stays_in_range() {
        let scorer = TextScorer::new(ScorerBackend::Fallback, None);
        let result = scorer.score("Great success but the errors were frustrating.");
        assert!(result.sentiment_score >= -1.0 && result.sentiment_score <= 1.0);
    }

    #[test]
    fn topics_match_first_table_entry() {
        let scorer = TextScorer::new(ScorerBackend::Fallback, None);
        assert_eq!(scorer.classify("Kafka ingest is lagging").topic, "streaming");
        assert_eq!(
            scorer.classify("Unity Catalog permissions are confusing").topic,
            "governance"
        );
        assert_eq!(scorer.classify("Queries are slow").topic, "performance");
        assert_eq!(scorer.classify("Legacy migration plan").topic, "migration");
        assert_eq!(
            scorer.classify("Terraform deployment pipeline").topic,
            "infrastructure"
        );
        assert_eq!(scorer.classify("Quarterly business review").topic, "general");
    }

    #[test]
    fn streaming_wins_over_performance_in_table_order() {
        // "slow" and "streaming" both match; streaming comes first.
        let scorer = TextScorer::new(ScorerBackend::Fallback, None);
        let topic = scorer.classify("The streaming job is slow");
        assert_eq!(topic.topic, "streaming");
    }

    #[test]
    fn rich_scorer_handles_negation_and_intensifiers() {
        let scorer = RichScorer::new(None);
        let negated = scorer.score("not happy with the rollout");
        assert_eq!(negated.sentiment_type, SentimentType::Negative);

        let plain = scorer.score("good result").sentiment_score;
        let boosted = scorer.score("very good result").sentiment_score;
        assert!(boosted > plain);
    }

    #[test]
    fn rich_scorer_falls_back_on_unreadable_lexicon() {
        let scorer = RichScorer::new(Some(Path::new("/nonexistent/lexicon.json")));
        let baseline = FallbackScorer;
        let text = "Great experience, would recommend.";
        let result = scorer.score(text);
        let expected = baseline.score(text);
        assert_eq!(result.sentiment_type, expected.sentiment_type);
        assert_eq!(result.sentiment_score, expected.sentiment_score);
    }

    #[test]
    fn truncation_is_a_noop_below_the_limit() {
        let short = "short input";
        assert_eq!(truncate_chars(short, MAX_SCORING_CHARS), short);

        let long = "x".repeat(MAX_SCORING_CHARS + 50);
        assert_eq!(truncate_chars(&long, MAX_SCORING_CHARS).chars().count(), MAX_SCORING_CHARS);
    }

    #[test]
    fn rich_scorer_is_deterministic() {
        let scorer = RichScorer::new(None);
        let text = "Successfully migrated, performance improved.";
        let first = scorer.score(text);
        let second = scorer.score(text);
        assert_eq!(first.sentiment_score, second.sentiment_score);
        assert_eq!(first.sentiment_type, second.sentiment_type);
    }
}
