use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::HeatcastError;

// --- Platforms ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Weibo,
    Douyin,
    Zhihu,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Weibo => write!(f, "weibo"),
            Platform::Douyin => write!(f, "douyin"),
            Platform::Zhihu => write!(f, "zhihu"),
        }
    }
}

impl FromStr for Platform {
    type Err = HeatcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weibo" => Ok(Platform::Weibo),
            "douyin" => Ok(Platform::Douyin),
            "zhihu" => Ok(Platform::Zhihu),
            other => Err(HeatcastError::UnknownPlatform(other.to_string())),
        }
    }
}

// --- Raw Topics ---

/// One trending-list entry as harvested from a platform. Heat and discussion
/// counts are already parsed to integers by the source adapter (unit suffixes
/// like 万/亿 are an adapter concern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTopic {
    pub platform: Platform,
    pub title: String,
    pub heat_score: u64,
    pub link: String,
    pub discussion_volume: Option<u64>,
    pub category: Option<String>,
    /// Excerpt of the topic's top content, when the platform exposes one.
    pub content: Option<String>,
}

// --- Quality Judgment ---

/// Semantic assessment of one topic, produced by the LLM judge. The schema
/// (including the Chinese field descriptions) is embedded verbatim in the
/// judge prompt's format instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualityJudgment {
    #[schemars(description = "话题性质：娱乐/社会新闻/科技/虚假信息等")]
    pub nature: String,
    #[schemars(description = "社会影响力评分 1-10")]
    pub social_impact: u8,
    #[schemars(description = "讨论深度评分 1-10")]
    pub discussion_depth: u8,
    #[schemars(description = "综合潜力分 1-10")]
    pub potential_score: u8,
    #[schemars(description = "评分理由")]
    pub reason: String,
}

impl QualityJudgment {
    /// Neutral default substituted whenever judging a topic fails.
    pub fn fallback() -> Self {
        Self {
            nature: "未知".to_string(),
            social_impact: 5,
            discussion_depth: 5,
            potential_score: 5,
            reason: "分析失败，使用默认值".to_string(),
        }
    }

    /// Clamp all numeric scores into [1, 10]. Model output occasionally
    /// wanders out of the requested range.
    pub fn clamped(mut self) -> Self {
        self.social_impact = self.social_impact.clamp(1, 10);
        self.discussion_depth = self.discussion_depth.clamp(1, 10);
        self.potential_score = self.potential_score.clamp(1, 10);
        self
    }
}

// --- Enriched Topics ---

/// A topic after scoring: the raw record, its judgment, and the derived
/// composite fields. Never mutated after the scoring engine produces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedTopic {
    pub topic: RawTopic,
    pub judgment: QualityJudgment,
    /// Min-max normalized heat, 0-100, rounded to 2 decimals.
    pub normalized_heat: f64,
    /// Min-max normalized discussion volume, 0-100, rounded to 2 decimals.
    pub normalized_discussion: f64,
    pub total_score: f64,
    pub is_breakout: bool,
}

// --- Scoring ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub heat: f64,
    pub discussion: f64,
    pub llm: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            heat: 0.5,
            discussion: 0.3,
            llm: 0.2,
        }
    }
}

/// Aggregate view over one scored batch. Score aggregates are `None` for an
/// empty batch rather than NaN so the serialized report stays valid JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreStats {
    pub total_count: usize,
    pub breakout_count: usize,
    pub avg_score: Option<f64>,
    pub max_score: Option<f64>,
    pub min_score: Option<f64>,
    pub platform_distribution: BTreeMap<String, usize>,
    pub nature_distribution: BTreeMap<String, usize>,
}

// --- Prediction Events ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceLevel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ImportanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportanceLevel::High => write!(f, "high"),
            ImportanceLevel::Medium => write!(f, "medium"),
            ImportanceLevel::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// The judgment scores carried into an event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentDigest {
    pub social_impact: u8,
    pub discussion_depth: u8,
    pub potential_score: u8,
}

/// The scoring-engine numbers carried into an event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicMetrics {
    pub heat_score: u64,
    pub discussion_volume: u64,
    pub normalized_heat: f64,
    pub normalized_discussion: f64,
    pub total_score: f64,
    pub is_breakout: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOrigin {
    pub platform: Platform,
    pub source_link: String,
    pub category: Option<String>,
}

/// A binary prediction-market event synthesized from one enriched topic.
/// Terminal artifact of the pipeline; fully determined by (topic, run stamp,
/// index, config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEvent {
    pub event_id: String,
    pub slug: String,
    pub language: String,
    pub title: String,
    pub question: String,
    pub description: String,
    pub category: String,
    pub market_type: String,
    pub outcomes: Vec<EventOutcome>,
    pub resolution_criteria: String,
    pub resolution_sources: Vec<String>,
    pub status: String,
    pub timezone: String,
    pub created_at: DateTime<FixedOffset>,
    pub close_time: DateTime<FixedOffset>,
    pub resolve_time: DateTime<FixedOffset>,
    pub importance_level: ImportanceLevel,
    /// total_score / 100, rounded to 4 decimals.
    pub probability_hint: f64,
    pub analysis: JudgmentDigest,
    pub metrics: TopicMetrics,
    pub origin: EventOrigin,
    pub tags: Vec<String>,
}

// --- Run bookkeeping ---

/// Identity of one pipeline run: the instant it started (in the configured
/// UTC offset) and the compact label derived from it. The label keys every
/// report filename and event id of the run.
#[derive(Debug, Clone)]
pub struct RunStamp {
    pub label: String,
    pub started_at: DateTime<FixedOffset>,
}

impl RunStamp {
    /// Stamp the current instant in the given UTC offset. An out-of-range
    /// offset (config validates against this) falls back to UTC.
    pub fn now(offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self::at(Utc::now().with_timezone(&offset))
    }

    /// Stamp a fixed instant.
    pub fn at(started_at: DateTime<FixedOffset>) -> Self {
        Self {
            label: started_at.format("%Y%m%d_%H%M%S").to_string(),
            started_at,
        }
    }
}

/// Counters from one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub label: String,
    pub fetched_by_platform: BTreeMap<String, usize>,
    pub source_failures: usize,
    pub duplicates_removed: usize,
    pub topics_scored: usize,
    pub breakout_count: usize,
    pub events_emitted: usize,
    pub judge_fallbacks: usize,
    pub elapsed_secs: f64,
}

impl RunReport {
    pub fn topics_fetched(&self) -> usize {
        self.fetched_by_platform.values().sum()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Heatcast Run Complete ===")?;
        writeln!(f, "Run label:          {}", self.label)?;
        writeln!(f, "Topics fetched:     {}", self.topics_fetched())?;
        for (platform, count) in &self.fetched_by_platform {
            writeln!(f, "  {platform}: {count}")?;
        }
        writeln!(f, "Source failures:    {}", self.source_failures)?;
        writeln!(f, "Duplicates removed: {}", self.duplicates_removed)?;
        writeln!(f, "Topics scored:      {}", self.topics_scored)?;
        writeln!(f, "Breakouts:          {}", self.breakout_count)?;
        writeln!(f, "Events emitted:     {}", self.events_emitted)?;
        writeln!(f, "Judge fallbacks:    {}", self.judge_fallbacks)?;
        writeln!(f, "Elapsed:            {:.1}s", self.elapsed_secs)?;
        Ok(())
    }
}
