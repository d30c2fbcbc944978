// Test mocks for the heatcast pipeline.
//
// Three mock families matching the three trait boundaries:
// - StaticSource / FailingSource (TopicSource) — canned lists and forced errors
// - ScriptedJudge / FailingJudge (TopicJudge) — title-keyed judgments
// - MemorySink (ReportSink) — records every write in memory
//
// Plus helpers for constructing RawTopic, QualityJudgment and EnrichedTopic.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use heatcast_common::{
    EnrichedTopic, Platform, PredictionEvent, QualityJudgment, RawTopic, RunStamp, ScoreStats,
};

use crate::judge::TopicJudge;
use crate::sink::ReportSink;
use crate::sources::TopicSource;

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Bare topic with no link, discussion volume, category or content.
pub fn topic(platform: Platform, title: &str, heat: u64) -> RawTopic {
    RawTopic {
        platform,
        title: title.to_string(),
        heat_score: heat,
        link: String::new(),
        discussion_volume: None,
        category: None,
        content: None,
    }
}

pub fn topic_with_discussion(
    platform: Platform,
    title: &str,
    heat: u64,
    discussion: Option<u64>,
) -> RawTopic {
    RawTopic {
        discussion_volume: discussion,
        ..topic(platform, title, heat)
    }
}

pub fn topic_with_category(
    platform: Platform,
    title: &str,
    heat: u64,
    category: Option<&str>,
) -> RawTopic {
    RawTopic {
        category: category.map(str::to_string),
        ..topic(platform, title, heat)
    }
}

/// Judgment with both sub-scores pinned to 5 and an empty reason.
pub fn judgment(nature: &str, potential: u8) -> QualityJudgment {
    QualityJudgment {
        nature: nature.to_string(),
        social_impact: 5,
        discussion_depth: 5,
        potential_score: potential,
        reason: String::new(),
    }
}

/// Enriched topic with the given rounded total; breakout at >= 80.
pub fn enriched(topic: RawTopic, judgment: QualityJudgment, total_score: f64) -> EnrichedTopic {
    EnrichedTopic {
        topic,
        judgment,
        normalized_heat: 0.0,
        normalized_discussion: 0.0,
        total_score,
        is_breakout: total_score >= 80.0,
    }
}

// ---------------------------------------------------------------------------
// TopicSource mocks
// ---------------------------------------------------------------------------

/// Source returning a fixed list, truncated to the fetch limit.
pub struct StaticSource {
    platform: Platform,
    topics: Vec<RawTopic>,
}

impl StaticSource {
    pub fn new(platform: Platform, topics: Vec<RawTopic>) -> Self {
        Self { platform, topics }
    }
}

#[async_trait]
impl TopicSource for StaticSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<RawTopic>> {
        Ok(self.topics.iter().take(limit).cloned().collect())
    }
}

/// Source that fails every fetch.
pub struct FailingSource {
    platform: Platform,
    message: String,
}

impl FailingSource {
    pub fn new(platform: Platform, message: &str) -> Self {
        Self {
            platform,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl TopicSource for FailingSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, _limit: usize) -> Result<Vec<RawTopic>> {
        bail!("FailingSource: {}", self.message)
    }
}

// ---------------------------------------------------------------------------
// TopicJudge mocks
// ---------------------------------------------------------------------------

/// Title-keyed judge. Unregistered titles get the fallback judgment.
/// Builder pattern: `.on_title()`, `.on_topic()`.
pub struct ScriptedJudge {
    by_title: HashMap<String, QualityJudgment>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self {
            by_title: HashMap::new(),
        }
    }

    /// Register a judgment with all three sub-scores set to `potential`.
    pub fn on_title(mut self, title: &str, potential: u8) -> Self {
        self.by_title.insert(
            title.to_string(),
            QualityJudgment {
                nature: "社会新闻".to_string(),
                social_impact: potential,
                discussion_depth: potential,
                potential_score: potential,
                reason: format!("scripted: {title}"),
            },
        );
        self
    }

    pub fn on_topic(mut self, title: &str, judgment: QualityJudgment) -> Self {
        self.by_title.insert(title.to_string(), judgment);
        self
    }
}

impl Default for ScriptedJudge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicJudge for ScriptedJudge {
    async fn judge(&self, topic: &RawTopic) -> Result<QualityJudgment> {
        Ok(self
            .by_title
            .get(&topic.title)
            .cloned()
            .unwrap_or_else(QualityJudgment::fallback))
    }
}

/// Judge that violates its contract and errors on every call.
pub struct FailingJudge {
    message: String,
}

impl FailingJudge {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl TopicJudge for FailingJudge {
    async fn judge(&self, _topic: &RawTopic) -> Result<QualityJudgment> {
        bail!("FailingJudge: {}", self.message)
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemorySinkInner {
    topics: Vec<(String, Vec<EnrichedTopic>)>,
    breakouts: Vec<(String, Vec<EnrichedTopic>)>,
    stats: Vec<(String, ScoreStats)>,
    events: Vec<(String, Vec<PredictionEvent>)>,
    fail_on_topics: bool,
    fail_on_events: bool,
}

/// Records every write in memory. Thread-safe via interior Mutex.
/// `failing_topics` and `failing_events` force errors at either boundary.
pub struct MemorySink {
    inner: Mutex<MemorySinkInner>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemorySinkInner::default()),
        }
    }

    /// Make `write_topics` return an error for every call.
    pub fn failing_topics(self) -> Self {
        self.inner.lock().unwrap().fail_on_topics = true;
        self
    }

    /// Make `write_events` return an error for every call.
    pub fn failing_events(self) -> Self {
        self.inner.lock().unwrap().fail_on_events = true;
        self
    }

    // --- Assertion helpers ---

    /// Number of `write_topics` calls.
    pub fn topic_writes(&self) -> usize {
        self.inner.lock().unwrap().topics.len()
    }

    /// Topics from the most recent `write_topics` call, empty if none.
    pub fn topics_written(&self) -> Vec<EnrichedTopic> {
        let inner = self.inner.lock().unwrap();
        inner
            .topics
            .last()
            .map(|(_, topics)| topics.clone())
            .unwrap_or_default()
    }

    /// Breakouts from the most recent `write_breakouts` call, empty if none.
    pub fn breakouts_written(&self) -> Vec<EnrichedTopic> {
        let inner = self.inner.lock().unwrap();
        inner
            .breakouts
            .last()
            .map(|(_, topics)| topics.clone())
            .unwrap_or_default()
    }

    /// Stats from the most recent `write_stats` call.
    pub fn stats_written(&self) -> Option<ScoreStats> {
        let inner = self.inner.lock().unwrap();
        inner.stats.last().map(|(_, stats)| stats.clone())
    }

    /// Events from the most recent `write_events` call, empty if none.
    pub fn events_written(&self) -> Vec<PredictionEvent> {
        let inner = self.inner.lock().unwrap();
        inner
            .events
            .last()
            .map(|(_, events)| events.clone())
            .unwrap_or_default()
    }

    /// Number of `write_events` calls.
    pub fn event_writes(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    /// Run label of the most recent `write_topics` call.
    pub fn written_label(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.topics.last().map(|(label, _)| label.clone())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn write_topics(&self, topics: &[EnrichedTopic], stamp: &RunStamp) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_on_topics {
            bail!("MemorySink: topic write failure requested");
        }
        inner.topics.push((stamp.label.clone(), topics.to_vec()));
        Ok(())
    }

    async fn write_breakouts(&self, topics: &[EnrichedTopic], stamp: &RunStamp) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.breakouts.push((stamp.label.clone(), topics.to_vec()));
        Ok(())
    }

    async fn write_stats(&self, stats: &ScoreStats, stamp: &RunStamp) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.stats.push((stamp.label.clone(), stats.clone()));
        Ok(())
    }

    async fn write_events(&self, events: &[PredictionEvent], stamp: &RunStamp) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_on_events {
            bail!("MemorySink: event write failure requested");
        }
        inner.events.push((stamp.label.clone(), events.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn stamp() -> RunStamp {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        RunStamp::at(offset.with_ymd_and_hms(2024, 6, 1, 9, 30, 5).unwrap())
    }

    #[tokio::test]
    async fn static_source_respects_limit() {
        let source = StaticSource::new(
            Platform::Weibo,
            vec![
                topic(Platform::Weibo, "甲话题", 300),
                topic(Platform::Weibo, "乙话题", 200),
                topic(Platform::Weibo, "丙话题", 100),
            ],
        );
        let fetched = source.fetch(2).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].title, "甲话题");
    }

    #[tokio::test]
    async fn scripted_judge_falls_back_for_unknown_titles() {
        let judge = ScriptedJudge::new().on_title("已知话题", 9);
        let known = judge
            .judge(&topic(Platform::Weibo, "已知话题", 100))
            .await
            .unwrap();
        assert_eq!(known.potential_score, 9);

        let unknown = judge
            .judge(&topic(Platform::Weibo, "未知话题", 100))
            .await
            .unwrap();
        assert_eq!(unknown, QualityJudgment::fallback());
    }

    #[tokio::test]
    async fn memory_sink_records_latest_write() {
        let sink = MemorySink::new();
        let topics = vec![enriched(
            topic(Platform::Zhihu, "话题甲", 100),
            judgment("其他", 5),
            42.0,
        )];
        sink.write_topics(&topics, &stamp()).await.unwrap();
        assert_eq!(sink.topic_writes(), 1);
        assert_eq!(sink.topics_written().len(), 1);
        assert_eq!(sink.written_label().as_deref(), Some("20240601_093005"));
    }

    #[tokio::test]
    async fn failing_toggles_error_their_writes() {
        let sink = MemorySink::new().failing_events();
        let err = sink.write_events(&[], &stamp()).await;
        assert!(err.is_err());
        assert_eq!(sink.event_writes(), 0);

        let sink = MemorySink::new().failing_topics();
        assert!(sink.write_topics(&[], &stamp()).await.is_err());
        assert_eq!(sink.topic_writes(), 0);
    }
}
