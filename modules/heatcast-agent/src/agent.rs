// Pipeline orchestration. One `run` is one cycle: fetch, dedup, judge,
// score, persist, synthesize events.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{error, info, warn};

use heatcast_common::{AgentConfig, QualityJudgment, RawTopic, RunReport, RunStamp};

use crate::dedup::dedup_by_title;
use crate::events::{EventConfig, EventSynthesizer};
use crate::judge::{judge_all, TopicJudge};
use crate::scoring::{statistics, ScoringEngine};
use crate::sink::ReportSink;
use crate::sources::TopicSource;

pub struct HeatAgent {
    sources: Vec<Box<dyn TopicSource>>,
    judge: Box<dyn TopicJudge>,
    sink: Arc<dyn ReportSink>,
    scoring: ScoringEngine,
    synthesizer: EventSynthesizer,
    fetch_limit: usize,
    judge_batch_size: usize,
    timezone_offset_hours: i32,
}

impl HeatAgent {
    pub fn new(
        config: &AgentConfig,
        sources: Vec<Box<dyn TopicSource>>,
        judge: Box<dyn TopicJudge>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            sources,
            judge,
            sink,
            scoring: ScoringEngine::new(config.weights, config.breakout_threshold),
            synthesizer: EventSynthesizer::new(EventConfig::from(config)),
            fetch_limit: config.fetch_limit,
            judge_batch_size: config.judge_batch_size,
            timezone_offset_hours: config.timezone_offset_hours,
        }
    }

    /// Run one full cycle and report what happened.
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        let stamp = RunStamp::now(self.timezone_offset_hours);
        let mut report = RunReport {
            label: stamp.label.clone(),
            ..RunReport::default()
        };

        info!(label = %stamp.label, sources = self.sources.len(), "Starting Heatcast run");

        // 1. Fetch all hot lists concurrently. One bad source never sinks
        //    the rest of the run.
        let fetches = join_all(self.sources.iter().map(|source| async move {
            (source.platform(), source.fetch(self.fetch_limit).await)
        }))
        .await;

        let mut merged: Vec<RawTopic> = Vec::new();
        for (platform, result) in fetches {
            match result {
                Ok(topics) => {
                    info!(platform = %platform, count = topics.len(), "Source fetch succeeded");
                    report
                        .fetched_by_platform
                        .insert(platform.to_string(), topics.len());
                    merged.extend(topics);
                }
                Err(e) => {
                    error!(platform = %platform, error = %e, "Source fetch failed");
                    report.source_failures += 1;
                }
            }
        }

        if merged.is_empty() {
            warn!("No topics fetched, nothing to do");
            report.elapsed_secs = started.elapsed().as_secs_f64();
            return Ok(report);
        }

        // 2. Dedup by title across platforms, first occurrence wins.
        let before = merged.len();
        let topics = dedup_by_title(merged);
        report.duplicates_removed = before - topics.len();

        // 3. Judge quality, sequentially in batches.
        let judgments = judge_all(self.judge.as_ref(), &topics, self.judge_batch_size).await;
        let fallback = QualityJudgment::fallback();
        report.judge_fallbacks = judgments.iter().filter(|j| **j == fallback).count();

        // 4. Score and rank.
        let enriched = self.scoring.calculate_scores(&topics, &judgments);
        report.topics_scored = enriched.len();
        let breakouts: Vec<_> = enriched
            .iter()
            .filter(|t| t.is_breakout)
            .cloned()
            .collect();
        report.breakout_count = breakouts.len();
        let stats = statistics(&enriched);

        // 5. Persist the run's primary product.
        self.sink
            .write_topics(&enriched, &stamp)
            .await
            .context("Failed to write topic report")?;
        self.sink
            .write_breakouts(&breakouts, &stamp)
            .await
            .context("Failed to write breakout report")?;
        self.sink
            .write_stats(&stats, &stamp)
            .await
            .context("Failed to write statistics report")?;

        // 6. Prediction events are best-effort: a failure here must not
        //    undo the reports already written.
        let events = self.synthesizer.synthesize(&enriched, &stamp);
        match self.sink.write_events(&events, &stamp).await {
            Ok(()) => report.events_emitted = events.len(),
            Err(e) => error!(error = %e, "Failed to write prediction events"),
        }

        // 7. Headline breakouts. `enriched` is ranked, so the subset is too.
        for topic in breakouts.iter().take(5) {
            info!(
                platform = %topic.topic.platform,
                title = %topic.topic.title,
                score = topic.total_score,
                nature = %topic.judgment.nature,
                "Top breakout"
            );
        }

        report.elapsed_secs = started.elapsed().as_secs_f64();
        Ok(report)
    }
}
