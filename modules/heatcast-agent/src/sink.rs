// Report persistence. The pipeline only talks to `ReportSink`; the JSON
// directory sink is the production implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use heatcast_common::{AgentConfig, EnrichedTopic, PredictionEvent, RunStamp, ScoreStats};

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// All scored topics, ranked. Written every run.
    async fn write_topics(&self, topics: &[EnrichedTopic], stamp: &RunStamp) -> Result<()>;
    /// Breakout subset. Implementations may skip the write when empty.
    async fn write_breakouts(&self, topics: &[EnrichedTopic], stamp: &RunStamp) -> Result<()>;
    async fn write_stats(&self, stats: &ScoreStats, stamp: &RunStamp) -> Result<()>;
    async fn write_events(&self, events: &[PredictionEvent], stamp: &RunStamp) -> Result<()>;
}

/// Writes pretty-printed JSON reports under two directories: topic reports
/// and statistics in `output_dir`, prediction events in `predict_dir`. File
/// names carry the run label so consecutive runs never clobber each other.
pub struct JsonDirSink {
    output_dir: PathBuf,
    predict_dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(output_dir: impl Into<PathBuf>, predict_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            predict_dir: predict_dir.into(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(&config.output_dir, &config.predict_dir)
    }

    async fn write_json<T>(&self, dir: &Path, file_name: &str, value: &T) -> Result<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating report directory {}", dir.display()))?;
        let path = dir.join(file_name);
        let bytes = serde_json::to_vec_pretty(value)
            .with_context(|| format!("serializing {file_name}"))?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

#[async_trait]
impl ReportSink for JsonDirSink {
    async fn write_topics(&self, topics: &[EnrichedTopic], stamp: &RunStamp) -> Result<()> {
        let file_name = format!("all_topics_{}.json", stamp.label);
        let path = self.write_json(&self.output_dir, &file_name, topics).await?;
        info!(path = %path.display(), count = topics.len(), "Wrote topic report");
        Ok(())
    }

    async fn write_breakouts(&self, topics: &[EnrichedTopic], stamp: &RunStamp) -> Result<()> {
        if topics.is_empty() {
            info!("No breakout topics, skipping breakout report");
            return Ok(());
        }
        let file_name = format!("breakout_topics_{}.json", stamp.label);
        let path = self.write_json(&self.output_dir, &file_name, topics).await?;
        info!(path = %path.display(), count = topics.len(), "Wrote breakout report");
        Ok(())
    }

    async fn write_stats(&self, stats: &ScoreStats, stamp: &RunStamp) -> Result<()> {
        let file_name = format!("statistics_{}.json", stamp.label);
        let path = self.write_json(&self.output_dir, &file_name, stats).await?;
        info!(path = %path.display(), "Wrote statistics report");
        Ok(())
    }

    async fn write_events(&self, events: &[PredictionEvent], stamp: &RunStamp) -> Result<()> {
        let file_name = format!("predict_events_{}.json", stamp.label);
        let path = self
            .write_json(&self.predict_dir, &file_name, events)
            .await?;
        info!(path = %path.display(), count = events.len(), "Wrote prediction events");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{enriched, judgment, topic};
    use chrono::{FixedOffset, TimeZone};
    use heatcast_common::Platform;

    fn stamp() -> RunStamp {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        RunStamp::at(offset.with_ymd_and_hms(2024, 6, 1, 9, 30, 5).unwrap())
    }

    fn sample_topics() -> Vec<EnrichedTopic> {
        vec![
            enriched(
                topic(Platform::Weibo, "油价或将上调", 9000),
                judgment("社会新闻", 8),
                86.5,
            ),
            enriched(
                topic(Platform::Zhihu, "普通话题", 400),
                judgment("其他", 5),
                42.0,
            ),
        ]
    }

    #[tokio::test]
    async fn write_topics_round_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path().join("out"), dir.path().join("predict"));
        let topics = sample_topics();
        sink.write_topics(&topics, &stamp()).await.unwrap();

        let path = dir.path().join("out/all_topics_20240601_093005.json");
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<EnrichedTopic> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].topic.title, "油价或将上调");
        assert_eq!(parsed[0].total_score, 86.5);
    }

    #[tokio::test]
    async fn empty_breakouts_skip_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path().join("out"), dir.path().join("predict"));
        sink.write_breakouts(&[], &stamp()).await.unwrap();
        let path = dir.path().join("out/breakout_topics_20240601_093005.json");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn breakouts_written_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path().join("out"), dir.path().join("predict"));
        let breakouts: Vec<EnrichedTopic> = sample_topics()
            .into_iter()
            .filter(|t| t.is_breakout)
            .collect();
        assert_eq!(breakouts.len(), 1);
        sink.write_breakouts(&breakouts, &stamp()).await.unwrap();

        let path = dir.path().join("out/breakout_topics_20240601_093005.json");
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<EnrichedTopic> = serde_json::from_str(&raw).unwrap();
        assert!(parsed[0].is_breakout);
    }

    #[tokio::test]
    async fn stats_and_events_land_in_their_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path().join("out"), dir.path().join("predict"));
        let topics = sample_topics();
        let stats = crate::scoring::statistics(&topics);
        sink.write_stats(&stats, &stamp()).await.unwrap();
        sink.write_events(&[], &stamp()).await.unwrap();

        let stats_path = dir.path().join("out/statistics_20240601_093005.json");
        let parsed: ScoreStats =
            serde_json::from_str(&std::fs::read_to_string(&stats_path).unwrap()).unwrap();
        assert_eq!(parsed.total_count, 2);

        // Events report is written even when empty.
        let events_path = dir.path().join("predict/predict_events_20240601_093005.json");
        let parsed: Vec<PredictionEvent> =
            serde_json::from_str(&std::fs::read_to_string(&events_path).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn nested_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(
            dir.path().join("a/b/out"),
            dir.path().join("a/b/predict"),
        );
        sink.write_stats(&crate::scoring::statistics(&[]), &stamp())
            .await
            .unwrap();
        assert!(dir.path().join("a/b/out/statistics_20240601_093005.json").exists());
    }
}
