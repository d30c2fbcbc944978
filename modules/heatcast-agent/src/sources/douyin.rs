use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use heatcast_common::{Platform, RawTopic};

use super::{clean_title, http_client, is_valid_title, TopicSource};

const BILLBOARD_URL: &str = "https://www.iesdouyin.com/web/api/v2/hotsearch/billboard/word/";

#[derive(Debug, Deserialize)]
struct BillboardResponse {
    #[serde(default)]
    word_list: Vec<BillboardWord>,
}

#[derive(Debug, Deserialize)]
struct BillboardWord {
    #[serde(default)]
    word: String,
    #[serde(default)]
    hot_value: u64,
    #[serde(default)]
    sentence_id: String,
}

pub struct DouyinSource {
    client: reqwest::Client,
}

impl DouyinSource {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for DouyinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicSource for DouyinSource {
    fn platform(&self) -> Platform {
        Platform::Douyin
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<RawTopic>> {
        let response: BillboardResponse = self
            .client
            .get(BILLBOARD_URL)
            .send()
            .await
            .context("Douyin billboard request failed")?
            .json()
            .await
            .context("Failed to parse Douyin billboard response")?;

        let topics = collect_topics(response, limit);
        info!(count = topics.len(), "Douyin fetch complete");
        Ok(topics)
    }
}

fn collect_topics(response: BillboardResponse, limit: usize) -> Vec<RawTopic> {
    response
        .word_list
        .into_iter()
        .take(limit)
        .filter_map(|entry| {
            let title = clean_title(&entry.word);
            if !is_valid_title(&title) {
                return None;
            }
            let link = if entry.sentence_id.is_empty() {
                String::new()
            } else {
                format!("https://www.douyin.com/hot/{}", entry.sentence_id)
            };
            Some(RawTopic {
                platform: Platform::Douyin,
                title,
                heat_score: entry.hot_value,
                link,
                discussion_volume: None,
                category: None,
                content: None,
            })
        })
        .collect()
}
