use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use heatcast_common::{Platform, RawTopic};

use super::{clean_title, http_client, is_valid_title, parse_cn_count, TopicSource};

const HOT_LIST_URL: &str = "https://api.zhihu.com/topstory/hot-list";

#[derive(Debug, Deserialize)]
struct HotListResponse {
    #[serde(default)]
    data: Vec<HotListSection>,
}

#[derive(Debug, Deserialize)]
struct HotListSection {
    /// Heat rendered for display, e.g. "3096 万热度".
    #[serde(default)]
    detail_text: String,
    #[serde(default)]
    target: HotListTarget,
}

#[derive(Debug, Default, Deserialize)]
struct HotListTarget {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    answer_count: Option<u64>,
}

pub struct ZhihuSource {
    client: reqwest::Client,
}

impl ZhihuSource {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for ZhihuSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicSource for ZhihuSource {
    fn platform(&self) -> Platform {
        Platform::Zhihu
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<RawTopic>> {
        let response: HotListResponse = self
            .client
            .get(HOT_LIST_URL)
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .context("Zhihu hot list request failed")?
            .json()
            .await
            .context("Failed to parse Zhihu hot list response")?;

        let topics = collect_topics(response, limit);
        info!(count = topics.len(), "Zhihu fetch complete");
        Ok(topics)
    }
}

fn collect_topics(response: HotListResponse, limit: usize) -> Vec<RawTopic> {
    response
        .data
        .into_iter()
        .take(limit)
        .filter_map(|section| {
            let title = clean_title(&section.target.title);
            if !is_valid_title(&title) {
                return None;
            }
            let link = if section.target.id == 0 {
                String::new()
            } else {
                format!("https://www.zhihu.com/question/{}", section.target.id)
            };
            let excerpt = clean_title(&section.target.excerpt);
            Some(RawTopic {
                platform: Platform::Zhihu,
                title,
                heat_score: parse_cn_count(&section.detail_text),
                link,
                discussion_volume: section.target.answer_count,
                category: None,
                content: (!excerpt.is_empty()).then_some(excerpt),
            })
        })
        .collect()
}
