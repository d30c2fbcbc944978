use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use url::Url;

use heatcast_common::{Platform, RawTopic};

use super::{clean_title, http_client, is_valid_title, TopicSource};

const HOT_SEARCH_URL: &str = "https://weibo.com/ajax/side/hotSearch";

#[derive(Debug, Deserialize)]
struct HotSearchResponse {
    #[serde(default)]
    data: HotSearchData,
}

#[derive(Debug, Default, Deserialize)]
struct HotSearchData {
    #[serde(default)]
    realtime: Vec<RealtimeEntry>,
}

#[derive(Debug, Deserialize)]
struct RealtimeEntry {
    #[serde(default)]
    word: String,
    #[serde(default)]
    num: u64,
    #[serde(default)]
    category: Option<String>,
}

pub struct WeiboSource {
    client: reqwest::Client,
}

impl WeiboSource {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for WeiboSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicSource for WeiboSource {
    fn platform(&self) -> Platform {
        Platform::Weibo
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<RawTopic>> {
        let response: HotSearchResponse = self
            .client
            .get(HOT_SEARCH_URL)
            .send()
            .await
            .context("Weibo hot search request failed")?
            .json()
            .await
            .context("Failed to parse Weibo hot search response")?;

        let topics = collect_topics(response, limit);
        info!(count = topics.len(), "Weibo fetch complete");
        Ok(topics)
    }
}

fn collect_topics(response: HotSearchResponse, limit: usize) -> Vec<RawTopic> {
    response
        .data
        .realtime
        .into_iter()
        .take(limit)
        .filter_map(|entry| {
            let title = clean_title(&entry.word);
            if !is_valid_title(&title) {
                return None;
            }
            Some(RawTopic {
                platform: Platform::Weibo,
                link: search_link(&title),
                title,
                heat_score: entry.num,
                discussion_volume: None,
                category: entry.category.filter(|c| !c.is_empty()),
                content: None,
            })
        })
        .collect()
}

/// Search link for a hot word, `#word#` percent-encoded in the query.
fn search_link(word: &str) -> String {
    Url::parse_with_params("https://s.weibo.com/weibo", [("q", format!("#{word}#"))])
        .map(String::from)
        .unwrap_or_default()
}
