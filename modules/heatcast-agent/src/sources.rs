// Hot list sources. Each adapter hits a platform's public JSON endpoint,
// maps entries into `RawTopic` and applies the shared title hygiene. The
// pipeline isolates per-source failures, so `fetch` just propagates them.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use heatcast_common::{AgentConfig, Platform, RawTopic};

pub mod douyin;
pub mod weibo;
pub mod zhihu;

pub use douyin::DouyinSource;
pub use weibo::WeiboSource;
pub use zhihu::ZhihuSource;

#[async_trait]
pub trait TopicSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetch up to `limit` topics, cleaned and ad-filtered, in list order.
    async fn fetch(&self, limit: usize) -> Result<Vec<RawTopic>>;
}

/// Sources for the configured platforms, in configuration order.
pub fn enabled_sources(config: &AgentConfig) -> Vec<Box<dyn TopicSource>> {
    config
        .enabled_platforms
        .iter()
        .map(|platform| match platform {
            Platform::Weibo => Box::new(WeiboSource::new()) as Box<dyn TopicSource>,
            Platform::Douyin => Box::new(DouyinSource::new()) as Box<dyn TopicSource>,
            Platform::Zhihu => Box::new(ZhihuSource::new()) as Box<dyn TopicSource>,
        })
        .collect()
}

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const AD_MARKERS: &[&str] = &["广告", "推广", "赞助", "AD"];

static CN_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(万|亿)?").unwrap());

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client")
}

pub(crate) fn clean_title(raw: &str) -> String {
    raw.trim().replace('\n', " ").replace('\r', "")
}

/// Titles under 3 characters or carrying ad markers are dropped.
pub(crate) fn is_valid_title(title: &str) -> bool {
    if title.chars().count() < 3 {
        return false;
    }
    !AD_MARKERS.iter().any(|marker| title.contains(marker))
}

/// Parse counts written with Chinese magnitude suffixes, e.g. "1.2万" or
/// "3096 万热度". Returns 0 when no number is present.
pub(crate) fn parse_cn_count(text: &str) -> u64 {
    let Some(caps) = CN_COUNT.captures(text) else {
        return 0;
    };
    let number: f64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("万") => 10_000.0,
        Some("亿") => 100_000_000.0,
        _ => 1.0,
    };
    (number * multiplier) as u64
}
