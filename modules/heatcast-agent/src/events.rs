// Prediction-event synthesis. A lexical classifier over the topic title
// decides whether a topic describes a verifiable future outcome; each
// accepted topic expands deterministically into a binary yes/no market
// record keyed by the run stamp.

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use tracing::info;

use heatcast_common::{
    AgentConfig, EnrichedTopic, EventOrigin, EventOutcome, ImportanceLevel, JudgmentDigest,
    PredictionEvent, RunStamp, TopicMetrics,
};

// --- Title lexicons ---

/// Phrases that state an open future outcome.
pub const PREDICTIVE_CUES: &[&str] = &[
    "是否", "会不会", "能否", "会", "将", "预计", "或将", "可能", "或将在",
];

/// Publicly measurable economic indicators.
pub const MEASURABLE_TERMS: &[&str] = &[
    "失业率", "CPI", "PPI", "GDP", "金价", "油价", "房价", "汇率", "股价", "物价", "通胀", "利率",
];

/// Directional movements an indicator can verifiably take.
pub const DIRECTION_TERMS: &[&str] = &[
    "上涨", "下跌", "下降", "回升", "回落", "走高", "走低", "突破", "创新高", "刷新纪录",
];

/// Phrases marking a topic as already settled.
pub const EXCLUSION_CUES: &[&str] = &[
    "已", "已经", "确认", "宣布", "发生", "现状", "走红", "身价", "首次", "联排", "回应", "被",
];

/// Predictive cues that already phrase the title as a question.
const INTERROGATIVE_CUES: &[&str] = &["是否", "会不会", "能否"];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z\x{4e00}-\x{9fff}-]").unwrap());

// --- Classifier ---

/// True when the trimmed title states an open, checkable outcome: either an
/// explicit predictive phrase, or a measurable indicator paired with a
/// direction of movement.
pub fn has_predictive_signal(title: &str) -> bool {
    let title = title.trim();
    if PREDICTIVE_CUES.iter().any(|cue| title.contains(cue)) {
        return true;
    }
    MEASURABLE_TERMS.iter().any(|term| title.contains(term))
        && DIRECTION_TERMS.iter().any(|term| title.contains(term))
}

/// Whether a topic title can back a binary market. Empty titles never
/// qualify; a title carrying an already-settled cue is rejected unless it
/// independently carries a predictive signal.
pub fn is_event_worthy(title: &str) -> bool {
    let title = title.trim();
    if title.is_empty() {
        return false;
    }
    if EXCLUSION_CUES.iter().any(|cue| title.contains(cue)) && !has_predictive_signal(title) {
        return false;
    }
    has_predictive_signal(title)
}

// --- Generation helpers ---

/// Compact a title into a URL-safe slug: whitespace runs become single
/// hyphens, anything outside CJK/alphanumeric/hyphen is stripped, capped at
/// 40 characters.
pub fn slugify(title: &str) -> String {
    let hyphenated = WHITESPACE.replace_all(title.trim(), "-");
    let cleaned = NON_SLUG.replace_all(&hyphenated, "");
    cleaned.chars().take(40).collect()
}

fn build_question(title: &str, resolve_days: i64) -> String {
    if INTERROGATIVE_CUES.iter().any(|cue| title.contains(cue)) {
        format!("在未来{resolve_days}天内，{title}？")
    } else {
        format!("在未来{resolve_days}天内，是否出现以下情况：{title}？")
    }
}

fn build_resolution_criteria(resolve_days: i64) -> String {
    format!(
        "在市场截止时间前（{resolve_days}天内），若有权威来源（政府/官方机构/主流媒体）\
         发布明确报道或公告，证明该事件发生或指标达到题目描述的变化，\
         则判定为“是”；否则判定为“否”。"
    )
}

fn render_timezone(offset_hours: i32) -> String {
    if offset_hours >= 0 {
        format!("UTC+{offset_hours:02}:00")
    } else {
        format!("UTC-{:02}:00", -offset_hours)
    }
}

// --- Synthesizer ---

/// The generation knobs, lifted out of `AgentConfig` so the synthesizer is
/// constructible without the full pipeline config.
#[derive(Debug, Clone)]
pub struct EventConfig {
    pub resolve_days: i64,
    pub timezone_offset_hours: i32,
    pub importance_high: f64,
    pub importance_medium: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            resolve_days: 7,
            timezone_offset_hours: 8,
            importance_high: 80.0,
            importance_medium: 50.0,
        }
    }
}

impl From<&AgentConfig> for EventConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            resolve_days: config.resolve_days,
            timezone_offset_hours: config.timezone_offset_hours,
            importance_high: config.importance_high,
            importance_medium: config.importance_medium,
        }
    }
}

pub struct EventSynthesizer {
    config: EventConfig,
}

impl EventSynthesizer {
    pub fn new(config: EventConfig) -> Self {
        Self { config }
    }

    /// Expand every event-worthy topic into a binary market record. Output
    /// is fully determined by (topics, stamp, config). Indices are 1-based
    /// over the whole ranked input, so topics the classifier rejects leave
    /// gaps in the event id sequence.
    pub fn synthesize(&self, topics: &[EnrichedTopic], stamp: &RunStamp) -> Vec<PredictionEvent> {
        let events: Vec<PredictionEvent> = topics
            .iter()
            .enumerate()
            .filter(|(_, item)| is_event_worthy(&item.topic.title))
            .map(|(position, item)| self.build_event(item, stamp, position + 1))
            .collect();
        info!(
            candidates = topics.len(),
            events = events.len(),
            "Synthesized prediction events"
        );
        events
    }

    fn build_event(
        &self,
        item: &EnrichedTopic,
        stamp: &RunStamp,
        index: usize,
    ) -> PredictionEvent {
        let topic = &item.topic;
        let title = topic.title.trim();

        let mut slug = slugify(title);
        if slug.is_empty() {
            slug = format!("topic-{index}");
        }

        let description = [
            Some(title.to_string()),
            topic.content.clone().filter(|c| !c.is_empty()),
            Some(item.judgment.reason.clone()).filter(|r| !r.is_empty()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("。");

        let mut tags = Vec::new();
        for tag in [
            Some(topic.platform.to_string()),
            Some(item.judgment.nature.clone()).filter(|n| !n.is_empty()),
            topic.category.clone().filter(|c| !c.is_empty()),
        ]
        .into_iter()
        .flatten()
        {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let created_at = stamp.started_at;
        let resolve_time = created_at + Duration::days(self.config.resolve_days);

        let importance_level = if item.total_score >= self.config.importance_high {
            ImportanceLevel::High
        } else if item.total_score >= self.config.importance_medium {
            ImportanceLevel::Medium
        } else {
            ImportanceLevel::Low
        };

        PredictionEvent {
            event_id: format!("{}_{}_{:03}", topic.platform, stamp.label, index),
            slug,
            language: "zh-CN".to_string(),
            title: title.to_string(),
            question: build_question(title, self.config.resolve_days),
            description,
            category: item.judgment.nature.clone(),
            market_type: "binary".to_string(),
            outcomes: vec![
                EventOutcome {
                    id: "yes".to_string(),
                    label: "是".to_string(),
                    description: "在截止时间前满足判定条件".to_string(),
                },
                EventOutcome {
                    id: "no".to_string(),
                    label: "否".to_string(),
                    description: "在截止时间前未满足判定条件".to_string(),
                },
            ],
            resolution_criteria: build_resolution_criteria(self.config.resolve_days),
            resolution_sources: if topic.link.is_empty() {
                Vec::new()
            } else {
                vec![topic.link.clone()]
            },
            status: "open".to_string(),
            timezone: render_timezone(self.config.timezone_offset_hours),
            created_at,
            close_time: resolve_time,
            resolve_time,
            importance_level,
            probability_hint: (item.total_score / 100.0 * 10_000.0).round() / 10_000.0,
            analysis: JudgmentDigest {
                social_impact: item.judgment.social_impact,
                discussion_depth: item.judgment.discussion_depth,
                potential_score: item.judgment.potential_score,
            },
            metrics: TopicMetrics {
                heat_score: topic.heat_score,
                discussion_volume: topic.discussion_volume.unwrap_or(0),
                normalized_heat: item.normalized_heat,
                normalized_discussion: item.normalized_discussion,
                total_score: item.total_score,
                is_breakout: item.is_breakout,
            },
            origin: EventOrigin {
                platform: topic.platform,
                source_link: topic.link.clone(),
                category: topic.category.clone(),
            },
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{enriched, judgment, topic, topic_with_category};
    use chrono::{FixedOffset, TimeZone};
    use heatcast_common::Platform;

    fn stamp() -> RunStamp {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        RunStamp::at(offset.with_ymd_and_hms(2024, 6, 1, 9, 30, 5).unwrap())
    }

    fn synthesizer() -> EventSynthesizer {
        EventSynthesizer::new(EventConfig::default())
    }

    #[test]
    fn explicit_predictive_cue_is_accepted() {
        assert!(is_event_worthy("股价会上涨吗"));
        assert!(is_event_worthy("油价或将在下周调整"));
    }

    #[test]
    fn indicator_plus_direction_is_accepted() {
        assert!(is_event_worthy("CPI上涨"));
        assert!(is_event_worthy("金价创新高"));
    }

    #[test]
    fn indicator_without_direction_is_rejected() {
        assert!(!is_event_worthy("CPI"));
        assert!(!is_event_worthy("今日金价"));
    }

    #[test]
    fn settled_topic_without_signal_is_rejected() {
        assert!(!is_event_worthy("某明星已官宣结婚"));
        assert!(!is_event_worthy("新规已经发生效力"));
    }

    #[test]
    fn settled_cue_with_independent_signal_is_accepted() {
        // 已 appears, but 是否 carries its own forward-looking question.
        assert!(is_event_worthy("已停产车型是否会复产"));
    }

    #[test]
    fn empty_title_is_rejected() {
        assert!(!is_event_worthy(""));
        assert!(!is_event_worthy("   "));
    }

    #[test]
    fn slugify_hyphenates_and_strips() {
        assert_eq!(slugify("股价 会 上涨吗"), "股价-会-上涨吗");
        assert_eq!(slugify("CPI数据（6月）公布!"), "CPI数据6月公布");
    }

    #[test]
    fn slugify_caps_at_forty_chars() {
        let long = "长".repeat(60);
        assert_eq!(slugify(&long).chars().count(), 40);
    }

    #[test]
    fn slugify_strips_symbol_only_titles_to_empty() {
        assert_eq!(slugify("！？。"), "");
        let topics = vec![enriched(
            topic(Platform::Weibo, "！？。会", 100),
            judgment("社会新闻", 5),
            60.0,
        )];
        let events = synthesizer().synthesize(&topics, &stamp());
        assert_eq!(events[0].slug, "会");
    }

    #[test]
    fn build_event_falls_back_to_indexed_slug() {
        let item = enriched(
            topic(Platform::Douyin, "？？？", 100),
            judgment("社会新闻", 5),
            55.0,
        );
        let event = synthesizer().build_event(&item, &stamp(), 7);
        assert_eq!(event.slug, "topic-7");
        assert_eq!(event.event_id, "douyin_20240601_093005_007");
    }

    #[test]
    fn interrogative_title_keeps_its_own_phrasing() {
        let topics = vec![enriched(
            topic(Platform::Weibo, "房价是否见顶", 100),
            judgment("社会新闻", 7),
            70.0,
        )];
        let events = synthesizer().synthesize(&topics, &stamp());
        assert_eq!(events[0].question, "在未来7天内，房价是否见顶？");
    }

    #[test]
    fn declarative_title_is_wrapped_as_question() {
        let topics = vec![enriched(
            topic(Platform::Weibo, "油价将迎来调整", 100),
            judgment("社会新闻", 7),
            70.0,
        )];
        let events = synthesizer().synthesize(&topics, &stamp());
        assert_eq!(
            events[0].question,
            "在未来7天内，是否出现以下情况：油价将迎来调整？"
        );
    }

    #[test]
    fn event_ids_reflect_prefilter_positions() {
        let topics = vec![
            enriched(topic(Platform::Weibo, "股价会上涨吗", 100), judgment("财经", 8), 90.0),
            enriched(topic(Platform::Weibo, "无信号话题", 90), judgment("娱乐", 3), 40.0),
            enriched(topic(Platform::Zhihu, "CPI上涨", 80), judgment("财经", 7), 70.0),
        ];
        let events = synthesizer().synthesize(&topics, &stamp());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, "weibo_20240601_093005_001");
        assert_eq!(events[1].event_id, "zhihu_20240601_093005_003");
    }

    #[test]
    fn generation_is_deterministic() {
        let topics = vec![enriched(
            topic(Platform::Douyin, "金价会突破吗", 500),
            judgment("财经", 9),
            85.0,
        )];
        let first = synthesizer().synthesize(&topics, &stamp());
        let second = synthesizer().synthesize(&topics, &stamp());
        assert_eq!(first[0].event_id, second[0].event_id);
        assert_eq!(first[0].slug, second[0].slug);
        assert_eq!(first[0].question, second[0].question);
        assert_eq!(first[0].close_time, second[0].close_time);
    }

    #[test]
    fn close_and_resolve_times_sit_at_window_end() {
        let stamp = stamp();
        let topics = vec![enriched(
            topic(Platform::Weibo, "汇率会波动吗", 100),
            judgment("财经", 6),
            60.0,
        )];
        let events = synthesizer().synthesize(&topics, &stamp);
        let expected = stamp.started_at + Duration::days(7);
        assert_eq!(events[0].created_at, stamp.started_at);
        assert_eq!(events[0].close_time, expected);
        assert_eq!(events[0].resolve_time, expected);
        assert_eq!(events[0].timezone, "UTC+08:00");
    }

    #[test]
    fn importance_bands_on_total_score() {
        let cases = [(85.0, ImportanceLevel::High), (50.0, ImportanceLevel::Medium), (49.9, ImportanceLevel::Low)];
        for (score, expected) in cases {
            let topics = vec![enriched(
                topic(Platform::Weibo, "利率会下调吗", 100),
                judgment("财经", 5),
                score,
            )];
            let events = synthesizer().synthesize(&topics, &stamp());
            assert_eq!(events[0].importance_level, expected, "score {score}");
        }
    }

    #[test]
    fn probability_hint_is_score_over_100() {
        let topics = vec![enriched(
            topic(Platform::Weibo, "物价会回落吗", 100),
            judgment("财经", 5),
            67.89,
        )];
        let events = synthesizer().synthesize(&topics, &stamp());
        assert_eq!(events[0].probability_hint, 0.6789);
    }

    #[test]
    fn tags_deduplicate_preserving_order() {
        let topics = vec![enriched(
            topic_with_category(Platform::Weibo, "股市会反弹吗", 100, Some("财经")),
            judgment("财经", 8),
            75.0,
        )];
        let events = synthesizer().synthesize(&topics, &stamp());
        // nature and category are both 财经; the duplicate collapses.
        assert_eq!(events[0].tags, vec!["weibo".to_string(), "财经".to_string()]);
    }

    #[test]
    fn description_joins_nonempty_parts() {
        let mut raw = topic(Platform::Weibo, "股市会反弹吗", 100);
        raw.content = Some("沪指连续三日收跌".to_string());
        let mut item = enriched(raw, judgment("财经", 8), 75.0);
        item.judgment.reason = "宏观信号分歧".to_string();
        let events = synthesizer().synthesize(&[item], &stamp());
        assert_eq!(events[0].description, "股市会反弹吗。沪指连续三日收跌。宏观信号分歧");
    }

    #[test]
    fn link_feeds_resolution_sources() {
        let mut raw = topic(Platform::Zhihu, "GDP会回升吗", 100);
        raw.link = "https://www.zhihu.com/question/1".to_string();
        let events = synthesizer().synthesize(&[enriched(raw, judgment("财经", 6), 55.0)], &stamp());
        assert_eq!(events[0].resolution_sources, vec!["https://www.zhihu.com/question/1"]);

        let unlinked = topic(Platform::Weibo, "GDP会回落吗", 90);
        let events = synthesizer().synthesize(&[enriched(unlinked, judgment("财经", 6), 55.0)], &stamp());
        assert!(events[0].resolution_sources.is_empty());
    }

    #[test]
    fn binary_outcomes_are_fixed() {
        let topics = vec![enriched(
            topic(Platform::Weibo, "通胀会回落吗", 100),
            judgment("财经", 6),
            55.0,
        )];
        let events = synthesizer().synthesize(&topics, &stamp());
        assert_eq!(events[0].market_type, "binary");
        assert_eq!(events[0].outcomes.len(), 2);
        assert_eq!(events[0].outcomes[0].id, "yes");
        assert_eq!(events[0].outcomes[0].label, "是");
        assert_eq!(events[0].outcomes[1].id, "no");
        assert_eq!(events[0].outcomes[1].label, "否");
    }

    #[test]
    fn negative_offset_renders_with_sign() {
        assert_eq!(render_timezone(-5), "UTC-05:00");
        assert_eq!(render_timezone(0), "UTC+00:00");
    }
}
