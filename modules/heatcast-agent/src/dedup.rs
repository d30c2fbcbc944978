use std::collections::HashSet;

use tracing::info;

use heatcast_common::RawTopic;

/// Drop repeated titles across the merged platform lists, compared
/// case-insensitively. First occurrence wins, so input order (source
/// registration order) decides which platform keeps a cross-posted topic.
pub fn dedup_by_title(topics: Vec<RawTopic>) -> Vec<RawTopic> {
    let before = topics.len();
    let mut seen: HashSet<String> = HashSet::new();
    let deduped: Vec<RawTopic> = topics
        .into_iter()
        .filter(|topic| seen.insert(topic.title.to_lowercase()))
        .collect();
    let removed = before - deduped.len();
    if removed > 0 {
        info!(removed, "Title-based dedup");
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::topic;
    use heatcast_common::Platform;

    #[test]
    fn keeps_first_occurrence_case_insensitively() {
        let deduped = dedup_by_title(vec![
            topic(Platform::Weibo, "Foo", 100),
            topic(Platform::Douyin, "foo", 90),
            topic(Platform::Weibo, "Bar", 80),
        ]);
        let titles: Vec<&str> = deduped.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Foo", "Bar"]);
        assert_eq!(deduped[0].platform, Platform::Weibo);
    }

    #[test]
    fn chinese_titles_need_exact_match() {
        let deduped = dedup_by_title(vec![
            topic(Platform::Weibo, "股价会上涨吗", 100),
            topic(Platform::Zhihu, "股价会上涨吗", 90),
            topic(Platform::Zhihu, "油价会上涨吗", 80),
        ]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn distinct_titles_pass_through_in_order() {
        let deduped = dedup_by_title(vec![
            topic(Platform::Weibo, "甲", 3),
            topic(Platform::Weibo, "乙", 2),
            topic(Platform::Weibo, "丙", 1),
        ]);
        let titles: Vec<&str> = deduped.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["甲", "乙", "丙"]);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(dedup_by_title(Vec::new()).is_empty());
    }
}
