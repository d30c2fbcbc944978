// LLM quality judging. The judge never fails the pipeline: any error on the
// wire, in parsing, or in the model's numbers collapses to the neutral
// fallback judgment.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use ai_client::util::{strip_code_fences, truncate_to_char_boundary};
use ai_client::ChatClient;
use heatcast_common::{AgentConfig, QualityJudgment, RawTopic};

#[async_trait]
pub trait TopicJudge: Send + Sync {
    /// Assess one topic. Implementations are expected to fold their own
    /// failures into `QualityJudgment::fallback()` rather than erroring.
    async fn judge(&self, topic: &RawTopic) -> Result<QualityJudgment>;
}

const SYSTEM_PROMPT: &str = r#"你是一个专业的社会热点分析专家，擅长判断网络话题的性质和影响力。

你需要分析话题标题和具体内容，评估其：
1. 话题性质（娱乐/社会新闻/科技/虚假信息/其他）
2. 社会影响力（1-10分）：话题对社会的影响范围和深度
3. 讨论深度（1-10分）：话题引发深度思考和讨论的潜力
4. 综合潜力分（1-10分）：综合评估话题成为"社会级爆点"的潜力

评分标准：
- 9-10分：全民关注的重大事件，具有深远影响
- 7-8分：引发广泛讨论的热点事件
- 5-6分：有一定关注度的普通话题
- 3-4分：娱乐性话题或影响力较小
- 1-2分：小范围关注的话题

注意：如果提供了具体内容，请结合内容进行深度分析，而不仅仅依赖标题。"#;

/// Format instructions derived from the `QualityJudgment` schema, appended
/// to the system prompt so the model returns parseable JSON.
fn format_instructions() -> String {
    let schema = schemars::schema_for!(QualityJudgment);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!("输出必须是符合以下 JSON Schema 的单个 JSON 对象，不要输出任何其他文字：\n{schema_json}")
}

/// Parse a model response into a judgment. Tolerates a markdown fence around
/// the JSON body and clamps out-of-range scores.
fn parse_judgment(raw: &str) -> Result<QualityJudgment> {
    let json = strip_code_fences(raw);
    let judgment: QualityJudgment =
        serde_json::from_str(json).context("judgment response was not valid JSON")?;
    Ok(judgment.clamped())
}

fn user_prompt(topic: &RawTopic, max_content_length: usize) -> String {
    let content_section = match &topic.content {
        Some(content) if !content.is_empty() => format!(
            "具体内容：\n{}",
            truncate_to_char_boundary(content, max_content_length)
        ),
        _ => "具体内容：暂无".to_string(),
    };
    format!(
        "请分析以下热榜话题：\n\n平台：{}\n标题：{}\n原始热度：{}\n{}\n\n请返回严格的JSON格式分析结果。",
        topic.platform, topic.title, topic.heat_score, content_section
    )
}

/// Judge backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmJudge {
    client: ChatClient,
    system_prompt: String,
    max_content_length: usize,
}

impl LlmJudge {
    pub fn new(client: ChatClient, max_content_length: usize) -> Self {
        Self {
            client,
            system_prompt: format!("{SYSTEM_PROMPT}\n\n{}", format_instructions()),
            max_content_length,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        if config.openai_api_key.is_empty() {
            warn!("OPENAI_API_KEY not set, every judgment will use the fallback");
        }
        let client = ChatClient::new(&config.openai_api_key, &config.llm_model)
            .with_base_url(&config.openai_api_base);
        Self::new(client, config.max_content_length)
    }
}

#[async_trait]
impl TopicJudge for LlmJudge {
    async fn judge(&self, topic: &RawTopic) -> Result<QualityJudgment> {
        let prompt = user_prompt(topic, self.max_content_length);
        let judged = self
            .client
            .chat_completion(&self.system_prompt, prompt)
            .await
            .and_then(|raw| parse_judgment(&raw));
        match judged {
            Ok(judgment) => {
                info!(
                    title = %topic.title,
                    potential = judgment.potential_score,
                    "Topic judged"
                );
                Ok(judgment)
            }
            Err(e) => {
                warn!(title = %topic.title, error = %e, "Judge failed, using fallback");
                Ok(QualityJudgment::fallback())
            }
        }
    }
}

/// Judge a list sequentially in `batch_size` chunks. Chunking is logging
/// granularity only: one judgment is in flight at a time and the output
/// matches the input by position and count. A judge that still returns
/// `Err` is substituted with the fallback, never propagated.
pub async fn judge_all(
    judge: &dyn TopicJudge,
    topics: &[RawTopic],
    batch_size: usize,
) -> Vec<QualityJudgment> {
    let batch_size = batch_size.max(1);
    let mut judgments = Vec::with_capacity(topics.len());
    for (batch_index, batch) in topics.chunks(batch_size).enumerate() {
        let start = batch_index * batch_size + 1;
        let end = start + batch.len() - 1;
        info!(from = start, to = end, total = topics.len(), "Judging topics");
        for topic in batch {
            let judgment = match judge.judge(topic).await {
                Ok(judgment) => judgment,
                Err(e) => {
                    warn!(
                        title = %topic.title,
                        error = %e,
                        "Judge errored, substituting fallback"
                    );
                    QualityJudgment::fallback()
                }
            };
            judgments.push(judgment);
        }
    }
    judgments
}
