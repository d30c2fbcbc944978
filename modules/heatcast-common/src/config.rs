use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use crate::error::HeatcastError;
use crate::types::{Platform, ScoreWeights};

/// Pipeline configuration. Every field has a default; environment variables
/// override individual values. Components receive the pieces they need at
/// construction, never a global.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    // Sources
    pub enabled_platforms: Vec<Platform>,
    pub fetch_limit: usize,

    // Scoring
    pub weights: ScoreWeights,
    pub breakout_threshold: f64,

    // Prediction events
    pub resolve_days: i64,
    pub importance_high: f64,
    pub importance_medium: f64,
    pub timezone_offset_hours: i32,

    // LLM judge
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub llm_model: String,
    pub judge_batch_size: usize,
    pub max_content_length: usize,

    // Output
    pub output_dir: PathBuf,
    pub predict_dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled_platforms: vec![Platform::Weibo, Platform::Douyin, Platform::Zhihu],
            fetch_limit: 20,
            weights: ScoreWeights::default(),
            breakout_threshold: 80.0,
            resolve_days: 7,
            importance_high: 80.0,
            importance_medium: 50.0,
            timezone_offset_hours: 8,
            openai_api_key: String::new(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4-turbo-preview".to_string(),
            judge_batch_size: 5,
            max_content_length: 2000,
            output_dir: PathBuf::from("./output"),
            predict_dir: PathBuf::from("./predict"),
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset. Malformed values are errors, not silent
    /// defaults.
    pub fn from_env() -> Result<Self, HeatcastError> {
        let defaults = Self::default();

        let enabled_platforms = match env::var("ENABLED_PLATFORMS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Platform::from_str)
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => defaults.enabled_platforms,
        };

        let timezone_offset_hours =
            parsed_env("TIMEZONE_OFFSET_HOURS", defaults.timezone_offset_hours)?;
        if !(-23..=23).contains(&timezone_offset_hours) {
            return Err(HeatcastError::Config(format!(
                "TIMEZONE_OFFSET_HOURS must be between -23 and 23, got {timezone_offset_hours}"
            )));
        }

        Ok(Self {
            enabled_platforms,
            fetch_limit: parsed_env("FETCH_LIMIT", defaults.fetch_limit)?,
            weights: ScoreWeights {
                heat: parsed_env("WEIGHT_HEAT", defaults.weights.heat)?,
                discussion: parsed_env("WEIGHT_DISCUSSION", defaults.weights.discussion)?,
                llm: parsed_env("WEIGHT_LLM", defaults.weights.llm)?,
            },
            breakout_threshold: parsed_env("SCORE_THRESHOLD", defaults.breakout_threshold)?,
            resolve_days: parsed_env("PREDICT_RESOLVE_DAYS", defaults.resolve_days)?,
            importance_high: parsed_env("IMPORTANCE_HIGH", defaults.importance_high)?,
            importance_medium: parsed_env("IMPORTANCE_MEDIUM", defaults.importance_medium)?,
            timezone_offset_hours,
            openai_api_key: string_env("OPENAI_API_KEY", &defaults.openai_api_key),
            openai_api_base: string_env("OPENAI_API_BASE", &defaults.openai_api_base),
            llm_model: string_env("LLM_MODEL", &defaults.llm_model),
            judge_batch_size: parsed_env("JUDGE_BATCH_SIZE", defaults.judge_batch_size)?,
            max_content_length: parsed_env("MAX_CONTENT_LENGTH", defaults.max_content_length)?,
            output_dir: PathBuf::from(string_env("OUTPUT_DIR", "./output")),
            predict_dir: PathBuf::from(string_env("PREDICT_DIR", "./predict")),
        })
    }

    /// Log the effective configuration without leaking the API key.
    pub fn log_redacted(&self) {
        let platforms = self
            .enabled_platforms
            .iter()
            .map(Platform::to_string)
            .collect::<Vec<_>>()
            .join(",");
        info!(
            platforms = %platforms,
            fetch_limit = self.fetch_limit,
            weight_heat = self.weights.heat,
            weight_discussion = self.weights.discussion,
            weight_llm = self.weights.llm,
            breakout_threshold = self.breakout_threshold,
            resolve_days = self.resolve_days,
            importance_high = self.importance_high,
            importance_medium = self.importance_medium,
            model = %self.llm_model,
            api_key_set = !self.openai_api_key.is_empty(),
            output_dir = %self.output_dir.display(),
            predict_dir = %self.predict_dir.display(),
            "Configuration loaded"
        );
    }
}

fn string_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T, HeatcastError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            HeatcastError::Config(format!("{key} must be a valid number, got '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AgentConfig::default();
        assert_eq!(config.fetch_limit, 20);
        assert_eq!(config.breakout_threshold, 80.0);
        assert_eq!(config.weights.heat, 0.5);
        assert_eq!(config.weights.discussion, 0.3);
        assert_eq!(config.weights.llm, 0.2);
        assert_eq!(config.resolve_days, 7);
        assert_eq!(config.importance_high, 80.0);
        assert_eq!(config.importance_medium, 50.0);
        assert_eq!(config.timezone_offset_hours, 8);
        assert_eq!(config.judge_batch_size, 5);
        assert_eq!(config.enabled_platforms.len(), 3);
    }
}
