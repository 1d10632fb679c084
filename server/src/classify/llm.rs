//! Stage 4: LLM fallback (§4.4), generalizing the teacher's
//! `prompt/mistral.rs::send_category_prompt` (reqwest + rate-limiter +
//! JSON-parse-with-regex-fallback shape) into the full category/
//! sub_category/priority/labels/score response this stage produces.
use async_trait::async_trait;
use lazy_static::lazy_static;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::config::cfg;

use super::{semantic_cache::SemanticCacheStore, ClassificationInput, ClassificationResult};

const AI_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";

const VALID_CATEGORIES: &[&str] = &[
    "primary", "work", "personal", "newsletter", "notification", "marketing", "social", "finance", "travel", "shopping", "spam", "other",
];

lazy_static! {
    static ref SYSTEM_PROMPT: String = format!(
        "You are an email classification assistant. Choose exactly one category from [{}], an optional sub_category, a priority in [0,1], and zero or more labels. Respond only with a JSON object with keys category, sub_category, priority, labels.",
        cfg.categories.join(", ")
    );
}

#[derive(Debug, Deserialize)]
struct LlmAnswer {
    category: String,
    #[serde(default)]
    sub_category: Option<String>,
    #[serde(default)]
    priority: f64,
    #[serde(default)]
    labels: Vec<String>,
}

#[async_trait]
pub trait LlmClassifier: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;
}

pub struct MistralClassifier {
    http: reqwest::Client,
    rate_limiter: leaky_bucket::RateLimiter,
}

impl MistralClassifier {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            rate_limiter: leaky_bucket::RateLimiter::builder()
                .initial(cfg.api.prompt_limits.refill_amount as usize)
                .interval(std::time::Duration::from_millis(cfg.api.prompt_limits.refill_interval_ms))
                .refill(cfg.api.prompt_limits.refill_amount as usize)
                .build(),
        }
    }
}

#[async_trait]
impl LlmClassifier for MistralClassifier {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(AI_ENDPOINT)
            .bearer_auth(&cfg.api.key)
            .json(&json!({
                "model": &cfg.model.id,
                "temperature": cfg.model.temperature,
                "messages": [
                    { "role": "system", "content": system_prompt },
                    { "role": "user", "content": user_prompt },
                ],
                "response_format": { "type": "json_object" },
            }))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let content = resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("no choices in LLM response"))?;

        Ok(content.to_string())
    }
}

fn parse_answer(raw: &str) -> Option<LlmAnswer> {
    if let Ok(answer) = serde_json::from_str::<LlmAnswer>(raw) {
        return Some(answer);
    }

    static RE_CATEGORY: Lazy<Regex> = Lazy::new(|| Regex::new(r#""category"\s*:\s*"([^"]*)""#).unwrap());
    static RE_PRIORITY: Lazy<Regex> = Lazy::new(|| Regex::new(r#""priority"\s*:\s*([0-9.]+)"#).unwrap());

    let category = RE_CATEGORY.captures(raw)?.get(1)?.as_str().to_string();
    let priority = RE_PRIORITY.captures(raw).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse::<f64>().ok()).unwrap_or(0.5);

    Some(LlmAnswer { category, sub_category: None, priority, labels: vec![] })
}

fn sanitize_category(category: &str) -> String {
    if VALID_CATEGORIES.contains(&category) {
        category.to_string()
    } else {
        "other".to_string()
    }
}

fn neutral_result() -> ClassificationResult {
    ClassificationResult {
        category: "other".into(),
        sub_category: Some("normal".into()),
        priority: 0.50,
        labels: vec![],
        score: 0.50,
        stage: "llm".into(),
        source: "llm_error".into(),
        signals: vec![],
        llm_used: true,
        processing_time_ms: 0,
    }
}

pub async fn classify(client: &dyn LlmClassifier, semantic_cache: &dyn SemanticCacheStore, input: &ClassificationInput) -> ClassificationResult {
    let subject = &input.subject;
    let body = input.body.as_deref().unwrap_or_default();
    let user_prompt = format!("<subject>{subject}</subject>\n<body>{body}</body>");

    let raw = match client.complete(&SYSTEM_PROMPT, &user_prompt).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(?err, "LLM classification request failed");
            return neutral_result();
        }
    };

    let Some(answer) = parse_answer(&raw) else {
        tracing::warn!(%raw, "could not parse LLM classification response");
        return neutral_result();
    };

    let category = sanitize_category(&answer.category);
    let sub_category = answer.sub_category.filter(|_| category != "other" || answer.category == "other");
    let priority = if answer.priority.is_nan() { 0.5 } else { answer.priority.clamp(0.0, 1.0) };

    let result = ClassificationResult {
        category,
        sub_category,
        priority,
        labels: answer.labels,
        score: priority,
        stage: "llm".into(),
        source: "mistral".into(),
        signals: vec![],
        llm_used: true,
        processing_time_ms: 0,
    };

    if result.score >= cfg.classification.semantic_cache_write_threshold {
        if let Some(embedding) = &input.embedding {
            let dup_threshold = cfg.classification.semantic_cache_dedup_similarity;
            match semantic_cache.has_near_duplicate(input.user_id, embedding, dup_threshold).await {
                Ok(false) => {
                    let user_id = input.user_id;
                    let embedding = embedding.clone();
                    let result_clone = result.clone();
                    // semantic_cache writes are best-effort; failures are logged, not propagated
                    if let Err(err) = semantic_cache.write_entry(user_id, &embedding, &result_clone).await {
                        tracing::warn!(?err, "semantic cache write-back failed");
                    }
                }
                Ok(true) => {}
                Err(err) => tracing::warn!(?err, "semantic cache dedup check failed"),
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_handles_valid_json() {
        let answer = parse_answer(r#"{"category":"finance","priority":0.8}"#).unwrap();
        assert_eq!(answer.category, "finance");
        assert_eq!(answer.priority, 0.8);
    }

    #[test]
    fn parse_answer_falls_back_to_regex() {
        let answer = parse_answer(r#"category": "marketing", not quite json"#);
        assert!(answer.is_none());
        let answer = parse_answer(r#"{"category": "marketing", "priority": 0.6 trailing garbage"#).unwrap();
        assert_eq!(answer.category, "marketing");
    }

    #[test]
    fn sanitize_category_collapses_unknown() {
        assert_eq!(sanitize_category("bogus"), "other");
        assert_eq!(sanitize_category("finance"), "finance");
    }
}
