//! Minimal OpenAI client for our use-cases.
//!
//! We only call chat.completions and request either plain text or a strict
//! JSON object. Calls are instrumented and log model names, latencies, and
//! response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{LevelInfo, Problem, ProblemSource};
use crate::util::fill_template;

#[derive(Clone)]
pub struct OpenAI {
    pub client: reqwest::Client,
    pub api_key: String,
    pub base_url: String,
    pub fast_model: String,
    pub strong_model: String,
}

/// Shape the model must return for problem generation.
#[derive(Deserialize)]
struct GenProblem {
    question: String,
    options: Vec<String>,
    answer: usize,
    explanation: String,
}

/// Structural checks applied before a generated problem is accepted.
/// The model output is never trusted blindly.
fn validate_generated(gen: &GenProblem) -> Result<(), String> {
    if gen.question.trim().is_empty() {
        return Err("empty question".into());
    }
    if gen.options.len() < 2 || gen.options.len() > 6 {
        return Err(format!("bad option count: {}", gen.options.len()));
    }
    if gen.options.iter().any(|o| o.trim().is_empty()) {
        return Err("empty option text".into());
    }
    if gen.answer >= gen.options.len() {
        return Err(format!(
            "answer index {} out of range for {} options",
            gen.answer,
            gen.options.len()
        ));
    }
    Ok(())
}

impl OpenAI {
    /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let fast_model =
            std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let strong_model =
            std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .ok()?;

        Some(Self { client, api_key, base_url, fast_model, strong_model })
    }

    /// Plain-text chat completion. Used for personalized explanations.
    #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
    async fn chat_plain(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessageReq { role: "system".into(), content: system.into() },
                ChatMessageReq { role: "user".into(), content: user.into() },
            ],
            temperature,
            response_format: None,
            max_tokens: None,
        };

        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "codequiz-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let msg = extract_openai_error(&body).unwrap_or(body);
            return Err(format!("OpenAI HTTP {}: {}", status, msg));
        }

        let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
        if let Some(usage) = &body.usage {
            info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
        }
        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(text)
    }

    /// JSON-object chat completion. Generic over the target type T.
    #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
    async fn chat_json<T: for<'a> Deserialize<'a>>(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<T, String> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessageReq { role: "system".into(), content: system.into() },
                ChatMessageReq { role: "user".into(), content: user.into() },
            ],
            temperature,
            response_format: Some(ResponseFormat { r#type: "json_object".into() }),
            max_tokens: None,
        };

        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "codequiz-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let msg = extract_openai_error(&body).unwrap_or(body);
            return Err(format!("OpenAI HTTP {}: {}", status, msg));
        }

        let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
        if let Some(usage) = &body.usage {
            info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
        }
        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        serde_json::from_str::<T>(&text).map_err(|e| format!("JSON parse error: {}", e))
    }

    // --- High-level helpers (domain-specialized) ---

    /// Generate a fresh multiple-choice problem for a catalog level.
    /// The response is validated structurally before we accept it.
    #[instrument(
        level = "info",
        skip(self, prompts, level_info),
        fields(level = level_info.level, model = %self.strong_model)
    )]
    pub async fn generate_problem(
        &self,
        prompts: &Prompts,
        level_info: &LevelInfo,
    ) -> Result<Problem, String> {
        let level_str = level_info.level.to_string();
        let user = fill_template(
            &prompts.problem_user_template,
            &[
                ("level", level_str.as_str()),
                ("title", level_info.title.as_str()),
                ("description", level_info.description.as_str()),
            ],
        );

        let start = std::time::Instant::now();
        let result = self
            .chat_json::<GenProblem>(&self.strong_model, &prompts.problem_system, &user, 0.95)
            .await;
        let elapsed = start.elapsed();

        let gen = match result {
            Ok(gen) => {
                info!(?elapsed, "Model response received successfully");
                gen
            }
            Err(e) => {
                error!(?elapsed, error = %e, "Model call failed during problem generation");
                return Err(format!("Model generation failed: {e}"));
            }
        };

        validate_generated(&gen).map_err(|e| format!("Rejected generated problem: {e}"))?;

        let problem = Problem {
            id: Uuid::new_v4().to_string(),
            level: level_info.level,
            source: ProblemSource::Generated,
            question: gen.question,
            options: gen.options,
            answer: gen.answer,
            explanation: gen.explanation,
            created_at: chrono::Utc::now(),
        };

        info!(
            problem_id = %problem.id,
            question_preview = %problem.question.chars().take(40).collect::<String>(),
            option_count = problem.options.len(),
            "Problem successfully generated"
        );

        Ok(problem)
    }

    /// Personalized explanation of a graded submission.
    #[instrument(level = "info", skip(self, prompts, problem), fields(problem_id = %problem.id, selected_option))]
    pub async fn explain_answer(
        &self,
        prompts: &Prompts,
        problem: &Problem,
        selected_option: usize,
    ) -> Result<String, String> {
        let options = problem.options.join(" | ");
        let correct = problem
            .options
            .get(problem.answer)
            .cloned()
            .unwrap_or_default();
        let selected = problem
            .options
            .get(selected_option)
            .cloned()
            .unwrap_or_else(|| format!("(option {})", selected_option));

        let user = fill_template(
            &prompts.explanation_user_template,
            &[
                ("question", problem.question.as_str()),
                ("options", options.as_str()),
                ("correct", correct.as_str()),
                ("selected", selected.as_str()),
                ("explanation", problem.explanation.as_str()),
            ],
        );
        self.chat_plain(&self.fast_model, &prompts.explanation_system, &user, 0.2)
            .await
    }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq {
    role: String,
    content: String,
}
#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    r#type: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
    #[serde(default)]
    total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct EWrap {
        error: EObj,
    }
    #[derive(Deserialize)]
    struct EObj {
        message: String,
    }
    match serde_json::from_str::<EWrap>(body) {
        Ok(w) => Some(w.error.message),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen(options: usize, answer: usize) -> GenProblem {
        GenProblem {
            question: "What is 1 + 1?".into(),
            options: (0..options).map(|i| format!("option {i}")).collect(),
            answer,
            explanation: "Basic arithmetic.".into(),
        }
    }

    #[test]
    fn validation_accepts_well_formed_output() {
        assert!(validate_generated(&gen(4, 2)).is_ok());
    }

    #[test]
    fn validation_rejects_out_of_range_answer_index() {
        assert!(validate_generated(&gen(4, 4)).is_err());
    }

    #[test]
    fn validation_rejects_degenerate_option_lists() {
        assert!(validate_generated(&gen(1, 0)).is_err());
        assert!(validate_generated(&gen(7, 0)).is_err());
    }
}
