use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use url::Url;

use crate::dto::grading_dto::{GradeReport, GradingRequest};
use crate::error::{Error, Result};
use crate::services::grading_service::Grader;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const VOICE_FALLBACK_REPLY: &str = "Sorry, I could not generate a response.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Models often wrap JSON replies in a fenced block; drop the fences.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn grading_prompt(request: &GradingRequest, today: &str) -> String {
    let blocks = request
        .items
        .iter()
        .map(|item| {
            let mut block = format!(
                "Question {}: {}\nStudent's Answer: {}",
                item.id, item.question, item.answer
            );
            if let Some(key) = &item.correct_answer {
                block.push_str(&format!("\nCorrect Answer (Key Points): {}", key));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are a strict assessment grader. Grade the following student answers.
Today's date: {today}

Assessment: {name}
Max marks per question: {per}
Total full marks: {full}

{blocks}

For each question, assign a score from 0 to {per} in increments of 0.5.

Grading rules:
1. Correctness against the provided key points decides the score.
2. A short but fully correct answer gets full marks; length earns nothing.
3. Factual errors lose marks even inside a detailed answer.
4. Ignore style and minor grammar unless they make the answer unclear.
5. Without key points, grade on general accuracy and relevance.

Give a brief reason of one or two sentences per question.

Respond ONLY with JSON in this exact format, using the question numbers above:
{{"grades": [{{"question": 1, "score": 0.5, "feedback": "brief reason"}}], "totalScore": 0.5}}"#,
        today = today,
        name = request.assessment_name,
        per = request.marks_per_question,
        full = request.full_marks,
        blocks = blocks,
    )
}

fn voice_instruction(topic: Option<&str>) -> String {
    match topic.map(str::trim).filter(|t| !t.is_empty()) {
        Some(topic) => format!(
            "You are a helpful medical education AI assistant. The current discussion topic is: \"{}\". \
             Keep responses concise (2-3 sentences max) and conversational since this is a voice chat. \
             Focus on the topic and provide accurate medical information. Always respond in Thai language.",
            topic
        ),
        None => "You are a helpful medical education AI assistant. Keep responses concise \
                 (2-3 sentences max) and conversational since this is a voice chat. \
                 Always respond in Thai language."
            .to_string(),
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> Result<Url> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Gemini API not configured".to_string()))?;
        Url::parse_with_params(
            &format!("{}/{}:generateContent", GEMINI_BASE, self.model),
            &[("key", key)],
        )
        .map_err(|e| Error::Internal(format!("Invalid Gemini URL: {}", e)))
    }

    /// Text of the first candidate, if the model produced one.
    async fn generate(&self, payload: JsonValue) -> Result<Option<String>> {
        let res = self
            .client
            .post(self.endpoint()?)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::error!(%status, body = %text, "Gemini API error");
            return Err(Error::Upstream(format!("Gemini API Error {}", status)));
        }

        let body: JsonValue = res.json().await?;
        Ok(body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|t| t.as_str())
            .map(str::to_string))
    }

    pub async fn voice_chat(&self, messages: &[ChatMessage], topic: Option<&str>) -> Result<String> {
        let contents: Vec<JsonValue> = messages
            .iter()
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();

        let payload = json!({
            "system_instruction": {"parts": [{"text": voice_instruction(topic)}]},
            "contents": contents,
            "generationConfig": {"maxOutputTokens": 300, "temperature": 0.7}
        });

        Ok(self
            .generate(payload)
            .await?
            .unwrap_or_else(|| VOICE_FALLBACK_REPLY.to_string()))
    }
}

#[async_trait]
impl Grader for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn grade(&self, request: &GradingRequest) -> Result<GradeReport> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let payload = json!({
            "contents": [{"role": "user", "parts": [{"text": grading_prompt(request, &today)}]}],
            "generationConfig": {"maxOutputTokens": 1000, "temperature": 0.3}
        });

        let reply = self.generate(payload).await?.unwrap_or_default();
        serde_json::from_str::<GradeReport>(strip_code_fences(&reply))
            .map_err(|e| Error::Upstream(format!("Unreadable grading reply: {}", e)))
    }
}
