//! Remote chat-completion provider.
//!
//! Builds the instruction prompt from the generation options and asks an
//! OpenAI-compatible `/chat/completions` endpoint for a single message.
//! There is no retry here; the fallback policy decides what happens on error.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use crate::types::{Category, GenerationOptions, MessageLength};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const SYSTEM_ROLE: &str = "You are a creative writer specializing in heartfelt, personalized good morning messages. Your messages are authentic, warm, and make people feel special.";
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.9;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("remote request failed: {0}")]
    Request(String),

    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote request timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not parse remote response: {0}")]
    Parse(String),

    #[error("remote response contained no message text")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout(Duration::ZERO)
        } else {
            GenerationError::Request(err.to_string())
        }
    }
}

/// Something that can turn generation options into a message over the network.
#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    async fn generate(&self, options: &GenerationOptions) -> Result<String, GenerationError>;
}

fn category_description(category: Category) -> &'static str {
    match category {
        Category::Sweet => "caring, warm, and affectionate",
        Category::Romantic => "deeply loving, passionate, and intimate",
        Category::Poetic => "artistic, lyrical, and beautifully crafted with metaphors",
    }
}

fn length_instruction(length: MessageLength) -> &'static str {
    match length {
        MessageLength::Short => "Keep it between 7-10 words - very brief and impactful",
        MessageLength::Medium => "Keep it between 10-20 words - concise but sweet",
        MessageLength::Long => "Keep it between 20-30 words - more detailed and expressive",
    }
}

pub fn build_prompt(options: &GenerationOptions) -> String {
    let emoji_instruction = if options.include_emojis {
        "Include relevant and tasteful emojis throughout the message."
    } else {
        "Do not include any emojis in the message."
    };

    let mut requirements = vec![
        "The message should be heartfelt and original",
        length_instruction(options.message_length),
        "Make it feel personal and genuine",
        emoji_instruction,
    ];
    if options.include_weather {
        requirements.push("Include a brief, positive reference to the morning weather or sunrise.");
    }
    requirements.push("Avoid cliches and overused phrases");
    requirements.push("Make each message unique and special");

    let requirements = requirements
        .iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate a unique, personalized good morning message that is {}.\n\n\
         Requirements:\n{}\n\n\
         Style: {}\n\
         Length: {}\n\n\
         Please respond with just the message text, no additional formatting or quotation marks.",
        category_description(options.category),
        requirements,
        options.category,
        options.message_length,
    )
}

/// OpenAI-compatible chat-completion backend.
pub struct OpenAiGenerator {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl RemoteGenerator for OpenAiGenerator {
    async fn generate(&self, options: &GenerationOptions) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_ROLE },
                { "role": "user", "content": build_prompt(options) },
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        debug!("Requesting {} message from {}", options.category, url);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| match GenerationError::from(e) {
                GenerationError::Timeout(_) => GenerationError::Timeout(self.timeout),
                other => other,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or("");

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(category: Category, length: MessageLength, emojis: bool, weather: bool) -> GenerationOptions {
        GenerationOptions {
            category,
            include_emojis: emojis,
            include_weather: weather,
            message_length: length,
        }
    }

    fn generator(server: &MockServer) -> OpenAiGenerator {
        OpenAiGenerator::new(server.uri(), "sk-test", DEFAULT_MODEL, Duration::from_secs(5))
    }

    #[test]
    fn prompt_substitutes_every_option() {
        let prompt = build_prompt(&options(Category::Poetic, MessageLength::Long, false, true));

        assert!(prompt.starts_with(
            "Generate a unique, personalized good morning message that is artistic, lyrical, and beautifully crafted with metaphors."
        ));
        assert!(prompt.contains("- Keep it between 20-30 words"));
        assert!(prompt.contains("- Do not include any emojis in the message."));
        assert!(prompt.contains("morning weather or sunrise"));
        assert!(prompt.contains("- Avoid cliches and overused phrases\n- Make each message unique and special"));
        assert!(prompt.contains("\nStyle: poetic\nLength: long\n"));
        assert!(prompt.ends_with("no additional formatting or quotation marks."));
    }

    #[test]
    fn prompt_omits_weather_line_when_not_requested() {
        let prompt = build_prompt(&options(Category::Sweet, MessageLength::Short, true, false));

        assert!(prompt.contains("caring, warm, and affectionate"));
        assert!(prompt.contains("7-10 words"));
        assert!(prompt.contains("tasteful emojis"));
        assert!(!prompt.contains("weather"));
        assert!(!prompt.contains("- \n"));
        assert_eq!(prompt, build_prompt(&options(Category::Sweet, MessageLength::Short, true, false)));
    }

    #[tokio::test]
    async fn returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-4o", "max_tokens": 150 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "  Good morning, bright heart!  \n" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = generator(&server)
            .generate(&GenerationOptions::new(Category::Sweet))
            .await
            .unwrap();
        assert_eq!(message, "Good morning, bright heart!");
    }

    #[tokio::test]
    async fn auth_failure_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&GenerationOptions::new(Category::Romantic))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Status { status: 401, .. }), "{err}");
    }

    #[tokio::test]
    async fn blank_content_is_an_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "   " } }]
            })))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&GenerationOptions::new(Category::Poetic))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_choices_is_an_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&GenerationOptions::new(Category::Poetic))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn slow_remote_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] })),
            )
            .mount(&server)
            .await;

        let generator =
            OpenAiGenerator::new(server.uri(), "sk-test", DEFAULT_MODEL, Duration::from_millis(100));
        let err = generator
            .generate(&GenerationOptions::new(Category::Sweet))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(d) if d == Duration::from_millis(100)));
    }
}
