use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{CompletionModel, RetryPolicy, Role, Talk};
use crate::error::{Result, TutorError};
use crate::Config;

const TEMPERATURE: f32 = 0.0;
const TOP_P: f32 = 1.0;
const FREQUENCY_PENALTY: f32 = 0.5;
const PRESENCE_PENALTY: f32 = 0.5;

/// OpenAI-compatible chat completion client (DeepSeek by default).
pub struct ChatClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl ChatClient {
    pub fn from_config(config: &Config, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| TutorError::Config(format!("cannot build chat HTTP client: {err}")))?;
        Ok(Self {
            client,
            api_key: config.chat_api_key.clone(),
            model: config.chat_model.clone(),
            url: config.chat_url.clone(),
            max_tokens: config.max_tokens,
            retry,
        })
    }

    async fn request(&self, messages: &[Talk]) -> Result<String> {
        let request = ChatRequest {
            messages,
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: self.max_tokens,
            top_p: TOP_P,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
        };
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() || err.is_connect() || err.is_request() {
                    TutorError::TransientService(format!("chat request failed: {err}"))
                } else {
                    TutorError::Completion(format!("chat request failed: {err}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let message = format!("chat API returned {status}: {body}");
            return Err(if is_transient(status) {
                TutorError::TransientService(message)
            } else {
                TutorError::Completion(message)
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| TutorError::Completion(format!("cannot parse chat response: {err}")))?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TutorError::Completion("chat response has no choices".to_string()))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl CompletionModel for ChatClient {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let messages = [
            Talk::new(Role::System, system_prompt.to_string()),
            Talk::new(Role::User, user_text.to_string()),
        ];
        debug!("Requesting completion from {} ({} chars)", self.model, user_text.len());
        self.retry.run(|| self.request(&messages)).await
    }
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    messages: &'a [Talk],
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Talk,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}
