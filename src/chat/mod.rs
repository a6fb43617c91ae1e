use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod deepseek;
pub mod retry;

pub use retry::RetryPolicy;

/// Prompt used when asking the model to repair an extracted page.
pub const REFINE_PROMPT: &str = "You are a Chinese and linguistic expert. \
Fix the following broken text into a cohesive sentence. \
Be sure to also add tones to pinyin with missing tones.\n\n\
If you are unsure of the correct answer, please simply return the original text.\n\n\
Do not mention any additional information that is not in the text, such as \"Sure, here is ...\".\n\n\
Only return the corrected text or the original text if you are not able to correct it.";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Talk {
    pub role: Role,
    pub content: String,
}

impl Talk {
    pub fn new(role: Role, content: String) -> Self {
        Self { role, content }
    }
}

/// A chat model answering one system + user exchange.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}
