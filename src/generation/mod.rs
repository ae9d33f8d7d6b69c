//! 언어 생성 모듈 - watsonx.ai chat API 클라이언트
//!
//! 역할이 지정된 메시지 목록을 받아 단일 텍스트 응답을 반환합니다.
//! 텍스트 전용 메시지와 이미지가 포함된 멀티파트 메시지를 모두 지원합니다.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::TokenSource;
use crate::config::Config;
use crate::embedding::error_message;
use crate::error::GenerationError;

// ============================================================================
// Message Types
// ============================================================================

/// 메시지 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// 멀티파트 콘텐츠 조각
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// 메시지 콘텐츠 (텍스트 또는 멀티파트)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// 실질적인 내용이 없는지 확인
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Parts(parts) => parts.iter().all(|part| match part {
                ContentPart::Text { text } => text.is_empty(),
                ContentPart::ImageUrl { image_url } => image_url.url.is_empty(),
            }),
        }
    }
}

/// chat 메시지
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// 생성 옵션
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// 기본 모델 대신 사용할 모델
    pub model_id: Option<String>,
    /// 최대 생성 토큰 수 (`None`이면 기본값)
    pub max_new_tokens: Option<u32>,
}

/// 기본 최대 생성 토큰 수
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 300;
const MIN_NEW_TOKENS: u32 = 10;

// ============================================================================
// ChatModel Trait
// ============================================================================

/// 언어 생성 협력자 트레이트
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 메시지 목록으로 단일 응답 생성
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, GenerationError>;

    /// 기본 모델 ID
    fn model_id(&self) -> &str;
}

// ============================================================================
// watsonx.ai Chat
// ============================================================================

const CHAT_PATH: &str = "/ml/v1/text/chat";
const CHAT_VERSION: &str = "2023-05-29";

/// watsonx.ai chat 클라이언트
pub struct WatsonxChat {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    model_id: String,
    token: Arc<dyn TokenSource>,
}

impl WatsonxChat {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        model_id: impl Into<String>,
        token: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            model_id: model_id.into(),
            token,
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &Config, token: Arc<dyn TokenSource>) -> reqwest::Result<Self> {
        Ok(Self::new(
            config.http_client()?,
            config.endpoint.clone(),
            config.project_id.clone(),
            config.model_id.clone(),
            token,
        ))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    project_id: &'a str,
    model_id: &'a str,
    messages: &'a [ChatMessage],
    parameters: ChatParameters,
}

#[derive(Debug, Serialize)]
struct ChatParameters {
    decoding_method: &'static str,
    max_new_tokens: u32,
    min_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 마지막 user 메시지가 비어있으면 거부
fn validate_messages(messages: &[ChatMessage]) -> Result<(), GenerationError> {
    if messages.len() > 1 {
        if let Some(last) = messages.last() {
            if last.role == Role::User && last.content.is_blank() {
                return Err(GenerationError::EmptyUserMessage);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl ChatModel for WatsonxChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, GenerationError> {
        validate_messages(messages)?;

        let token = self.token.bearer_token().await?;
        let model_id = options.model_id.as_deref().unwrap_or(&self.model_id);

        tracing::info!("Calling watsonx chat: {} ({} messages)", model_id, messages.len());

        let request = ChatRequest {
            project_id: &self.project_id,
            model_id,
            messages,
            parameters: ChatParameters {
                decoding_method: "greedy",
                max_new_tokens: options.max_new_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS),
                min_new_tokens: MIN_NEW_TOKENS,
            },
        };

        let response = self
            .client
            .post(format!("{}{}?version={}", self.endpoint, CHAT_PATH, CHAT_VERSION))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::error!("watsonx chat error ({}): {}", status, message);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyReply)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Tests
// ============================================================================
