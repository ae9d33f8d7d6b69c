//! 임베딩 모듈 - watsonx.ai API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 임베딩 프로바이더입니다.
//! 호출 실패는 예외가 아닌 정상 결과(`Err` = unavailable)로 취급합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = WatsonxEmbedding::from_config(&config, token)?;
//! match embedder.embed("Hello, world!").await {
//!     Ok(vector) => { /* ... */ }
//!     Err(e) => tracing::warn!("embedding unavailable: {}", e),
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::TokenSource;
use crate::config::Config;
use crate::error::EmbeddingError;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 호출당 정확히 한 번의 외부 요청을 보내며, 결과를 캐싱하지 않습니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// watsonx.ai Embedding
// ============================================================================

/// 임베딩 API 경로 및 버전
const EMBEDDINGS_PATH: &str = "/ml/v1/text/embeddings";
const EMBEDDINGS_VERSION: &str = "2023-11-22";

/// watsonx.ai 임베딩 구현체
pub struct WatsonxEmbedding {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    model_id: Option<String>,
    token: Arc<dyn TokenSource>,
}

impl WatsonxEmbedding {
    /// 새 임베딩 인스턴스 생성
    ///
    /// `model_id`가 `None`이면 모든 호출이 네트워크 요청 없이
    /// `EmbeddingError::NotConfigured`를 반환합니다.
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        model_id: Option<String>,
        token: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            model_id,
            token,
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &Config, token: Arc<dyn TokenSource>) -> reqwest::Result<Self> {
        Ok(Self::new(
            config.http_client()?,
            config.endpoint.clone(),
            config.project_id.clone(),
            config.embedding_model_id.clone(),
            token,
        ))
    }

    /// 임베딩 모델 설정 여부
    pub fn is_configured(&self) -> bool {
        self.model_id.is_some()
    }

    fn url(&self) -> String {
        format!(
            "{}{}?version={}",
            self.endpoint, EMBEDDINGS_PATH, EMBEDDINGS_VERSION
        )
    }
}

/// 임베딩 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    inputs: [&'a str; 1],
}

/// 임베딩 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    results: Vec<EmbedResult>,
}

#[derive(Debug, Deserialize)]
struct EmbedResult {
    embedding: Vec<f32>,
}

/// watsonx 에러 응답
#[derive(Debug, Deserialize)]
pub(crate) struct WatsonxError {
    #[serde(default)]
    pub(crate) errors: Vec<WatsonxErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatsonxErrorDetail {
    pub(crate) message: String,
}

/// 에러 본문에서 사람이 읽을 메시지 추출
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<WatsonxError>(body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|d| d.message)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl EmbeddingProvider for WatsonxEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let Some(model_id) = self.model_id.as_deref() else {
            tracing::warn!("Embedding model id not set. Skipping embedding.");
            return Err(EmbeddingError::NotConfigured(
                "WATSONX_EMBEDDING_MODEL_ID is not set".to_string(),
            ));
        };

        let token = self.token.bearer_token().await?;

        tracing::debug!("Getting embedding for: {:?} using {}", text, model_id);

        let request = EmbedRequest {
            model_id,
            project_id: &self.project_id,
            inputs: [text],
        };

        let response = self
            .client
            .post(self.url())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::warn!("Embedding API error ({}): {}", status, message);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        let embedding = parsed
            .results
            .into_iter()
            .next()
            .map(|r| r.embedding)
            .ok_or_else(|| EmbeddingError::MalformedResponse("no results".to_string()))?;

        if embedding.is_empty() {
            return Err(EmbeddingError::MalformedResponse(
                "empty embedding".to_string(),
            ));
        }

        Ok(embedding)
    }

    fn name(&self) -> &str {
        self.model_id.as_deref().unwrap_or("unconfigured")
    }
}

// ============================================================================
// Tests
// ============================================================================
