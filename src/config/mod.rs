//! 설정 모듈 - 환경변수 기반 watsonx 설정
//!
//! 모든 값은 환경변수에서 읽습니다. 필수 값이 없어도 실패하지 않으며,
//! 해당 기능이 "unavailable"로 동작합니다.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// 기본 watsonx 리전 엔드포인트
pub const DEFAULT_ENDPOINT: &str = "https://us-south.ml.cloud.ibm.com";

/// 기본 텍스트 모델
pub const DEFAULT_MODEL_ID: &str = "google/flan-ul2";

/// 기본 요청 타임아웃 (초)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_ENDPOINT: &str = "WATSONX_API_ENDPOINT";
const ENV_PROJECT_ID: &str = "WATSONX_PROJECT_ID";
const ENV_MODEL_ID: &str = "WATSONX_MODEL_ID";
const ENV_EMBEDDING_MODEL_ID: &str = "WATSONX_EMBEDDING_MODEL_ID";
const ENV_TOKEN: &str = "WATSONX_TOKEN";
const ENV_TIMEOUT_SECS: &str = "WATSONX_TIMEOUT_SECS";
const ENV_READY_GRACE_MS: &str = "RAG_READY_GRACE_MS";

// ============================================================================
// Config
// ============================================================================

/// watsonx 및 RAG 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// API 베이스 URL (끝의 `/` 제거됨)
    pub endpoint: String,
    pub project_id: String,
    /// 기본 chat 모델
    pub model_id: String,
    /// 임베딩 모델 (없으면 임베딩 비활성)
    pub embedding_model_id: Option<String>,
    /// 사전 발급된 bearer 토큰
    pub token: Option<String>,
    /// 모든 외부 호출에 적용되는 타임아웃
    pub request_timeout: Duration,
    /// 질의가 초기화 완료를 기다리는 최대 시간
    pub ready_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: String::new(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            embedding_model_id: None,
            token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ready_grace: Duration::ZERO,
        }
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키 조회 함수로 설정 로드
    ///
    /// 빈 문자열은 미설정으로 취급합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let endpoint = match get(ENV_ENDPOINT) {
            Some(raw) => parse_endpoint(&raw)?,
            None => defaults.endpoint,
        };

        let request_timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &raw)?),
            None => defaults.request_timeout,
        };

        let ready_grace = match get(ENV_READY_GRACE_MS) {
            Some(raw) => Duration::from_millis(parse_number(ENV_READY_GRACE_MS, &raw)?),
            None => defaults.ready_grace,
        };

        Ok(Self {
            endpoint,
            project_id: get(ENV_PROJECT_ID).unwrap_or_default(),
            model_id: get(ENV_MODEL_ID).unwrap_or(defaults.model_id),
            embedding_model_id: get(ENV_EMBEDDING_MODEL_ID),
            token: get(ENV_TOKEN),
            request_timeout,
            ready_grace,
        })
    }

    /// 토큰 설정 여부
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// 타임아웃이 적용된 HTTP 클라이언트 생성
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(concat!("travelite-rag/", env!("CARGO_PKG_VERSION")))
            .timeout(self.request_timeout)
            .build()
    }
}

fn parse_endpoint(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: ENV_ENDPOINT,
        message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: ENV_ENDPOINT,
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        key,
        message: e.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
