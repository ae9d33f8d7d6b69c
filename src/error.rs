//! 에러 타입 - 어댑터 경계별 실패 종류
//!
//! 임베딩/생성 호출의 실패는 정상적인 결과로 취급합니다.
//! 사용자 문자열로의 변환은 최외곽(RAG 응답, CLI)에서만 수행합니다.

use thiserror::Error;

/// Bearer 토큰 획득 실패
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Bearer token not configured (set WATSONX_TOKEN)")]
    MissingToken,
}

/// 임베딩 호출 실패 (모두 "unavailable"로 취급)
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding not configured: {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Embedding request timed out")]
    Timeout,

    #[error("Embedding request failed: {0}")]
    Network(String),

    #[error("Embedding API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// 언어 생성(chat) 호출 실패
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("User message content is empty.")]
    EmptyUserMessage,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Chat request timed out")]
    Timeout,

    #[error("Chat request failed: {0}")]
    Network(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Malformed chat response: {0}")]
    MalformedResponse(String),

    #[error("No reply from LLM.")]
    EmptyReply,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// 설정 로드 실패
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_is_transparent() {
        let err = EmbeddingError::from(AuthError::MissingToken);
        assert_eq!(err.to_string(), AuthError::MissingToken.to_string());
    }

    #[test]
    fn test_api_error_message() {
        let err = GenerationError::Api {
            status: 401,
            message: "token expired".to_string(),
        };
        assert_eq!(err.to_string(), "token expired");
    }
}
