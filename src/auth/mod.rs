//! 인증 모듈 - watsonx 호출용 bearer 토큰 공급
//!
//! IAM 토큰 교환/캐싱은 이 크레이트 범위 밖입니다.
//! 어댑터는 `TokenSource` 트레이트를 통해서만 토큰을 얻습니다.

use async_trait::async_trait;

use crate::error::AuthError;

/// Bearer 토큰 공급자 트레이트
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// 현재 유효한 bearer 토큰
    async fn bearer_token(&self) -> Result<String, AuthError>;
}

/// 사전 발급된 고정 토큰
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        self.token.clone().ok_or(AuthError::MissingToken)
    }
}
