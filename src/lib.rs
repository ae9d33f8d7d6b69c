//! travelite-rag - Travelite 여행 어시스턴트
//!
//! watsonx.ai 임베딩으로 소규모 여행 팁 코퍼스를 인메모리 인덱싱하고,
//! 코사인 유사도 임계값을 통과한 팁만 근거로 답변합니다.

pub mod assistant;
pub mod auth;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod knowledge;
pub mod rag;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use assistant::{detect_intent, ChatRequest, ImageAttachment, Intent, TravelAssistant};
pub use auth::{StaticToken, TokenSource};
pub use config::Config;
pub use embedding::{EmbeddingProvider, WatsonxEmbedding};
pub use error::{AuthError, ConfigError, EmbeddingError, GenerationError};
pub use generation::{ChatMessage, ChatModel, CompletionOptions, WatsonxChat};
pub use knowledge::{
    best_match, cosine_similarity, default_tips, InitReport, RetrieverStats, Tip, TipMatch,
    TipRetriever,
};
pub use rag::{RagAnswer, RagAnswerer, SIMILARITY_THRESHOLD};
