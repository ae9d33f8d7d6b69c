//! Knowledge 모듈 - 여행 팁 인메모리 지식 저장소
//!
//! - Tip: 코퍼스 엔트리 (id, text, embedding)
//! - Vector: 코사인 유사도
//! - Retriever: 초기화 스윕 + 최고 유사도 검색

mod retriever;
mod tip;
mod vector;

// Re-exports
pub use retriever::{best_match, InitReport, RetrieverStats, TipMatch, TipRetriever};
pub use tip::{default_tips, Tip};
pub use vector::cosine_similarity;
