//! Tip Retriever - 인메모리 코사인 유사도 검색
//!
//! 고정된 소규모 팁 코퍼스를 보유하고, 질의 벡터에 대해 최고 유사도 팁을 찾습니다.
//! 코퍼스는 초기화 스윕에서만 쓰기가 발생하며 (누락된 임베딩 채우기),
//! 이후 검색은 읽기 전용입니다.

use tokio::sync::RwLock;

use crate::embedding::EmbeddingProvider;
use crate::error::EmbeddingError;

use super::tip::Tip;
use super::vector::cosine_similarity;

// ============================================================================
// Types
// ============================================================================

/// 검색 결과 (최고 유사도 팁)
#[derive(Debug, Clone, PartialEq)]
pub struct TipMatch {
    /// 팁 ID
    pub id: String,
    /// 팁 본문
    pub text: String,
    /// 코사인 유사도 (-1.0 ~ 1.0)
    pub score: f32,
}

/// 초기화 스윕 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    /// 이번 스윕에서 새로 임베딩된 팁 수
    pub embedded: usize,
    /// 임베딩 실패 팁 수 (재시도 없음)
    pub failed: usize,
    /// 이미 임베딩이 있어 건너뛴 팁 수
    pub already_present: usize,
}

/// 코퍼스 통계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieverStats {
    pub tip_count: usize,
    pub embedded_count: usize,
}

// ============================================================================
// TipRetriever
// ============================================================================

/// 팁 검색기
pub struct TipRetriever {
    tips: RwLock<Vec<Tip>>,
}

impl TipRetriever {
    /// 코퍼스로 검색기 생성
    pub fn new(tips: Vec<Tip>) -> Self {
        Self {
            tips: RwLock::new(tips),
        }
    }

    /// 초기화 스윕 - 임베딩이 없는 팁만 임베딩
    ///
    /// 멱등입니다. 이미 있는 임베딩은 다시 계산하지 않고,
    /// 실패한 팁은 임베딩 없이 남아 검색에서 제외됩니다.
    /// 네트워크 호출 중에는 락을 잡지 않습니다.
    pub async fn initialize(&self, embedder: &dyn EmbeddingProvider) -> InitReport {
        tracing::info!("Initializing tip vector store with {}...", embedder.name());

        let mut report = InitReport::default();

        let pending: Vec<(usize, String, String)> = {
            let tips = self.tips.read().await;
            tips.iter()
                .enumerate()
                .filter(|(_, tip)| !tip.is_embedded())
                .map(|(index, tip)| (index, tip.id.clone(), tip.text.clone()))
                .collect()
        };

        let total = self.tips.read().await.len();
        report.already_present = total - pending.len();

        for (index, id, text) in pending {
            let embedding = match embedder.embed(&text).await {
                Ok(embedding) => embedding,
                Err(EmbeddingError::NotConfigured(reason)) => {
                    tracing::debug!("Skipped tip {}: {}", id, reason);
                    report.failed += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Failed to embed tip {}: {}", id, e);
                    report.failed += 1;
                    continue;
                }
            };

            let mut tips = self.tips.write().await;
            match tips.get_mut(index) {
                Some(tip) if tip.embedding.is_none() => {
                    tip.embedding = Some(embedding);
                    report.embedded += 1;
                    tracing::info!("Embedded tip: {}", id);
                }
                // 동시 실행된 다른 스윕이 먼저 채움
                Some(_) => report.already_present += 1,
                None => {}
            }
        }

        tracing::info!(
            "Tip vector store initialization complete (embedded={}, failed={}, already_present={})",
            report.embedded,
            report.failed,
            report.already_present
        );

        report
    }

    /// 최고 유사도 팁 검색
    ///
    /// 임베딩이 있는 팁이 없으면 `None`을 반환합니다.
    pub async fn find_best_match(&self, query: &[f32]) -> Option<TipMatch> {
        let tips = self.tips.read().await;
        best_match(&tips, query)
    }

    /// 현재 코퍼스 복사본
    pub async fn snapshot(&self) -> Vec<Tip> {
        self.tips.read().await.clone()
    }

    /// 코퍼스 통계
    pub async fn stats(&self) -> RetrieverStats {
        let tips = self.tips.read().await;
        RetrieverStats {
            tip_count: tips.len(),
            embedded_count: tips.iter().filter(|t| t.is_embedded()).count(),
        }
    }
}

/// 팁 목록에서 최고 유사도 팁 선택
///
/// 엄격히 더 높은 점수만 교체하므로 동점이면 코퍼스 순서상 앞선 팁이 선택됩니다.
pub fn best_match(tips: &[Tip], query: &[f32]) -> Option<TipMatch> {
    let mut best: Option<(&Tip, f32)> = None;

    for tip in tips {
        let Some(embedding) = tip.embedding.as_deref() else {
            continue;
        };

        let score = cosine_similarity(query, embedding);
        tracing::debug!("Similarity {} = {:.4}", tip.id, score);

        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((tip, score));
        }
    }

    best.map(|(tip, score)| TipMatch {
        id: tip.id.clone(),
        text: tip.text.clone(),
        score,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::StaticToken;
    use crate::embedding::WatsonxEmbedding;
    use crate::test_support::{FakeEmbedder, LogCapture};

    fn embedded(id: &str, embedding: Vec<f32>) -> Tip {
        Tip::with_embedding(id, format!("{} text", id), embedding)
    }

    #[tokio::test]
    async fn test_empty_corpus_no_match() {
        let retriever = TipRetriever::new(vec![]);
        assert!(retriever.find_best_match(&[1.0, 0.0]).await.is_none());
    }

    #[tokio::test]
    async fn test_unembedded_corpus_no_match() {
        let retriever = TipRetriever::new(vec![Tip::new("a", "x"), Tip::new("b", "y")]);
        assert!(retriever.find_best_match(&[1.0, 0.0]).await.is_none());
    }

    #[tokio::test]
    async fn test_hydration_scenario() {
        let retriever = TipRetriever::new(vec![
            embedded("hydration", vec![1.0, 0.0]),
            embedded("adapter", vec![0.0, 1.0]),
        ]);

        let found = retriever.find_best_match(&[0.9, 0.1]).await.unwrap();
        assert_eq!(found.id, "hydration");
        assert!((found.score - 0.994).abs() < 0.001);
    }

    #[test]
    fn test_tie_prefers_first_in_corpus_order() {
        let tips = vec![
            embedded("first", vec![1.0, 1.0]),
            embedded("second", vec![1.0, 1.0]),
        ];
        let found = best_match(&tips, &[1.0, 1.0]).unwrap();
        assert_eq!(found.id, "first");
    }

    #[test]
    fn test_mismatched_dimension_never_wins() {
        let tips = vec![
            embedded("broken", vec![1.0, 0.0, 0.0]),
            embedded("ok", vec![0.2, 0.8]),
        ];
        let found = best_match(&tips, &[0.2, 0.8]).unwrap();
        assert_eq!(found.id, "ok");
    }

    #[test]
    fn test_negative_scores_still_match() {
        let tips = vec![embedded("opposite", vec![-1.0, 0.0])];
        let found = best_match(&tips, &[1.0, 0.0]).unwrap();
        assert_eq!(found.id, "opposite");
        assert!((found.score + 1.0).abs() < 0.0001);
    }

    #[tokio::test]
    async fn test_initialize_fills_missing() {
        let embedder = FakeEmbedder::new()
            .with("alpha", vec![1.0, 0.0])
            .with("beta", vec![0.0, 1.0]);
        let retriever = TipRetriever::new(vec![Tip::new("a", "alpha"), Tip::new("b", "beta")]);

        let report = retriever.initialize(&embedder).await;
        assert_eq!(
            report,
            InitReport {
                embedded: 2,
                failed: 0,
                already_present: 0
            }
        );
        assert_eq!(embedder.calls(), 2);

        let stats = retriever.stats().await;
        assert_eq!(stats.tip_count, 2);
        assert_eq!(stats.embedded_count, 2);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let embedder = FakeEmbedder::new()
            .with("alpha", vec![1.0, 0.0])
            .with("beta", vec![0.0, 1.0]);
        let retriever = TipRetriever::new(vec![
            Tip::with_embedding("a", "alpha", vec![0.6, 0.8]),
            Tip::new("b", "beta"),
        ]);

        retriever.initialize(&embedder).await;
        let first = retriever.snapshot().await;

        let report = retriever.initialize(&embedder).await;
        assert_eq!(report.embedded, 0);
        assert_eq!(report.already_present, 2);

        // 기존 임베딩 유지, 두 번째 스윕은 호출 없음
        let second = retriever.snapshot().await;
        assert_eq!(first, second);
        assert_eq!(second[0].embedding, Some(vec![0.6, 0.8]));
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_initialize_retries_only_gaps() {
        let embedder = FakeEmbedder::new().with("alpha", vec![1.0, 0.0]);
        let retriever = TipRetriever::new(vec![Tip::new("a", "alpha"), Tip::new("b", "beta")]);

        let report = retriever.initialize(&embedder).await;
        assert_eq!(report.embedded, 1);
        assert_eq!(report.failed, 1);

        let report = retriever.initialize(&embedder).await;
        assert_eq!(report.embedded, 0);
        assert_eq!(report.failed, 1);
        assert_eq!(report.already_present, 1);
        // 첫 스윕 2회 + 두 번째 스윕은 빈 자리만 1회
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_tip_never_returned() {
        let texts = ["one", "two", "three", "four", "five"];
        let mut embedder = FakeEmbedder::new();
        for (i, text) in texts.iter().enumerate() {
            if *text == "three" {
                continue;
            }
            let mut v = vec![0.0; 5];
            v[i] = 1.0;
            embedder = embedder.with(text, v);
        }

        let tips = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Tip::new(format!("tip{}", i + 1), *text))
            .collect();
        let retriever = TipRetriever::new(tips);

        let report = retriever.initialize(&embedder).await;
        assert_eq!(report.embedded, 4);
        assert_eq!(report.failed, 1);

        for axis in 0..5 {
            let mut query = vec![0.0; 5];
            query[axis] = 1.0;
            let found = retriever.find_best_match(&query).await.unwrap();
            assert_ne!(found.id, "tip3");
        }
    }

    #[tokio::test]
    async fn test_unconfigured_embedder_warns_once_per_tip() {
        let embedder = WatsonxEmbedding::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            "proj-1",
            None,
            Arc::new(StaticToken::new(None)),
        );
        let retriever = TipRetriever::new(vec![Tip::new("a", "alpha"), Tip::new("b", "beta")]);

        let (logs, _guard) = LogCapture::install();
        let report = retriever.initialize(&embedder).await;

        assert_eq!(report.failed, 2);
        assert_eq!(logs.count("WARN"), 2);
    }
}
