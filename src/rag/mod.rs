//! RAG 모듈 - 검색 증강 답변 오케스트레이션
//!
//! 질문 임베딩 → 최고 유사도 팁 검색 → 임계값 게이트 → 근거 프롬프트로 생성 호출.
//! 임계값을 넘지 못하면 절대 답변을 지어내지 않고 고정 응답을 반환합니다.
//!
//! 코퍼스 초기화는 백그라운드 작업으로 실행되며, 준비 상태는 `watch` 채널로 공개됩니다.
//! 질의는 설정된 유예 시간까지만 초기화를 기다리고, 이후에는 부분 코퍼스로 답합니다.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::embedding::EmbeddingProvider;
use crate::error::{EmbeddingError, GenerationError};
use crate::generation::{ChatMessage, ChatModel, CompletionOptions};
use crate::knowledge::{InitReport, TipRetriever};

/// 근거 답변 유사도 임계값 (초과해야 통과)
pub const SIMILARITY_THRESHOLD: f32 = 0.5;

/// 질문 임베딩 실패 시 응답
pub const CANNOT_PROCESS_REPLY: &str =
    "Sorry, I couldn't process your question for RAG at the moment.";

/// 임계값 미달/매치 없음 응답
pub const NO_INFORMATION_REPLY: &str = "I don't have a specific travel tip for that in my current knowledge base. Would you like me to try a general answer?";

const GROUNDED_SYSTEM_PROMPT: &str = "You are Travelite, a helpful travel assistant. Answer the user question based ONLY on the provided context. If the context is not sufficient or irrelevant, say you do not have that information in the provided context.";

// ============================================================================
// RagAnswer
// ============================================================================

/// RAG 답변 결과
#[derive(Debug)]
pub enum RagAnswer {
    /// 매치된 팁을 근거로 생성된 답변
    Grounded {
        tip_id: String,
        score: f32,
        reply: String,
    },
    /// 매치 없음 또는 임계값 이하
    NoInformation { best_score: Option<f32> },
    /// 질문 임베딩 실패
    Unavailable(EmbeddingError),
    /// 생성 호출 실패
    GenerationFailed(GenerationError),
}

impl RagAnswer {
    /// 사용자에게 보여줄 문자열로 변환
    pub fn into_reply(self) -> String {
        match self {
            Self::Grounded { reply, .. } => reply,
            Self::NoInformation { .. } => NO_INFORMATION_REPLY.to_string(),
            Self::Unavailable(_) => CANNOT_PROCESS_REPLY.to_string(),
            Self::GenerationFailed(e) => generation_failure_reply(&e),
        }
    }
}

/// 생성 실패를 사용자 문자열로 변환
pub fn generation_failure_reply(err: &GenerationError) -> String {
    match err {
        GenerationError::EmptyReply => "🤖 No reply from LLM.".to_string(),
        other => format!("⚠️ Chat error. Please try again. Details: {}", other),
    }
}

/// 매치된 팁 본문으로 범위를 제한한 프롬프트
pub fn grounded_prompt(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(GROUNDED_SYSTEM_PROMPT),
        ChatMessage::user(format!("Question: {}\n\nContext:\n{}", question, context)),
    ]
}

// ============================================================================
// RagAnswerer
// ============================================================================

/// RAG 답변 서비스
///
/// 코퍼스와 협력자들을 소유하는 명시적 서비스 객체입니다.
pub struct RagAnswerer {
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatModel>,
    retriever: Arc<TipRetriever>,
    ready_grace: Duration,
    ready: Arc<watch::Sender<bool>>,
    init_task: Mutex<Option<JoinHandle<InitReport>>>,
}

impl RagAnswerer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatModel>,
        retriever: Arc<TipRetriever>,
    ) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            embedder,
            chat,
            retriever,
            ready_grace: Duration::ZERO,
            ready: Arc::new(ready),
            init_task: Mutex::new(None),
        }
    }

    /// 질의가 초기화를 기다리는 최대 시간 설정 (0이면 기다리지 않음)
    pub fn with_ready_grace(mut self, grace: Duration) -> Self {
        self.ready_grace = grace;
        self
    }

    pub fn retriever(&self) -> &TipRetriever {
        &self.retriever
    }

    /// 백그라운드 초기화 시작
    ///
    /// 서비스당 한 번만 작업을 생성하며, 이미 시작했으면 `false`를 반환합니다.
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn start_initialization(&self) -> bool {
        let mut slot = self
            .init_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if slot.is_some() {
            tracing::debug!("Tip vector store initialization already started");
            return false;
        }

        let retriever = Arc::clone(&self.retriever);
        let embedder = Arc::clone(&self.embedder);
        let ready = Arc::clone(&self.ready);

        tracing::info!("Initializing tip vector store in background...");
        *slot = Some(tokio::spawn(async move {
            let report = retriever.initialize(embedder.as_ref()).await;
            ready.send_replace(true);
            report
        }));

        true
    }

    /// 초기화를 현재 작업에서 실행하고 완료까지 대기
    pub async fn initialize(&self) -> InitReport {
        let report = self.retriever.initialize(self.embedder.as_ref()).await;
        self.ready.send_replace(true);
        report
    }

    /// 초기화 완료 여부
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// 최대 `grace` 동안 초기화 완료를 대기
    pub async fn wait_ready(&self, grace: Duration) -> bool {
        let mut rx = self.ready.subscribe();
        if *rx.borrow() {
            return true;
        }

        let ready = matches!(
            tokio::time::timeout(grace, rx.wait_for(|ready| *ready)).await,
            Ok(Ok(_))
        );
        ready
    }

    /// 진행 중인 백그라운드 초기화 중단
    pub fn shutdown(&self) {
        let task = self
            .init_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(task) = task {
            if !task.is_finished() {
                tracing::info!("Aborting tip vector store initialization");
                task.abort();
            }
        }
    }

    /// 질문에 대한 RAG 답변 (타입 결과)
    pub async fn answer(&self, question: &str) -> RagAnswer {
        if !self.ready_grace.is_zero() && !self.wait_ready(self.ready_grace).await {
            tracing::debug!("Answering on a partially initialized tip store");
        }

        let query = match self.embedder.embed(question).await {
            Ok(query) => query,
            Err(e) => {
                // 미설정은 어댑터가 이미 경고함
                if matches!(e, EmbeddingError::NotConfigured(_)) {
                    tracing::debug!("Question embedding unavailable: {}", e);
                } else {
                    tracing::warn!("Question embedding unavailable: {}", e);
                }
                return RagAnswer::Unavailable(e);
            }
        };

        let best = match self.retriever.find_best_match(&query).await {
            Some(best) if best.score > SIMILARITY_THRESHOLD => best,
            other => {
                let best_score = other.map(|m| m.score);
                tracing::info!(
                    "RAG: no tip above threshold for {:?} (best={:?})",
                    question,
                    best_score
                );
                return RagAnswer::NoInformation { best_score };
            }
        };

        tracing::info!(
            "RAG: Highest similarity for {:?} is {:.4} ({})",
            question,
            best.score,
            best.id
        );

        let messages = grounded_prompt(question, &best.text);
        match self
            .chat
            .complete(&messages, &CompletionOptions::default())
            .await
        {
            Ok(reply) => RagAnswer::Grounded {
                tip_id: best.id,
                score: best.score,
                reply,
            },
            Err(e) => {
                tracing::error!("Grounded generation failed: {}", e);
                RagAnswer::GenerationFailed(e)
            }
        }
    }

    /// 질문에 대한 RAG 답변 (사용자 문자열, 실패하지 않음)
    pub async fn answer_with_rag(&self, question: &str) -> String {
        self.answer(question).await.into_reply()
    }
}

impl Drop for RagAnswerer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================
