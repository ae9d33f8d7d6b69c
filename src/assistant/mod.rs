//! 어시스턴트 모듈 - 키워드 기반 의도 분류 및 응답 라우팅
//!
//! 이미지 캡션, 메모리 캡슐 스크립트, 여행 팁 질문(RAG), 일반 chat 순으로 분류합니다.
//! 이미지는 vision 모델이 선택된 경우에만 메시지에 포함합니다.

mod creative;
mod image;

use std::sync::Arc;

use crate::generation::{ChatMessage, ChatModel, CompletionOptions, ContentPart, ImageUrl};
use crate::rag::{generation_failure_reply, RagAnswerer};

pub use creative::{
    DEFAULT_CAPTION_TONE, DESCRIBE_IMAGES_REPLY, DESCRIBE_IMAGE_REPLY, DESCRIBE_SCENES_REPLY,
};
pub use image::ImageAttachment;

const GENERAL_SYSTEM_PROMPT: &str = "You are Travelite, a helpful and friendly travel assistant.";

/// 아무 입력도 없는 경우
pub const EMPTY_REQUEST_REPLY: &str =
    "Please type a message or upload an image with a vision model selected.";

/// 이미지와 함께 오면 캡션으로 보내는 키워드
const CAPTION_KEYWORDS: [&str; 2] = ["caption", "what is this"];

/// 메모리 캡슐 키워드
const CAPSULE_KEYWORDS: [&str; 2] = ["memory capsule", "video script"];

/// RAG 경로로 보내는 키워드
const TIP_KEYWORDS: [&str; 4] = ["tip for", "advice on", "how to", "what about"];

// ============================================================================
// Intent
// ============================================================================

/// 메시지 의도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// 이미지 캡션 생성
    Caption,
    /// 장면 설명으로 영상 스크립트 생성
    MemoryCapsule,
    /// 여행 팁 질문 (RAG)
    TravelTip,
    /// 일반 대화
    General,
}

/// 키워드로 의도 분류 (대소문자 무시)
///
/// 이미지가 있고 메시지가 비었거나 캡션 키워드가 있으면 캡션이 우선합니다.
pub fn detect_intent(message: &str, has_image: bool) -> Intent {
    let lowered = message.trim().to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if has_image && (lowered.is_empty() || mentions(&CAPTION_KEYWORDS)) {
        Intent::Caption
    } else if mentions(&CAPSULE_KEYWORDS) {
        Intent::MemoryCapsule
    } else if mentions(&TIP_KEYWORDS) {
        Intent::TravelTip
    } else {
        Intent::General
    }
}

/// 모델 ID가 vision 모델인지
fn is_vision_model(model_id: &str) -> bool {
    model_id.contains("vision")
}

// ============================================================================
// TravelAssistant
// ============================================================================

/// chat 요청
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub image: Option<ImageAttachment>,
    /// 선택된 모델 (없으면 기본 모델)
    pub model_id: Option<String>,
}

/// 여행 어시스턴트
pub struct TravelAssistant {
    rag: Arc<RagAnswerer>,
    chat: Arc<dyn ChatModel>,
}

impl TravelAssistant {
    pub fn new(rag: Arc<RagAnswerer>, chat: Arc<dyn ChatModel>) -> Self {
        Self { rag, chat }
    }

    pub fn rag(&self) -> &RagAnswerer {
        &self.rag
    }

    /// 요청에 대한 사용자 응답 (실패하지 않음)
    pub async fn respond(&self, request: ChatRequest) -> String {
        let message = request.message.trim();
        let intent = detect_intent(message, request.image.is_some());

        match (intent, request.image.as_ref()) {
            (Intent::Caption, Some(image)) => {
                return self
                    .caption(message, image, request.model_id.as_deref())
                    .await;
            }
            (Intent::MemoryCapsule, image) => {
                return self.memory_capsule(message, image.is_some()).await;
            }
            (Intent::TravelTip, _) => {
                tracing::info!("Routing message to RAG");
                return self.rag.answer_with_rag(message).await;
            }
            _ => {}
        }

        let model_id = request
            .model_id
            .unwrap_or_else(|| self.chat.model_id().to_string());

        let mut parts = Vec::new();
        if let Some(image) = request.image.as_ref() {
            if is_vision_model(&model_id) {
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                });
            }
        }
        if !message.is_empty() {
            parts.push(ContentPart::Text {
                text: message.to_string(),
            });
        }

        // 이미지만 있는 요청은 캡션으로 분류되므로 여기서는 빈 메시지뿐
        if parts.is_empty() {
            return EMPTY_REQUEST_REPLY.to_string();
        }

        // 텍스트만 있으면 문자열 콘텐츠로 전송
        let text_only = matches!(parts.as_slice(), [ContentPart::Text { .. }]);
        let user = if text_only {
            ChatMessage::user(message)
        } else {
            ChatMessage::user_parts(parts)
        };

        let messages = [ChatMessage::system(GENERAL_SYSTEM_PROMPT), user];
        let options = CompletionOptions {
            model_id: Some(model_id),
            max_new_tokens: None,
        };

        self.complete("General chat", &messages, &options).await
    }

    /// 이미지 캡션 (vision 모델이 아니면 기본 모델과 사용자 설명 사용)
    async fn caption(
        &self,
        message: &str,
        image: &ImageAttachment,
        model_id: Option<&str>,
    ) -> String {
        let vision_model = model_id.filter(|id| is_vision_model(id));
        let description = creative::caption_description(message);
        let tone = creative::caption_tone(message);

        tracing::info!("Generating {} caption (vision={})", tone, vision_model.is_some());

        let Some(messages) =
            creative::caption_messages(&description, tone, vision_model.and(Some(image)))
        else {
            return DESCRIBE_IMAGE_REPLY.to_string();
        };

        let options = CompletionOptions {
            model_id: vision_model.map(str::to_string),
            max_new_tokens: Some(creative::CAPTION_MAX_NEW_TOKENS),
        };

        self.complete("Caption", &messages, &options).await
    }

    /// 메모리 캡슐 영상 스크립트
    async fn memory_capsule(&self, message: &str, has_image: bool) -> String {
        let scenes = creative::split_scenes(message);

        if scenes.is_empty() {
            return if has_image {
                DESCRIBE_IMAGES_REPLY.to_string()
            } else {
                DESCRIBE_SCENES_REPLY.to_string()
            };
        }

        let mood = creative::capsule_mood(message);
        tracing::info!("Generating {} memory capsule with {} scenes", mood, scenes.len());

        let messages = creative::capsule_messages(&scenes, mood);
        self.complete("Memory capsule", &messages, &CompletionOptions::default())
            .await
    }

    async fn complete(
        &self,
        what: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> String {
        match self.chat.complete(messages, options).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("{} failed: {}", what, e);
                generation_failure_reply(&e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
