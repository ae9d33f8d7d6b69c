//! 창작 기능 프롬프트 - 이미지 캡션, 메모리 캡슐 영상 스크립트

use regex::Regex;

use crate::generation::{ChatMessage, ContentPart, ImageUrl};

use super::image::ImageAttachment;

// ============================================================================
// Caption
// ============================================================================

/// 톤 키워드가 없을 때의 캡션 톤
pub const DEFAULT_CAPTION_TONE: &str = "witty";

/// 캡션 생성 최대 토큰 수
pub const CAPTION_MAX_NEW_TOKENS: u32 = 150;

/// 텍스트 모델인데 이미지 설명이 없는 경우
pub const DESCRIBE_IMAGE_REPLY: &str = "Please describe the image for me to generate a caption.";

const CAPTION_THIS: &str = "caption this";

/// 메시지에서 캡션 톤 선택
pub fn caption_tone(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    if lowered.contains("witty") {
        "witty"
    } else if lowered.contains("elegant") {
        "elegant"
    } else {
        DEFAULT_CAPTION_TONE
    }
}

/// 메시지에서 이미지 설명 추출
///
/// "caption this ..." 뒤의 텍스트는 설명으로 쓰고, 그 외 "caption" 요청은 설명 없음.
/// 캡션 키워드가 없으면 메시지 전체가 설명입니다.
pub fn caption_description(message: &str) -> String {
    let message = message.trim();

    if let Some(prefix) = message.get(..CAPTION_THIS.len()) {
        if prefix.eq_ignore_ascii_case(CAPTION_THIS) {
            return message[CAPTION_THIS.len()..].trim().to_string();
        }
    }

    if message.to_lowercase().contains("caption") {
        String::new()
    } else {
        message.to_string()
    }
}

/// 캡션 프롬프트 생성
///
/// `image`는 vision 모델이 선택된 경우에만 전달합니다.
/// 텍스트 모델에 설명도 없으면 `None`을 반환합니다.
pub fn caption_messages(
    description: &str,
    tone: &str,
    image: Option<&ImageAttachment>,
) -> Option<Vec<ChatMessage>> {
    let system = ChatMessage::system(format!(
        "You are a creative social media assistant. Generate a caption based ONLY on the provided image (and its description if text model). Tone: {}. Include 2-3 relevant hashtags.",
        tone
    ));

    let user = match image {
        Some(image) => {
            let text = if description.is_empty() {
                "Generate caption.".to_string()
            } else {
                format!("Image description (if helpful): {}. Generate caption.", description)
            };
            ChatMessage::user_parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
                ContentPart::Text { text },
            ])
        }
        None if description.is_empty() => return None,
        None => ChatMessage::user(format!(
            "Image described as: \"{}\". Generate a {} caption.",
            description, tone
        )),
    };

    Some(vec![system, user])
}

// ============================================================================
// Memory Capsule
// ============================================================================

/// 이미지는 있는데 장면 설명이 없는 경우
pub const DESCRIBE_IMAGES_REPLY: &str =
    "Great! Please describe each scene or image for your memory capsule.";

/// 장면 설명이 없는 경우
pub const DESCRIBE_SCENES_REPLY: &str = "Please describe the scenes for your memory capsule (e.g., 'Scene 1: beach sunset then Scene 2: dinner with friends'). You can also upload images and describe them.";

/// 장면으로 인정하는 최소 길이 (초과)
const MIN_SCENE_CHARS: usize = 5;

/// 메시지에서 영상 분위기 선택
pub fn capsule_mood(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    if lowered.contains("happy") {
        "happy"
    } else if lowered.contains("adventurous") {
        "adventurous"
    } else {
        "heartwarming"
    }
}

/// 메시지를 장면 목록으로 분리
///
/// "then", `;`, 줄바꿈으로 나누고 요청 문구를 제거한 뒤 너무 짧은 조각은 버립니다.
pub fn split_scenes(message: &str) -> Vec<String> {
    let (Ok(separator), Ok(lead_in)) = (
        Regex::new(r"(?i)then\b|;|\n"),
        Regex::new(r"(?i)memory capsule for|video script for"),
    ) else {
        return Vec::new();
    };

    separator
        .split(message)
        .map(|scene| lead_in.replace(scene, "").trim().to_string())
        .filter(|scene| scene.chars().count() > MIN_SCENE_CHARS)
        .collect()
}

/// 영상 스크립트 프롬프트 생성
pub fn capsule_messages(scenes: &[String], mood: &str) -> Vec<ChatMessage> {
    let scenes_text = scenes
        .iter()
        .enumerate()
        .map(|(i, scene)| format!("Scene {}: {}", i + 1, scene))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::system(
            "You are Travelite, a creative storyteller. Generate a short video script/storyboard based ONLY on the provided scenes and mood. Suggest a background music style.",
        ),
        ChatMessage::user(format!(
            "Desired Video Mood: {}\n\n{}\n\nGenerate the script and suggest music.",
            mood, scenes_text
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MessageContent;

    #[test]
    fn test_caption_tone() {
        assert_eq!(caption_tone("Caption this, make it ELEGANT"), "elegant");
        assert_eq!(caption_tone("witty caption please"), "witty");
        assert_eq!(caption_tone(""), DEFAULT_CAPTION_TONE);
    }

    #[test]
    fn test_caption_description() {
        assert_eq!(
            caption_description("Caption this sunset over Santorini"),
            "sunset over Santorini"
        );
        assert_eq!(caption_description("caption please"), "");
        assert_eq!(caption_description("  what is this temple?  "), "what is this temple?");
        assert_eq!(caption_description(""), "");
    }

    #[test]
    fn test_caption_text_model_needs_description() {
        assert!(caption_messages("", "witty", None).is_none());

        let messages = caption_messages("a temple at dawn", "elegant", None).unwrap();
        assert_eq!(
            messages[1],
            ChatMessage::user("Image described as: \"a temple at dawn\". Generate a elegant caption.")
        );
        assert!(matches!(
            &messages[0].content,
            MessageContent::Text(text) if text.contains("Tone: elegant.")
        ));
    }

    #[test]
    fn test_split_scenes() {
        let scenes = split_scenes(
            "Memory capsule for beach sunset then dinner with friends; ok\nTHEN hiking at dawn",
        );
        assert_eq!(
            scenes,
            vec!["beach sunset", "dinner with friends", "hiking at dawn"]
        );

        // "athens"는 분리 기준이 아님
        assert_eq!(split_scenes("video script for Athens at night"), vec!["Athens at night"]);
        assert!(split_scenes("video script for").is_empty());
    }

    #[test]
    fn test_capsule_mood_and_prompt() {
        assert_eq!(capsule_mood("a HAPPY memory capsule"), "happy");
        assert_eq!(capsule_mood("adventurous video script"), "adventurous");
        assert_eq!(capsule_mood("memory capsule"), "heartwarming");

        let scenes = vec!["beach sunset".to_string(), "dinner with friends".to_string()];
        let messages = capsule_messages(&scenes, "happy");
        assert_eq!(
            messages[1],
            ChatMessage::user(
                "Desired Video Mood: happy\n\nScene 1: beach sunset\nScene 2: dinner with friends\n\nGenerate the script and suggest music."
            )
        );
    }
}
