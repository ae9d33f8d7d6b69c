//! 이미지 첨부 모듈
//!
//! 로컬 이미지 파일을 읽어 vision 모델용 data URL로 인코딩합니다.

use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};

/// chat 메시지에 첨부할 이미지
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(mime_type: &'static str, data: Vec<u8>) -> Self {
        Self { mime_type, data }
    }

    /// 이미지 파일 읽기
    pub async fn from_path(path: &Path) -> Result<Self> {
        let mime_type = get_mime_type(path)?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image: {:?}", path))?;

        Ok(Self { mime_type, data })
    }

    /// `data:{mime};base64,...` 형식 URL
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// 파일 경로에서 MIME 타입 결정
fn get_mime_type(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        "gif" => Ok("image/gif"),
        "bmp" => Ok("image/bmp"),
        _ => anyhow::bail!("Unsupported image format: {}", ext),
    }
}

// ============================================================================
// Tests
// ============================================================================
