//! CLI 모듈
//!
//! travelite CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::assistant::{detect_intent, ChatRequest, ImageAttachment, Intent, TravelAssistant};
use crate::auth::{StaticToken, TokenSource};
use crate::config::Config;
use crate::embedding::WatsonxEmbedding;
use crate::generation::{ChatModel, WatsonxChat};
use crate::knowledge::{default_tips, InitReport, TipRetriever};
use crate::rag::RagAnswerer;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "travelite")]
#[command(version, about = "Travelite 여행 어시스턴트 (watsonx RAG)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 여행 팁 지식베이스로 질문에 답변
    Ask {
        /// 질문
        question: String,

        /// 코퍼스 초기화를 기다리지 않음 (RAG_READY_GRACE_MS까지만 대기)
        #[arg(long)]
        no_wait: bool,
    },

    /// 어시스턴트와 대화 (팁 질문은 자동으로 RAG 사용)
    Chat {
        /// 메시지
        message: Option<String>,

        /// 첨부할 이미지 파일
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// 사용할 모델 ID (vision 모델이면 이미지 포함)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// 여행 팁 목록 및 임베딩 상태
    Tips,

    /// 설정 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("설정 로드 실패")?;

    match cli.command {
        Commands::Ask { question, no_wait } => cmd_ask(&config, &question, no_wait).await,
        Commands::Chat {
            message,
            image,
            model,
        } => cmd_chat(&config, message, image, model).await,
        Commands::Tips => cmd_tips(&config).await,
        Commands::Status => cmd_status(&config),
    }
}

/// 설정으로 서비스 구성
fn build_services(config: &Config) -> Result<(Arc<RagAnswerer>, Arc<dyn ChatModel>)> {
    let token: Arc<dyn TokenSource> = Arc::new(StaticToken::new(config.token.clone()));

    let embedder = WatsonxEmbedding::from_config(config, Arc::clone(&token))
        .context("임베딩 클라이언트 생성 실패")?;
    let chat: Arc<dyn ChatModel> = Arc::new(
        WatsonxChat::from_config(config, token).context("chat 클라이언트 생성 실패")?,
    );

    let retriever = Arc::new(TipRetriever::new(default_tips()));
    let rag = RagAnswerer::new(Arc::new(embedder), Arc::clone(&chat), retriever)
        .with_ready_grace(config.ready_grace);

    Ok((Arc::new(rag), chat))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 질문 명령어 (ask)
async fn cmd_ask(config: &Config, question: &str, no_wait: bool) -> Result<()> {
    let (rag, _) = build_services(config)?;

    if no_wait {
        rag.start_initialization();
    } else {
        print_init_report(&rag.initialize().await);
    }

    let reply = rag.answer_with_rag(question).await;
    println!("{}", reply);

    rag.shutdown();
    Ok(())
}

/// 대화 명령어 (chat)
async fn cmd_chat(
    config: &Config,
    message: Option<String>,
    image: Option<PathBuf>,
    model: Option<String>,
) -> Result<()> {
    let image = match image {
        Some(path) => Some(
            ImageAttachment::from_path(&path)
                .await
                .context("이미지 읽기 실패")?,
        ),
        None => None,
    };

    let message = message.unwrap_or_default();
    let (rag, chat) = build_services(config)?;

    // 팁 질문이면 코퍼스 준비 후 답변
    if detect_intent(&message, image.is_some()) == Intent::TravelTip {
        print_init_report(&rag.initialize().await);
    }

    let assistant = TravelAssistant::new(rag, chat);
    let reply = assistant
        .respond(ChatRequest {
            message,
            image,
            model_id: model,
        })
        .await;

    println!("{}", reply);

    assistant.rag().shutdown();
    Ok(())
}

/// 팁 목록 명령어 (tips)
async fn cmd_tips(config: &Config) -> Result<()> {
    let (rag, _) = build_services(config)?;
    print_init_report(&rag.initialize().await);

    let tips = rag.retriever().snapshot().await;
    println!("[OK] 여행 팁 ({} 건):\n", tips.len());

    for tip in tips {
        let status = match tip.embedding.as_ref() {
            Some(embedding) => format!("dim={}", embedding.len()),
            None => "임베딩 없음".to_string(),
        };
        println!("  {:<6} [{}] {}", tip.id, status, truncate_text(&tip.text, 80));
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &Config) -> Result<()> {
    println!("travelite v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 엔드포인트: {}", config.endpoint);
    if config.project_id.is_empty() {
        println!("[!] 프로젝트 ID: 미설정");
    } else {
        println!("[OK] 프로젝트 ID: {}", config.project_id);
    }
    println!("[*] 텍스트 모델: {}", config.model_id);

    match config.embedding_model_id.as_deref() {
        Some(model) => println!("[OK] 임베딩 모델: {}", model),
        None => {
            println!("[!] 임베딩 모델: 미설정 (RAG 비활성)");
            println!("    설정: export WATSONX_EMBEDDING_MODEL_ID=ibm/slate-30m-english-rtrvr-v2");
        }
    }

    if config.has_token() {
        println!("[OK] 토큰: 설정됨");
    } else {
        println!("[!] 토큰: 미설정");
        println!("    설정: export WATSONX_TOKEN=your-bearer-token");
    }

    println!(
        "[*] 요청 타임아웃: {}s, 초기화 대기: {}ms",
        config.request_timeout.as_secs(),
        config.ready_grace.as_millis()
    );

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn print_init_report(report: &InitReport) {
    if report.failed > 0 {
        println!(
            "[!] 팁 임베딩: 성공 {}, 실패 {}, 기존 {}",
            report.embedded, report.failed, report.already_present
        );
    } else {
        tracing::debug!("Tip store ready: {:?}", report);
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_cli_parses_ask() {
        let cli = Cli::try_parse_from(["travelite", "ask", "tip for Bali?", "--no-wait"]).unwrap();
        match cli.command {
            Commands::Ask { question, no_wait } => {
                assert_eq!(question, "tip for Bali?");
                assert!(no_wait);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_cli_parses_chat_with_image() {
        let cli = Cli::try_parse_from([
            "travelite",
            "chat",
            "what is this",
            "--image",
            "photo.jpg",
            "--model",
            "meta-llama/llama-3-2-11b-vision-instruct",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                message,
                image,
                model,
            } => {
                assert_eq!(message.as_deref(), Some("what is this"));
                assert_eq!(image, Some(PathBuf::from("photo.jpg")));
                assert!(model.unwrap().contains("vision"));
            }
            _ => panic!("expected chat"),
        }
    }

    #[tokio::test]
    async fn test_services_without_credentials_degrade() {
        let config = Config::default();
        let (rag, _) = build_services(&config).unwrap();

        let report = rag.initialize().await;
        assert_eq!(report.embedded, 0);
        assert_eq!(report.failed, 5);

        let reply = rag.answer_with_rag("tip for packing?").await;
        assert_eq!(reply, crate::rag::CANNOT_PROCESS_REPLY);
    }
}
