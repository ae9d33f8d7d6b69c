//! Tip - 여행 팁 코퍼스 엔트리

/// 여행 팁 (검색 단위)
#[derive(Debug, Clone, PartialEq)]
pub struct Tip {
    /// 코퍼스 내 고유 ID
    pub id: String,
    /// 팁 본문 (불변)
    pub text: String,
    /// 임베딩 벡터 (계산 전에는 `None`, 한 번 설정되면 불변)
    pub embedding: Option<Vec<f32>>,
}

impl Tip {
    /// 임베딩 없는 팁 생성
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: None,
        }
    }

    /// 임베딩이 이미 있는 팁 생성
    pub fn with_embedding(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: Some(embedding),
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some()
    }
}

/// 기본 여행 팁 코퍼스
pub fn default_tips() -> Vec<Tip> {
    [
        ("tip1", "For budget travel in Southeast Asia, consider local buses and street food for authentic experiences."),
        ("tip2", "When visiting European capitals, purchase a city pass online beforehand for discounts on museum access and public transport."),
        ("tip3", "Always pack a universal adapter and a portable power bank for international trips to keep your devices charged."),
        ("tip4", "Learn a few basic phrases in the local language; it can greatly enhance your interactions and show respect for the culture."),
        ("tip5", "Stay hydrated, especially in hot climates or when doing a lot of walking. Carry a reusable water bottle."),
    ]
    .into_iter()
    .map(|(id, text)| Tip::new(id, text))
    .collect()
}
