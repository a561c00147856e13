use crate::session::{ChatMessage, ChatRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Turkish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Turkish => "tr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "tr" | "turkish" => Some(Language::Turkish),
            _ => None,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Language::English => Language::Turkish,
            Language::Turkish => Language::English,
        }
    }

    pub fn copy(&self) -> &'static CopyTable {
        match self {
            Language::English => &EN,
            Language::Turkish => &TR,
        }
    }
}

/// Static UI strings for one language.
pub struct CopyTable {
    pub user_label: &'static str,
    pub agent_label: &'static str,
    pub chat_title: &'static str,
    pub input_title: &'static str,
    pub input_placeholder: &'static str,
    pub map_title: &'static str,
    pub places_title: &'static str,
    pub no_coordinates: &'static str,
    pub thinking: &'static str,
    pub no_response: &'static str,
    pub default_marker: &'static str,
    pub model_picker_title: &'static str,
    pub models_unavailable: &'static str,
    pub seed_greeting: &'static str,
    pub seed_query: &'static str,
    pub seed_reply: &'static str,
}

static EN: CopyTable = CopyTable {
    user_label: "You:",
    agent_label: "AI:",
    chat_title: "Assistant",
    input_title: "Ask",
    input_placeholder: "Ask about places, e.g. \"List the best restaurants in Kadıköy\"",
    map_title: "Map",
    places_title: "Places",
    no_coordinates: "no coordinates",
    thinking: "Thinking",
    no_response: "No response.",
    default_marker: "Istanbul",
    model_picker_title: " Select Model (Enter to select, Esc to cancel) ",
    models_unavailable: "Model list unavailable",
    seed_greeting: "Hi! I can find places for you. Ask about restaurants, cafes or sights anywhere in Istanbul.",
    seed_query: "List the best restaurants in Kadıköy",
    seed_reply: "Sure — Çiya Sofrası in Kadıköy, for example, is famous for its Anatolian kitchen. Ask me and I will put the results on the map.",
};

static TR: CopyTable = CopyTable {
    user_label: "Sen:",
    agent_label: "AI:",
    chat_title: "Asistan",
    input_title: "Sor",
    input_placeholder: "Mekan sor, örn. \"Kadıköy'deki en iyi restoranları listele\"",
    map_title: "Harita",
    places_title: "Mekanlar",
    no_coordinates: "koordinat yok",
    thinking: "Düşünüyor",
    no_response: "Yanıt yok.",
    default_marker: "İstanbul",
    model_picker_title: " Model Seç (Enter: seç, Esc: vazgeç) ",
    models_unavailable: "Model listesi alınamadı",
    seed_greeting: "Merhaba! Senin için mekan bulabilirim. İstanbul'daki restoranları, kafeleri veya gezilecek yerleri sorabilirsin.",
    seed_query: "Kadıköy'deki en iyi restoranları listele",
    seed_reply: "Tabii — örneğin Kadıköy'deki Çiya Sofrası Anadolu mutfağıyla ünlüdür. Bana sor, sonuçları haritada göstereyim.",
};

/// Scripted three-message exchange shown before the first real submission.
pub fn seed_transcript(language: Language) -> Vec<ChatMessage> {
    let copy = language.copy();
    vec![
        ChatMessage {
            role: ChatRole::Agent,
            text: copy.seed_greeting.to_string(),
        },
        ChatMessage {
            role: ChatRole::User,
            text: copy.seed_query.to_string(),
        },
        ChatMessage {
            role: ChatRole::Agent,
            text: copy.seed_reply.to_string(),
        },
    ]
}
