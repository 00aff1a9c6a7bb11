//! 语音目录与角色音色表

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_VOICE_ID: &str = "ru-RU-DmitryNeural";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoiceCategory {
    Standard,
    Celebrity,
    Fun,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
    pub category: VoiceCategory,
}

/// Pitch and rate applied on top of the base utterance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Prosody {
    pub pitch: f32,
    pub rate: f32,
}

impl Prosody {
    pub const NEUTRAL: Prosody = Prosody {
        pitch: 1.0,
        rate: 1.0,
    };
}

static VOICE_CATALOG: &[VoiceInfo] = &[
    VoiceInfo {
        id: "ru-RU-DmitryNeural",
        name: "Дмитрий",
        flag: "🇷🇺",
        category: VoiceCategory::Standard,
    },
    VoiceInfo {
        id: "ru-RU-SvetlanaNeural",
        name: "Светлана",
        flag: "🇷🇺",
        category: VoiceCategory::Standard,
    },
    VoiceInfo {
        id: "ru-RU-DariyaNeural",
        name: "Дария",
        flag: "🇷🇺",
        category: VoiceCategory::Standard,
    },
    VoiceInfo {
        id: "en-US-GuyNeural",
        name: "Guy",
        flag: "🇺🇸",
        category: VoiceCategory::Standard,
    },
    VoiceInfo {
        id: "en-US-JennyNeural",
        name: "Jenny",
        flag: "🇺🇸",
        category: VoiceCategory::Standard,
    },
    VoiceInfo {
        id: "celebrity-announcer",
        name: "Ring Announcer",
        flag: "🎤",
        category: VoiceCategory::Celebrity,
    },
    VoiceInfo {
        id: "celebrity-narrator",
        name: "Documentary Narrator",
        flag: "🎬",
        category: VoiceCategory::Celebrity,
    },
    VoiceInfo {
        id: "celebrity-sportscaster",
        name: "Sportscaster",
        flag: "⚽",
        category: VoiceCategory::Celebrity,
    },
    VoiceInfo {
        id: "celebrity-rockstar",
        name: "Rock Star",
        flag: "🎸",
        category: VoiceCategory::Celebrity,
    },
    VoiceInfo {
        id: "fun-robot",
        name: "Robot",
        flag: "🤖",
        category: VoiceCategory::Fun,
    },
    VoiceInfo {
        id: "fun-chipmunk",
        name: "Chipmunk",
        flag: "🐿️",
        category: VoiceCategory::Fun,
    },
    VoiceInfo {
        id: "fun-giant",
        name: "Giant",
        flag: "👹",
        category: VoiceCategory::Fun,
    },
    VoiceInfo {
        id: "fun-alien",
        name: "Alien",
        flag: "👽",
        category: VoiceCategory::Fun,
    },
    VoiceInfo {
        id: "fun-grandma",
        name: "Grandma",
        flag: "👵",
        category: VoiceCategory::Fun,
    },
    VoiceInfo {
        id: "fun-ghost",
        name: "Ghost",
        flag: "👻",
        category: VoiceCategory::Fun,
    },
];

// 角色音色：每个角色固定的 pitch / rate
static CHARACTER_PROSODY: [(&str, Prosody); 10] = [
    ("celebrity-announcer", Prosody { pitch: 0.8, rate: 1.1 }),
    ("celebrity-narrator", Prosody { pitch: 0.6, rate: 0.85 }),
    ("celebrity-sportscaster", Prosody { pitch: 1.2, rate: 1.3 }),
    ("celebrity-rockstar", Prosody { pitch: 0.9, rate: 1.05 }),
    ("fun-robot", Prosody { pitch: 0.5, rate: 0.9 }),
    ("fun-chipmunk", Prosody { pitch: 1.8, rate: 1.25 }),
    ("fun-giant", Prosody { pitch: 0.4, rate: 0.75 }),
    ("fun-alien", Prosody { pitch: 1.6, rate: 1.15 }),
    ("fun-grandma", Prosody { pitch: 1.4, rate: 0.8 }),
    ("fun-ghost", Prosody { pitch: 0.7, rate: 0.95 }),
];

pub fn voice_catalog() -> &'static [VoiceInfo] {
    VOICE_CATALOG
}

pub fn find_voice(id: &str) -> Option<&'static VoiceInfo> {
    VOICE_CATALOG.iter().find(|v| v.id == id)
}

/// Display name for a voice id; ids outside the catalog are shown as-is.
pub fn voice_display_name(id: &str) -> String {
    find_voice(id)
        .map(|v| v.name.to_string())
        .unwrap_or_else(|| id.to_string())
}

pub fn character_prosody(id: &str) -> Prosody {
    CHARACTER_PROSODY
        .iter()
        .find(|(voice_id, _)| *voice_id == id)
        .map(|(_, prosody)| *prosody)
        .unwrap_or(Prosody::NEUTRAL)
}

pub fn voice_language(id: &str) -> &'static str {
    if id.starts_with("ru-") { "ru-RU" } else { "en-US" }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VoiceResponse {
    pub id: String,
    pub name: String,
    pub flag: String,
    pub category: VoiceCategory,
    pub lang: String,
    pub prosody: Prosody,
}

impl From<&VoiceInfo> for VoiceResponse {
    fn from(v: &VoiceInfo) -> Self {
        VoiceResponse {
            id: v.id.to_string(),
            name: v.name.to_string(),
            flag: v.flag.to_string(),
            category: v.category,
            lang: voice_language(v.id).to_string(),
            prosody: character_prosody(v.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_table_is_in_catalog() {
        for (id, _) in CHARACTER_PROSODY.iter() {
            let voice = find_voice(id).unwrap();
            assert_ne!(voice.category, VoiceCategory::Standard);
        }
    }

    #[test]
    fn test_character_prosody_ranges_and_distinct() {
        for (i, (_, a)) in CHARACTER_PROSODY.iter().enumerate() {
            assert!((0.4..=1.8).contains(&a.pitch));
            assert!((0.75..=1.3).contains(&a.rate));
            for (_, b) in CHARACTER_PROSODY.iter().skip(i + 1) {
                assert_ne!(a.pitch, b.pitch);
            }
        }
    }

    #[test]
    fn test_prosody_lookup_is_deterministic() {
        let first = character_prosody("fun-chipmunk");
        for _ in 0..10 {
            assert_eq!(character_prosody("fun-chipmunk"), first);
        }
        assert_eq!(first, Prosody { pitch: 1.8, rate: 1.25 });
    }

    #[test]
    fn test_unknown_voice_is_neutral() {
        assert_eq!(character_prosody("nobody"), Prosody::NEUTRAL);
        assert_eq!(character_prosody(DEFAULT_VOICE_ID), Prosody::NEUTRAL);
        assert_eq!(voice_display_name("nobody"), "nobody");
    }

    #[test]
    fn test_voice_language() {
        assert_eq!(voice_language("ru-RU-DmitryNeural"), "ru-RU");
        assert_eq!(voice_language("en-US-GuyNeural"), "en-US");
        assert_eq!(voice_language("fun-robot"), "en-US");
    }
}
