use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::donation::{AlertTier, DonationRecord};
use super::voice::{character_prosody, voice_language};

pub const SPEECH_VOLUME: f32 = 0.8;

/// Parameters handed to the speech synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub volume: f32,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn for_voice(text: impl Into<String>, voice: &str) -> Self {
        let prosody = character_prosody(voice);
        Self {
            text: text.into(),
            lang: voice_language(voice).to_string(),
            volume: SPEECH_VOLUME,
            rate: prosody.rate,
            pitch: prosody.pitch,
        }
    }

    /// Character count used for the duration estimate.
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Idle,
    Claimed,
    Speaking,
    Completing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackOutcome {
    Finished,
    Failed,
}

/// What the overlay surface renders right now.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub donation: Option<DonationRecord>,
    pub tier: Option<AlertTier>,
    pub accent_color: Option<String>,
    pub celebratory: bool,
    /// 0-100
    pub progress: f64,
    pub outcome: Option<PlaybackOutcome>,
    /// Set for the final fade-out of the completing phase.
    pub fading: bool,
}

impl PlaybackSnapshot {
    pub fn idle() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            donation: None,
            tier: None,
            accent_color: None,
            celebratory: false,
            progress: 0.0,
            outcome: None,
            fading: false,
        }
    }

    pub fn claimed(record: DonationRecord) -> Self {
        let tier = record.tier();
        Self {
            phase: PlaybackPhase::Claimed,
            donation: Some(record),
            tier: Some(tier),
            accent_color: Some(tier.accent_color().to_string()),
            celebratory: tier.is_celebratory(),
            progress: 0.0,
            outcome: None,
            fading: false,
        }
    }
}
