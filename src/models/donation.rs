use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One pledge-with-message flowing from the donation widget to the overlay.
///
/// Field names follow the persisted queue layout (camelCase JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    /// 创建时间派生的唯一ID (毫秒)
    pub id: i64,
    pub username: String,
    /// 金额 (卢布)
    pub amount: f64,
    pub message: String,
    pub voice: String,
    /// 创建时间，仅用于展示
    pub timestamp: String,
    pub is_playing: bool,
    /// 被播放端领取的时间 (毫秒)，未领取时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<i64>,
}

impl DonationRecord {
    pub fn tier(&self) -> AlertTier {
        AlertTier::from_amount(self.amount)
    }

    /// Text read aloud by the overlay.
    pub fn speech_text(&self) -> String {
        format!(
            "{} отправил донат {} рублей. Сообщение: {}",
            self.username, self.amount, self.message
        )
    }
}

/// Amount bucket controlling how loud the overlay alert looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    Standard,
    Elevated,
    High,
    Premium,
}

impl AlertTier {
    pub fn from_amount(amount: f64) -> Self {
        if amount >= 5000.0 {
            AlertTier::Premium
        } else if amount >= 1000.0 {
            AlertTier::High
        } else if amount >= 500.0 {
            AlertTier::Elevated
        } else {
            AlertTier::Standard
        }
    }

    pub fn accent_color(&self) -> &'static str {
        match self {
            AlertTier::Standard => "#3b82f6",
            AlertTier::Elevated => "#8b5cf6",
            AlertTier::High => "#f59e0b",
            AlertTier::Premium => "#ef4444",
        }
    }

    pub fn is_celebratory(&self) -> bool {
        matches!(self, AlertTier::High | AlertTier::Premium)
    }
}

/// 提交捐赠请求
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDonationRequest {
    /// 表单中的金额字符串
    #[schema(example = "100")]
    pub amount: String,
    #[schema(example = "Привет, стрим!")]
    pub message: String,
    #[schema(example = "ru-RU-DmitryNeural")]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreviewRequest {
    pub message: String,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DonationAccepted {
    pub donation: DonationRecord,
    pub voice_name: String,
    pub message: String,
}

/// Donation widget settings served from site configuration.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DonationSettingsResponse {
    pub enabled: bool,
    pub preset_amounts: Vec<u32>,
    pub message_max_chars: usize,
    pub default_voice: String,
}
