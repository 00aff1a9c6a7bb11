use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::config::DonationConfig;
use crate::error::{AppError, AppResult};
use crate::external::SpeechSynthesizer;
use crate::models::*;
use crate::services::QueueStore;
use crate::utils::DonationIdGenerator;

/// Producer side of the alert queue: validates viewer input and appends it.
#[derive(Clone)]
pub struct DonationService {
    store: QueueStore,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    ids: Arc<DonationIdGenerator>,
    settings: DonationConfig,
    preview_slot: Arc<Semaphore>,
}

/// Input that passed validation, ready to become a record.
#[derive(Debug, PartialEq)]
pub struct ValidDonation {
    pub username: String,
    pub amount: f64,
    pub message: String,
    pub voice: String,
}

impl DonationService {
    pub fn new(
        store: QueueStore,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        settings: DonationConfig,
    ) -> Self {
        Self {
            store,
            synthesizer,
            ids: Arc::new(DonationIdGenerator::new()),
            settings,
            preview_slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Continues id allocation after the largest id already in the queue.
    pub async fn resume_ids(&self) -> AppResult<Option<i64>> {
        let last = self.store.read().await?.iter().map(|r| r.id).max();
        if let Some(last) = last {
            self.ids.observe(last);
        }
        Ok(last)
    }

    pub fn settings(&self) -> DonationSettingsResponse {
        DonationSettingsResponse {
            enabled: self.settings.enabled,
            preset_amounts: self.settings.preset_amounts.clone(),
            message_max_chars: self.settings.message_max_chars,
            default_voice: self.settings.default_voice.clone(),
        }
    }

    /// 校验顺序: 登录 -> 金额 -> 留言，首个失败即返回
    pub fn validate(
        &self,
        session: Option<&Session>,
        request: &CreateDonationRequest,
    ) -> AppResult<ValidDonation> {
        let session = session.ok_or(AppError::NotAuthenticated)?;

        let amount = parse_amount(&request.amount).ok_or(AppError::InvalidAmount)?;

        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::EmptyMessage);
        }

        Ok(ValidDonation {
            username: session.username.clone(),
            amount,
            message: truncate_chars(message, self.settings.message_max_chars),
            voice: self.resolve_voice(request.voice.as_deref()),
        })
    }

    pub async fn submit(
        &self,
        session: Option<&Session>,
        request: CreateDonationRequest,
    ) -> AppResult<DonationAccepted> {
        let valid = self.validate(session, &request)?;
        let now = Utc::now();

        let record = DonationRecord {
            id: self.ids.next(now.timestamp_millis()),
            username: valid.username,
            amount: valid.amount,
            message: valid.message,
            voice: valid.voice,
            timestamp: now.to_rfc3339(),
            is_playing: false,
            claimed_at: None,
        };

        self.store.append(record.clone()).await?;
        log::info!(
            "Donation {} queued: {} sent {} with voice {}",
            record.id,
            record.username,
            record.amount,
            record.voice
        );

        let voice_name = voice_display_name(&record.voice);
        Ok(DonationAccepted {
            message: format!("Donation sent! Voice: {voice_name}"),
            voice_name,
            donation: record,
        })
    }

    /// Reads a draft message aloud without touching the queue.
    ///
    /// Only logged-in viewers may preview, and only one preview plays at a time.
    pub fn preview(
        &self,
        session: Option<&Session>,
        request: PreviewRequest,
    ) -> AppResult<Utterance> {
        session.ok_or(AppError::NotAuthenticated)?;

        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::EmptyMessage);
        }

        let permit = self
            .preview_slot
            .clone()
            .try_acquire_owned()
            .map_err(|_| AppError::PreviewBusy)?;

        let voice = self.resolve_voice(request.voice.as_deref());
        let utterance = Utterance::for_voice(
            truncate_chars(message, self.settings.message_max_chars),
            &voice,
        );

        let synthesizer = self.synthesizer.clone();
        let spoken = utterance.clone();
        tokio::spawn(async move {
            if let Err(e) = synthesizer.speak(&spoken).await {
                log::warn!("Preview speech failed: {e}");
            }
            drop(permit);
        });

        Ok(utterance)
    }

    pub async fn queue(&self) -> AppResult<Vec<DonationRecord>> {
        Ok(self.store.read().await?)
    }

    fn resolve_voice(&self, voice: Option<&str>) -> String {
        match voice.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => self.settings.default_voice.clone(),
        }
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let amount: f64 = raw.trim().parse().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
