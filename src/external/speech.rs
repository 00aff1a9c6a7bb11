//! Text-to-speech adapters driven by the overlay player and the preview endpoint.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Notify;

use crate::config::{SpeechConfig, SpeechEngine};
use crate::error::SpeechError;
use crate::models::Utterance;

/// Platform speech capability.
///
/// `speak` resolving to `Ok` is the "finished" callback, `Err` the "error"
/// callback. `cancel` stops whatever is being spoken right now.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;

    fn cancel(&self);
}

pub fn create_synthesizer(config: &SpeechConfig, chars_per_second: f64) -> Arc<dyn SpeechSynthesizer> {
    match config.engine {
        SpeechEngine::Simulated => Arc::new(SimulatedSynthesizer::new(chars_per_second)),
        SpeechEngine::Command => Arc::new(CommandSynthesizer::new(
            config.program.clone(),
            config.args.clone(),
        )),
    }
}

/// Independent synthesizers for the overlay player and for previews, so that
/// cancelling one never stops the other.
pub struct Synthesizers {
    pub overlay: Arc<dyn SpeechSynthesizer>,
    pub preview: Arc<dyn SpeechSynthesizer>,
}

pub fn create_synthesizers(config: &SpeechConfig, chars_per_second: f64) -> Synthesizers {
    Synthesizers {
        overlay: create_synthesizer(config, chars_per_second),
        preview: create_synthesizer(config, chars_per_second),
    }
}

/// Estimated time to read `chars` characters aloud.
pub fn estimate_duration(chars: usize, chars_per_second: f64) -> Duration {
    if chars_per_second <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(chars as f64 / chars_per_second)
}

/// Runs an external TTS program (espeak-ng by default) once per utterance.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    cancel: Notify,
}

impl CommandSynthesizer {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            cancel: Notify::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let args = render_args(&self.args, utterance);
        log::debug!("Spawning {} {:?}", self.program, args);

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // 取消时丢弃 future，kill_on_drop 会结束子进程
        tokio::select! {
            output = child.wait_with_output() => {
                let output = output.map_err(|e| SpeechError::Engine(e.to_string()))?;
                if output.status.success() {
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(SpeechError::Engine(format!(
                        "{} exited with {}: {}",
                        self.program,
                        output.status,
                        stderr.trim()
                    )))
                }
            }
            _ = self.cancel.notified() => Err(SpeechError::Cancelled),
        }
    }

    fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}

/// Logs the utterance and waits as long as reading it would take.
pub struct SimulatedSynthesizer {
    chars_per_second: f64,
    cancel: Notify,
}

impl SimulatedSynthesizer {
    pub fn new(chars_per_second: f64) -> Self {
        Self {
            chars_per_second,
            cancel: Notify::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for SimulatedSynthesizer {
    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        log::info!(
            "Speaking [{} pitch={} rate={}]: {}",
            utterance.lang,
            utterance.pitch,
            utterance.rate,
            utterance.text
        );
        let duration = estimate_duration(utterance.len_chars(), self.chars_per_second);

        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancel.notified() => Err(SpeechError::Cancelled),
        }
    }

    fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}

/// Expands utterance placeholders inside each argument template.
///
/// `{wpm}` assumes 175 words per minute at rate 1.0, `{pitch_percent}` maps
/// pitch 1.0 to 50 on a 0-99 scale and `{amplitude}` maps volume 1.0 to 100.
pub fn render_args(templates: &[String], utterance: &Utterance) -> Vec<String> {
    let voice = utterance
        .lang
        .split('-')
        .next()
        .unwrap_or("en")
        .to_ascii_lowercase();
    let wpm = (175.0 * utterance.rate).round() as i64;
    let pitch_percent = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as i64;
    let amplitude = (100.0 * utterance.volume).round() as i64;

    templates
        .iter()
        .map(|t| {
            t.replace("{lang}", &utterance.lang)
                .replace("{voice}", &voice)
                .replace("{rate}", &utterance.rate.to_string())
                .replace("{wpm}", &wpm.to_string())
                .replace("{pitch}", &utterance.pitch.to_string())
                .replace("{pitch_percent}", &pitch_percent.to_string())
                .replace("{volume}", &utterance.volume.to_string())
                .replace("{amplitude}", &amplitude.to_string())
                // 最后替换正文，留言里的占位符原样保留
                .replace("{text}", &utterance.text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_espeak_args() {
        let config = SpeechConfig::default();
        let utterance = Utterance::for_voice("Привет", "fun-chipmunk");
        let args = render_args(&config.args, &utterance);

        assert_eq!(
            args,
            vec!["-v", "en", "-s", "219", "-p", "90", "-a", "80", "Привет"]
        );
    }

    #[test]
    fn test_render_russian_voice() {
        let utterance = Utterance::for_voice("текст", "ru-RU-DmitryNeural");
        let args = render_args(&["{lang}:{voice}:{rate}:{pitch}".to_string()], &utterance);
        assert_eq!(args, vec!["ru-RU:ru:1:1"]);
    }

    #[test]
    fn test_placeholders_in_message_are_kept() {
        let utterance = Utterance::for_voice("say {voice}", "en-US-GuyNeural");
        let args = render_args(&["{text}".to_string()], &utterance);
        assert_eq!(args, vec!["say {voice}"]);
    }

    #[test]
    fn test_estimate_duration() {
        assert_eq!(estimate_duration(50, 10.0), Duration::from_secs(5));
        assert_eq!(estimate_duration(5, 0.0), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_speaks_for_estimated_duration() {
        let synth = SimulatedSynthesizer::new(10.0);
        let utterance = Utterance::for_voice("0123456789", "en-US-GuyNeural");

        let start = tokio::time::Instant::now();
        synth.speak(&utterance).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_cancel() {
        let synth = Arc::new(SimulatedSynthesizer::new(1.0));
        let utterance = Utterance::for_voice("a long message", "en-US-GuyNeural");

        let speaking = {
            let synth = synth.clone();
            tokio::spawn(async move { synth.speak(&utterance).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        synth.cancel();

        assert!(matches!(speaking.await.unwrap(), Err(SpeechError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelling_overlay_keeps_preview_speaking() {
        let synths = create_synthesizers(&SpeechConfig::default(), 10.0);
        let draft = Utterance::for_voice("0123456789", "en-US-GuyNeural");
        let line = Utterance::for_voice("a much longer overlay line", "en-US-GuyNeural");

        let preview = {
            let synth = synths.preview.clone();
            tokio::spawn(async move { synth.speak(&draft).await })
        };
        let overlay = {
            let synth = synths.overlay.clone();
            tokio::spawn(async move { synth.speak(&line).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        synths.overlay.cancel();

        assert!(matches!(overlay.await.unwrap(), Err(SpeechError::Cancelled)));
        assert!(preview.await.unwrap().is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_stderr_in_error() {
        let synth = CommandSynthesizer::new(
            "sh".to_string(),
            vec!["-c".to_string(), "echo no such voice >&2; exit 3".to_string()],
        );
        let utterance = Utterance::for_voice("x", "en-US-GuyNeural");

        match synth.speak(&utterance).await {
            Err(SpeechError::Engine(msg)) => assert!(msg.contains("no such voice"), "{msg}"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_with_chatty_stderr_finishes() {
        // 超过管道缓冲区的 stderr 输出也不会阻塞
        let synth = CommandSynthesizer::new(
            "sh".to_string(),
            vec![
                "-c".to_string(),
                "head -c 300000 /dev/zero >&2".to_string(),
            ],
        );
        let utterance = Utterance::for_voice("x", "en-US-GuyNeural");
        assert!(synth.speak(&utterance).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_exit_status() {
        let ok = CommandSynthesizer::new("true".to_string(), vec![]);
        let utterance = Utterance::for_voice("x", "en-US-GuyNeural");
        assert!(ok.speak(&utterance).await.is_ok());

        let failing = CommandSynthesizer::new("false".to_string(), vec![]);
        assert!(matches!(
            failing.speak(&utterance).await,
            Err(SpeechError::Engine(_))
        ));

        let missing = CommandSynthesizer::new("definitely-not-a-tts-binary".to_string(), vec![]);
        assert!(matches!(
            missing.speak(&utterance).await,
            Err(SpeechError::Spawn { .. })
        ));
    }
}
