use std::process::{Child, Command, Stdio};

use thiserror::Error;

use crate::speech::pcm::PcmError;

/*
Speech providers
================

Two collaborator seams, both deliberately thin:

  CloudSpeech    text + persona hint + voice id → raw PCM bytes, or failure.
                 The router decodes and plays the payload; the provider
                 knows nothing about audio buses.

  SystemSpeech   text + voice parameters → audible output, asynchronously.
                 One utterance at a time: submitting cancels whatever is
                 still in flight. No completion callback exists or is needed.

The shipped SystemSpeech drives a speech synthesizer process (espeak by
default, `say` on mac-flavored setups). Killing a child that already exited
is fine - that race is swallowed, per the idempotent-teardown rule.
*/

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech provider unavailable: {0}")]
    Unavailable(String),
    #[error("synthesis failed: {0}")]
    Synthesis(String),
    #[error("payload decode failed: {0}")]
    Decode(#[from] PcmError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One utterance: what to say and how to say it.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Persona/style hint forwarded to cloud synthesis verbatim.
    pub persona: Option<String>,
    /// Voice identifier, meaningful to whichever provider handles it.
    pub voice: String,
    /// 0.0-1.0.
    pub volume: f32,
    /// Pitch multiplier, 1.0 = neutral.
    pub pitch: f32,
    /// Rate multiplier, 1.0 = neutral.
    pub rate: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            persona: None,
            voice: "default".into(),
            volume: 0.8,
            pitch: 1.0,
            rate: 1.0,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }
}

/// Cloud synthesis boundary: returns raw PCM16-LE mono bytes at
/// [`crate::speech::pcm::SAMPLE_RATE`].
pub trait CloudSpeech: Send {
    fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, SpeechError>;
}

/// System speech boundary: asynchronous playback, cancel-on-resubmit.
pub trait SystemSpeech: Send {
    fn speak(&mut self, request: &SpeechRequest) -> Result<(), SpeechError>;

    /// Cancel the in-flight utterance, if any. Must be idempotent.
    fn cancel(&mut self);
}

/// System speech via a synthesizer child process.
pub struct ProcessSpeech {
    program: String,
    child: Option<Child>,
}

impl ProcessSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
        }
    }

    /// The platform default synthesizer.
    pub fn system_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say")
        } else {
            Self::new("espeak")
        }
    }
}

impl SystemSpeech for ProcessSpeech {
    fn speak(&mut self, request: &SpeechRequest) -> Result<(), SpeechError> {
        self.cancel();

        // espeak-style flags: -a amplitude 0..200, -p pitch 0..99,
        // -s speed in words per minute, -v voice
        let amplitude = (request.volume * 180.0).round() as i32;
        let pitch = (request.pitch * 50.0).clamp(0.0, 99.0).round() as i32;
        let speed = (request.rate * 160.0).clamp(80.0, 450.0).round() as i32;

        let child = Command::new(&self.program)
            .arg("-a")
            .arg(amplitude.to_string())
            .arg("-p")
            .arg(pitch.to_string())
            .arg("-s")
            .arg(speed.to_string())
            .arg("-v")
            .arg(&request.voice)
            .arg(&request.text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            // The child may have finished on its own; both outcomes are fine
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ProcessSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Silent provider: accepts everything, says nothing. The terminal fallback.
pub struct NullSpeech;

impl SystemSpeech for NullSpeech {
    fn speak(&mut self, _request: &SpeechRequest) -> Result<(), SpeechError> {
        Ok(())
    }

    fn cancel(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_clamps_volume() {
        let request = SpeechRequest::new("hello").with_volume(3.0);
        assert_eq!(request.volume, 1.0);
    }

    #[test]
    fn cancel_without_utterance_is_a_noop() {
        let mut speech = ProcessSpeech::new("definitely-not-a-real-binary");
        speech.cancel();
        speech.cancel();
    }

    #[test]
    fn missing_binary_reports_an_error() {
        let mut speech = ProcessSpeech::new("definitely-not-a-real-binary");
        let result = speech.speak(&SpeechRequest::new("hello"));
        assert!(result.is_err());
    }

    #[test]
    fn null_speech_swallows_everything() {
        let mut speech = NullSpeech;
        assert!(speech.speak(&SpeechRequest::new("void")).is_ok());
        speech.cancel();
    }
}
