use std::sync::mpsc;
use std::thread;

use log::warn;

use crate::speech::pcm;
use crate::speech::providers::{CloudSpeech, SpeechRequest, SystemSpeech};

/*
Speech Output Router
====================

Chooses among cloud synthesis, system speech, and silent failure - and never
blocks the caller. `speak` pushes the request onto a channel and returns; a
worker thread does the slow parts (network, decode). The audio callback only
ever sees finished clips arriving through whatever sink the session wired in.

Fallback chain, per request:

  cloud requested:   synthesize → decode → resample → clip sink
                     any failure: log, then system speech with the SAME text
                     system also fails: log. Silence. Nobody above hears it.

  system requested:  straight to system speech; failure is logged silence.

Overlapping requests are fine. System speech cancels its own in-flight
utterance internally; cloud clips simply layer in the playback queue.
*/

/// Which provider the caller wants first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Cloud,
    System,
}

/// A decoded, engine-rate utterance ready for the voice bus.
pub struct SpeechClip {
    pub samples: Vec<f32>,
    pub volume: f32,
}

/// Synchronous routing core. Factored out of the worker so the fallback
/// chain is testable without threads.
pub fn route(
    request: &SpeechRequest,
    provider: Provider,
    cloud: &dyn CloudSpeech,
    system: &mut dyn SystemSpeech,
    engine_rate: u32,
    push_clip: &mut dyn FnMut(SpeechClip),
) {
    match provider {
        Provider::Cloud => {
            let clip = cloud
                .synthesize(request)
                .and_then(|bytes| Ok(pcm::decode(&bytes)?));

            match clip {
                Ok(samples) => {
                    let samples = pcm::resample(&samples, pcm::SAMPLE_RATE, engine_rate);
                    push_clip(SpeechClip {
                        samples,
                        volume: request.volume,
                    });
                }
                Err(err) => {
                    warn!("cloud speech failed ({err}), falling back to system speech");
                    if let Err(err) = system.speak(request) {
                        warn!("system speech fallback failed ({err}), staying silent");
                    }
                }
            }
        }
        Provider::System => {
            if let Err(err) = system.speak(request) {
                warn!("system speech failed ({err}), staying silent");
            }
        }
    }
}

/// Fire-and-forget router handle. Dropping it shuts the worker down once the
/// queue drains.
pub struct SpeechRouter {
    tx: mpsc::Sender<(SpeechRequest, Provider)>,
}

impl SpeechRouter {
    /// Spawn the worker. `push_clip` receives decoded cloud clips; the
    /// session points it at the engine's playback queue.
    pub fn spawn(
        cloud: Box<dyn CloudSpeech>,
        mut system: Box<dyn SystemSpeech>,
        engine_rate: u32,
        mut push_clip: Box<dyn FnMut(SpeechClip) + Send>,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<(SpeechRequest, Provider)>();

        thread::spawn(move || {
            while let Ok((request, provider)) = rx.recv() {
                route(
                    &request,
                    provider,
                    cloud.as_ref(),
                    system.as_mut(),
                    engine_rate,
                    &mut push_clip,
                );
            }
        });

        Self { tx }
    }

    /// Queue an utterance. Never blocks; a router whose worker has died
    /// drops the request silently.
    pub fn speak(&self, request: SpeechRequest, provider: Provider) {
        if self.tx.send((request, provider)).is_err() {
            warn!("speech worker is gone, dropping utterance");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::providers::SpeechError;
    use std::sync::{Arc, Mutex};

    struct FailingCloud;
    impl CloudSpeech for FailingCloud {
        fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>, SpeechError> {
            Err(SpeechError::Unavailable("quota exhausted".into()))
        }
    }

    struct PcmCloud(Vec<f32>);
    impl CloudSpeech for PcmCloud {
        fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>, SpeechError> {
            Ok(pcm::encode(&self.0))
        }
    }

    struct CorruptCloud;
    impl CloudSpeech for CorruptCloud {
        fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>, SpeechError> {
            Ok(vec![0xAB; 7]) // odd length: decode must fail
        }
    }

    #[derive(Default)]
    struct RecordingSystem {
        spoken: Arc<Mutex<Vec<String>>>,
    }
    impl SystemSpeech for RecordingSystem {
        fn speak(&mut self, request: &SpeechRequest) -> Result<(), SpeechError> {
            self.spoken.lock().unwrap().push(request.text.clone());
            Ok(())
        }
        fn cancel(&mut self) {}
    }

    #[test]
    fn cloud_success_produces_a_clip() {
        let cloud = PcmCloud(vec![0.25; 2_400]);
        let mut system = RecordingSystem::default();
        let mut clips = Vec::new();

        route(
            &SpeechRequest::new("hello stars"),
            Provider::Cloud,
            &cloud,
            &mut system,
            48_000,
            &mut |clip| clips.push(clip),
        );

        assert_eq!(clips.len(), 1);
        // 2400 samples at 24 kHz resampled up to 48 kHz ≈ doubled
        assert!(clips[0].samples.len() > 4_000);
        assert!(system.spoken.lock().unwrap().is_empty());
    }

    #[test]
    fn cloud_failure_falls_back_to_system_with_same_text() {
        let mut system = RecordingSystem::default();
        let spoken = system.spoken.clone();

        route(
            &SpeechRequest::new("entropy keeps perfect time"),
            Provider::Cloud,
            &FailingCloud,
            &mut system,
            48_000,
            &mut |_clip| {},
        );

        assert_eq!(
            spoken.lock().unwrap().as_slice(),
            ["entropy keeps perfect time"]
        );
    }

    #[test]
    fn decode_failure_also_falls_back() {
        let mut system = RecordingSystem::default();
        let spoken = system.spoken.clone();

        route(
            &SpeechRequest::new("broken payload"),
            Provider::Cloud,
            &CorruptCloud,
            &mut system,
            48_000,
            &mut |_clip| {},
        );

        assert_eq!(spoken.lock().unwrap().len(), 1);
    }

    #[test]
    fn total_failure_stays_silent_without_panicking() {
        struct FailingSystem;
        impl SystemSpeech for FailingSystem {
            fn speak(&mut self, _request: &SpeechRequest) -> Result<(), SpeechError> {
                Err(SpeechError::Unavailable("no synthesizer".into()))
            }
            fn cancel(&mut self) {}
        }

        route(
            &SpeechRequest::new("into the void"),
            Provider::Cloud,
            &FailingCloud,
            &mut FailingSystem,
            48_000,
            &mut |_clip| {},
        );
        // Reaching here without panic is the contract
    }

    #[test]
    fn spawned_router_survives_overlapping_requests() {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let system = RecordingSystem {
            spoken: spoken.clone(),
        };

        let router = SpeechRouter::spawn(
            Box::new(FailingCloud),
            Box::new(system),
            48_000,
            Box::new(|_clip| {}),
        );

        for i in 0..5 {
            router.speak(SpeechRequest::new(format!("phrase {i}")), Provider::Cloud);
        }

        // Give the worker a moment to drain
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while spoken.lock().unwrap().len() < 5 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(spoken.lock().unwrap().len(), 5);
    }
}
