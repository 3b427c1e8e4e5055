use std::sync::{Arc, Mutex};

use rtrb::{Producer, RingBuffer};

use log::warn;

use crate::engine::{ControlMsg, Engine, EngineConfig};
use crate::input::{playable_key, InputEvent};
use crate::scene::manager::{Scene, SceneConfig};
use crate::speech::providers::{CloudSpeech, SpeechRequest, SystemSpeech};
use crate::speech::router::{Provider, SpeechRouter};

/*
Session
=======

The bridge layer. One session owns the three shared worlds:

  engine   (audio clock)     behind Arc<Mutex>, locked by the audio callback
  scene    (frame clock)     behind Arc<Mutex>, locked by frame + sweep
  router   (speech worker)   fire-and-forget channel

and fans each discrete input event out to all of them:

  key down  →  NoteOn onto the control ring      (audio, non-blocking)
            →  shape + glyph (+ text) spawned    (visuals)
            →  phrase handed to the router       (speech, cooldown-gated)
  key up    →  NoteOff onto the control ring
  nudge     →  NudgeTempo onto the control ring

The control ring is the only path into the audio callback, so a storm of
keystrokes can never block or be blocked by rendering. A full ring drops the
event - by that point there are hundreds of messages in flight per block and
one more voice is not the experience anyone is having.
*/

const CONTROL_RING_CAPACITY: usize = 256;

/// How the session speaks when the scene produces a phrase.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub enabled: bool,
    pub provider: Provider,
    pub voice: String,
    pub volume: f32,
    pub persona: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: Provider::Cloud,
            voice: "default".into(),
            volume: 0.8,
            persona: Some("a weary philosopher narrating the cosmos".into()),
        }
    }
}

pub struct Session {
    engine: Arc<Mutex<Engine>>,
    scene: Arc<Mutex<Scene>>,
    control: Producer<ControlMsg>,
    router: Option<SpeechRouter>,
    speech: SpeechSettings,
}

impl Session {
    /// Build a session: engine with its control ring attached, plus scene.
    pub fn new(engine_config: EngineConfig, scene_config: SceneConfig) -> Self {
        let (tx, rx) = RingBuffer::<ControlMsg>::new(CONTROL_RING_CAPACITY);

        let mut engine = Engine::new(engine_config);
        engine.attach_control(rx);

        Self {
            engine: Arc::new(Mutex::new(engine)),
            scene: Arc::new(Mutex::new(Scene::new(scene_config))),
            control: tx,
            router: None,
            speech: SpeechSettings::default(),
        }
    }

    /// Wire up the speech fallback chain. Decoded cloud clips land straight
    /// in the engine's playback queue.
    pub fn attach_speech(
        &mut self,
        cloud: Box<dyn CloudSpeech>,
        system: Box<dyn SystemSpeech>,
        engine_rate: u32,
        settings: SpeechSettings,
    ) {
        let engine = self.engine.clone();
        let router = SpeechRouter::spawn(
            cloud,
            system,
            engine_rate,
            Box::new(move |clip| {
                if let Ok(mut engine) = engine.lock() {
                    engine.push_clip(clip);
                }
            }),
        );
        self.router = Some(router);
        self.speech = settings;
    }

    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        self.engine.clone()
    }

    pub fn scene(&self) -> Arc<Mutex<Scene>> {
        self.scene.clone()
    }

    /// Push a control message onto the audio ring. Non-blocking.
    pub fn send(&mut self, msg: ControlMsg) {
        if self.control.push(msg).is_err() {
            warn!("control ring full, dropping {msg:?}");
        }
    }

    /// Fan one input event out to audio, visuals, and (opportunistically)
    /// speech. `now` is the scene clock in seconds.
    pub fn handle_event(&mut self, event: InputEvent, now: f64) {
        match event {
            InputEvent::KeyDown(raw) => {
                let Some(key) = playable_key(raw) else {
                    return;
                };

                self.send(ControlMsg::NoteOn(key));

                let phrase = {
                    let mut scene = self.scene.lock().unwrap();
                    scene.add_shape_and_friends(key, now).phrase
                };

                if let (Some(phrase), Some(router)) = (phrase, &self.router) {
                    if self.speech.enabled {
                        let mut request = SpeechRequest::new(phrase)
                            .with_voice(self.speech.voice.clone())
                            .with_volume(self.speech.volume);
                        if let Some(persona) = &self.speech.persona {
                            request = request.with_persona(persona.clone());
                        }
                        router.speak(request, self.speech.provider);
                    }
                }
            }
            InputEvent::KeyUp(raw) => {
                if let Some(key) = playable_key(raw) {
                    self.send(ControlMsg::NoteOff(key));
                }
            }
            InputEvent::TempoNudge(nudge) => {
                self.send(ControlMsg::NudgeTempo(nudge));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Nudge;

    fn drained(session: &Session) {
        let mut out = vec![0.0f32; 256];
        let mut engine = session.engine.lock().unwrap();
        engine.process_block(&mut out);
    }

    fn ready_session() -> Session {
        let session = Session::new(EngineConfig::default(), SceneConfig::default());
        session.engine.lock().unwrap().init(48_000.0);
        session
    }

    #[test]
    fn key_events_reach_both_worlds() {
        let mut session = ready_session();

        session.handle_event(InputEvent::KeyDown('a'), 0.0);
        drained(&session);

        assert_eq!(session.engine.lock().unwrap().voice_count(), 1);
        assert!(session.scene.lock().unwrap().len() >= 2);
    }

    #[test]
    fn unplayable_keys_do_nothing_anywhere() {
        let mut session = ready_session();

        session.handle_event(InputEvent::KeyDown('5'), 0.0);
        drained(&session);

        assert_eq!(session.engine.lock().unwrap().voice_count(), 0);
        assert!(session.scene.lock().unwrap().is_empty());
    }

    #[test]
    fn nudges_travel_the_control_ring() {
        let mut session = ready_session();
        let initial = session.engine.lock().unwrap().bpm();

        session.handle_event(InputEvent::TempoNudge(Nudge::Up), 0.0);
        drained(&session);

        assert!(session.engine.lock().unwrap().bpm() > initial);
    }

    #[test]
    fn uppercase_maps_onto_the_same_key() {
        let mut session = ready_session();

        session.handle_event(InputEvent::KeyDown('A'), 0.0);
        session.handle_event(InputEvent::KeyDown('a'), 0.1);
        drained(&session);

        assert_eq!(session.engine.lock().unwrap().voice_count(), 1);
    }
}
