//! Application wiring: audio stream, input loop, sweep timer, TUI.
//!
//! Three timing domains run here, as separate tasks sharing only the
//! session's locked collections:
//!   - the cpal callback renders audio on the device's clock;
//!   - the main loop advances and draws the scene every ~16 ms, reading
//!     entities BEFORE the sweep can remove them (both take the scene lock);
//!   - a background timer sweeps expired entities four times a second.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use cosmophone::beat::pattern::BeatStyle;
use cosmophone::engine::{ControlMsg, EngineConfig};
use cosmophone::input::{InputEvent, Nudge};
use cosmophone::scene::frame;
use cosmophone::scene::manager::SceneConfig;
use cosmophone::session::{Session, SpeechSettings};
use cosmophone::speech::providers::{
    CloudSpeech, ProcessSpeech, SpeechError, SpeechRequest,
};
use cosmophone::speech::router::Provider;
use cosmophone::MAX_BLOCK_SIZE;

use crate::view;

/// Keys without a terminal release event auto-release after this hold.
const AUTO_RELEASE: Duration = Duration::from_millis(450);

/// Sweep interval for the expired-entity timer.
const SWEEP_INTERVAL: Duration = Duration::from_millis(250);

/// Cloud synthesis is an external collaborator; this build ships without a
/// network path, so the provider reports unavailable and the router's
/// fallback chain lands on system speech - exactly the degraded mode the
/// instrument is designed to keep playing through.
struct OfflineCloud;

impl CloudSpeech for OfflineCloud {
    fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>, SpeechError> {
        Err(SpeechError::Unavailable("no cloud endpoint configured".into()))
    }
}

pub struct App {
    session: Session,
    started: Instant,
    held: HashMap<char, Instant>,
}

impl App {
    pub fn new() -> EyreResult<Self> {
        Ok(Self {
            session: Session::new(EngineConfig::default(), SceneConfig::default()),
            started: Instant::now(),
            held: HashMap::new(),
        })
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn run(mut self) -> EyreResult<()> {
        // ---- Audio ----
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        self.session
            .engine()
            .lock()
            .unwrap()
            .init(sample_rate);

        self.session.attach_speech(
            Box::new(OfflineCloud),
            Box::new(ProcessSpeech::system_default()),
            sample_rate as u32,
            SpeechSettings {
                provider: Provider::Cloud,
                ..SpeechSettings::default()
            },
        );

        let engine_for_audio = self.session.engine();
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let mut engine = engine_for_audio.lock().unwrap();
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames];
                    engine.process_block(block);

                    // Mono to all channels
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }
                    frames_written += frames;
                }
            },
            |err| eprintln!("audio error: {err}"),
            None,
        )?;
        stream.play()?;

        // ---- Sweep timer ----
        let scene_for_sweep = self.session.scene();
        let sweep_epoch = self.started;
        std::thread::spawn(move || loop {
            std::thread::sleep(SWEEP_INTERVAL);
            let now = sweep_epoch.elapsed().as_secs_f64();
            if let Ok(mut scene) = scene_for_sweep.lock() {
                scene.sweep(now);
            }
        });

        // ---- TUI loop ----
        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal);
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> EyreResult<()> {
        let mut last_frame = Instant::now();

        loop {
            // Input, with a frame-length poll budget
            while event::poll(Duration::from_millis(4))? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key)? {
                        return Ok(());
                    }
                }
            }
            self.auto_release();

            // Frame update: advance kinematics, then snapshot for drawing.
            // The sweep thread takes the same lock, so read-then-remove
            // ordering holds per tick.
            let now = self.now();
            let dt = last_frame.elapsed().as_secs_f32();
            last_frame = Instant::now();

            let params = self.session.engine().lock().unwrap().frame_params();
            let snapshot = {
                let scene_arc = self.session.scene();
                let mut scene = scene_arc.lock().unwrap();
                frame::advance(&mut scene, dt, now);
                frame::snapshot(&scene, params)
            };
            let status = self.status();

            terminal.draw(|f| view::draw(f, &snapshot, &status))?;
        }
    }

    fn handle_key(&mut self, key: event::KeyEvent) -> EyreResult<bool> {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                self.held.remove(&c);
                self.session.handle_event(InputEvent::KeyUp(c), self.now());
            }
            return Ok(false);
        }
        // Press and Repeat both flow through: the allocator dedups the audio
        // side, and entity spawning on repeat is intended behavior

        match key.code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true)
            }

            KeyCode::Tab => {
                let next = self.session.engine().lock().unwrap().preset().next();
                self.session.send(ControlMsg::SetPreset(next));
            }
            KeyCode::Backspace => self.session.send(ControlMsg::ClearAll),
            KeyCode::Enter => self.session.send(ControlMsg::RegenerateKeymap),

            KeyCode::Char('[') => self
                .session
                .handle_event(InputEvent::TempoNudge(Nudge::Down), self.now()),
            KeyCode::Char(']') => self
                .session
                .handle_event(InputEvent::TempoNudge(Nudge::Up), self.now()),

            KeyCode::Char(c @ '1'..='4') => {
                let style = match c {
                    '1' => BeatStyle::Dnb,
                    '2' => BeatStyle::House,
                    '3' => BeatStyle::Breaks,
                    _ => BeatStyle::Breakcore,
                };
                let bpm = self.session.engine().lock().unwrap().bpm();
                self.session.send(ControlMsg::StartBeats {
                    bpm,
                    style,
                    variant: 0,
                });
            }
            KeyCode::Char('0') => self.session.send(ControlMsg::StopBeats),

            KeyCode::Char(c) => {
                // Repeat presses are harmless: the allocator is idempotent
                // per key, and the scene is SUPPOSED to spawn again
                self.held.insert(c, Instant::now());
                self.session.handle_event(InputEvent::KeyDown(c), self.now());
            }
            _ => {}
        }

        Ok(false)
    }

    /// Terminals without key-release reporting: release anything held past
    /// the auto-release window.
    fn auto_release(&mut self) {
        let now = self.now();
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, pressed)| pressed.elapsed() > AUTO_RELEASE)
            .map(|(&c, _)| c)
            .collect();
        for c in expired {
            self.held.remove(&c);
            self.session.handle_event(InputEvent::KeyUp(c), now);
        }
    }

    fn status(&self) -> view::Status {
        let engine_arc = self.session.engine();
        let mut engine = engine_arc.lock().unwrap();
        let scene_len = self.session.scene().lock().unwrap().len();
        view::Status {
            preset: engine.preset().name().to_string(),
            bpm: engine.bpm(),
            sequencer: engine.sequencer_state(),
            voices: engine.voice_count(),
            entities: scene_len,
            clips: engine.playing_clip_count(),
            levels: engine.band_levels(),
        }
    }
}
