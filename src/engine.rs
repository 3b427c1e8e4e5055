use rand::rngs::SmallRng;
use rand::SeedableRng;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use log::debug;

use crate::analysis::{BandLevels, SpectrumAnalyzer};
use crate::beat::pattern::BeatStyle;
use crate::beat::percussion::PercussionBus;
use crate::beat::sequencer::{BeatSequencer, ScheduledHit, SequencerState};
use crate::input::{KeyId, Nudge};
use crate::scene::frame::FrameParams;
use crate::speech::router::SpeechClip;
use crate::synth::allocator::VoiceAllocator;
use crate::synth::keymap::KeyFrequencyMap;
use crate::synth::preset::{recipe, PresetId};

/*
The Engine
==========

One Engine per session, explicitly owned - there is no ambient global state
anywhere in this crate. The engine owns everything that lives on the audio
clock: the voice allocator, the beat sequencer, the percussion bus, the
speech playback queue, and the sample counter they all share.

Time here is SAMPLES, counted by `process_block`. Wall-clock time never
enters: envelopes advance per sample, sequencer ticks are scheduled at
absolute sample timestamps, percussion gates at in-block offsets. The scene
(wall-clock domain) and the sweep live outside the engine entirely.

Until `init` provides a sample rate, every audio operation is a no-op - not
an error. A keystroke arriving before the output stream exists simply does
nothing, and the instrument catches up when audio appears.
*/

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub master_gain: f32,
    /// Fixed sustain level voices ramp to during attack.
    pub sustain_level: f32,
    /// Base release in seconds, jittered per note-off.
    pub base_release: f32,
    pub max_voices: usize,
    pub percussion_gain: f32,
    pub speech_gain: f32,
    pub default_bpm: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.8,
            sustain_level: 0.35,
            base_release: 0.4,
            max_voices: 64,
            percussion_gain: 0.9,
            speech_gain: 1.0,
            default_bpm: 120.0,
        }
    }
}

/// Control messages from the input thread to the audio callback.
#[derive(Debug, Clone, Copy)]
pub enum ControlMsg {
    NoteOn(KeyId),
    NoteOff(KeyId),
    ClearAll,
    SetPreset(PresetId),
    StartBeats {
        bpm: f32,
        style: BeatStyle,
        variant: u8,
    },
    StopBeats,
    NudgeTempo(Nudge),
    RegenerateKeymap,
}

/// Tempo nudge step and bounds, in BPM.
const NUDGE_STEP: f32 = 8.0;
const BPM_RANGE: std::ops::RangeInclusive<f32> = 60.0..=220.0;

enum AudioState {
    Uninitialized,
    Ready { sample_rate: f32 },
}

struct PlayingClip {
    samples: Vec<f32>,
    position: usize,
    volume: f32,
}

pub struct Engine {
    state: AudioState,
    /// Sample counter: the audio clock every subsystem schedules against.
    clock: u64,
    config: EngineConfig,

    preset: PresetId,
    keymap: KeyFrequencyMap,
    allocator: VoiceAllocator,
    sequencer: BeatSequencer,
    percussion: PercussionBus,
    bpm: f32,

    clips: Vec<PlayingClip>,
    scheduled: Vec<ScheduledHit>,
    analyzer: Option<SpectrumAnalyzer>,
    rng: SmallRng,

    #[cfg(feature = "rtrb")]
    control_rx: Option<Consumer<ControlMsg>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: AudioState::Uninitialized,
            clock: 0,
            preset: PresetId::Aurora,
            keymap: KeyFrequencyMap::new(),
            allocator: VoiceAllocator::new(
                config.sustain_level,
                config.base_release,
                config.max_voices,
            ),
            sequencer: BeatSequencer::new(),
            percussion: PercussionBus::new(config.percussion_gain),
            bpm: config.default_bpm,
            clips: Vec::new(),
            scheduled: Vec::new(),
            analyzer: None,
            rng: SmallRng::from_os_rng(),
            #[cfg(feature = "rtrb")]
            control_rx: None,
            config,
        }
    }

    /// Bring the audio side up. Safe to call again (a device change just
    /// re-derives the rate-dependent state).
    pub fn init(&mut self, sample_rate: f32) {
        self.state = AudioState::Ready { sample_rate };
        self.analyzer = Some(SpectrumAnalyzer::new(sample_rate));
        debug!("engine initialized at {sample_rate} Hz");
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, AudioState::Ready { .. })
    }

    fn sample_rate(&self) -> Option<f32> {
        match self.state {
            AudioState::Ready { sample_rate } => Some(sample_rate),
            AudioState::Uninitialized => None,
        }
    }

    /// Attach the ring the input thread pushes control messages into.
    #[cfg(feature = "rtrb")]
    pub fn attach_control(&mut self, rx: Consumer<ControlMsg>) {
        self.control_rx = Some(rx);
    }

    // ---- Voice operations (no-ops until initialized) ----

    pub fn play_note(&mut self, key: KeyId) {
        let Some(sample_rate) = self.sample_rate() else {
            return;
        };
        let frequency = self.keymap.frequency(key);
        self.allocator.play_note(
            key,
            frequency,
            recipe(self.preset),
            self.clock,
            sample_rate,
        );
    }

    pub fn stop_note(&mut self, key: KeyId) {
        let Some(sample_rate) = self.sample_rate() else {
            return;
        };
        self.allocator.stop_note(key, sample_rate);
    }

    /// Instant silence: short linear ramp on every voice, then the shared
    /// output graph (percussion shots, speech clips, scheduled hits) is
    /// rebuilt empty.
    pub fn clear_all_notes(&mut self) {
        let Some(sample_rate) = self.sample_rate() else {
            return;
        };
        self.allocator.clear_all(sample_rate);
        self.percussion.clear();
        self.clips.clear();
        self.scheduled.clear();
    }

    /// Store the preset used by future `play_note` calls. Voices already
    /// sounding keep the recipe they were built with.
    pub fn set_preset(&mut self, preset: PresetId) {
        self.preset = preset;
    }

    pub fn preset(&self) -> PresetId {
        self.preset
    }

    /// Reshuffle the key/frequency bijection.
    pub fn regenerate_keymap(&mut self) {
        self.keymap.regenerate();
    }

    // ---- Beat operations ----

    pub fn start_beats(&mut self, bpm: f32, style: BeatStyle, variant: u8) {
        let Some(sample_rate) = self.sample_rate() else {
            return;
        };
        self.bpm = bpm.clamp(*BPM_RANGE.start(), *BPM_RANGE.end());
        self.sequencer
            .start(self.bpm, style, variant, self.clock, sample_rate);
    }

    pub fn stop_beats(&mut self) {
        self.sequencer.stop();
    }

    /// Tempo changes go through stop+restart; there is no in-place retiming.
    pub fn nudge_tempo(&mut self, nudge: Nudge) {
        let delta = match nudge {
            Nudge::Up => NUDGE_STEP,
            Nudge::Down => -NUDGE_STEP,
        };
        self.bpm = (self.bpm + delta).clamp(*BPM_RANGE.start(), *BPM_RANGE.end());

        if let SequencerState::Running { style, variant, .. } = self.sequencer.state() {
            self.sequencer.stop();
            self.start_beats(self.bpm, style, variant);
        }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn sequencer_state(&self) -> SequencerState {
        self.sequencer.state()
    }

    // ---- Speech playback ----

    /// Queue a decoded utterance on the voice bus. Called from the speech
    /// worker; playback starts on the next block.
    pub fn push_clip(&mut self, clip: SpeechClip) {
        self.clips.push(PlayingClip {
            samples: clip.samples,
            position: 0,
            volume: clip.volume,
        });
    }

    pub fn playing_clip_count(&self) -> usize {
        self.clips.len()
    }

    // ---- Rendering ----

    /// Render one block of audio. The single entry point of the audio clock:
    /// drains control, advances the sequencer (with look-ahead), renders
    /// voices, percussion, and speech, and moves the sample counter.
    pub fn process_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let Some(sample_rate) = self.sample_rate() else {
            return;
        };

        self.drain_control();

        // Sequencer ticks due inside this block's look-ahead horizon become
        // scheduled percussion shots with absolute timestamps
        self.sequencer.advance(
            self.clock,
            out.len(),
            sample_rate,
            &mut self.rng,
            &mut self.scheduled,
        );
        for hit in self.scheduled.drain(..) {
            self.percussion.trigger(
                hit.trigger.drum,
                hit.at,
                hit.trigger.velocity,
                hit.trigger.pitch,
            );
        }

        self.allocator.render(out, sample_rate);
        self.percussion.render(out, self.clock, sample_rate);
        self.render_clips(out);

        for sample in out.iter_mut() {
            *sample = (*sample * self.config.master_gain).clamp(-1.0, 1.0);
        }

        if let Some(analyzer) = &mut self.analyzer {
            analyzer.push_block(out);
        }

        self.clock += out.len() as u64;
    }

    fn drain_control(&mut self) {
        #[cfg(feature = "rtrb")]
        {
            let Some(mut rx) = self.control_rx.take() else {
                return;
            };
            while let Ok(msg) = rx.pop() {
                self.handle_control(msg);
            }
            self.control_rx = Some(rx);
        }
    }

    /// Apply one control message. Public so non-rtrb embeddings can drive
    /// the engine directly.
    pub fn handle_control(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::NoteOn(key) => self.play_note(key),
            ControlMsg::NoteOff(key) => self.stop_note(key),
            ControlMsg::ClearAll => self.clear_all_notes(),
            ControlMsg::SetPreset(preset) => self.set_preset(preset),
            ControlMsg::StartBeats {
                bpm,
                style,
                variant,
            } => self.start_beats(bpm, style, variant),
            ControlMsg::StopBeats => self.stop_beats(),
            ControlMsg::NudgeTempo(nudge) => self.nudge_tempo(nudge),
            ControlMsg::RegenerateKeymap => self.regenerate_keymap(),
        }
    }

    fn render_clips(&mut self, out: &mut [f32]) {
        let gain = self.config.speech_gain;
        for clip in &mut self.clips {
            let remaining = &clip.samples[clip.position..];
            let n = remaining.len().min(out.len());
            for (o, &s) in out.iter_mut().zip(remaining[..n].iter()) {
                *o += s * clip.volume * gain;
            }
            clip.position += n;
        }
        self.clips.retain(|c| c.position < c.samples.len());
    }

    // ---- Display / render-boundary feeds ----

    pub fn voice_count(&self) -> usize {
        self.allocator.live_count()
    }

    pub fn held_count(&self) -> usize {
        self.allocator.held_count()
    }

    pub fn has_voice(&self, key: KeyId) -> bool {
        self.allocator.has_voice(key)
    }

    pub fn percussion_count(&self) -> usize {
        self.percussion.live_count()
    }

    pub fn band_levels(&mut self) -> BandLevels {
        self.analyzer
            .as_mut()
            .map(|a| a.levels())
            .unwrap_or_default()
    }

    /// Starfield warp factor for the render boundary: idle drift when
    /// stopped, tempo-proportional once the drum machine runs.
    pub fn warp(&self) -> f32 {
        if self.sequencer.is_running() {
            0.3 + (self.bpm / 220.0) * 0.7
        } else {
            0.05
        }
    }

    /// Bundle the audio-reactive global parameters for one frame.
    pub fn frame_params(&mut self) -> FrameParams {
        let levels = self.band_levels();
        FrameParams {
            warp: self.warp(),
            glow_low: levels.low,
            glow_mid: levels.mid,
            glow_high: levels.high,
            starfield: true,
            planet: true,
        }
    }
}
