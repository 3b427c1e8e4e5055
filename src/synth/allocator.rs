use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::dsp::envelope::ReleaseCurve;
use crate::input::KeyId;
use crate::synth::preset::{build_voice, Recipe};
use crate::synth::voice::Voice;
use crate::MAX_BLOCK_SIZE;

/*
Voice Allocator
===============

Owns every live voice and enforces the one-voice-per-key rule:

  play_note    no-op if the key already holds a voice (key-repeat safe);
               otherwise builds a graph from the current recipe and gates it.

  stop_note    no-op if the key holds nothing; otherwise moves the voice to
               the releasing pool with a RANDOMIZED exponential release
               (base × uniform[0.7, 1.6]) so repeated notes of the same
               pitch die away differently. The key becomes free immediately,
               which is what lets a quick re-press start a fresh voice while
               the old one is still ringing out.

  clear_all    every voice - held or releasing - gets a short linear ramp.
               Instant silence for mode changes; the engine rebuilds the
               output bus on top of this.

Reaping happens in render: once a releasing voice's envelope finishes, the
voice is dropped, which tears down its whole graph.
*/

/// Span of the random release multiplier applied per note-off.
const RELEASE_JITTER: std::ops::Range<f32> = 0.7..1.6;

/// Linear ramp used by clear_all, in seconds.
const PANIC_RAMP: f32 = 0.03;

pub struct VoiceAllocator {
    held: HashMap<KeyId, Voice>,
    releasing: Vec<Voice>,
    temp: Vec<f32>,
    rng: SmallRng,
    sustain: f32,
    base_release: f32,
    max_voices: usize,
}

impl VoiceAllocator {
    pub fn new(sustain: f32, base_release: f32, max_voices: usize) -> Self {
        Self {
            held: HashMap::new(),
            releasing: Vec::new(),
            temp: vec![0.0; MAX_BLOCK_SIZE],
            rng: SmallRng::from_os_rng(),
            sustain,
            base_release,
            max_voices,
        }
    }

    /// Start a voice for `key` at `frequency` using `recipe`. Idempotent:
    /// a key that already holds a voice is left untouched.
    pub fn play_note(
        &mut self,
        key: KeyId,
        frequency: f32,
        recipe: &Recipe,
        now: u64,
        sample_rate: f32,
    ) {
        if self.held.contains_key(&key) {
            return;
        }
        if self.held.len() + self.releasing.len() >= self.max_voices {
            return;
        }

        let graph = build_voice(recipe, self.sustain, self.base_release);
        let voice = Voice::start(key, frequency, graph, now, sample_rate);
        self.held.insert(key, voice);
    }

    /// Release the voice for `key`, if any, with a randomized exponential
    /// release time.
    pub fn stop_note(&mut self, key: KeyId, sample_rate: f32) {
        if let Some(mut voice) = self.held.remove(&key) {
            let release = self.base_release * self.rng.random_range(RELEASE_JITTER);
            voice.release(release, ReleaseCurve::Exponential, sample_rate);
            self.releasing.push(voice);
        }
    }

    /// Force-stop everything with a short linear ramp, including voices
    /// already mid-release.
    pub fn clear_all(&mut self, sample_rate: f32) {
        let mut held: Vec<Voice> = self.held.drain().map(|(_, v)| v).collect();
        self.releasing.append(&mut held);

        for voice in &mut self.releasing {
            voice.release(PANIC_RAMP, ReleaseCurve::Linear, sample_rate);
        }
    }

    /// Render and mix every live voice into `out`, then reap finished ones.
    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        for voice in self
            .held
            .values_mut()
            .chain(self.releasing.iter_mut())
        {
            let block = &mut self.temp[..out.len()];
            block.fill(0.0);
            voice.render(block, sample_rate);

            for (o, &v) in out.iter_mut().zip(block.iter()) {
                *o += v;
            }
        }

        self.releasing.retain(|v| !v.is_finished());
    }

    pub fn has_voice(&self, key: KeyId) -> bool {
        self.held.contains_key(&key)
    }

    /// Number of held (key-down) voices.
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Total live voices including release tails.
    pub fn live_count(&self) -> usize {
        self.held.len() + self.releasing.len()
    }

    /// Held keys with their envelope levels, for display.
    pub fn held_voices(&self) -> impl Iterator<Item = (KeyId, Option<f32>)> + '_ {
        self.held
            .iter()
            .map(|(&key, voice)| (key, voice.envelope_level()))
    }
}
