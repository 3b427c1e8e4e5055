use std::f32::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
Oscillator Block
================

A phase-accumulator oscillator. Phase runs 0.0 → 1.0 once per waveform cycle
and wraps; each waveform is a cheap function of the phase. The frequency comes
from the render context every block, so pitch changes (vibrato, sweeps) take
effect without any per-sample branching beyond the wave shape itself.

  phase += frequency / sample_rate      (per sample)
  phase -= 1.0 when phase >= 1.0

Waveform character, briefly:

  Sine      fundamental only; deep, hollow. Kick bodies, sub tones.
  Saw       all harmonics falling off as 1/n; bright, buzzy. Drones, pads.
  Square    odd harmonics; hollow and woody. Chiptune-ish leads.
  Triangle  odd harmonics falling off as 1/n²; soft. Gentle leads.
  Noise     no pitch at all; every sample is an independent uniform draw.
            Snare rattles, hats, breath textures.

The noise source keeps its own small PRNG so two noise blocks never correlate
and rendering stays allocation-free. Noise ignores the phase accumulator
entirely; the other waveforms ignore the PRNG.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
    Noise,
}

pub struct OscillatorBlock {
    waveform: Waveform,
    /// Normalized phase in [0, 1). Unused for noise.
    phase: f32,
    noise: SmallRng,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            noise: SmallRng::from_os_rng(),
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(Waveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(Waveform::Triangle)
    }

    pub fn noise() -> Self {
        Self::new(Waveform::Noise)
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Reset the phase accumulator to the start of the cycle.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Fill the buffer with one block of oscillator output at ctx.frequency.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if self.waveform == Waveform::Noise {
            for sample in out.iter_mut() {
                *sample = self.noise.random_range(-1.0..1.0);
            }
            return;
        }

        let step = (ctx.frequency / ctx.sample_rate).clamp(0.0, 0.5);
        for sample in out.iter_mut() {
            *sample = match self.waveform {
                Waveform::Sine => (TAU * self.phase).sin(),
                // Bipolar ramp: 0 → -1, ramps through 0 at phase 0.5, up to +1
                Waveform::Saw => 2.0 * self.phase - 1.0,
                Waveform::Square => {
                    if self.phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                // Rises 0→1 over the first half cycle, falls back over the second
                Waveform::Triangle => 4.0 * (self.phase - 0.5).abs() - 1.0,
                Waveform::Noise => unreachable!(),
            };

            self.phase += step;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }
}
