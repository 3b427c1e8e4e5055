use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
State-Variable Filter
=====================

One topology, three responses, taken from the same two-integrator core:

  | response  | passes          | typical use here            |
  | --------- | --------------- | --------------------------- |
  | low-pass  | below cutoff    | kick bodies, drone warmth   |
  | high-pass | above cutoff    | hats, air                   |
  | band-pass | around cutoff   | snare rattle, breath voices |

The cutoff is a plain settable field so preset sweeps and LFO modulation can
move it every block without re-deriving any per-stage state; the integrator
memories carry across cutoff changes, which keeps sweeps click-free.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

pub struct SVFilter {
    // Integrator memories
    ic1eq: f32,
    ic2eq: f32,

    kind: FilterKind,
    cutoff_hz: f32,
    resonance: f32,
}

impl SVFilter {
    pub fn new(kind: FilterKind, cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            kind,
            cutoff_hz,
            resonance: 0.0,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterKind::LowPass, cutoff_hz)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterKind::HighPass, cutoff_hz)
    }

    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self::new(FilterKind::BandPass, cutoff_hz)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        // Keep the prewarp stable: stay below Nyquist with some margin
        self.cutoff_hz = cutoff_hz.clamp(10.0, 20_000.0);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 0.95);
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Process the buffer in place.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        // Bilinear-transform prewarp of the cutoff
        let g = (TAU * self.cutoff_hz.min(ctx.sample_rate * 0.45) / (2.0 * ctx.sample_rate)).tan();
        let k = 2.0 - 2.0 * self.resonance;
        let h = 1.0 / (1.0 + g * (g + k));

        for sample in buffer.iter_mut() {
            let v3 = *sample - self.ic2eq;
            let v1 = h * (self.ic1eq + g * v3);
            let v2 = self.ic2eq + g * v1;

            self.ic1eq = 2.0 * v1 - self.ic1eq;
            self.ic2eq = 2.0 * v2 - self.ic2eq;

            *sample = match self.kind {
                FilterKind::LowPass => v2,
                FilterKind::BandPass => v1,
                FilterKind::HighPass => *sample - k * v1 - v2,
            };
        }
    }
}
