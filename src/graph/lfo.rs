use crate::dsp::oscillator::{OscillatorBlock, Waveform};
use crate::graph::node::{GraphNode, RenderCtx};

/// Low frequency oscillator for parameter modulation.
///
/// Runs at its own fixed sub-audio frequency, ignoring the note pitch. Output
/// is bipolar (-1..+1); the Modulate combinator scales it by a depth and adds
/// it onto a parameter. 5-7 Hz on an oscillator's frequency offset is classic
/// vibrato; fractions of a hertz on a filter cutoff make slow preset sweeps.
pub struct LfoNode {
    osc: OscillatorBlock,
    frequency: f32,
    /// When set, remap the bipolar wave to a gain contour 1.0 → (1 - depth).
    gain_depth: Option<f32>,
}

impl LfoNode {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency,
            gain_depth: None,
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(Waveform::Sine, frequency)
    }

    pub fn triangle(frequency: f32) -> Self {
        Self::new(Waveform::Triangle, frequency)
    }

    /// Unipolar gain contour for tremolo / amplitude-modulated shimmer:
    /// output stays in [1 - depth, 1], so it can sit directly under an
    /// `.amplify()` without re-biasing.
    pub fn gain(frequency: f32, depth: f32) -> Self {
        Self {
            osc: OscillatorBlock::sine(),
            frequency,
            gain_depth: Some(depth.clamp(0.0, 1.0)),
        }
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        // Swap in the LFO's own frequency so it runs independently of pitch
        let lfo_ctx = RenderCtx::from_freq(ctx.sample_rate, self.frequency, 1.0);
        self.osc.render(out, &lfo_ctx);

        if let Some(depth) = self.gain_depth {
            for sample in out.iter_mut() {
                *sample = 1.0 - depth * (0.5 + 0.5 * *sample);
            }
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Phase-sync to the note start so every press sweeps the same way
        self.osc.reset();
    }
}
