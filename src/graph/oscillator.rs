use crate::dsp::oscillator::{OscillatorBlock, Waveform};
use crate::graph::node::{GraphNode, Modulatable, RenderCtx};

/*
Oscillator Node
===============

The fundamental sound source. Wraps an OscillatorBlock with the pitch
plumbing a voice needs:

  freq_scale     multiplies the context frequency. 0.5 = one octave down,
                 2.0 = one octave up. Used for sub layers and octave stacks.

  detune_cents   offset in cents (100 cents = 1 semitone). Small opposing
                 detunes across two saws make the classic thick drone.

  fixed_hz       if set, the node ignores the context frequency entirely.
                 Percussion is tuned this way - a kick should not track the
                 key that happened to trigger it.

  offset_hz      modulation input. Vibrato LFOs and pitch-sweep envelopes
                 write here through the Modulate combinator; the offset adds
                 to the resolved frequency every block.
*/

pub struct OscNode {
    osc: OscillatorBlock,
    freq_scale: f32,
    detune_cents: f32,
    fixed_hz: Option<f32>,
    offset_hz: f32,
}

/// Parameters that can be modulated on an oscillator.
#[derive(Clone, Copy, Debug)]
pub enum OscParam {
    /// Additive frequency offset in Hz, applied after scaling and detune.
    FrequencyOffset,
}

impl OscNode {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            freq_scale: 1.0,
            detune_cents: 0.0,
            fixed_hz: None,
            offset_hz: 0.0,
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

    /// Ignore the note pitch and run at a fixed frequency. For drums and
    /// other sounds that should not track the keyboard.
    pub fn with_fixed_hz(mut self, hz: f32) -> Self {
        self.fixed_hz = Some(hz);
        self
    }

    /// Multiply the resolved frequency (0.5 = octave down, 2.0 = octave up).
    pub fn with_freq_scale(mut self, scale: f32) -> Self {
        self.freq_scale = scale;
        self
    }

    /// Detune in cents (100 cents = 1 semitone).
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self
    }

    fn resolve_frequency(&self, ctx: &RenderCtx) -> f32 {
        let base = self.fixed_hz.unwrap_or(ctx.frequency) * self.freq_scale;
        let detuned = if self.detune_cents != 0.0 {
            base * 2.0_f32.powf(self.detune_cents / 1200.0)
        } else {
            base
        };
        (detuned + self.offset_hz).clamp(0.0, 20_000.0)
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let shifted = RenderCtx {
            frequency: self.resolve_frequency(ctx),
            ..*ctx
        };
        self.osc.render(out, &shifted);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Restart the cycle and drop any stale modulation offset so every
        // press starts from the same place
        self.osc.reset();
        self.offset_hz = 0.0;
    }
}

impl Modulatable for OscNode {
    type Param = OscParam;

    fn base_value(&self, param: Self::Param) -> f32 {
        match param {
            OscParam::FrequencyOffset => 0.0,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        match param {
            OscParam::FrequencyOffset => {
                self.offset_hz = base + modulation;
            }
        }
    }
}
