use crate::dsp::envelope::ReleaseCurve;
use crate::graph::node::{GraphNode, Modulatable, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/*
Modulate
========

Connects a modulation source (LFO, one-shot envelope) to a parameter on
another node:

  value = base + mean(modulator block) × depth

Modulation is applied once per block using the block average of the source.
That is deliberately control-rate: a 64-2048 sample block at 5 Hz vibrato
moves the parameter plenty smoothly, and it keeps the hot per-sample loops of
the underlying DSP untouched.

Two shapes show up in the presets:

  vibrato       OscNode .modulate(LfoNode::sine(6.0), FrequencyOffset, 4.0)
  pitch sweep   OscNode .modulate(EnvNode::percussive(0.001, 0.2),
                                  FrequencyOffset, 120.0)

The second is also exactly how the kick gets its punch - the envelope starts
at full level on note_on and decays, so the offset falls 120 Hz → 0.
*/

pub struct Modulate<S, M>
where
    S: GraphNode + Modulatable,
    M: GraphNode,
{
    source: S,
    modulator: M,
    param: S::Param,
    depth: f32,
    mod_buffer: Vec<f32>,
}

impl<S, M> Modulate<S, M>
where
    S: GraphNode + Modulatable,
    M: GraphNode,
{
    pub fn new(source: S, modulator: M, param: S::Param, depth: f32) -> Self {
        Self {
            source,
            modulator,
            param,
            depth,
            mod_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<S, M> GraphNode for Modulate<S, M>
where
    S: GraphNode + Modulatable,
    M: GraphNode,
{
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let mod_block = &mut self.mod_buffer[..out.len()];
        self.modulator.render_block(mod_block, ctx);

        let mean = mod_block.iter().sum::<f32>() / mod_block.len().max(1) as f32;
        let base = self.source.base_value(self.param);
        self.source
            .apply_modulation(self.param, base, mean * self.depth);

        self.source.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.modulator.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.source.note_off(ctx);
        // The modulator keeps running through the release; a vibrato that
        // froze at note-off would be audible as a pitch step
    }

    fn set_release(&mut self, seconds: f32, curve: ReleaseCurve) {
        self.source.set_release(seconds, curve);
    }

    fn envelope_level(&self) -> Option<f32> {
        self.source.envelope_level()
    }

    fn is_active(&self) -> bool {
        self.source.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{envelope::EnvNode, extensions::NodeExt, filter::FilterNode, lfo::LfoNode};
    use crate::graph::filter::FilterParam;
    use crate::graph::oscillator::{OscNode, OscParam};

    #[test]
    fn sweep_envelope_moves_the_pitch() {
        let ctx = RenderCtx::from_freq(48_000.0, 200.0, 1.0);

        // Envelope starts high and decays: early blocks should be higher
        // pitched than late blocks. Count zero crossings as a pitch proxy.
        let mut node = OscNode::sine().modulate(
            EnvNode::percussive(0.0005, 0.03),
            OscParam::FrequencyOffset,
            2_000.0,
        );
        node.note_on(&ctx);

        let crossings = |buffer: &[f32]| {
            buffer
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count()
        };

        let mut early = vec![0.0f32; 512];
        node.render_block(&mut early, &ctx);

        // Let the sweep die out
        let mut skip = vec![0.0f32; 2_048];
        for _ in 0..4 {
            node.render_block(&mut skip, &ctx);
        }

        let mut late = vec![0.0f32; 512];
        node.render_block(&mut late, &ctx);

        assert!(
            crossings(&early) > crossings(&late) + 4,
            "sweep should start sharp and settle: early {} late {}",
            crossings(&early),
            crossings(&late)
        );
    }

    #[test]
    fn lfo_on_cutoff_keeps_output_finite() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut node = OscNode::sawtooth().through(FilterNode::lowpass(800.0).modulate(
            LfoNode::sine(2.0),
            FilterParam::Cutoff,
            600.0,
        ));

        let mut buffer = vec![0.0f32; 2_048];
        node.render_block(&mut buffer, &ctx);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
