use crate::dsp::envelope::ReleaseCurve;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/*
Amplify (multiplicative combination)
====================================

Renders the source and the modulator separately, then multiplies them sample
by sample:

  output[n] = source[n] × modulator[n]

This is how voices are gated: source is the tone, modulator is an EnvNode.
With an audio-rate LFO as the modulator it turns into amplitude modulation,
which is what the bell-ish presets use for their shimmer.

is_active uses AND: if either side has gone silent the product is silent, so
the whole node can be reaped. Gating an oscillator (always active) by an
envelope (expires) therefore expires exactly when the envelope does.
*/

pub struct Amplify<S, M> {
    source: S,
    modulator: M,
    mod_buffer: Vec<f32>,
}

impl<S, M> Amplify<S, M> {
    pub fn new(source: S, modulator: M) -> Self {
        Self {
            source,
            modulator,
            mod_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<S: GraphNode, M: GraphNode> GraphNode for Amplify<S, M> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);

        let mod_block = &mut self.mod_buffer[..out.len()];
        self.modulator.render_block(mod_block, ctx);

        for (sample, &gain) in out.iter_mut().zip(mod_block.iter()) {
            *sample *= gain;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.modulator.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.source.note_off(ctx);
        self.modulator.note_off(ctx);
    }

    fn set_release(&mut self, seconds: f32, curve: ReleaseCurve) {
        self.source.set_release(seconds, curve);
        self.modulator.set_release(seconds, curve);
    }

    fn envelope_level(&self) -> Option<f32> {
        self.modulator
            .envelope_level()
            .or_else(|| self.source.envelope_level())
    }

    fn is_active(&self) -> bool {
        self.source.is_active() && self.modulator.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{envelope::EnvNode, extensions::NodeExt, oscillator::OscNode};

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(48_000.0, 440.0, 1.0)
    }

    #[test]
    fn silent_until_gated() {
        let mut node = OscNode::sine().amplify(EnvNode::gate(0.01, 0.5, 0.1));
        let mut buffer = vec![0.0f32; 128];
        node.render_block(&mut buffer, &ctx());

        assert!(buffer.iter().all(|&s| s == 0.0), "ungated voice leaked");
    }

    #[test]
    fn expires_with_the_envelope() {
        let ctx = ctx();
        let mut node = OscNode::sine().amplify(EnvNode::gate(0.001, 0.5, 0.01));

        node.note_on(&ctx);
        assert!(node.is_active());

        node.note_off(&ctx);
        let mut buffer = vec![0.0f32; 2_048];
        for _ in 0..24 {
            node.render_block(&mut buffer, &ctx);
        }

        assert!(!node.is_active(), "gated voice should expire after release");
    }
}
