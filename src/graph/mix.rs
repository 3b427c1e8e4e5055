use crate::dsp::envelope::ReleaseCurve;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/// Parallel blend of two sources with a linear crossfade:
///
///   output = a × (1 - balance) + b × balance
///
/// Used for layering oscillators (detuned stacks, body + rattle in the
/// snare). Both sides receive note events, so an envelope applied AFTER the
/// mix gates the whole layer; an envelope inside one branch gates only that
/// branch.
pub struct Mix<A, B> {
    source_a: A,
    source_b: B,
    balance: f32,
    b_buffer: Vec<f32>,
}

impl<A, B> Mix<A, B> {
    pub fn new(source_a: A, source_b: B, balance: f32) -> Self {
        Self {
            source_a,
            source_b,
            balance: balance.clamp(0.0, 1.0),
            b_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<A: GraphNode, B: GraphNode> GraphNode for Mix<A, B> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source_a.render_block(out, ctx);

        let b_block = &mut self.b_buffer[..out.len()];
        self.source_b.render_block(b_block, ctx);

        let weight_a = 1.0 - self.balance;
        for (sample, &b) in out.iter_mut().zip(b_block.iter()) {
            *sample = *sample * weight_a + b * self.balance;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source_a.note_on(ctx);
        self.source_b.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.source_a.note_off(ctx);
        self.source_b.note_off(ctx);
    }

    fn set_release(&mut self, seconds: f32, curve: ReleaseCurve) {
        self.source_a.set_release(seconds, curve);
        self.source_b.set_release(seconds, curve);
    }

    fn envelope_level(&self) -> Option<f32> {
        self.source_a
            .envelope_level()
            .or_else(|| self.source_b.envelope_level())
    }

    fn is_active(&self) -> bool {
        self.source_a.is_active() || self.source_b.is_active()
    }
}
