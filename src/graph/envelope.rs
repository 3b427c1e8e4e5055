use crate::dsp::envelope::{Envelope, ReleaseCurve};
use crate::graph::node::{GraphNode, RenderCtx};

/// Envelope generator node.
///
/// Renders the envelope's gain contour as a signal, so it can gate a source
/// through `.amplify()` or act as a one-shot modulation source (pitch sweeps)
/// through `.modulate()`. This is the node that makes a graph self-expiring:
/// once the envelope goes idle, `is_active` turns false and the owner reaps
/// the graph.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    /// Gated contour for keyed voices: linear attack to the sustain level,
    /// exponential release.
    pub fn gate(attack: f32, sustain: f32, release: f32) -> Self {
        Self {
            env: Envelope::gate(attack, sustain, release),
        }
    }

    /// One-shot contour for percussion and sweeps: fast attack, exponential
    /// decay to silence.
    pub fn percussive(attack: f32, decay: f32) -> Self {
        Self {
            env: Envelope::percussive(attack, decay),
        }
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.env.render(out, ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.env.note_on();
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    fn set_release(&mut self, seconds: f32, curve: ReleaseCurve) {
        self.env.set_release(seconds, curve);
    }

    fn envelope_level(&self) -> Option<f32> {
        Some(self.env.level())
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_note_events() {
        let ctx = RenderCtx::from_freq(1_000.0, 440.0, 1.0);
        let mut node = EnvNode::gate(0.01, 0.5, 0.02);

        assert!(!node.is_active());

        node.note_on(&ctx);
        let mut buffer = vec![0.0f32; 64];
        node.render_block(&mut buffer, &ctx);
        assert!(node.is_active());
        assert!(buffer.iter().any(|&s| s > 0.0));

        node.note_off(&ctx);
        let mut tail = vec![0.0f32; 1_000];
        node.render_block(&mut tail, &ctx);
        assert!(!node.is_active(), "envelope should expire after release");
    }

    #[test]
    fn reports_its_level() {
        let ctx = RenderCtx::from_freq(1_000.0, 440.0, 1.0);
        let mut node = EnvNode::gate(0.001, 0.7, 0.1);
        node.note_on(&ctx);

        let mut buffer = vec![0.0f32; 32];
        node.render_block(&mut buffer, &ctx);

        let level = node.envelope_level().unwrap();
        assert!((level - 0.7).abs() < 0.05);
    }
}
