use crate::dsp::envelope::ReleaseCurve;
use crate::graph::node::{GraphNode, RenderCtx};

/// Serial chain: render the source into the buffer, then let the processor
/// transform it in place. The classic subtractive path is
///
///   OscNode::sawtooth()
///       .amplify(EnvNode::gate(…))
///       .through(FilterNode::lowpass(…))
///
/// Through vs Amplify vs Mix: Through transforms (source → processor),
/// Amplify multiplies, Mix adds.
pub struct Through<S, P> {
    source: S,
    processor: P,
}

impl<S, P> Through<S, P> {
    pub fn new(source: S, processor: P) -> Self {
        Self { source, processor }
    }
}

impl<S: GraphNode, P: GraphNode> GraphNode for Through<S, P> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.processor.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.processor.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.source.note_off(ctx);
        self.processor.note_off(ctx);
    }

    fn set_release(&mut self, seconds: f32, curve: ReleaseCurve) {
        self.source.set_release(seconds, curve);
        self.processor.set_release(seconds, curve);
    }

    fn envelope_level(&self) -> Option<f32> {
        self.source
            .envelope_level()
            .or_else(|| self.processor.envelope_level())
    }

    fn is_active(&self) -> bool {
        self.source.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{envelope::EnvNode, extensions::NodeExt, filter::FilterNode, oscillator::OscNode};

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(48_000.0, 440.0, 1.0)
    }

    #[test]
    fn renders_source_then_processor() {
        let mut node = OscNode::sine().through(FilterNode::lowpass(100.0));
        let mut buffer = vec![0.0f32; 256];
        node.render_block(&mut buffer, &ctx());

        assert!(buffer.iter().all(|&s| s.is_finite()));
        assert!(buffer.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn activity_follows_the_source() {
        let ctx = ctx();
        let mut node = OscNode::sine()
            .amplify(EnvNode::gate(0.001, 0.5, 0.01))
            .through(FilterNode::lowpass(2_000.0));

        node.note_on(&ctx);
        node.note_off(&ctx);

        let mut buffer = vec![0.0f32; 2_048];
        for _ in 0..24 {
            node.render_block(&mut buffer, &ctx);
        }

        assert!(!node.is_active(), "chain should expire with its source");
    }
}
