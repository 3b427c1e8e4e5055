use crate::dsp::envelope::ReleaseCurve;

/// Context passed to graph nodes during rendering.
///
/// - `sample_rate`: audio sample rate (e.g. 48000.0)
/// - `frequency`: pitch to render, in Hz - already resolved from the key map
/// - `velocity`: intensity in 0.0-1.0
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub velocity: f32,
}

impl RenderCtx {
    /// Create a context from a direct frequency. Keyed voices get their
    /// frequency from the key/frequency map; percussion passes its own tuning.
    pub fn from_freq(sample_rate: f32, frequency: f32, velocity: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            velocity,
        }
    }
}

/// Core trait for audio processing graph nodes.
///
/// Nodes render audio in blocks and respond to note events. Combinators
/// forward every event to their children so envelopes buried anywhere in a
/// graph hear about gates and release overrides.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a note starts. Default: passthrough nodes do nothing.
    fn note_on(&mut self, _ctx: &RenderCtx) {}

    /// Triggered when a note is released.
    fn note_off(&mut self, _ctx: &RenderCtx) {}

    /// Override the release segment of any envelope in this graph. Used by
    /// the allocator to randomize releases per note-off and to force the
    /// short linear ramp on clear-all.
    fn set_release(&mut self, _seconds: f32, _curve: ReleaseCurve) {}

    /// Current envelope level, if this graph contains one (for display).
    fn envelope_level(&self) -> Option<f32> {
        None
    }

    /// Whether this node is still producing sound. Voice reaping and
    /// one-shot disposal key off this.
    fn is_active(&self) -> bool {
        true
    }
}

/// Trait for nodes that expose modulatable parameters.
pub trait Modulatable: Send {
    type Param: Copy + Send;

    fn base_value(&self, param: Self::Param) -> f32;

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32);
}

/// Allow boxed graph nodes to be used as graph nodes (dynamic dispatch).
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        (**self).note_on(ctx)
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        (**self).note_off(ctx)
    }

    fn set_release(&mut self, seconds: f32, curve: ReleaseCurve) {
        (**self).set_release(seconds, curve)
    }

    fn envelope_level(&self) -> Option<f32> {
        (**self).envelope_level()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
