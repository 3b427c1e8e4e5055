use crate::dsp::envelope::ReleaseCurve;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::input::KeyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Key is down, envelope in attack or sustain.
    Held,
    /// Key released, envelope ringing out. The voice is reaped once the
    /// graph reports inactive.
    Releasing,
}

/// One playing note: a key bound to a synthesis graph instance.
pub struct Voice {
    key: KeyId,
    frequency: f32,
    state: VoiceState,
    started_at: u64,
    graph: Box<dyn GraphNode>,
}

impl Voice {
    /// Create and gate a voice. `started_at` is the engine's sample clock.
    pub fn start(
        key: KeyId,
        frequency: f32,
        graph: Box<dyn GraphNode>,
        started_at: u64,
        sample_rate: f32,
    ) -> Self {
        let mut voice = Self {
            key,
            frequency,
            state: VoiceState::Held,
            started_at,
            graph,
        };
        let ctx = voice.ctx(sample_rate);
        voice.graph.note_on(&ctx);
        voice
    }

    fn ctx(&self, sample_rate: f32) -> RenderCtx {
        RenderCtx::from_freq(sample_rate, self.frequency, 1.0)
    }

    /// Begin the release with an explicit duration and curve. The randomized
    /// per-note release and the clear-all linear ramp both come through here;
    /// re-releasing an already-releasing voice restarts the ramp from its
    /// current level (how clear-all shortens tails that are mid-release).
    pub fn release(&mut self, seconds: f32, curve: ReleaseCurve, sample_rate: f32) {
        self.state = VoiceState::Releasing;

        let ctx = self.ctx(sample_rate);
        self.graph.set_release(seconds, curve);
        self.graph.note_off(&ctx);
    }

    /// Render one block, mixing into nothing (the caller owns mixing).
    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        let ctx = self.ctx(sample_rate);
        self.graph.render_block(out, &ctx);
    }

    /// A held voice is always live; a releasing voice is live until its
    /// envelope finishes.
    pub fn is_finished(&self) -> bool {
        self.state == VoiceState::Releasing && !self.graph.is_active()
    }

    pub fn key(&self) -> KeyId {
        self.key
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn envelope_level(&self) -> Option<f32> {
        self.graph.envelope_level()
    }
}
