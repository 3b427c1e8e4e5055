use crate::dsp::filter::{FilterKind, SVFilter};
use crate::graph::node::{GraphNode, Modulatable, RenderCtx};

/// Filter node: processes its input buffer in place.
///
/// The cutoff is modulatable, which is how preset filter sweeps work: an LFO
/// (or a one-shot envelope) drives `FilterParam::Cutoff` through the Modulate
/// combinator and the underlying SVF follows it block by block.
pub struct FilterNode {
    filter: SVFilter,
    base_cutoff: f32,
}

/// Parameters that can be modulated on a filter.
#[derive(Clone, Copy, Debug)]
pub enum FilterParam {
    /// Cutoff frequency in Hz.
    Cutoff,
}

impl FilterNode {
    pub fn new(kind: FilterKind, cutoff_hz: f32) -> Self {
        Self {
            filter: SVFilter::new(kind, cutoff_hz),
            base_cutoff: cutoff_hz,
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

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.filter.set_resonance(resonance);
        self
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.filter.render(out, ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Fresh integrator state so the previous note's tail does not bleed in
        self.filter.reset();
        self.filter.set_cutoff(self.base_cutoff);
    }
}

impl Modulatable for FilterNode {
    type Param = FilterParam;

    fn base_value(&self, param: Self::Param) -> f32 {
        match param {
            FilterParam::Cutoff => self.base_cutoff,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        match param {
            FilterParam::Cutoff => self.filter.set_cutoff(base + modulation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::oscillator::OscNode;

    #[test]
    fn filters_in_place() {
        let ctx = RenderCtx::from_freq(48_000.0, 6_000.0, 1.0);
        let mut osc = OscNode::sine();
        let mut node = FilterNode::lowpass(300.0);

        let mut buffer = vec![0.0f32; 512];
        osc.render_block(&mut buffer, &ctx);
        node.render_block(&mut buffer, &ctx);

        let peak = buffer[64..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(peak < 0.3, "lowpass should attenuate 6 kHz, peak {peak}");
    }

    #[test]
    fn cutoff_modulation_reaches_the_filter() {
        let mut node = FilterNode::lowpass(500.0);
        assert_eq!(node.base_value(FilterParam::Cutoff), 500.0);

        // base + modulation lands on the underlying filter
        node.apply_modulation(FilterParam::Cutoff, 500.0, 1_500.0);
        let ctx = RenderCtx::from_freq(48_000.0, 1_000.0, 1.0);
        let mut osc = OscNode::sine();
        let mut buffer = vec![0.0f32; 512];
        osc.render_block(&mut buffer, &ctx);
        node.render_block(&mut buffer, &ctx);

        let peak = buffer[64..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(peak > 0.6, "opened filter should pass 1 kHz, peak {peak}");
    }
}
