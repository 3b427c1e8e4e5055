use crate::beat::pattern::Drum;
use crate::graph::{
    envelope::EnvNode,
    extensions::NodeExt,
    filter::FilterNode,
    node::{GraphNode, RenderCtx},
    oscillator::{OscNode, OscParam},
};
use crate::MAX_BLOCK_SIZE;

/*
Percussion Synthesis
====================

Stateless one-shot drums. `trigger` builds a short-lived graph, parks it on
the bus with an absolute sample timestamp, and forgets about it - no handle
comes back. A shot gates itself when its start time falls inside the current
block (at the exact sample offset), renders until its envelope dies, then is
dropped, which tears down the whole graph. Teardown of an already-finished
shot is therefore impossible by construction: disposal IS the drop.

The three drums:

  kick    sine whose pitch falls fast from ~160 Hz onto ~45 Hz while the
          amplitude decays - the pitch envelope is the punch.
  snare   band-passed noise burst (the wire rattle) over a short triangle
          body an octave below the trigger pitch.
  hat     high-passed noise, very short. Closed tss.
*/

/// Native tunings, scaled by the trigger's pitch factor.
const KICK_HZ: f32 = 45.0;
const SNARE_HZ: f32 = 190.0;
const HAT_HZ: f32 = 6_000.0;

/// Build the synthesis graph for one drum hit.
pub fn drum_graph(drum: Drum) -> Box<dyn GraphNode> {
    match drum {
        Drum::Kick => Box::new(
            OscNode::sine()
                .modulate(
                    EnvNode::percussive(0.0005, 0.09),
                    OscParam::FrequencyOffset,
                    115.0,
                )
                .amplify(EnvNode::percussive(0.001, 0.16))
                .through(FilterNode::lowpass(240.0)),
        ),
        Drum::Snare => {
            let rattle = OscNode::noise()
                .amplify(EnvNode::percussive(0.001, 0.11))
                .through(FilterNode::bandpass(3_200.0).with_resonance(0.3));
            let body = OscNode::triangle()
                .with_freq_scale(0.5)
                .amplify(EnvNode::percussive(0.001, 0.07));
            Box::new(body.mix(rattle, 0.7))
        }
        Drum::Hat => Box::new(
            OscNode::noise()
                .amplify(EnvNode::percussive(0.0005, 0.04))
                .through(FilterNode::highpass(7_500.0)),
        ),
    }
}

fn native_hz(drum: Drum) -> f32 {
    match drum {
        Drum::Kick => KICK_HZ,
        Drum::Snare => SNARE_HZ,
        Drum::Hat => HAT_HZ,
    }
}

struct Shot {
    graph: Box<dyn GraphNode>,
    at: u64,
    frequency: f32,
    velocity: f32,
    started: bool,
}

/// The shared percussion bus: collects scheduled one-shots and mixes them.
pub struct PercussionBus {
    shots: Vec<Shot>,
    temp: Vec<f32>,
    gain: f32,
}

impl PercussionBus {
    pub fn new(gain: f32) -> Self {
        Self {
            shots: Vec::new(),
            temp: vec![0.0; MAX_BLOCK_SIZE],
            gain,
        }
    }

    /// Schedule one drum hit at an absolute sample time. Fire and forget.
    pub fn trigger(&mut self, drum: Drum, at: u64, velocity: f32, pitch: f32) {
        self.shots.push(Shot {
            graph: drum_graph(drum),
            at,
            frequency: native_hz(drum) * pitch.max(0.05),
            velocity: velocity.clamp(0.0, 1.0),
            started: false,
        });
    }

    /// Drop everything immediately (part of the clear-all bus rebuild).
    pub fn clear(&mut self) {
        self.shots.clear();
    }

    pub fn live_count(&self) -> usize {
        self.shots.len()
    }

    /// Render the block starting at sample time `block_start`, gating shots
    /// at their exact in-block offset, then reap finished ones.
    pub fn render(&mut self, out: &mut [f32], block_start: u64, sample_rate: f32) {
        let block_len = out.len();
        let block_end = block_start + block_len as u64;

        for shot in &mut self.shots {
            let ctx = RenderCtx::from_freq(sample_rate, shot.frequency, shot.velocity);

            let offset = if !shot.started {
                if shot.at >= block_end {
                    continue; // scheduled past this block
                }
                let offset = shot.at.saturating_sub(block_start) as usize;
                shot.graph.note_on(&ctx);
                shot.started = true;
                offset
            } else {
                0
            };

            let block = &mut self.temp[..block_len - offset];
            block.fill(0.0);
            shot.graph.render_block(block, &ctx);

            let gain = shot.velocity * self.gain;
            for (o, &v) in out[offset..].iter_mut().zip(block.iter()) {
                *o += v * gain;
            }
        }

        self.shots.retain(|s| !s.started || s.graph.is_active());
    }
}
