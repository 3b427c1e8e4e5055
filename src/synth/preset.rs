use crate::dsp::filter::FilterKind;
use crate::dsp::oscillator::Waveform;
use crate::graph::{
    envelope::EnvNode,
    extensions::NodeExt,
    filter::{FilterNode, FilterParam},
    lfo::LfoNode,
    mix::Mix,
    node::GraphNode,
    oscillator::{OscNode, OscParam},
    through::Through,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Preset Bank
===========

A preset is pure data: a list of source stages, an optional filter stage, an
attack time, and an optional modulation stage. One generic interpreter
(`build_voice`) turns any recipe into a graph, so adding a preset means adding
a table entry, not another hand-built graph function.

Switching presets never touches voices that are already sounding - the recipe
is read once, at `play_note` time.
*/

/// Selectable synthesis presets.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetId {
    /// Two detuned saws under a slowly sweeping lowpass. Slow attack drone.
    Drift,
    /// Sine with a fast downward pitch sweep. Plucky comet tail.
    Comet,
    /// Triangle with gentle vibrato. The singing default.
    Aurora,
    /// Square through a swept bandpass. Hollow and insistent.
    Pulsar,
    /// Filtered noise breath with a very slow attack.
    Nebula,
    /// Amplitude-modulated sine pair, bell-like shimmer.
    Quasar,
}

impl PresetId {
    pub const ALL: [PresetId; 6] = [
        PresetId::Drift,
        PresetId::Comet,
        PresetId::Aurora,
        PresetId::Pulsar,
        PresetId::Nebula,
        PresetId::Quasar,
    ];

    pub fn name(self) -> &'static str {
        recipe(self).name
    }

    /// Cycle to the next preset (UI convenience).
    pub fn next(self) -> PresetId {
        let idx = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// One oscillator/noise layer of a recipe.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct SourceStage {
    pub waveform: Waveform,
    /// Frequency multiplier relative to the key pitch (0.5 = octave down).
    pub freq_scale: f32,
    /// Detune in cents.
    pub detune_cents: f32,
    /// Blend weight when this layer is mixed onto the previous ones.
    pub blend: f32,
}

/// Filter stage of a recipe.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct FilterStage {
    pub kind: FilterKind,
    pub cutoff_hz: f32,
    pub resonance: f32,
    /// Optional cutoff sweep driven by a sine LFO.
    pub sweep: Option<Sweep>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    pub rate_hz: f32,
    pub depth_hz: f32,
}

/// Modulation stage of a recipe, applied by the interpreter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub enum ModStage {
    /// Periodic pitch wobble on every source layer.
    Vibrato { rate_hz: f32, depth_hz: f32 },
    /// One-shot pitch offset decaying from `depth_hz` to zero.
    PitchSweep { depth_hz: f32, time: f32 },
    /// Periodic amplitude dip on the combined signal.
    Tremolo { rate_hz: f32, depth: f32 },
}

/// A complete synthesis recipe. Immutable, shared by reference, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct Recipe {
    pub name: &'static str,
    pub sources: &'static [SourceStage],
    pub filter: Option<FilterStage>,
    /// Envelope attack in seconds. Spans 0.05-2.5 s across the bank.
    pub attack: f32,
    pub modulation: Option<ModStage>,
}

const DRIFT: Recipe = Recipe {
    name: "drift",
    sources: &[
        SourceStage {
            waveform: Waveform::Saw,
            freq_scale: 1.0,
            detune_cents: -9.0,
            blend: 0.0,
        },
        SourceStage {
            waveform: Waveform::Saw,
            freq_scale: 1.0,
            detune_cents: 9.0,
            blend: 0.5,
        },
    ],
    filter: Some(FilterStage {
        kind: FilterKind::LowPass,
        cutoff_hz: 900.0,
        resonance: 0.3,
        sweep: Some(Sweep {
            rate_hz: 0.2,
            depth_hz: 500.0,
        }),
    }),
    attack: 1.8,
    modulation: None,
};

const COMET: Recipe = Recipe {
    name: "comet",
    sources: &[SourceStage {
        waveform: Waveform::Sine,
        freq_scale: 1.0,
        detune_cents: 0.0,
        blend: 0.0,
    }],
    filter: None,
    attack: 0.08,
    modulation: Some(ModStage::PitchSweep {
        depth_hz: 420.0,
        time: 0.35,
    }),
};

const AURORA: Recipe = Recipe {
    name: "aurora",
    sources: &[
        SourceStage {
            waveform: Waveform::Triangle,
            freq_scale: 1.0,
            detune_cents: 0.0,
            blend: 0.0,
        },
        SourceStage {
            waveform: Waveform::Sine,
            freq_scale: 0.5,
            detune_cents: 0.0,
            blend: 0.35,
        },
    ],
    filter: Some(FilterStage {
        kind: FilterKind::LowPass,
        cutoff_hz: 2_400.0,
        resonance: 0.0,
        sweep: None,
    }),
    attack: 0.6,
    modulation: Some(ModStage::Vibrato {
        rate_hz: 5.5,
        depth_hz: 4.0,
    }),
};

const PULSAR: Recipe = Recipe {
    name: "pulsar",
    sources: &[SourceStage {
        waveform: Waveform::Square,
        freq_scale: 1.0,
        detune_cents: 0.0,
        blend: 0.0,
    }],
    filter: Some(FilterStage {
        kind: FilterKind::BandPass,
        cutoff_hz: 1_200.0,
        resonance: 0.5,
        sweep: Some(Sweep {
            rate_hz: 1.3,
            depth_hz: 700.0,
        }),
    }),
    attack: 0.05,
    modulation: None,
};

const NEBULA: Recipe = Recipe {
    name: "nebula",
    sources: &[SourceStage {
        waveform: Waveform::Noise,
        freq_scale: 1.0,
        detune_cents: 0.0,
        blend: 0.0,
    }],
    filter: Some(FilterStage {
        kind: FilterKind::BandPass,
        cutoff_hz: 800.0,
        resonance: 0.7,
        sweep: Some(Sweep {
            rate_hz: 0.15,
            depth_hz: 450.0,
        }),
    }),
    attack: 2.5,
    modulation: None,
};

const QUASAR: Recipe = Recipe {
    name: "quasar",
    sources: &[
        SourceStage {
            waveform: Waveform::Sine,
            freq_scale: 1.0,
            detune_cents: 0.0,
            blend: 0.0,
        },
        SourceStage {
            waveform: Waveform::Sine,
            freq_scale: 2.76, // inharmonic partial, bell-like
            detune_cents: 0.0,
            blend: 0.3,
        },
    ],
    filter: None,
    attack: 0.12,
    modulation: Some(ModStage::Tremolo {
        rate_hz: 9.0,
        depth: 0.65,
    }),
};

/// Pure mapping from preset id to its recipe.
pub fn recipe(id: PresetId) -> &'static Recipe {
    match id {
        PresetId::Drift => &DRIFT,
        PresetId::Comet => &COMET,
        PresetId::Aurora => &AURORA,
        PresetId::Pulsar => &PULSAR,
        PresetId::Nebula => &NEBULA,
        PresetId::Quasar => &QUASAR,
    }
}

fn build_source(stage: &SourceStage, modulation: Option<&ModStage>) -> Box<dyn GraphNode> {
    let osc = OscNode::new(stage.waveform)
        .with_freq_scale(stage.freq_scale)
        .with_detune(stage.detune_cents);

    match modulation {
        Some(ModStage::Vibrato { rate_hz, depth_hz }) => Box::new(osc.modulate(
            LfoNode::sine(*rate_hz),
            OscParam::FrequencyOffset,
            *depth_hz,
        )),
        Some(ModStage::PitchSweep { depth_hz, time }) => Box::new(osc.modulate(
            EnvNode::percussive(0.001, *time),
            OscParam::FrequencyOffset,
            *depth_hz,
        )),
        _ => Box::new(osc),
    }
}

/// Interpret a recipe into a ready-to-gate voice graph.
///
/// The interpreter is the only place recipes become code: layers are mixed in
/// order, pitch modulation lands on every layer, the filter (with optional
/// sweep) comes next, tremolo after that, and the gain envelope sits on the
/// outside so it gates everything.
pub fn build_voice(recipe: &Recipe, sustain: f32, release: f32) -> Box<dyn GraphNode> {
    let modulation = recipe.modulation.as_ref();

    let mut signal = build_source(&recipe.sources[0], modulation);
    for stage in &recipe.sources[1..] {
        let layer = build_source(stage, modulation);
        signal = Box::new(Mix::new(signal, layer, stage.blend));
    }

    if let Some(f) = &recipe.filter {
        let filter = FilterNode::new(f.kind, f.cutoff_hz).with_resonance(f.resonance);
        signal = match f.sweep {
            Some(sweep) => Box::new(Through::new(
                signal,
                filter.modulate(
                    LfoNode::sine(sweep.rate_hz),
                    FilterParam::Cutoff,
                    sweep.depth_hz,
                ),
            )),
            None => Box::new(Through::new(signal, filter)),
        };
    }

    if let Some(ModStage::Tremolo { rate_hz, depth }) = recipe.modulation {
        signal = Box::new(signal.amplify(LfoNode::gain(rate_hz, depth)));
    }

    Box::new(signal.amplify(EnvNode::gate(recipe.attack, sustain, release)))
}
