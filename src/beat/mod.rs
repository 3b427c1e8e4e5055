//! The drum machine: pattern tables, the step clock, and percussion
//! synthesis. Everything here runs on the engine's sample clock - wall-clock
//! time never appears on this side of the crate.

pub mod pattern;
pub mod percussion;
pub mod sequencer;

pub use pattern::{BeatStyle, Drum, DrumTrigger};
pub use percussion::PercussionBus;
pub use sequencer::{BeatSequencer, ScheduledHit};
