// Purpose: presets, key/frequency mapping, and per-key voice allocation.
// This layer sits above graph nodes and turns key events into sounding voices.

pub mod allocator;
pub mod keymap;
pub mod preset;
pub mod voice;

pub use allocator::VoiceAllocator;
pub use keymap::KeyFrequencyMap;
pub use preset::{recipe, PresetId, Recipe};
