pub mod analysis; // FFT band levels for the audio-reactive render params
pub mod beat; // Step sequencer, pattern tables, percussion one-shots
pub mod dsp;
pub mod engine; // The per-session audio engine
pub mod graph; // Composable audio graph nodes
pub mod input;
pub mod scene; // Visual entity lifecycle and the render boundary
#[cfg(feature = "rtrb")]
pub mod session; // Input-event bridge fanning out to audio and visuals
pub mod speech; // Speech output routing and the PCM payload codec
pub mod synth; // Presets, key/frequency mapping, voice allocation

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

/// Frequency used when a key has no entry in the key/frequency map.
pub const DEFAULT_FREQUENCY: f32 = 220.0;
