//! Composable building blocks for constructing audio-processing graphs.
//!
//! Graph nodes wrap the low-level DSP primitives with what instrument design
//! needs: note events, parameter modulation, release overrides, and
//! block-based rendering. The `extensions` module adds fluent helpers so both
//! the preset interpreter and the percussion one-shots can compose graphs
//! with a clear, chainable API.

/// Multiply two signals together (envelope gating, tremolo, ring-ish AM).
pub mod amplify;
/// Envelope generator node.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.through()`, `.mix()`, `.modulate()`).
pub mod extensions;
/// State-variable filter node with a modulatable cutoff.
pub mod filter;
/// Low frequency oscillators for parameter modulation.
pub mod lfo;
/// Linear blending of two parallel sources.
pub mod mix;
/// Connect modulation sources to node parameters.
pub mod modulate;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-band oscillators and noise sources.
pub mod oscillator;
/// Serial chaining of two nodes (source → processor).
pub mod through;

pub use extensions::NodeExt;
pub use node::{GraphNode, RenderCtx};
