//! Speech output: the provider fallback chain, the PCM payload codec, and
//! the phrase pool that feeds spoken text fragments.
//!
//! Nothing in this module may block or panic into the audio path. Cloud
//! synthesis happens on a worker thread; every failure mode ends in either
//! system speech or silence, logged and swallowed.

pub mod pcm;
pub mod phrases;
pub mod providers;
pub mod router;

pub use phrases::{PhrasePool, PhraseSource};
pub use providers::{CloudSpeech, SpeechError, SpeechRequest, SystemSpeech};
pub use router::{Provider, SpeechClip, SpeechRouter};
