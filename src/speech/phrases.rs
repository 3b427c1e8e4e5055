use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use thiserror::Error;

use log::warn;

/*
Phrase Pool
===========

The text-generation boundary. A `PhraseSource` is an asynchronous-ish
collaborator that, when asked, returns an ordered list of short strings -
the philosophical fragments the instrument speaks and floats across the
scene. The pool refreshes itself from the source opportunistically; when the
source fails (network, quota, whatever), the built-in fallback list takes
over so fragment selection NEVER comes up empty.

The fallback list is part of the instrument, not an error message: these are
the lines it ships with.
*/

#[derive(Debug, Error)]
pub enum PhraseError {
    #[error("phrase source unavailable: {0}")]
    Unavailable(String),
    #[error("phrase source returned nothing")]
    Empty,
}

/// Collaborator returning a fresh batch of phrases.
pub trait PhraseSource: Send {
    fn fetch(&mut self) -> Result<Vec<String>, PhraseError>;
}

/// Built-in fragments used whenever the source has nothing for us.
pub const FALLBACK_PHRASES: [&str; 14] = [
    "the stars do not ask to be counted",
    "every signal decays into its own silence",
    "you are the instrument being played",
    "repetition is a form of forgetting",
    "the void hums at its own tempo",
    "light arrives long after its departure",
    "a key pressed is a question asked",
    "entropy keeps perfect time",
    "the planet turns without an audience",
    "meaning is a resonance, briefly held",
    "what fades was still here",
    "the universe rehearses nothing",
    "each tone is the history of its attack",
    "silence is the oldest instrument",
];

/// Pool of speakable phrases with refresh-or-fallback semantics.
pub struct PhrasePool {
    phrases: Vec<String>,
    rng: SmallRng,
}

impl PhrasePool {
    /// A pool seeded with the built-in fragments.
    pub fn new() -> Self {
        Self {
            phrases: FALLBACK_PHRASES.iter().map(|s| s.to_string()).collect(),
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Replace the pool from the source. On any failure - including a source
    /// that "succeeds" with an empty list - the pool falls back to the
    /// built-in fragments and keeps going. Never errors to the caller.
    pub fn refresh(&mut self, source: &mut dyn PhraseSource) {
        match source.fetch() {
            Ok(phrases) if !phrases.is_empty() => {
                self.phrases = phrases;
            }
            Ok(_) => {
                warn!("phrase source returned an empty list, using fallback");
                self.use_fallback();
            }
            Err(err) => {
                warn!("phrase fetch failed ({err}), using fallback");
                self.use_fallback();
            }
        }
    }

    fn use_fallback(&mut self) {
        self.phrases = FALLBACK_PHRASES.iter().map(|s| s.to_string()).collect();
    }

    /// Pick a random phrase. The pool is never empty, so this always
    /// returns something.
    pub fn pick(&mut self) -> &str {
        self.phrases
            .choose(&mut self.rng)
            .map(|s| s.as_str())
            .unwrap_or(FALLBACK_PHRASES[0])
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for PhrasePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;
    impl PhraseSource for FailingSource {
        fn fetch(&mut self) -> Result<Vec<String>, PhraseError> {
            Err(PhraseError::Unavailable("no network".into()))
        }
    }

    struct EmptySource;
    impl PhraseSource for EmptySource {
        fn fetch(&mut self) -> Result<Vec<String>, PhraseError> {
            Ok(Vec::new())
        }
    }

    struct GoodSource;
    impl PhraseSource for GoodSource {
        fn fetch(&mut self) -> Result<Vec<String>, PhraseError> {
            Ok(vec!["fresh one".into(), "fresh two".into()])
        }
    }

    #[test]
    fn fallback_list_is_big_enough() {
        assert!(FALLBACK_PHRASES.len() >= 10);
    }

    #[test]
    fn failed_fetch_falls_back_and_still_picks() {
        let mut pool = PhrasePool::new();
        pool.refresh(&mut FailingSource);

        assert!(!pool.is_empty());
        let phrase = pool.pick().to_string();
        assert!(FALLBACK_PHRASES.contains(&phrase.as_str()));
    }

    #[test]
    fn empty_fetch_counts_as_failure() {
        let mut pool = PhrasePool::new();
        pool.refresh(&mut EmptySource);
        assert_eq!(pool.len(), FALLBACK_PHRASES.len());
    }

    #[test]
    fn successful_fetch_replaces_the_pool() {
        let mut pool = PhrasePool::new();
        pool.refresh(&mut GoodSource);
        assert_eq!(pool.len(), 2);
        assert!(pool.pick().starts_with("fresh"));
    }

    #[test]
    fn pick_covers_the_pool_eventually() {
        let mut pool = PhrasePool::new();
        pool.refresh(&mut GoodSource);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            seen.insert(pool.pick().to_string());
        }
        assert_eq!(seen.len(), 2, "both phrases should appear across picks");
    }
}
