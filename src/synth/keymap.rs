use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::input::{playable_keys, KeyId};
use crate::DEFAULT_FREQUENCY;

/*
Key/Frequency Map
=================

A shuffled bijection from the playable key set onto a fixed frequency
palette. The palette is chromatic from 110 Hz upward, one slot per key, so
every key owns exactly one pitch - but WHICH pitch is decided by a shuffle.
Regenerating the map rebinds the whole keyboard at once, which is the
instrument's "retune everything" gesture.

Reads never fail: a key outside the playable set (or a map that somehow lost
an entry) falls back to DEFAULT_FREQUENCY instead of erroring, per the
missing-mapping rule.
*/

/// Lowest palette frequency (A2).
const PALETTE_BASE_HZ: f32 = 110.0;

pub struct KeyFrequencyMap {
    map: HashMap<KeyId, f32>,
    rng: SmallRng,
}

impl KeyFrequencyMap {
    pub fn new() -> Self {
        let mut this = Self {
            map: HashMap::new(),
            rng: SmallRng::from_os_rng(),
        };
        this.regenerate();
        this
    }

    /// The fixed frequency palette: one chromatic step per playable key,
    /// 110 Hz up to ~2 kHz.
    pub fn palette() -> Vec<f32> {
        (0..playable_keys().count())
            .map(|i| PALETTE_BASE_HZ * 2.0_f32.powf(i as f32 / 12.0))
            .collect()
    }

    /// Reshuffle the bijection. Only this operation writes the map.
    pub fn regenerate(&mut self) {
        let mut palette = Self::palette();
        palette.shuffle(&mut self.rng);

        self.map.clear();
        for (key, freq) in playable_keys().zip(palette) {
            self.map.insert(key, freq);
        }
    }

    /// Frequency bound to `key`, or the default for unmapped keys.
    pub fn frequency(&self, key: KeyId) -> f32 {
        self.map.get(&key).copied().unwrap_or(DEFAULT_FREQUENCY)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for KeyFrequencyMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_playable_key_is_mapped() {
        let map = KeyFrequencyMap::new();
        let palette = KeyFrequencyMap::palette();
        assert_eq!(map.len(), playable_keys().count());

        for key in playable_keys() {
            let freq = map.frequency(key);
            assert!(
                palette.contains(&freq),
                "key {key} maps outside the palette: {freq}"
            );
        }
    }

    #[test]
    fn mapping_is_a_bijection() {
        let map = KeyFrequencyMap::new();
        let frequencies: HashSet<u32> = playable_keys()
            .map(|k| map.frequency(k).to_bits())
            .collect();
        assert_eq!(frequencies.len(), map.len(), "two keys share a frequency");
    }

    #[test]
    fn unmapped_keys_fall_back_to_default() {
        let map = KeyFrequencyMap::new();
        assert_eq!(map.frequency('7'), DEFAULT_FREQUENCY);
        assert_eq!(map.frequency(' '), DEFAULT_FREQUENCY);
    }

    #[test]
    fn regenerate_reshuffles() {
        let mut map = KeyFrequencyMap::new();
        let before: Vec<f32> = playable_keys().map(|k| map.frequency(k)).collect();

        // One reshuffle could coincide on a few keys; all of them matching
        // across several reshuffles would mean regenerate does nothing.
        let mut changed = false;
        for _ in 0..4 {
            map.regenerate();
            let after: Vec<f32> = playable_keys().map(|k| map.frequency(k)).collect();
            if before != after {
                changed = true;
                break;
            }
        }
        assert!(changed, "regenerate never changed the binding");
    }
}
