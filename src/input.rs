//! Input boundary: discrete key events and tempo nudges.
//!
//! The instrument accepts letters of two alphabets - Latin and Greek - which
//! matches the register of the text fragments it speaks. Everything else at
//! the input edge is normalized away here so the rest of the crate only ever
//! sees a playable `KeyId` or a nudge.

/// A playable key identifier (a normalized lowercase letter).
pub type KeyId = char;

/// Direction of a tempo nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Up,
    Down,
}

/// A discrete input event at the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyId),
    KeyUp(KeyId),
    TempoNudge(Nudge),
}

/// Normalize a raw character to a playable key, if it is one.
///
/// Accepts Latin a-z (either case) and Greek α-ω (either case). Key-repeat
/// suppression is NOT done here - the voice allocator's idempotence handles
/// repeats on the press path.
pub fn playable_key(raw: char) -> Option<KeyId> {
    let lower = raw.to_lowercase().next().unwrap_or(raw);
    if lower.is_ascii_lowercase() || ('\u{03B1}'..='\u{03C9}').contains(&lower) {
        Some(lower)
    } else {
        None
    }
}

/// The full playable key set, in a stable order: a-z then α-ω.
pub fn playable_keys() -> impl Iterator<Item = KeyId> + Clone {
    ('a'..='z').chain('\u{03B1}'..='\u{03C9}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_letters_are_playable() {
        assert_eq!(playable_key('a'), Some('a'));
        assert_eq!(playable_key('Z'), Some('z'));
    }

    #[test]
    fn greek_letters_are_playable() {
        assert_eq!(playable_key('α'), Some('α'));
        assert_eq!(playable_key('Ω'), Some('ω'));
        assert_eq!(playable_key('λ'), Some('λ'));
    }

    #[test]
    fn non_letters_are_rejected() {
        for raw in ['1', ' ', '.', '\n', '#'] {
            assert_eq!(playable_key(raw), None, "{raw:?} should not be playable");
        }
    }

    #[test]
    fn key_set_has_both_alphabets() {
        let keys: Vec<KeyId> = playable_keys().collect();
        assert_eq!(keys.len(), 26 + 25);
        assert!(keys.contains(&'q'));
        assert!(keys.contains(&'ψ'));
    }
}
