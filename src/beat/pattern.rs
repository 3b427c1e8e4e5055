use rand::rngs::SmallRng;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Beat Patterns
=============

A pattern is a read-only table mapping (style, variant, step mod 16) to a set
of drum triggers. Sixteen steps is one bar of sixteenth notes; the tables are
plain bitmasks, bit N set = the drum fires on step N.

      step            0123456789012345
      DNB kick        X.........X.....      the classic two-step
      DNB snare       ....X.......X...
      house kick      X...X...X...X...      four on the floor

The breakcore style is different in kind: there is no table. Every step rolls
an independent Bernoulli per drum, with velocity and pitch drawn uniformly
per hit. Two runs never sound the same; that is the point.
*/

/// Drum machine styles.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatStyle {
    Dnb,
    House,
    Breaks,
    Breakcore,
}

impl BeatStyle {
    pub const ALL: [BeatStyle; 4] = [
        BeatStyle::Dnb,
        BeatStyle::House,
        BeatStyle::Breaks,
        BeatStyle::Breakcore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BeatStyle::Dnb => "dnb",
            BeatStyle::House => "house",
            BeatStyle::Breaks => "breaks",
            BeatStyle::Breakcore => "breakcore",
        }
    }

    /// Number of pattern variants for this style.
    pub fn variant_count(self) -> u8 {
        match self {
            BeatStyle::Dnb => 2,
            BeatStyle::House => 2,
            BeatStyle::Breaks => 1,
            BeatStyle::Breakcore => 1,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drum {
    Kick,
    Snare,
    Hat,
}

/// One percussion hit: what to play, how hard, and a frequency scale factor
/// (1.0 = the drum's native tuning).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumTrigger {
    pub drum: Drum,
    pub velocity: f32,
    pub pitch: f32,
}

/// Step masks for one deterministic pattern.
struct Table {
    kick: u16,
    snare: u16,
    hat: u16,
}

const DNB_0: Table = Table {
    kick: 1 << 0 | 1 << 10,
    snare: 1 << 4 | 1 << 12,
    hat: 0b0101_0101_0101_0101,
};

// Same skeleton, busier hats. The kick/snare placement is what makes DNB
// read as DNB, so variants leave it alone.
const DNB_1: Table = Table {
    kick: 1 << 0 | 1 << 10,
    snare: 1 << 4 | 1 << 12,
    hat: 0b1111_1111_1111_1111,
};

const HOUSE_0: Table = Table {
    kick: 1 << 0 | 1 << 4 | 1 << 8 | 1 << 12,
    snare: 1 << 4 | 1 << 12,
    hat: 1 << 2 | 1 << 6 | 1 << 10 | 1 << 14,
};

const HOUSE_1: Table = Table {
    kick: 1 << 0 | 1 << 4 | 1 << 8 | 1 << 12,
    snare: 1 << 4 | 1 << 12,
    hat: 0b0101_0101_0101_0101,
};

const BREAKS_0: Table = Table {
    kick: 1 << 0 | 1 << 6 | 1 << 10,
    snare: 1 << 4 | 1 << 12 | 1 << 15,
    hat: 0b0101_0101_0101_0101,
};

fn table(style: BeatStyle, variant: u8) -> &'static Table {
    match (style, variant) {
        (BeatStyle::Dnb, 1) => &DNB_1,
        (BeatStyle::Dnb, _) => &DNB_0,
        (BeatStyle::House, 1) => &HOUSE_1,
        (BeatStyle::House, _) => &HOUSE_0,
        (BeatStyle::Breaks, _) => &BREAKS_0,
        (BeatStyle::Breakcore, _) => unreachable!("breakcore has no table"),
    }
}

/// Per-step Bernoulli densities for breakcore, one per drum.
const BREAKCORE_KICK_DENSITY: f64 = 0.42;
const BREAKCORE_SNARE_DENSITY: f64 = 0.33;
const BREAKCORE_HAT_DENSITY: f64 = 0.65;

fn accent(step: u32) -> f32 {
    if step % 4 == 0 {
        1.0
    } else {
        0.8
    }
}

/// Triggers for one step of the pattern. Deterministic styles ignore the
/// RNG; breakcore draws everything from it.
pub fn triggers(style: BeatStyle, variant: u8, step: u32, rng: &mut SmallRng) -> Vec<DrumTrigger> {
    let step = step % 16;

    if style == BeatStyle::Breakcore {
        let mut hits = Vec::new();
        for (drum, density) in [
            (Drum::Kick, BREAKCORE_KICK_DENSITY),
            (Drum::Snare, BREAKCORE_SNARE_DENSITY),
            (Drum::Hat, BREAKCORE_HAT_DENSITY),
        ] {
            if rng.random_bool(density) {
                let semitones: f32 = rng.random_range(-5.0..5.0);
                hits.push(DrumTrigger {
                    drum,
                    velocity: rng.random_range(0.35..1.0),
                    pitch: 2.0_f32.powf(semitones / 12.0),
                });
            }
        }
        return hits;
    }

    let table = table(style, variant);
    let bit = 1u16 << step;
    let mut hits = Vec::new();

    if table.kick & bit != 0 {
        hits.push(DrumTrigger {
            drum: Drum::Kick,
            velocity: accent(step),
            pitch: 1.0,
        });
    }
    if table.snare & bit != 0 {
        hits.push(DrumTrigger {
            drum: Drum::Snare,
            velocity: accent(step),
            pitch: 1.0,
        });
    }
    if table.hat & bit != 0 {
        hits.push(DrumTrigger {
            drum: Drum::Hat,
            velocity: if step % 2 == 0 { 0.7 } else { 0.45 },
            pitch: 1.0,
        });
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn steps_with(style: BeatStyle, variant: u8, drum: Drum) -> Vec<u32> {
        let mut rng = rng();
        (0..16)
            .filter(|&step| {
                triggers(style, variant, step, &mut rng)
                    .iter()
                    .any(|t| t.drum == drum)
            })
            .collect()
    }

    #[test]
    fn dnb_places_kick_and_snare_on_the_two_step() {
        for variant in 0..BeatStyle::Dnb.variant_count() {
            assert_eq!(steps_with(BeatStyle::Dnb, variant, Drum::Kick), vec![0, 10]);
            assert_eq!(steps_with(BeatStyle::Dnb, variant, Drum::Snare), vec![4, 12]);
        }
    }

    #[test]
    fn house_is_four_on_the_floor() {
        assert_eq!(
            steps_with(BeatStyle::House, 0, Drum::Kick),
            vec![0, 4, 8, 12]
        );
    }

    #[test]
    fn step_lookup_wraps_mod_sixteen() {
        let mut rng = rng();
        let at_two = triggers(BeatStyle::Dnb, 0, 2, &mut rng);
        let at_eighteen = triggers(BeatStyle::Dnb, 0, 18, &mut rng);
        assert_eq!(at_two, at_eighteen);
    }

    #[test]
    fn breakcore_randomizes_velocity_and_pitch() {
        let mut rng = rng();
        let mut hits = Vec::new();
        for step in 0..256 {
            hits.extend(triggers(BeatStyle::Breakcore, 0, step, &mut rng));
        }

        assert!(!hits.is_empty(), "expected some breakcore hits in 16 bars");
        for hit in &hits {
            assert!((0.35..=1.0).contains(&hit.velocity));
            // ±5 semitones
            assert!(hit.pitch > 0.74 && hit.pitch < 1.35);
        }

        // Hits should not all share one velocity - they are drawn per hit
        let first = hits[0].velocity;
        assert!(hits.iter().any(|h| (h.velocity - first).abs() > 1e-3));
    }

    #[test]
    fn deterministic_styles_ignore_the_rng() {
        let mut rng_a = SmallRng::seed_from_u64(1);
        let mut rng_b = SmallRng::seed_from_u64(999);
        for step in 0..16 {
            assert_eq!(
                triggers(BeatStyle::Breaks, 0, step, &mut rng_a),
                triggers(BeatStyle::Breaks, 0, step, &mut rng_b)
            );
        }
    }
}
