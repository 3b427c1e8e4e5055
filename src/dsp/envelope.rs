use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Gain Envelope
=============

Attack / sustain / release gain contour with selectable release curves. This
drives every voice and percussion hit in the engine:

  keyed voices       linear attack straight up to the sustain level, hold
                     while the key is down, then an EXPONENTIAL release whose
                     duration is chosen at note-off time (the allocator
                     randomizes it so repeated notes decay differently).

  percussion shots   near-instant attack to full level, then an exponential
                     decay to silence with no sustain. The shot is finished
                     when the envelope goes idle, which is what lets one-shot
                     graphs dispose of themselves.

  hard teardown      clear-all switches the release to a short LINEAR ramp so
                     everything is audibly gone within a few milliseconds.

Level
  peak ┐   ╱╲
       │  ╱  ╲ _ _ _ _ _ _
  sus  │ ╱                ╲
       │╱                  ╲ ⌒ ⌒ ─ ─
  0.0  └────────────────────────────→ time
       attack  decay  sustain  release

Exponential segments multiply toward their target each sample and never quite
reach it; the stage ends at a -80 dB floor and snaps to the exact target. That
matches how struck and plucked sounds actually die away, and it is why the
release is specified as ramping "toward, not exactly, zero".

The per-sample coefficient for a segment that should take `t` seconds to fall
by 60 dB is

    k = 0.001^(1 / (t * sample_rate))

so after t seconds the level has shrunk by a factor of 1000.
*/

/// Stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Shape of the release segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseCurve {
    /// Straight ramp to zero. Used for hard teardown (clear-all).
    Linear,
    /// Multiplicative decay toward zero with a -80 dB floor. The musical
    /// default.
    Exponential,
}

/// Level at which an exponential segment is considered finished.
const EXP_FLOOR: f32 = 1e-4;

/// Ratio covered by the nominal exponential segment time (-60 dB).
const EXP_RATIO: f32 = 1e-3;

pub struct Envelope {
    // Contour parameters
    attack_time: f32,
    decay_time: f32,
    peak_level: f32,
    sustain_level: f32,
    release_time: f32,
    release_curve: ReleaseCurve,

    // Runtime state
    stage: EnvStage,
    level: f32,

    // Release bookkeeping, captured at note-off
    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    /// Gated envelope for keyed voices: linear attack directly to the sustain
    /// level, exponential release.
    pub fn gate(attack: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: 0.0,
            peak_level: sustain.clamp(0.0, 1.0),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_TIME),
            release_curve: ReleaseCurve::Exponential,
            stage: EnvStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// One-shot envelope for percussion: instant-ish attack to full level,
    /// exponential decay to silence, no sustain.
    pub fn percussive(attack: f32, decay: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            peak_level: 1.0,
            sustain_level: 0.0,
            release_time: decay.max(MIN_TIME),
            release_curve: ReleaseCurve::Exponential,
            stage: EnvStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Gate high: restart the attack from zero for a clean retrigger.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.stage = EnvStage::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: begin the release from the current level, whatever stage we
    /// are in. Any in-flight attack/decay movement is abandoned here, which
    /// is the "cancel scheduled changes, capture current gain" contract.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if self.stage == EnvStage::Idle {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples =
            (self.release_time.max(MIN_TIME) * ctx.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvStage::Release;
    }

    /// Override the release duration and curve. Takes effect at the next
    /// `note_off`; if the envelope is already releasing, the segment restarts
    /// from the current level with the new parameters.
    pub fn set_release(&mut self, seconds: f32, curve: ReleaseCurve) {
        self.release_time = seconds.max(MIN_TIME);
        self.release_curve = curve;

        if self.stage == EnvStage::Release {
            self.release_start_level = self.level;
            self.release_elapsed_samples = 0;
            self.release_total_samples = 1;
        }
    }

    /// Advance one sample and return the new level.
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        match self.stage {
            EnvStage::Idle => {
                self.level = 0.0;
            }

            EnvStage::Attack => {
                let increment = self.peak_level / (self.attack_time * ctx.sample_rate);
                self.level += increment;

                if self.level >= self.peak_level {
                    self.level = self.peak_level;
                    self.stage = if self.decay_time > 0.0 {
                        EnvStage::Decay
                    } else {
                        EnvStage::Sustain
                    };
                }
            }

            EnvStage::Decay => {
                let k = EXP_RATIO.powf(1.0 / (self.decay_time * ctx.sample_rate));
                self.level = self.sustain_level + (self.level - self.sustain_level) * k;

                if (self.level - self.sustain_level).abs() <= EXP_FLOOR {
                    self.level = self.sustain_level;
                    self.stage = if self.sustain_level <= EXP_FLOOR {
                        self.level = 0.0;
                        EnvStage::Idle
                    } else {
                        EnvStage::Sustain
                    };
                }
            }

            EnvStage::Sustain => {
                self.level = self.sustain_level;
            }

            EnvStage::Release => match self.release_curve {
                ReleaseCurve::Linear => {
                    // Lazily compute total samples if set_release restarted us
                    if self.release_total_samples <= 1 {
                        self.release_total_samples =
                            (self.release_time * ctx.sample_rate).round().max(1.0) as u32;
                    }
                    let progress =
                        self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                    self.level = (self.release_start_level * (1.0 - progress)).max(0.0);
                    self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                    if self.release_elapsed_samples >= self.release_total_samples {
                        self.level = 0.0;
                        self.stage = EnvStage::Idle;
                    }
                }
                ReleaseCurve::Exponential => {
                    let k = EXP_RATIO.powf(1.0 / (self.release_time * ctx.sample_rate));
                    self.level *= k;

                    if self.level <= EXP_FLOOR {
                        self.level = 0.0;
                        self.stage = EnvStage::Idle;
                    }
                }
            },
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }

    /// Returns true while the envelope is producing output.
    pub fn is_active(&self) -> bool {
        self.stage != EnvStage::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0)
    }

    fn run(env: &mut Envelope, samples: usize) {
        let ctx = ctx();
        for _ in 0..samples {
            env.next_sample(&ctx);
        }
    }

    #[test]
    fn attack_reaches_sustain_level() {
        let sustain = 0.35;
        let mut env = Envelope::gate(0.01, sustain, 0.2);

        env.note_on();
        run(&mut env, (0.01 * SAMPLE_RATE) as usize + 2);

        assert_eq!(env.stage(), EnvStage::Sustain);
        assert!((env.level() - sustain).abs() < 1e-3);
    }

    #[test]
    fn exponential_release_decays_without_touching_zero_early() {
        let mut env = Envelope::gate(0.005, 0.5, 0.05);
        env.note_on();
        run(&mut env, 20);
        env.note_off(&ctx());

        // Halfway through the nominal release the level must still be nonzero
        run(&mut env, (0.025 * SAMPLE_RATE) as usize);
        assert!(env.level() > 0.0, "exponential release hit zero too early");
        assert_eq!(env.stage(), EnvStage::Release);

        // Well past the nominal time it must have gone idle
        run(&mut env, (0.3 * SAMPLE_RATE) as usize);
        assert_eq!(env.stage(), EnvStage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn linear_release_hits_zero_on_schedule() {
        let mut env = Envelope::gate(0.005, 0.5, 0.4);
        env.note_on();
        run(&mut env, 20);

        env.set_release(0.03, ReleaseCurve::Linear);
        env.note_off(&ctx());
        run(&mut env, (0.03 * SAMPLE_RATE) as usize + 2);

        assert_eq!(env.stage(), EnvStage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn percussive_envelope_expires_on_its_own() {
        let mut env = Envelope::percussive(0.001, 0.05);
        env.note_on();

        run(&mut env, (0.5 * SAMPLE_RATE) as usize);
        assert!(!env.is_active(), "percussive envelope should self-expire");
    }

    #[test]
    fn note_off_during_attack_releases_from_current_level() {
        let mut env = Envelope::gate(0.1, 0.8, 0.2);
        env.note_on();
        run(&mut env, (0.02 * SAMPLE_RATE) as usize);

        let mid_attack = env.level();
        assert!(mid_attack > 0.0 && mid_attack < 0.8);

        env.note_off(&ctx());
        let ctx = ctx();
        let next = env.next_sample(&ctx);
        assert!(next <= mid_attack, "release must start from the captured level");
    }
}
