use rand::rngs::SmallRng;

use crate::beat::pattern::{triggers, BeatStyle, DrumTrigger};

/*
Beat Sequencer
==============

A sixteenth-note step clock on the engine's sample clock.

  tick period  =  60 / bpm / 4 seconds  =  one sixteenth note

The sequencer does not own a timer. Every audio block, `advance` is handed
the current sample time and schedules every tick that falls before

  now + block + LOOKAHEAD

The ~50 ms look-ahead absorbs callback jitter: a tick landing just past a
block boundary is already scheduled (with its exact sample timestamp) before
the block that contains it begins, so percussion starts sample-accurately no
matter how the block boundaries fall.

State machine: Stopped ⇄ Running { style, variant, step }. Starting while
running restarts from step 0. There is no in-place tempo change - the engine
stops and restarts for nudges, which keeps every derived quantity (samples
per step, next tick time) consistent by construction.
*/

pub const STEPS_PER_CYCLE: u32 = 16;

/// Scheduling look-ahead in seconds.
pub const LOOKAHEAD: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequencerState {
    Stopped,
    Running {
        style: BeatStyle,
        variant: u8,
        /// Monotonic step counter; the pattern position is `step % 16`.
        step: u64,
    },
}

/// A percussion hit scheduled at an absolute sample time.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledHit {
    pub at: u64,
    pub trigger: DrumTrigger,
}

pub struct BeatSequencer {
    state: SequencerState,
    bpm: f32,
    samples_per_step: f64,
    /// Absolute sample time of the next unscheduled tick.
    next_tick: f64,
}

impl BeatSequencer {
    pub fn new() -> Self {
        Self {
            state: SequencerState::Stopped,
            bpm: 0.0,
            samples_per_step: 0.0,
            next_tick: 0.0,
        }
    }

    /// Start (or restart) the step clock. Any existing run is discarded and
    /// the step index resets to 0; the first tick lands at `now`.
    pub fn start(&mut self, bpm: f32, style: BeatStyle, variant: u8, now: u64, sample_rate: f32) {
        let bpm = bpm.clamp(20.0, 400.0);
        self.bpm = bpm;
        self.samples_per_step = (60.0 / bpm as f64 / 4.0) * sample_rate as f64;
        self.next_tick = now as f64;
        self.state = SequencerState::Running {
            style,
            variant,
            step: 0,
        };
    }

    /// Stop the clock. Idempotent.
    pub fn stop(&mut self) {
        self.state = SequencerState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SequencerState::Running { .. })
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Pattern position of the most recently scheduled tick, for display.
    pub fn current_step(&self) -> Option<u32> {
        match self.state {
            SequencerState::Running { step, .. } if step > 0 => {
                Some(((step - 1) % STEPS_PER_CYCLE as u64) as u32)
            }
            _ => None,
        }
    }

    /// Schedule every tick that falls before `now + block_len + LOOKAHEAD`,
    /// appending the resulting hits (with absolute sample timestamps) to
    /// `out`. Called once per audio block.
    pub fn advance(
        &mut self,
        now: u64,
        block_len: usize,
        sample_rate: f32,
        rng: &mut SmallRng,
        out: &mut Vec<ScheduledHit>,
    ) {
        let SequencerState::Running {
            style,
            variant,
            ref mut step,
        } = self.state
        else {
            return;
        };

        let horizon = now as f64 + block_len as f64 + (LOOKAHEAD * sample_rate) as f64;

        while self.next_tick < horizon {
            let position = (*step % STEPS_PER_CYCLE as u64) as u32;
            let at = self.next_tick.round() as u64;

            for trigger in triggers(style, variant, position, rng) {
                out.push(ScheduledHit { at, trigger });
            }

            *step += 1;
            self.next_tick += self.samples_per_step;
        }
    }
}

impl Default for BeatSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::pattern::Drum;
    use rand::SeedableRng;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn drive(seq: &mut BeatSequencer, blocks: usize, block_len: usize) -> Vec<ScheduledHit> {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut hits = Vec::new();
        let mut now = 0u64;
        for _ in 0..blocks {
            seq.advance(now, block_len, SAMPLE_RATE, &mut rng, &mut hits);
            now += block_len as u64;
        }
        hits
    }

    #[test]
    fn tick_period_matches_the_tempo() {
        let bpm = 174.0;
        let mut seq = BeatSequencer::new();
        seq.start(bpm, BeatStyle::Dnb, 0, 0, SAMPLE_RATE);

        let hits = drive(&mut seq, 200, 512);
        let kicks: Vec<u64> = hits
            .iter()
            .filter(|h| h.trigger.drum == Drum::Kick)
            .map(|h| h.at)
            .collect();

        // DNB kicks land on steps 0 and 10: within one cycle the gap is 10
        // steps, then 6 steps to the next cycle's step 0.
        let samples_per_step = 60.0 / bpm as f64 / 4.0 * SAMPLE_RATE as f64;
        assert!(kicks.len() >= 4);
        let gap_a = (kicks[1] - kicks[0]) as f64;
        let gap_b = (kicks[2] - kicks[1]) as f64;
        assert!((gap_a - 10.0 * samples_per_step).abs() < 2.0, "gap {gap_a}");
        assert!((gap_b - 6.0 * samples_per_step).abs() < 2.0, "gap {gap_b}");
    }

    #[test]
    fn dnb_cycle_places_kick_and_snare_per_pattern() {
        let mut seq = BeatSequencer::new();
        seq.start(174.0, BeatStyle::Dnb, 0, 0, SAMPLE_RATE);

        let hits = drive(&mut seq, 400, 512);
        let samples_per_step = 60.0 / 174.0 / 4.0 * SAMPLE_RATE as f64;

        let step_of = |at: u64| ((at as f64 / samples_per_step).round() as u64 % 16) as u32;

        for hit in &hits {
            match hit.trigger.drum {
                Drum::Kick => assert!(matches!(step_of(hit.at), 0 | 10)),
                Drum::Snare => assert!(matches!(step_of(hit.at), 4 | 12)),
                Drum::Hat => {}
            }
        }
    }

    #[test]
    fn hits_are_scheduled_ahead_of_their_block() {
        // DNB variant 1 has a hat on every step, so every tick carries a hit
        let mut seq = BeatSequencer::new();
        seq.start(120.0, BeatStyle::Dnb, 1, 0, SAMPLE_RATE);

        // One sixteenth at 120 BPM is 6000 samples; a 4096-sample block plus
        // the 2400-sample look-ahead reaches past the tick at 6000.
        let mut rng = SmallRng::seed_from_u64(1);
        let mut hits = Vec::new();
        seq.advance(0, 4_096, SAMPLE_RATE, &mut rng, &mut hits);

        let lookahead = (LOOKAHEAD * SAMPLE_RATE) as u64;
        assert!(hits.iter().all(|h| h.at < 4_096 + lookahead + 1));
        assert!(
            hits.iter().any(|h| h.at >= 4_096),
            "expected at least one hit scheduled past the block boundary"
        );
    }

    #[test]
    fn steps_increase_monotonically_mod_sixteen() {
        let mut seq = BeatSequencer::new();
        seq.start(174.0, BeatStyle::Dnb, 1, 0, SAMPLE_RATE);

        let hits = drive(&mut seq, 300, 512);
        let samples_per_step = 60.0 / 174.0 / 4.0 * SAMPLE_RATE as f64;

        let mut last = -1.0f64;
        for hit in &hits {
            let tick = (hit.at as f64 / samples_per_step).round();
            assert!(tick >= last, "tick order went backwards");
            last = tick;
        }
    }

    #[test]
    fn restart_resets_the_step_index() {
        let mut seq = BeatSequencer::new();
        seq.start(174.0, BeatStyle::Dnb, 0, 0, SAMPLE_RATE);
        drive(&mut seq, 50, 512);

        seq.start(140.0, BeatStyle::House, 0, 100_000, SAMPLE_RATE);
        match seq.state() {
            SequencerState::Running { step, style, .. } => {
                assert_eq!(step, 0);
                assert_eq!(style, BeatStyle::House);
            }
            SequencerState::Stopped => panic!("sequencer should be running"),
        }
    }

    #[test]
    fn stop_is_idempotent_and_halts_scheduling() {
        let mut seq = BeatSequencer::new();
        seq.start(120.0, BeatStyle::House, 0, 0, SAMPLE_RATE);
        seq.stop();
        seq.stop();

        let hits = drive(&mut seq, 20, 512);
        assert!(hits.is_empty());
    }
}
