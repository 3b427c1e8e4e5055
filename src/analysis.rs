use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/*
Spectrum analysis
=================

FFT band levels from the master bus, feeding the glow parameters of the
render boundary. The engine pushes every rendered block in; `levels` windows
the most recent FFT_SIZE samples (Hann), transforms, and averages magnitude
over three coarse bands:

  low    20-200 Hz     kick energy → low glow
  mid    200-1000 Hz   voices      → mid glow
  high   1-4 kHz       hats, air   → high glow

This is display plumbing, not audio: nothing here feeds back into synthesis.
*/

pub const FFT_SIZE: usize = 1024;

const LOW_RANGE_HZ: (f32, f32) = (20.0, 200.0);
const MID_RANGE_HZ: (f32, f32) = (200.0, 1_000.0);
const HIGH_RANGE_HZ: (f32, f32) = (1_000.0, 4_000.0);

/// Averaged magnitudes per band, normalized to roughly 0..1 for display.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandLevels {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    sample_rate: f32,
    /// Ring of the most recent samples, FFT_SIZE long.
    ring: Vec<f32>,
    write_pos: usize,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(FFT_SIZE),
            sample_rate,
            ring: vec![0.0; FFT_SIZE],
            write_pos: 0,
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
        }
    }

    /// Feed one rendered block into the ring.
    pub fn push_block(&mut self, block: &[f32]) {
        for &sample in block {
            self.ring[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % FFT_SIZE;
        }
    }

    fn bin_range(&self, range_hz: (f32, f32)) -> (usize, usize) {
        let hz_per_bin = self.sample_rate / FFT_SIZE as f32;
        let lo = ((range_hz.0 / hz_per_bin) as usize).max(1);
        let hi = ((range_hz.1 / hz_per_bin) as usize).min(FFT_SIZE / 2);
        (lo, hi.max(lo + 1))
    }

    /// Transform the current window and average the band magnitudes.
    pub fn levels(&mut self) -> BandLevels {
        // Unroll the ring into scratch with a Hann window
        for i in 0..FFT_SIZE {
            let sample = self.ring[(self.write_pos + i) % FFT_SIZE];
            let window = 0.5 * (1.0 - (2.0 * PI * i as f32 / FFT_SIZE as f32).cos());
            self.scratch[i] = Complex::new(sample * window, 0.0);
        }

        self.fft.process(&mut self.scratch);

        let band = |this: &Self, range: (f32, f32)| -> f32 {
            let (lo, hi) = this.bin_range(range);
            let sum: f32 = this.scratch[lo..hi].iter().map(|c| c.norm()).sum();
            // Normalize by band width and a loudness fudge for 0..1-ish output
            (sum / (hi - lo) as f32 / 8.0).min(1.0)
        };

        BandLevels {
            low: band(self, LOW_RANGE_HZ),
            mid: band(self, MID_RANGE_HZ),
            high: band(self, HIGH_RANGE_HZ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_block(frequency: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn low_tone_lights_the_low_band() {
        let mut analyzer = SpectrumAnalyzer::new(48_000.0);
        analyzer.push_block(&sine_block(80.0, 48_000.0, FFT_SIZE * 2));

        let levels = analyzer.levels();
        assert!(levels.low > levels.mid * 2.0, "low {levels:?}");
        assert!(levels.low > levels.high * 2.0);
    }

    #[test]
    fn high_tone_lights_the_high_band() {
        let mut analyzer = SpectrumAnalyzer::new(48_000.0);
        analyzer.push_block(&sine_block(2_500.0, 48_000.0, FFT_SIZE * 2));

        let levels = analyzer.levels();
        assert!(levels.high > levels.low * 2.0, "high {levels:?}");
    }

    #[test]
    fn silence_reads_as_zero() {
        let mut analyzer = SpectrumAnalyzer::new(48_000.0);
        analyzer.push_block(&vec![0.0; FFT_SIZE]);

        let levels = analyzer.levels();
        assert!(levels.low < 1e-6 && levels.mid < 1e-6 && levels.high < 1e-6);
    }
}
