use thiserror::Error;

/*
Cloud speech payload codec
==========================

The cloud provider returns raw PCM: little-endian signed 16-bit, mono, at a
fixed 24 kHz. No header, no framing - the byte length must simply be even.

Decoding maps each i16 onto [-1, 1) by dividing by 32768; encoding clamps and
scales back. A round trip reconstructs every sample within one quantization
step (1/32768), which is the property the tests pin down.
*/

/// Sample rate of the cloud PCM payload, in Hz.
pub const SAMPLE_RATE: u32 = 24_000;

#[derive(Debug, Error)]
pub enum PcmError {
    #[error("PCM payload has odd length {0}")]
    OddLength(usize),
    #[error("PCM payload is empty")]
    Empty,
}

/// Decode a raw PCM16-LE mono payload into float samples.
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, PcmError> {
    if bytes.is_empty() {
        return Err(PcmError::Empty);
    }
    if bytes.len() % 2 != 0 {
        return Err(PcmError::OddLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32_768.0)
        .collect())
}

/// Encode float samples as raw PCM16-LE mono. Samples are clamped to [-1, 1].
pub fn encode(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32_767.0).round() as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Linear-interpolation resample from the payload rate to the engine rate.
pub fn resample(samples: &[f32], from_hz: u32, to_hz: u32) -> Vec<f32> {
    if from_hz == to_hz || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_hz as f64 / to_hz as f64;
    let out_len = ((samples.len() as f64) / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let position = i as f64 * ratio;
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let a = samples[index];
        let b = samples[(index + 1).min(samples.len() - 1)];
        out.push(a + (b - a) * frac);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_within_quantization_error() {
        let samples: Vec<f32> = (0..1_000)
            .map(|i| ((i as f32) * 0.7).sin() * 0.9)
            .collect();

        let decoded = decode(&encode(&samples)).unwrap();
        assert_eq!(decoded.len(), samples.len());

        for (original, restored) in samples.iter().zip(&decoded) {
            assert!(
                (original - restored).abs() <= 1.0 / 32_768.0 + f32::EPSILON,
                "sample drifted beyond one quantization step: {original} vs {restored}"
            );
        }
    }

    #[test]
    fn known_bytes_decode_to_known_values() {
        // 0x7FFF = 32767 ≈ +1.0, 0x8000 = -32768 = -1.0, zero is zero
        let bytes = [0xFF, 0x7F, 0x00, 0x80, 0x00, 0x00];
        let samples = decode(&bytes).unwrap();

        assert!((samples[0] - 32_767.0 / 32_768.0).abs() < 1e-6);
        assert!((samples[1] + 1.0).abs() < 1e-6);
        assert_eq!(samples[2], 0.0);
    }

    #[test]
    fn odd_length_is_rejected() {
        assert!(matches!(decode(&[1, 2, 3]), Err(PcmError::OddLength(3))));
        assert!(matches!(decode(&[]), Err(PcmError::Empty)));
    }

    #[test]
    fn encode_clamps_out_of_range_samples() {
        let bytes = encode(&[2.0, -2.0]);
        let samples = decode(&bytes).unwrap();
        assert!(samples[0] > 0.99);
        assert!(samples[1] < -0.99);
    }

    #[test]
    fn resample_halves_and_preserves_shape() {
        let samples: Vec<f32> = (0..480).map(|i| (i as f32 * 0.05).sin()).collect();
        let out = resample(&samples, 48_000, 24_000);

        assert_eq!(out.len(), 240);
        // Every output sample should sit between its neighbors' extremes
        assert!(out.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 24_000, 24_000), samples);
    }
}
