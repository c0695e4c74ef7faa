// Binary payload codec: little-endian i32 blocks <-> f64 sample sequences

use crate::core::constants::SAMPLE_SIZE;

/// Widens a block of little-endian i32 samples to f64, in order.
///
/// The caller sizes `raw` to exactly `SAMPLE_SIZE * n`; a trailing partial
/// sample would have been rejected upstream as truncated data.
pub fn decode_samples(raw: &[u8]) -> Vec<f64> {
    raw.chunks_exact(SAMPLE_SIZE)
        .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap()) as f64)
        .collect()
}

/// Narrows samples back to little-endian i32 bytes.
///
/// Conversion truncates toward zero; out-of-range values saturate rather
/// than error, matching `as i32`.
pub fn encode_samples(samples: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * SAMPLE_SIZE);
    for &value in samples {
        out.extend_from_slice(&(value as i32).to_le_bytes());
    }
    out
}
