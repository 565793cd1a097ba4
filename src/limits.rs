//! Compile-time constants shared by the codec, the editor and the FFT engine.

use std::ops::RangeInclusive;

/// Sample rate, in Hz, accepted on open and on `CreateNewFile`.
pub const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8_000..=96_000;

/// Byte depth (bytes per sample) accepted on open and on `CreateNewFile`.
pub const BYTE_DEPTH_RANGE: RangeInclusive<u16> = 1..=4;

/// Length, in seconds, accepted by `CreateNewFile`.
pub const NEW_FILE_SECONDS_RANGE: RangeInclusive<u32> = 1..=3600;

/// Maximum number of channels that get resolved to canonical speaker names
/// and exposed as editable `SampledFunction`s.
pub const MAX_CHANNEL_NAMES: usize = 18;

/// Minimum real-sample length (`2N`) a channel is padded up to before its
/// first FFT: the smallest power of two at least
/// `max(original_sample_count * 2, 65_536)`.
pub const MIN_FOURIER_LENGTH: usize = 65_536;

/// Bit depths recognized by the codec (`BadBitdepth` otherwise).
pub const VALID_BIT_DEPTHS: [u16; 4] = [8, 16, 24, 32];
