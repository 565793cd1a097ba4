//! `fmt ` chunk contents: `WaveFmt`/`WaveFmtExtended`, and channel naming.
//!
//! References:
//! - <http://www-mmsp.ece.mcgill.ca/Documents/AudioFormats/WAVE/Docs/multichaudP.pdf>
//! - <https://docs.microsoft.com/en-us/windows/win32/api/mmreg/ns-mmreg-waveformatextensible>

use uuid::Uuid;

use super::common_format::CommonFormat;
use super::limits::MAX_CHANNEL_NAMES;

/// Speaker assignment for a single channel, resolved from a
/// `WAVEFORMATEXTENSIBLE` channel mask. `channels()` below resolves up to 18
/// canonical names by popping set bits of the mask in ascending
/// bit-position order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelMask {
    FrontLeft,
    FrontRight,
    FrontCenter,
    LowFrequency,
    BackLeft,
    BackRight,
    FrontCenterLeft,
    FrontCenterRight,
    BackCenter,
    SideLeft,
    SideRight,
    TopCenter,
    TopFrontLeft,
    TopFrontCenter,
    TopFrontRight,
    TopBackLeft,
    TopBackCenter,
    TopBackRight,
}

impl ChannelMask {
    /// The 18 mask bit positions, ascending bit position, paired with the
    /// canonical name this codec reports for the channel.
    const BITS: [(u32, ChannelMask); 18] = [
        (0, ChannelMask::FrontLeft),
        (1, ChannelMask::FrontRight),
        (2, ChannelMask::FrontCenter),
        (3, ChannelMask::LowFrequency),
        (4, ChannelMask::BackLeft),
        (5, ChannelMask::BackRight),
        (6, ChannelMask::FrontCenterLeft),
        (7, ChannelMask::FrontCenterRight),
        (8, ChannelMask::BackCenter),
        (9, ChannelMask::SideLeft),
        (10, ChannelMask::SideRight),
        (11, ChannelMask::TopCenter),
        (12, ChannelMask::TopFrontLeft),
        (13, ChannelMask::TopFrontCenter),
        (14, ChannelMask::TopFrontRight),
        (15, ChannelMask::TopBackLeft),
        (16, ChannelMask::TopBackCenter),
        (17, ChannelMask::TopBackRight),
    ];

    /// The canonical, human-readable name for this speaker position.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelMask::FrontLeft => "front left",
            ChannelMask::FrontRight => "front right",
            ChannelMask::FrontCenter => "front center",
            ChannelMask::LowFrequency => "LFE",
            ChannelMask::BackLeft => "back left",
            ChannelMask::BackRight => "back right",
            ChannelMask::FrontCenterLeft => "front center left",
            ChannelMask::FrontCenterRight => "front center right",
            ChannelMask::BackCenter => "back center",
            ChannelMask::SideLeft => "side left",
            ChannelMask::SideRight => "side right",
            ChannelMask::TopCenter => "top center",
            ChannelMask::TopFrontLeft => "top front left",
            ChannelMask::TopFrontCenter => "top front center",
            ChannelMask::TopFrontRight => "top front right",
            ChannelMask::TopBackLeft => "top back left",
            ChannelMask::TopBackCenter => "top back center",
            ChannelMask::TopBackRight => "top back right",
        }
    }

    /// Pop set bits of `mask` in ascending bit-position order, returning up
    /// to `count` (and at most [`MAX_CHANNEL_NAMES`]) canonical names.
    ///
    /// If `channel_count` exceeds the number of set mask bits, the excess
    /// channels are not represented here; the caller (`resolve_channel_names`)
    /// names those `ch N` and marks them non-editable.
    pub fn channels(mask: u32, channel_count: u16) -> Vec<ChannelMask> {
        Self::BITS
            .iter()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, m)| *m)
            .take(channel_count as usize)
            .take(MAX_CHANNEL_NAMES)
            .collect()
    }
}

/// Extended (`WAVEFORMATEXTENSIBLE`) payload of a `fmt ` chunk.
///
/// <https://docs.microsoft.com/en-us/windows/win32/api/mmreg/ns-mmreg-waveformatextensible>
#[derive(Debug, Clone)]
pub struct WaveFmtExtended {
    /// Valid bits per sample (may be less than the container width).
    pub valid_bits_per_sample: u16,

    /// Channel mask identifying the speaker assignment of each channel.
    pub channel_mask: u32,

    /// Subformat GUID identifying the codec of the audio stream.
    pub subformat: Uuid,
}

/// `fmt ` chunk contents: sample rate, frame geometry, and an optional
/// extended payload.
#[derive(Debug, Clone)]
pub struct WaveFmt {
    /// A tag identifying the codec in use; `0xFFFE` defers to
    /// `extended_format`'s subformat GUID.
    pub tag: u16,

    /// Count of audio channels in each frame.
    pub channel_count: u16,

    /// Sample rate of the audio data, in Hz.
    pub sample_rate: u32,

    /// Count of bytes per second; by rule, `block_alignment * sample_rate`.
    pub bytes_per_second: u32,

    /// Count of bytes per audio frame; by rule,
    /// `channel_count * bits_per_sample / 8`.
    pub block_alignment: u16,

    /// Count of bits stored in the file per sample.
    pub bits_per_sample: u16,

    /// Extended format description, present when `tag == 0xFFFE` or when
    /// `channel_count > 2`.
    pub extended_format: Option<WaveFmtExtended>,
}

impl WaveFmt {
    /// Create a new integer-PCM `WaveFmt`. Uses the extensible layout once
    /// there are more than two channels, so anything beyond plain
    /// mono/stereo gets channel-mask-based channel naming.
    pub fn new_pcm(sample_rate: u32, bits_per_sample: u16, channel_count: u16) -> Self {
        assert!(channel_count > 0, "a WaveFmt must have at least one channel");
        let block_alignment = (bits_per_sample / 8) * channel_count;

        let (tag, extended_format) = if channel_count <= 2 {
            (super::common_format::WAVE_TAG_PCM, None)
        } else {
            let mask = match channel_count {
                1 => 0,
                2 => 0b11,
                n => (1u32 << n) - 1,
            };
            (
                super::common_format::WAVE_TAG_EXTENSIBLE,
                Some(WaveFmtExtended {
                    valid_bits_per_sample: bits_per_sample,
                    channel_mask: mask,
                    subformat: super::common_format::WAVE_UUID_PCM,
                }),
            )
        };

        WaveFmt {
            tag,
            channel_count,
            sample_rate,
            bytes_per_second: block_alignment as u32 * sample_rate,
            block_alignment,
            bits_per_sample,
            extended_format,
        }
    }

    /// Resolve this format's tag (and, for the extensible layout, subformat
    /// GUID) to a [`CommonFormat`].
    pub fn common_format(&self) -> CommonFormat {
        let uuid = self.extended_format.as_ref().map(|e| e.subformat);
        CommonFormat::make(self.tag, uuid)
    }

    /// Byte depth (bytes per sample per channel), used to choose the
    /// editor's element precision: depths ≤ 2 use 32-bit, depths ≥ 3 use
    /// 64-bit.
    pub fn byte_depth(&self) -> u16 {
        self.bits_per_sample / 8
    }
}

/// Resolve up to [`MAX_CHANNEL_NAMES`] channel names for a format.
///
/// Falls back to `{mono}`/`{left, right}` for non-extensible formats;
/// returns `(name, editable)` pairs in channel order, naming any channel
/// beyond the mask's bits (or beyond 18 channels) `ch N` and marking it
/// non-editable.
pub fn resolve_channel_names(fmt: &WaveFmt) -> Vec<(String, bool)> {
    let mask_names: Vec<String> = match &fmt.extended_format {
        Some(ext) => ChannelMask::channels(ext.channel_mask, fmt.channel_count)
            .iter()
            .map(|m| m.name().to_string())
            .collect(),
        None => match fmt.channel_count {
            1 => vec!["mono".to_string()],
            2 => vec!["left".to_string(), "right".to_string()],
            _ => vec![],
        },
    };

    (0..fmt.channel_count as usize)
        .map(|i| {
            if i < mask_names.len() && i < MAX_CHANNEL_NAMES {
                (mask_names[i].clone(), true)
            } else if i < MAX_CHANNEL_NAMES {
                (format!("ch {}", i + 1), true)
            } else {
                (format!("ch {}", i + 1), false)
            }
        })
        .collect()
}
