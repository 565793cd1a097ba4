//! Format tags and subformat UUIDs.
//!
//! Only integer PCM is a supported profile (`WAVEFORMATEX` tag `0x0001`, or
//! `WAVEFORMATEXTENSIBLE` with the PCM subtype GUID). Float, MPEG and
//! Ambisonic B-Format tags have no counterpart in the chunk-layout validity
//! rule requiring `fmt ` to describe a supported profile, so
//! `CommonFormat::Other` folds every one of them into the single case the
//! codec needs to reject with `BadFormat`.

use uuid::Uuid;

/// Format tag for integer LPCM.
pub const WAVE_TAG_PCM: u16 = 0x0001;

/// Format tag indicating the extended (`WAVEFORMATEXTENSIBLE`) layout.
pub const WAVE_TAG_EXTENSIBLE: u16 = 0xFFFE;

/// `KSDATAFORMAT_SUBTYPE_PCM`, the only subformat the extensible profile
/// accepts.
pub const WAVE_UUID_PCM: Uuid = Uuid::from_bytes([
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
]);

/// The resolved sample-coding format of a `fmt ` chunk.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommonFormat {
    /// Integer linear PCM, the only profile this codec can read or write.
    IntegerPcm,
    /// Anything else: a basic tag other than PCM/extensible, or an
    /// extensible subformat other than the PCM GUID.
    Other,
}

impl CommonFormat {
    /// Resolve a basic tag and, for the extensible case, a subformat GUID.
    pub fn make(basic: u16, uuid: Option<Uuid>) -> Self {
        match (basic, uuid) {
            (WAVE_TAG_PCM, _) => CommonFormat::IntegerPcm,
            (WAVE_TAG_EXTENSIBLE, Some(WAVE_UUID_PCM)) => CommonFormat::IntegerPcm,
            _ => CommonFormat::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_pcm_tag_resolves() {
        assert_eq!(CommonFormat::make(WAVE_TAG_PCM, None), CommonFormat::IntegerPcm);
    }

    #[test]
    fn extensible_pcm_subtype_resolves() {
        assert_eq!(
            CommonFormat::make(WAVE_TAG_EXTENSIBLE, Some(WAVE_UUID_PCM)),
            CommonFormat::IntegerPcm
        );
    }

    #[test]
    fn float_tag_is_other() {
        assert_eq!(CommonFormat::make(0x0003, None), CommonFormat::Other);
    }

    #[test]
    fn extensible_unknown_subtype_is_other() {
        let weird = Uuid::from_bytes([9; 16]);
        assert_eq!(CommonFormat::make(WAVE_TAG_EXTENSIBLE, Some(weird)), CommonFormat::Other);
    }
}
