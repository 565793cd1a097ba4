use std::io;

use bitflags::bitflags;

use super::fourcc::FourCC;

/// Low-16-bits error code of the WAVE codec's `OpenResult` bitfield.
///
/// The open/decode result is a 32-bit bitfield: low 16 bits error code (at
/// most one set), high 16 bits warning flags (may combine).
#[derive(thiserror::Error, Debug)]
pub enum OpenError {
    #[error("could not open file")]
    CantOpen(#[source] io::Error),

    #[error("RIFF/WAVE magic missing")]
    NotWave,

    #[error("malformed chunk layout, duplicate chunk {0:?}, or missing mandatory chunk")]
    BadWave(Option<FourCC>),

    #[error("unsupported format tag or subformat")]
    BadFormat,

    #[error("bit depth is not one of 8/16/24/32")]
    BadBitdepth,

    #[error("sample rate outside [8000, 96000] Hz")]
    BadFrequency,

    #[error("file smaller than declared, or declared size overflows")]
    BadSize,

    #[error("zero audible samples")]
    BadSamples,

    #[error("I/O error")]
    Misc(#[source] io::Error),
}

impl From<io::Error> for OpenError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => OpenError::CantOpen(e),
            _ => OpenError::Misc(e),
        }
    }
}

impl From<uuid::Error> for OpenError {
    fn from(_: uuid::Error) -> Self {
        OpenError::BadFormat
    }
}

impl OpenError {
    /// The low-16-bits numeric code for this error.
    pub fn code(&self) -> u16 {
        match self {
            OpenError::CantOpen(_) => 1,
            OpenError::NotWave => 2,
            OpenError::BadWave(_) => 3,
            OpenError::BadFormat => 4,
            OpenError::BadBitdepth => 5,
            OpenError::BadFrequency => 6,
            OpenError::BadSize => 7,
            OpenError::BadSamples => 8,
            OpenError::Misc(_) => 9,
        }
    }
}

bitflags! {
    /// High-16-bits warning flags of the `OpenResult` bitfield. Warnings
    /// never abort an open; they accompany a successful decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenWarnings: u16 {
        /// Unknown chunks are present and will be re-emitted verbatim but
        /// are not interpreted.
        const CHUNK_WARNING = 0b0000_0001;
        /// Channel count exceeds 18; trailing channels are read-only.
        const CHANNEL_WARNING = 0b0000_0010;
    }
}

/// The packed 32-bit open/decode result: `Ok((value, warnings))` on success
/// (possibly with warning flags set), `Err(error)` with no warnings
/// attached, so at most one error code is ever set by construction.
pub type OpenResult<T> = Result<(T, OpenWarnings), OpenError>;

/// Failure type for the modification engine, channel editor and FFT cache.
///
/// Allocation failure (the sole failure mode of applying a modification or
/// decoding PCM into the FFT cache) and I/O failure during save are
/// collapsed into one enum here because both are reported to the caller the
/// same way: a `Result` the editor state is rolled back around, never a
/// panic.
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error("allocation failed")]
    OutOfMemory,

    #[error("modification range [{from}, {to}) is not valid for a function of length {len}")]
    InvalidRange { from: usize, to: usize, len: usize },

    #[error("frequency range does not map to a valid bin range")]
    InvalidFrequencyRange,

    #[error("I/O error")]
    Io(#[from] io::Error),
}
