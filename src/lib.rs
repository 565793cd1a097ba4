/*!
# wavesculpt

A WAVE file codec and frequency-domain editing core.

## Interfaces

### `fileinfo::open_file` / `fileinfo::create_new_file`

Open an existing WAVE file, or synthesize a new silent one, validating it
per the chunk-layout rules in [`validation`] and decoding its PCM into a
complex-interleaved [`fileinfo::Editor`].

### `fileinfo::Editor`

Owns every channel's [`sampled_function::SampledFunction`], the FFT twiddle
cache, and the undo/redo [`modification::ModificationStack`] for one open
file. [`channel_editor::FileEditor`] is the precision-generic engine
underneath; `Editor` is the `f32`/`f64` dispatch wrapper chosen from a
file's byte depth at load time.

### `fileinfo::write_file` / `fileinfo::write_file_as`

Serialize a `FileInfo`/`Editor` pair back to a WAVE file, preserving any
chunk the codec doesn't itself interpret and dithering PCM quantization.
*/

extern crate byteorder;
extern crate encoding;
extern crate uuid;

mod common_format;
mod errors;
mod fourcc;

mod list_form;
mod parser;

mod chunks;
mod cue;
mod fmt;
mod limits;
mod validation;

mod sample;
mod sampled_function;

mod fft;
mod dither;
mod modification;
mod channel_editor;

mod fileinfo;

pub use channel_editor::Domain;
pub use common_format::CommonFormat;
pub use cue::Cue;
pub use errors::{EditorError, OpenError, OpenResult, OpenWarnings};
pub use fileinfo::{create_new_file, open_file, write_file, write_file_as, Editor, FileInfo};
pub use fmt::{ChannelMask, WaveFmt, WaveFmtExtended};
pub use modification::ChangeType;
