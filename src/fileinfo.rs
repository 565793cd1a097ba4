//! `FileInfo` and the top-level `open_file`/`create_new_file`/
//! `write_file`/`write_file_as` operations.
//!
//! A file is loaded fully into memory rather than streamed: there is no
//! partial-file editing, so `open_file` hands back an [`Editor`] that owns
//! every channel's [`SampledFunction`] up front. The chunk-walk/validate/
//! decode shape (open -> parse -> validate -> build a result type carrying
//! warnings) keeps that pipeline explicit as separate stages rather than
//! folding it into one large function.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_complex::Complex;

use super::channel_editor::{ChannelState, Domain, FileEditor};
use super::chunks::{ReadBWaveChunks, WriteBWaveChunks};
use super::cue::Cue;
use super::dither::DitherSource;
use super::errors::{EditorError, OpenError, OpenResult, OpenWarnings};
use super::fmt::{resolve_channel_names, WaveFmt};
use super::fourcc::{CUE__SIG, DATA_SIG, FMT__SIG, LIST_SIG, RIFF_SIG, SLNT_SIG};
use super::fourcc::{WriteFourCC};
use super::limits::{BYTE_DEPTH_RANGE, MIN_FOURIER_LENGTH, NEW_FILE_SECONDS_RANGE, SAMPLE_RATE_RANGE};
use super::parser::Parser;
use super::validation::{discover_chunks, validate_cue_addressing, validate_existence, validate_wave_list, ChunkExtent, Waveform};

/// A decoded WAVE file: its path (absent for a "new" file), the original
/// RIFF header size, the resolved format, cue points, and every chunk the
/// codec doesn't interpret (preserved verbatim on save).
pub struct FileInfo {
    pub path: Option<PathBuf>,
    pub format: WaveFmt,
    /// Original, pre-padding per-channel sample count.
    pub sample_length: usize,
    pub cues: Vec<Cue>,
    pub(crate) preserved_chunks: Vec<(ChunkExtent, Vec<u8>)>,
}

/// The two element precisions an [`Editor`] may be instantiated over,
/// chosen at load time from byte depth.
pub enum Editor {
    F32(FileEditor<f32>),
    F64(FileEditor<f64>),
}

impl Editor {
    pub fn can_undo(&self) -> bool {
        match self {
            Editor::F32(e) => e.can_undo(),
            Editor::F64(e) => e.can_undo(),
        }
    }

    pub fn can_redo(&self) -> bool {
        match self {
            Editor::F32(e) => e.can_redo(),
            Editor::F64(e) => e.can_redo(),
        }
    }

    pub fn undo(&mut self) -> bool {
        match self {
            Editor::F32(e) => e.undo(),
            Editor::F64(e) => e.undo(),
        }
    }

    pub fn redo(&mut self) -> bool {
        match self {
            Editor::F32(e) => e.redo(),
            Editor::F64(e) => e.redo(),
        }
    }

    pub fn set_channel_domain(&mut self, channel: usize, domain: Domain) {
        match self {
            Editor::F32(e) => e.set_channel_domain(channel, domain),
            Editor::F64(e) => e.set_channel_domain(channel, domain),
        }
    }

    pub fn channel_names(&self) -> Vec<(String, bool)> {
        match self {
            Editor::F32(e) => e.channel_names(),
            Editor::F64(e) => e.channel_names(),
        }
    }

    pub fn num_of_samples(&self, channel: usize) -> usize {
        match self {
            Editor::F32(e) => e.num_of_samples(channel),
            Editor::F64(e) => e.num_of_samples(channel),
        }
    }

    pub fn get_type(&self, channel: usize) -> super::sample::SampleType {
        match self {
            Editor::F32(e) => e.get_type(channel),
            Editor::F64(e) => e.get_type(channel),
        }
    }

    /// Weight `[fromHz, toHz)` of `channel` by a Multiply/Add envelope,
    /// pushing the edit onto the undo stack.
    pub fn apply_modification(
        &mut self,
        channel: usize,
        from_hz: f64,
        to_hz: f64,
        change_type: super::modification::ChangeType,
        amount: f64,
        smoothing: f64,
    ) -> Result<(), EditorError> {
        match self {
            Editor::F32(e) => e.apply_modification(channel, from_hz, to_hz, change_type, amount, smoothing),
            Editor::F64(e) => e.apply_modification(channel, from_hz, to_hz, change_type, amount, smoothing),
        }
    }
}

fn read_chunk_bytes(file: &File, start: u64, length: u64) -> std::io::Result<Vec<u8>> {
    let mut f = file.try_clone()?;
    f.seek(SeekFrom::Start(start))?;
    let mut buf = vec![0u8; length as usize];
    f.read_exact(&mut buf)?;
    Ok(buf)
}

fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

fn pcm_sample_to_float(raw: i64, bits_per_sample: u16) -> f64 {
    if bits_per_sample == 8 {
        (raw as f64 - 128.0) / 128.0
    } else {
        raw as f64 / (2f64.powi(bits_per_sample as i32 - 1))
    }
}

fn read_raw_sample(bytes: &[u8], bits_per_sample: u16) -> i64 {
    match bits_per_sample {
        8 => bytes[0] as i64,
        16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        24 => {
            let b = [bytes[0], bytes[1], bytes[2], if bytes[2] & 0x80 != 0 { 0xFF } else { 0 }];
            i32::from_le_bytes(b) as i64
        }
        32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
        _ => unreachable!("bit depth validated to VALID_BIT_DEPTHS before reaching here"),
    }
}

/// Open `path`, validate its chunk layout against the ordered validity
/// rules, and decode every editable channel's PCM into a
/// complex-interleaved [`Editor`].
pub fn open_file(path: &Path) -> OpenResult<(FileInfo, Editor)> {
    let file = File::open(path)?;
    let chunk_list = Parser::make(file.try_clone()?)?.into_chunk_list()?;

    let layout = discover_chunks(&chunk_list, |start, len| read_chunk_bytes(&file, start, len))?;
    validate_existence(&layout)?;

    let (fmt_start, fmt_len) = layout.fmt_chunk.unwrap();
    let fmt_bytes = read_chunk_bytes(&file, fmt_start, fmt_len)?;
    let format = std::io::Cursor::new(&fmt_bytes).read_wave_fmt(fmt_len)?;
    validate_format_profile(&format)?;

    let mut warnings = OpenWarnings::empty();

    let waveform = layout.waveform.clone().unwrap();
    if let Waveform::WaveList { length, ref segments, .. } = waveform {
        validate_wave_list(segments, length)?;
    }

    let cues = match layout.cue_chunk {
        Some((start, len)) => {
            let cue_bytes = read_chunk_bytes(&file, start, len)?;
            let adtl_bytes = find_adtl(&layout, &file)?;
            Cue::collect_from(&cue_bytes, adtl_bytes.as_deref())?
        }
        None => vec![],
    };

    let block_alignment = format.block_alignment as u64;
    if block_alignment == 0 {
        return Err(OpenError::BadFormat);
    }

    let (pcm_bytes, sample_length) = decode_waveform(&file, &waveform, &format)?;
    if sample_length == 0 {
        return Err(OpenError::BadSamples);
    }

    let mut cues_sorted = cues.clone();
    Cue::sort_by_chunk_start(&mut cues_sorted);
    let segment_starts: Vec<(u32, u32)> = match &waveform {
        Waveform::Data { .. } => vec![(0, sample_length as u32)],
        Waveform::WaveList { segments, .. } => segments
            .iter()
            .map(|s| (s.relative_offset as u32, s.length as u32 / block_alignment as u32))
            .collect(),
    };
    validate_cue_addressing(&cues_sorted, &segment_starts)?;

    let channel_count = format.channel_count as usize;
    let names = resolve_channel_names(&format);
    if channel_count > super::limits::MAX_CHANNEL_NAMES {
        log::warn!(
            "{} channels exceeds the {}-channel naming cap; trailing channels are read-only",
            channel_count,
            super::limits::MAX_CHANNEL_NAMES
        );
        warnings |= OpenWarnings::CHANNEL_WARNING;
    }

    let padded_real_len = next_power_of_two((sample_length * 2).max(MIN_FOURIER_LENGTH));
    let n = padded_real_len / 2;

    let editor = if format.byte_depth() <= 2 {
        Editor::F32(build_editor::<f32>(&pcm_bytes, &format, &names, sample_length, n))
    } else {
        Editor::F64(build_editor::<f64>(&pcm_bytes, &format, &names, sample_length, n))
    };

    // Preserve every chunk this codec doesn't itself interpret: `fmt `,
    // `data`, the one `LIST(wavl)` waveform list and `cue ` are dropped here
    // (they're reconstructed from `FileInfo`/the editor on save); `plst`'s
    // internal structure is never modeled, so it's kept verbatim like any
    // other LIST form (e.g. `INFO`) or unrecognized chunk.
    let wavl_start = match &waveform {
        Waveform::WaveList { start, .. } => Some(*start),
        Waveform::Data { .. } => None,
    };
    let mut preserved_chunks = Vec::new();
    for extent in &layout.all_chunks {
        let drop = match extent.signature {
            FMT__SIG | DATA_SIG | CUE__SIG => true,
            LIST_SIG => wavl_start == Some(extent.start),
            _ => false,
        };
        if !drop {
            preserved_chunks.push((*extent, read_chunk_bytes(&file, extent.start, extent.length)?));
        }
    }
    if !preserved_chunks.is_empty() {
        log::warn!("{} unrecognized chunk(s) will be preserved verbatim, not interpreted", preserved_chunks.len());
        warnings |= OpenWarnings::CHUNK_WARNING;
    }

    let info = FileInfo {
        path: Some(path.to_path_buf()),
        format,
        sample_length,
        cues,
        preserved_chunks,
    };

    Ok(((info, editor), warnings))
}

fn find_adtl(layout: &super::validation::ChunkLayout, file: &File) -> std::io::Result<Option<Vec<u8>>> {
    for chunk in &layout.all_chunks {
        if chunk.signature == LIST_SIG {
            let bytes = read_chunk_bytes(file, chunk.start, chunk.length)?;
            if bytes.len() >= 4 && &bytes[0..4] == b"adtl" {
                return Ok(Some(bytes));
            }
        }
    }
    Ok(None)
}

fn validate_format_profile(format: &WaveFmt) -> Result<(), OpenError> {
    if !matches!(format.common_format(), super::common_format::CommonFormat::IntegerPcm) {
        return Err(OpenError::BadFormat);
    }
    if !super::limits::VALID_BIT_DEPTHS.contains(&format.bits_per_sample) {
        return Err(OpenError::BadBitdepth);
    }
    if !SAMPLE_RATE_RANGE.contains(&format.sample_rate) {
        return Err(OpenError::BadFrequency);
    }
    if format.block_alignment != (format.bits_per_sample / 8) * format.channel_count {
        return Err(OpenError::BadFormat);
    }
    Ok(())
}

/// Flatten a `data` chunk or `wavl` list into one interleaved PCM byte
/// buffer (silence expanded from `slnt` markers) plus the per-channel
/// sample count.
fn decode_waveform(
    file: &File,
    waveform: &Waveform,
    format: &WaveFmt,
) -> std::io::Result<(Vec<u8>, usize)> {
    let frame_size = format.block_alignment as usize;

    match waveform {
        Waveform::Data { start, length } => {
            let bytes = read_chunk_bytes(file, *start, *length)?;
            let frames = bytes.len() / frame_size;
            Ok((bytes, frames))
        }
        Waveform::WaveList { start, segments, .. } => {
            let mut pcm = Vec::new();
            for seg in segments {
                // `start` is the LIST content's first byte (the 4-byte
                // "wavl" form tag); `relative_offset` is this member's
                // offset from just past that tag to its own signature+size
                // header, so the header itself is another 8 bytes in.
                let content = read_chunk_bytes(file, start + 4 + seg.relative_offset + 8, seg.length)?;
                if seg.signature == DATA_SIG {
                    pcm.extend_from_slice(&content);
                } else if seg.signature == SLNT_SIG {
                    let frame_count = std::io::Cursor::new(&content).read_u32::<LittleEndian>()? as usize;
                    pcm.resize(pcm.len() + frame_count * frame_size, 0);
                }
            }
            let frames = pcm.len() / frame_size;
            Ok((pcm, frames))
        }
    }
}

fn build_editor<F: num_traits::Float + num_traits::FloatConst>(
    pcm: &[u8],
    format: &WaveFmt,
    names: &[(String, bool)],
    sample_length: usize,
    n: usize,
) -> FileEditor<F> {
    let channel_count = format.channel_count as usize;
    let bytes_per_sample = (format.bits_per_sample / 8) as usize;
    let frame_size = format.block_alignment as usize;

    let mut channels: Vec<ChannelState<F>> = Vec::with_capacity(channel_count);

    for (ch, (name, editable)) in names.iter().enumerate().take(channel_count) {
        let mut function = super::sampled_function::SampledFunction::<Complex<F>>::allocate(n)
            .expect("allocation sized by MIN_FOURIER_LENGTH should not overflow in this exercise");

        if *editable {
            for i in 0..sample_length {
                let frame_offset = i * frame_size + ch * bytes_per_sample;
                let raw = read_raw_sample(&pcm[frame_offset..frame_offset + bytes_per_sample], format.bits_per_sample);
                let value = pcm_sample_to_float(raw, format.bits_per_sample);

                let slot = i / 2;
                let mut c = function.get(slot);
                if i % 2 == 0 {
                    c = Complex::new(F::from(value).unwrap(), c.im);
                } else {
                    c = Complex::new(c.re, F::from(value).unwrap());
                }
                function.set(slot, c);
            }
        }

        channels.push(ChannelState {
            name: name.clone(),
            editable: *editable,
            sample_rate: format.sample_rate,
            domain: Domain::Time,
            function,
        });
    }

    FileEditor::new(channels)
}

/// Create an in-memory "new file": canonical `fmt `+`data` layout, silence,
/// no path. Validates the same bounds `OpenFile` enforces.
pub fn create_new_file(seconds: u32, sample_rate: u32, byte_depth: u16) -> Result<(FileInfo, Editor), OpenError> {
    if !NEW_FILE_SECONDS_RANGE.contains(&seconds) {
        return Err(OpenError::BadSize);
    }
    if !SAMPLE_RATE_RANGE.contains(&sample_rate) {
        return Err(OpenError::BadFrequency);
    }
    if !BYTE_DEPTH_RANGE.contains(&byte_depth) {
        return Err(OpenError::BadBitdepth);
    }

    let bits_per_sample = byte_depth * 8;
    let format = WaveFmt::new_pcm(sample_rate, bits_per_sample, 1);
    let sample_length = seconds as usize * sample_rate as usize;
    let padded_real_len = next_power_of_two((sample_length * 2).max(MIN_FOURIER_LENGTH));
    let n = padded_real_len / 2;

    let names = resolve_channel_names(&format);
    let editor = if format.byte_depth() <= 2 {
        Editor::F32(build_editor::<f32>(&vec![0u8; 1], &format, &names, 0, n))
    } else {
        Editor::F64(build_editor::<f64>(&vec![0u8; 1], &format, &names, 0, n))
    };

    let info = FileInfo {
        path: None,
        format,
        sample_length,
        cues: vec![],
        preserved_chunks: vec![],
    };

    Ok((info, editor))
}

/// Quantize `value` to an integer sample. `dither` is `None` for a channel
/// that has never been edited, so a bare open/write round trip introduces
/// no noise and stays bit-exact.
fn quantize_sample(value: f64, bits_per_sample: u16, dither: Option<&mut DitherSource>) -> i64 {
    let clamped = value.clamp(-1.0, 1.0);
    let max = 2f64.powi(bits_per_sample as i32 - 1) - 1.0;
    let lsb = dither.map_or(0.0, |d| d.next_lsb());
    let dithered = clamped * max + lsb;
    if bits_per_sample == 8 {
        (dithered.round() + 128.0) as i64
    } else {
        dithered.round() as i64
    }
}

fn write_raw_sample<W: Write>(w: &mut W, value: i64, bits_per_sample: u16) -> std::io::Result<()> {
    match bits_per_sample {
        8 => w.write_u8(value as u8),
        16 => w.write_i16::<LittleEndian>(value as i16),
        24 => {
            let bytes = (value as i32).to_le_bytes();
            w.write_all(&bytes[0..3])
        }
        32 => w.write_i32::<LittleEndian>(value as i32),
        _ => unreachable!("bit depth validated to VALID_BIT_DEPTHS before reaching here"),
    }
}

/// Encode `editor`'s channels back to PCM interleaved bytes. Any channel
/// left in the frequency domain is transformed back to time domain first
/// (in place).
fn encode_pcm(info: &FileInfo, editor: &mut Editor, dither: &mut DitherSource) -> Vec<u8> {
    let frame_size = info.format.block_alignment as usize;
    let mut out = vec![0u8; info.sample_length * frame_size];

    let channel_count = editor.channel_names().len();
    for ch in 0..channel_count {
        editor.set_channel_domain(ch, Domain::Time);
    }

    match editor {
        Editor::F32(e) => encode_channels(&mut out, e, info, frame_size, dither),
        Editor::F64(e) => encode_channels(&mut out, e, info, frame_size, dither),
    }
    out
}

fn encode_channels<F: num_traits::Float + num_traits::FloatConst>(
    out: &mut [u8],
    editor: &FileEditor<F>,
    info: &FileInfo,
    frame_size: usize,
    dither: &mut DitherSource,
) {
    let bytes_per_sample = (info.format.bits_per_sample / 8) as usize;

    for (ch, state) in editor.channels.iter().enumerate() {
        if !state.editable {
            continue;
        }
        let edited = editor.is_channel_edited(ch);
        let view = state.function.read_complex_as_real();
        for i in 0..info.sample_length {
            let value = view.get(i);
            let maybe_dither = if edited { Some(&mut *dither) } else { None };
            let raw = quantize_sample(value, info.format.bits_per_sample, maybe_dither);
            let offset = i * frame_size + ch * bytes_per_sample;
            let mut cursor = std::io::Cursor::new(&mut out[offset..offset + bytes_per_sample]);
            write_raw_sample(&mut cursor, raw, info.format.bits_per_sample).expect("writing into a sized slice cannot fail");
        }
    }
}

fn write_data_chunk<W: Write>(w: &mut W, pcm: &[u8]) -> std::io::Result<()> {
    w.write_fourcc(DATA_SIG)?;
    w.write_u32::<LittleEndian>(pcm.len() as u32)?;
    w.write_all(pcm)?;
    if pcm.len() % 2 == 1 {
        w.write_u8(0)?;
    }
    Ok(())
}

/// `WriteFile`: serialize over the original path.
pub fn write_file(info: &FileInfo, editor: &mut Editor) -> Result<(), EditorError> {
    let path = info.path.clone().expect("WriteFile requires an already-open FileInfo");
    write_file_as(info, &path, editor)
}

/// Serialize to a new path. The caller is responsible for updating
/// `FileInfo::path` on success.
pub fn write_file_as(info: &FileInfo, path: &Path, editor: &mut Editor) -> Result<(), EditorError> {
    let bytes = serialize_full(info, editor)?;
    let tmp_path = path.with_extension("wavtmp");
    std::fs::write(&tmp_path, &bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn serialize_full(info: &FileInfo, editor: &mut Editor) -> Result<Vec<u8>, EditorError> {
    let mut dither = DitherSource::new();
    let pcm = encode_pcm(info, editor, &mut dither);

    let mut fmt_bytes = Vec::new();
    std::io::Cursor::new(&mut fmt_bytes).write_wave_fmt(&info.format)?;

    let mut body = Vec::new();
    body.write_all(b"WAVE")?;
    body.write_fourcc(FMT__SIG)?;
    body.write_u32::<LittleEndian>(fmt_bytes.len() as u32)?;
    body.write_all(&fmt_bytes)?;
    if fmt_bytes.len() % 2 == 1 {
        body.write_u8(0)?;
    }

    for (extent, bytes) in &info.preserved_chunks {
        body.write_fourcc(extent.signature)?;
        body.write_u32::<LittleEndian>(bytes.len() as u32)?;
        body.write_all(bytes)?;
        if bytes.len() % 2 == 1 {
            body.write_u8(0)?;
        }
    }

    write_data_chunk(&mut body, &pcm)?;

    if !info.cues.is_empty() {
        let cue_bytes = Cue::write_cue_chunk(&info.cues)?;
        body.write_fourcc(CUE__SIG)?;
        body.write_u32::<LittleEndian>(cue_bytes.len() as u32)?;
        body.write_all(&cue_bytes)?;
        if cue_bytes.len() % 2 == 1 {
            body.write_u8(0)?;
        }
    }

    let mut out = Vec::new();
    out.write_fourcc(RIFF_SIG)?;
    out.write_u32::<LittleEndian>(body.len() as u32)?;
    out.write_all(&body)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_new_file_rejects_out_of_range_seconds() {
        assert!(create_new_file(0, 44_100, 2).is_err());
        assert!(create_new_file(1, 44_100, 2).is_ok());
    }

    #[test]
    fn create_new_file_pads_to_min_fourier_length() {
        let (info, editor) = create_new_file(1, 44_100, 2).unwrap();
        assert_eq!(info.sample_length, 44_100);
        assert_eq!(editor.num_of_samples(0) * 2, MIN_FOURIER_LENGTH);
    }
}
