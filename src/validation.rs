//! Chunk-discovery and the ordered chunk-layout validity rules.
//!
//! A single discovery pass builds a [`ChunkLayout`] recording the first
//! offset of each significant chunk (a chunk appearing more than once
//! triggers `BadWave` immediately), and the remaining rules are a handful of
//! small, composable checks against that layout rather than re-walking the
//! file.

use super::errors::OpenError;
use super::fourcc::{
    FourCC, CUE__SIG, FACT_SIG, FMT__SIG, LIST_SIG, PLST_SIG, SLNT_SIG, WAVL_SIG,
};
use super::fourcc::DATA_SIG;
use super::list_form::collect_list_form;
use super::parser::ChunkIteratorItem;

/// The waveform descriptor: either a single `data` chunk, or a `wavl` list
/// of alternating `data`/`slnt` segments.
#[derive(Debug, Clone)]
pub enum Waveform {
    Data { start: u64, length: u64 },
    WaveList { start: u64, length: u64, segments: Vec<WaveformSegment> },
}

/// One `data` or `slnt` member of a `wavl` list, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformSegment {
    pub signature: FourCC,
    /// Byte offset of this segment's content relative to the start of the
    /// `wavl` list's member sequence (i.e. after the 4-byte "wavl" tag).
    pub relative_offset: u64,
    pub length: u64,
}

/// First-offset table of the chunks the validity rules care about, plus
/// every other top-level chunk (preserved verbatim, never interpreted).
#[derive(Debug, Clone, Default)]
pub struct ChunkLayout {
    pub fmt_chunk: Option<(u64, u64)>,
    pub waveform: Option<Waveform>,
    pub fact_chunk: Option<(u64, u64)>,
    pub cue_chunk: Option<(u64, u64)>,
    pub plst_chunk: Option<(u64, u64)>,
    /// Every top-level chunk in file order, signature plus extent, used to
    /// preserve unknown chunks verbatim on save.
    pub all_chunks: Vec<ChunkExtent>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkExtent {
    pub signature: FourCC,
    pub start: u64,
    pub length: u64,
}

/// Walk a flat chunk list (as produced by [`super::parser::Parser`]) and
/// build a [`ChunkLayout`], rejecting a second occurrence of `fmt `,
/// `data`/`LIST(wavl)`, `fact`, `cue ` or `plst` with `BadWave`.
pub fn discover_chunks(
    chunks: &[ChunkIteratorItem],
    mut read_chunk: impl FnMut(u64, u64) -> std::io::Result<Vec<u8>>,
) -> Result<ChunkLayout, OpenError> {
    let mut layout = ChunkLayout::default();

    for chunk in chunks {
        layout.all_chunks.push(ChunkExtent {
            signature: chunk.signature,
            start: chunk.start,
            length: chunk.length,
        });

        match chunk.signature {
            FMT__SIG => {
                if layout.fmt_chunk.replace((chunk.start, chunk.length)).is_some() {
                    return Err(OpenError::BadWave(Some(FMT__SIG)));
                }
            }
            DATA_SIG => {
                if layout.waveform.is_some() {
                    return Err(OpenError::BadWave(Some(DATA_SIG)));
                }
                layout.waveform = Some(Waveform::Data { start: chunk.start, length: chunk.length });
            }
            LIST_SIG => {
                let payload = read_chunk(chunk.start, chunk.length)?;
                if payload.len() >= 4 && &payload[0..4] == b"wavl" {
                    if layout.waveform.is_some() {
                        return Err(OpenError::BadWave(Some(LIST_SIG)));
                    }
                    let segments = collect_list_form(&payload)?
                        .into_iter()
                        .scan(0u64, |offset, item| {
                            let this_offset = *offset;
                            let displaced = item.contents.len() as u64
                                + (item.contents.len() as u64 % 2);
                            *offset += 8 + displaced;
                            Some(WaveformSegment {
                                signature: item.signature,
                                relative_offset: this_offset,
                                length: item.contents.len() as u64,
                            })
                        })
                        .collect();
                    layout.waveform = Some(Waveform::WaveList {
                        start: chunk.start,
                        length: chunk.length,
                        segments,
                    });
                }
                // Other LIST forms (e.g. INFO) are preserved verbatim, not
                // interpreted.
            }
            FACT_SIG => {
                if layout.fact_chunk.replace((chunk.start, chunk.length)).is_some() {
                    return Err(OpenError::BadWave(Some(FACT_SIG)));
                }
            }
            CUE__SIG => {
                if layout.cue_chunk.replace((chunk.start, chunk.length)).is_some() {
                    return Err(OpenError::BadWave(Some(CUE__SIG)));
                }
            }
            PLST_SIG => {
                if layout.plst_chunk.replace((chunk.start, chunk.length)).is_some() {
                    return Err(OpenError::BadWave(Some(PLST_SIG)));
                }
            }
            _ => {}
        }
    }

    Ok(layout)
}

/// Chunk *existence* relationships: the `fmt `/`data` mandatory pair, and
/// the `fact`/`plst` chunks that only make sense alongside the chunks they
/// describe.
pub fn validate_existence(layout: &ChunkLayout) -> Result<(), OpenError> {
    if layout.fmt_chunk.is_none() || layout.waveform.is_none() {
        return Err(OpenError::BadWave(None));
    }

    if let Some(Waveform::WaveList { .. }) = layout.waveform {
        if layout.fact_chunk.is_none() {
            return Err(OpenError::BadWave(Some(FACT_SIG)));
        }
    }

    if layout.plst_chunk.is_some() && layout.cue_chunk.is_none() {
        return Err(OpenError::BadWave(Some(PLST_SIG)));
    }

    Ok(())
}

/// Every member of a `wavl` list must be `data` or `slnt`, and offsets
/// must be monotonically increasing and bounded by the outer chunk size.
pub fn validate_wave_list(segments: &[WaveformSegment], outer_length: u64) -> Result<(), OpenError> {
    let mut last_offset: Option<u64> = None;

    for seg in segments {
        if seg.signature != DATA_SIG && seg.signature != SLNT_SIG {
            return Err(OpenError::BadWave(Some(seg.signature)));
        }
        if let Some(prev) = last_offset {
            if seg.relative_offset <= prev {
                return Err(OpenError::BadWave(Some(WAVL_SIG)));
            }
        }
        if seg.relative_offset + seg.length > outer_length {
            return Err(OpenError::BadSize);
        }
        last_offset = Some(seg.relative_offset);
    }

    Ok(())
}

/// Every cue point's `chunk_start` must match the start offset of an
/// existing waveform segment, and `sample_offset` must address a sample
/// within it. `segment_starts` pairs each segment's start offset with its
/// sample count. The stable sort itself lives in
/// [`super::cue::Cue::sort_by_chunk_start`].
pub fn validate_cue_addressing(
    cues: &[super::cue::Cue],
    segment_starts: &[(u32, u32)],
) -> Result<(), OpenError> {
    for cue in cues {
        let segment = segment_starts
            .iter()
            .find(|(start, _)| *start == cue.chunk_start)
            .ok_or(OpenError::BadWave(Some(CUE__SIG)))?;

        if cue.sample_offset >= segment.1 {
            return Err(OpenError::BadWave(Some(CUE__SIG)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(sig: &[u8; 4], start: u64, length: u64) -> ChunkIteratorItem {
        ChunkIteratorItem { signature: FourCC::make(sig), start, length }
    }

    #[test]
    fn duplicate_fmt_is_bad_wave() {
        let chunks = vec![extent(b"fmt ", 12, 16), extent(b"fmt ", 40, 16), extent(b"data", 68, 4)];
        let result = discover_chunks(&chunks, |_, _| Ok(vec![]));
        assert!(matches!(result, Err(OpenError::BadWave(_))));
    }

    #[test]
    fn missing_waveform_fails_existence() {
        let layout = ChunkLayout { fmt_chunk: Some((12, 16)), ..Default::default() };
        assert!(validate_existence(&layout).is_err());
    }

    #[test]
    fn wavl_without_fact_fails_existence() {
        let layout = ChunkLayout {
            fmt_chunk: Some((12, 16)),
            waveform: Some(Waveform::WaveList { start: 0, length: 0, segments: vec![] }),
            ..Default::default()
        };
        assert!(validate_existence(&layout).is_err());
    }

    #[test]
    fn plst_without_cue_fails_existence() {
        let layout = ChunkLayout {
            fmt_chunk: Some((12, 16)),
            waveform: Some(Waveform::Data { start: 0, length: 4 }),
            plst_chunk: Some((0, 4)),
            ..Default::default()
        };
        assert!(validate_existence(&layout).is_err());
    }

    #[test]
    fn non_monotonic_wave_list_offsets_reject() {
        let segments = vec![
            WaveformSegment { signature: DATA_SIG, relative_offset: 10, length: 4 },
            WaveformSegment { signature: SLNT_SIG, relative_offset: 8, length: 4 },
        ];
        assert!(validate_wave_list(&segments, 100).is_err());
    }

    #[test]
    fn cue_addressing_rejects_unknown_chunk_start() {
        let cues = vec![super::super::cue::Cue {
            chunk_start: 999,
            sample_offset: 0,
            frame: 0,
            length: None,
            label: None,
            note: None,
        }];
        let result = validate_cue_addressing(&cues, &[(0, 1000)]);
        assert!(result.is_err());
    }
}
