//! `cue ` / `plst` / `adtl` cue-point metadata.
//!
//! The raw `cue `/`labl`/`note`/`ltxt` record shapes and the `adtl`
//! sub-chunk walk are straightforward format plumbing. `Cue` additionally
//! exposes `chunk_start` (needed for the cue-addressing validity rule) and
//! a stable sort by `chunk_start` for that same rule.

use super::fourcc::{FourCC, ReadFourCC, WriteFourCC, ADTL_SIG, DATA_SIG, LABL_SIG, LTXT_SIG, NOTE_SIG};

use super::list_form::collect_list_form;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use encoding::all::ASCII;
use encoding::Encoding;
use encoding::{DecoderTrap, EncoderTrap};

use std::io::{Cursor, Read, Write};

#[derive(Copy, Clone, Debug)]
struct RawCue {
    cue_point_id: u32,
    frame: u32,
    chunk_id: FourCC,
    chunk_start: u32,
    block_start: u32,
    frame_offset: u32,
}

impl RawCue {
    fn write_to(cues: &[Self]) -> std::io::Result<Vec<u8>> {
        let mut writer = Cursor::new(Vec::new());
        writer.write_u32::<LittleEndian>(cues.len() as u32)?;
        for cue in cues {
            writer.write_u32::<LittleEndian>(cue.cue_point_id)?;
            writer.write_u32::<LittleEndian>(cue.frame)?;
            writer.write_fourcc(cue.chunk_id)?;
            writer.write_u32::<LittleEndian>(cue.chunk_start)?;
            writer.write_u32::<LittleEndian>(cue.block_start)?;
            writer.write_u32::<LittleEndian>(cue.frame_offset)?;
        }
        Ok(writer.into_inner())
    }

    fn read_from(data: &[u8]) -> std::io::Result<Vec<Self>> {
        let mut rdr = Cursor::new(data);
        let count = rdr.read_u32::<LittleEndian>()?;
        let mut retval = Vec::with_capacity(count as usize);

        for _ in 0..count {
            retval.push(Self {
                cue_point_id: rdr.read_u32::<LittleEndian>()?,
                frame: rdr.read_u32::<LittleEndian>()?,
                chunk_id: rdr.read_fourcc()?,
                chunk_start: rdr.read_u32::<LittleEndian>()?,
                block_start: rdr.read_u32::<LittleEndian>()?,
                frame_offset: rdr.read_u32::<LittleEndian>()?,
            })
        }

        Ok(retval)
    }
}

#[derive(Clone, Debug)]
struct RawLabel {
    cue_point_id: u32,
    text: Vec<u8>,
}

impl RawLabel {
    fn read_from(data: &[u8]) -> std::io::Result<Self> {
        let mut rdr = Cursor::new(data);
        Ok(Self {
            cue_point_id: rdr.read_u32::<LittleEndian>()?,
            text: {
                let mut buf = vec![0u8; data.len() - 4];
                rdr.read_exact(&mut buf)?;
                buf
            },
        })
    }
}

#[derive(Clone, Debug)]
struct RawNote {
    cue_point_id: u32,
    text: Vec<u8>,
}

impl RawNote {
    fn read_from(data: &[u8]) -> std::io::Result<Self> {
        let mut rdr = Cursor::new(data);
        Ok(Self {
            cue_point_id: rdr.read_u32::<LittleEndian>()?,
            text: {
                let mut buf = vec![0u8; data.len() - 4];
                rdr.read_exact(&mut buf)?;
                buf
            },
        })
    }
}

#[derive(Clone, Debug)]
struct RawLtxt {
    cue_point_id: u32,
    frame_length: u32,
    purpose: FourCC,
}

impl RawLtxt {
    fn read_from(data: &[u8]) -> std::io::Result<Self> {
        let mut rdr = Cursor::new(data);
        Ok(Self {
            cue_point_id: rdr.read_u32::<LittleEndian>()?,
            frame_length: rdr.read_u32::<LittleEndian>()?,
            purpose: rdr.read_fourcc()?,
        })
    }
}

#[derive(Clone, Debug)]
enum RawAdtlMember {
    Label(RawLabel),
    Note(RawNote),
    LabeledText(RawLtxt),
    Unrecognized(FourCC),
}

impl RawAdtlMember {
    fn collect_from(chunk: &[u8]) -> std::io::Result<Vec<RawAdtlMember>> {
        let chunks = collect_list_form(chunk)?;
        let mut retval = Vec::with_capacity(chunks.len());

        for chunk in chunks.iter() {
            retval.push(match chunk.signature {
                LABL_SIG => RawAdtlMember::Label(RawLabel::read_from(&chunk.contents)?),
                NOTE_SIG => RawAdtlMember::Note(RawNote::read_from(&chunk.contents)?),
                LTXT_SIG => RawAdtlMember::LabeledText(RawLtxt::read_from(&chunk.contents)?),
                x => RawAdtlMember::Unrecognized(x),
            })
        }
        Ok(retval)
    }
}

trait AdtlMemberSearch {
    fn labels_for_cue_point(&self, id: u32) -> Vec<&RawLabel>;
    fn notes_for_cue_point(&self, id: u32) -> Vec<&RawNote>;
}

impl AdtlMemberSearch for Vec<RawAdtlMember> {
    fn labels_for_cue_point(&self, id: u32) -> Vec<&RawLabel> {
        self.iter()
            .filter_map(|item| match item {
                RawAdtlMember::Label(x) if x.cue_point_id == id => Some(x),
                _ => None,
            })
            .collect()
    }

    fn notes_for_cue_point(&self, id: u32) -> Vec<&RawNote> {
        self.iter()
            .filter_map(|item| match item {
                RawAdtlMember::Note(x) if x.cue_point_id == id => Some(x),
                _ => None,
            })
            .collect()
    }
}

fn convert_to_cue_string(buffer: &[u8]) -> String {
    let trimmed: Vec<u8> = buffer.iter().take_while(|c| **c != 0).cloned().collect();
    ASCII.decode(&trimmed, DecoderTrap::Ignore).unwrap_or_default()
}

/// A single cue point, resolved from the `cue ` chunk plus any matching
/// `adtl` label/note.
///
/// Validated to reference an existing waveform segment, with
/// `(chunk_start, sample_offset)` addressing a sample inside it. Cue points
/// are preserved verbatim across save.
#[derive(Clone, Debug, PartialEq)]
pub struct Cue {
    /// File offset of the waveform segment (`data`/`slnt` chunk) this cue
    /// references. Zero when the file has only a single `data` chunk.
    pub chunk_start: u32,

    /// Sample offset of the marker within its segment.
    pub sample_offset: u32,

    /// The `cue ` chunk's `dwSampleOffset`/"frame" field. Applications vary
    /// in whether they duplicate the marker position here or leave it at
    /// zero and rely solely on `sample_offset` (see module docs).
    pub frame: u32,

    /// Region length, from a `rgn ` purpose `ltxt` record, if present.
    pub length: Option<u32>,

    /// Text label, from `adtl`'s `labl`, if present.
    pub label: Option<String>,

    /// Text note, from `adtl`'s `note`, if present.
    pub note: Option<String>,
}

impl Cue {
    /// Parse a `cue ` chunk and optional `adtl` LIST payload into cue
    /// points, in on-disk (`cue_point_id`) order.
    pub fn collect_from(cue_chunk: &[u8], adtl_chunk: Option<&[u8]>) -> std::io::Result<Vec<Cue>> {
        let raw_cues = RawCue::read_from(cue_chunk)?;
        let raw_adtl = match adtl_chunk {
            Some(adtl) => RawAdtlMember::collect_from(adtl)?,
            None => vec![],
        };

        Ok(raw_cues
            .iter()
            .map(|i| Cue {
                chunk_start: i.chunk_start,
                sample_offset: i.frame_offset,
                frame: i.frame,
                length: raw_adtl
                    .iter()
                    .filter_map(|m| match m {
                        RawAdtlMember::LabeledText(t)
                            if t.cue_point_id == i.cue_point_id && t.purpose == FourCC::make(b"rgn ") =>
                        {
                            Some(t.frame_length)
                        }
                        _ => None,
                    })
                    .next(),
                label: raw_adtl
                    .labels_for_cue_point(i.cue_point_id)
                    .iter()
                    .map(|s| convert_to_cue_string(&s.text))
                    .next(),
                note: raw_adtl
                    .notes_for_cue_point(i.cue_point_id)
                    .iter()
                    .map(|s| convert_to_cue_string(&s.text))
                    .next(),
            })
            .collect())
    }

    /// Serialize cue points back to a `cue ` chunk payload, preserving
    /// on-disk order (the writer does not re-sort; see `DESIGN.md` for the
    /// open-question decision behind this).
    pub fn write_cue_chunk(cues: &[Cue]) -> std::io::Result<Vec<u8>> {
        let raw: Vec<RawCue> = cues
            .iter()
            .enumerate()
            .map(|(n, c)| RawCue {
                cue_point_id: n as u32,
                frame: c.frame,
                chunk_id: DATA_SIG,
                chunk_start: c.chunk_start,
                block_start: 0,
                frame_offset: c.sample_offset,
            })
            .collect();
        RawCue::write_to(&raw)
    }

    /// Stably sort cue points by `chunk_start`, matching the order the
    /// cue-addressing check expects.
    pub fn sort_by_chunk_start(cues: &mut Vec<Cue>) {
        cues.sort_by_key(|c| c.chunk_start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_cue_bytes(entries: &[(u32, u32, u32)]) -> Vec<u8> {
        let raws: Vec<RawCue> = entries
            .iter()
            .enumerate()
            .map(|(n, &(chunk_start, frame, frame_offset))| RawCue {
                cue_point_id: n as u32,
                frame,
                chunk_id: DATA_SIG,
                chunk_start,
                block_start: 0,
                frame_offset,
            })
            .collect();
        RawCue::write_to(&raws).unwrap()
    }

    #[test]
    fn parses_cue_points_without_adtl() {
        let bytes = raw_cue_bytes(&[(0, 100, 100), (0, 200, 200)]);
        let cues = Cue::collect_from(&bytes, None).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].sample_offset, 100);
        assert!(cues[0].label.is_none());
    }

    #[test]
    fn stable_sort_by_chunk_start_orders_by_segment() {
        let bytes = raw_cue_bytes(&[(200, 0, 0), (50, 0, 0), (120, 0, 0)]);
        let mut cues = Cue::collect_from(&bytes, None).unwrap();
        Cue::sort_by_chunk_start(&mut cues);
        let starts: Vec<u32> = cues.iter().map(|c| c.chunk_start).collect();
        assert_eq!(starts, vec![50, 120, 200]);
    }

    #[test]
    fn round_trips_through_write_cue_chunk() {
        let cues = vec![
            Cue { chunk_start: 0, sample_offset: 10, frame: 10, length: None, label: None, note: None },
            Cue { chunk_start: 0, sample_offset: 20, frame: 20, length: None, label: None, note: None },
        ];
        let bytes = Cue::write_cue_chunk(&cues).unwrap();
        let read_back = Cue::collect_from(&bytes, None).unwrap();
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[1].sample_offset, 20);
    }
}
