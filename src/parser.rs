use std::io::SeekFrom::{Current, Start};
use std::io::{Read, Seek};

use byteorder::LittleEndian;
use byteorder::ReadBytesExt;

use super::errors::OpenError;
use super::fourcc::{FourCC, ReadFourCC};
use super::fourcc::{RIFF_SIG, WAVE_SIG};

/// One step of the top-level RIFF chunk walk.
///
/// Only classic 32-bit RIFF is modeled; there is no RF64/`ds64` promotion
/// past the 4 GiB boundary (`BadSize` covers both overflow and undersized
/// declarations). See `DESIGN.md` for the drop.
#[derive(Debug)]
pub enum Event {
    StartParse,
    ReadHeader { signature: FourCC, length_field: u32 },
    BeginChunk { signature: FourCC, content_start: u64, content_length: u64 },
    Failed { error: OpenError },
    FinishParse,
}

#[derive(Debug)]
enum State {
    New,
    ReadyForHeader,
    ReadyForChunk { at: u64, remaining: u64 },
    Error,
    Complete,
}

pub struct Parser<R: Read + Seek> {
    stream: R,
    state: State,
}

pub struct ChunkIteratorItem {
    pub signature: FourCC,
    pub start: u64,
    pub length: u64,
}

impl<R: Read + Seek> Parser<R> {
    pub fn make(stream: R) -> Result<Self, OpenError> {
        let mut the_stream = stream;
        the_stream.seek(Start(0))?;
        Ok(Parser { stream: the_stream, state: State::New })
    }

    pub fn into_chunk_iterator(self) -> impl Iterator<Item = Result<ChunkIteratorItem, OpenError>> {
        self.filter_map(|event| match event {
            Event::BeginChunk { signature, content_start, content_length } => {
                Some(Ok(ChunkIteratorItem { signature, start: content_start, length: content_length }))
            }
            Event::Failed { error } => Some(Err(error)),
            _ => None,
        })
    }

    pub fn into_chunk_list(self) -> Result<Vec<ChunkIteratorItem>, OpenError> {
        let mut error = Ok(());
        let chunks = self
            .into_chunk_iterator()
            .scan(&mut error, |err, res| match res {
                Ok(ok) => Some(ok),
                Err(e) => {
                    **err = Err(e);
                    None
                }
            })
            .collect();
        error?;
        Ok(chunks)
    }
}

impl<R: Read + Seek> Iterator for Parser<R> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        let (event, next_state) = self.advance();
        self.state = next_state;
        event
    }
}

impl<R: Read + Seek> Parser<R> {
    fn parse_header(&mut self) -> Result<(Event, State), OpenError> {
        let file_sig = self.stream.read_fourcc()?;
        let length = self.stream.read_u32::<LittleEndian>()?;
        let list_sig = self.stream.read_fourcc()?;

        match (file_sig, list_sig) {
            (RIFF_SIG, WAVE_SIG) => {
                let remaining = (length as u64).checked_sub(4).ok_or(OpenError::BadSize)?;
                Ok((
                    Event::ReadHeader { signature: file_sig, length_field: length },
                    State::ReadyForChunk { at: 12, remaining },
                ))
            }
            _ => Ok((Event::Failed { error: OpenError::NotWave }, State::Error)),
        }
    }

    fn enter_chunk(&mut self, at: u64, remaining: u64) -> Result<(Event, State), OpenError> {
        if remaining == 0 {
            return Ok((Event::FinishParse, State::Complete));
        }
        if remaining < 8 {
            return Ok((Event::Failed { error: OpenError::BadSize }, State::Error));
        }

        let this_fourcc = self.stream.read_fourcc()?;
        let this_size = self.stream.read_u32::<LittleEndian>()? as u64;
        let this_displacement = if this_size % 2 == 1 { this_size + 1 } else { this_size };

        if this_displacement > remaining - 8 {
            return Ok((Event::Failed { error: OpenError::BadSize }, State::Error));
        }

        self.stream.seek(Current(this_displacement as i64))?;

        log::debug!("crossed chunk boundary {:?} at offset {}, {} bytes", this_fourcc, at + 8, this_size);

        let event = Event::BeginChunk {
            signature: this_fourcc,
            content_start: at + 8,
            content_length: this_size,
        };

        let state = State::ReadyForChunk {
            at: at + 8 + this_displacement,
            remaining: remaining - 8 - this_displacement,
        };

        Ok((event, state))
    }

    fn handle_state(&mut self) -> Result<(Option<Event>, State), OpenError> {
        match self.state {
            State::New => Ok((Some(Event::StartParse), State::ReadyForHeader)),
            State::ReadyForHeader => {
                let (event, state) = self.parse_header()?;
                Ok((Some(event), state))
            }
            State::ReadyForChunk { at, remaining } => {
                let (event, state) = self.enter_chunk(at, remaining)?;
                Ok((Some(event), state))
            }
            State::Error => Ok((Some(Event::FinishParse), State::Complete)),
            State::Complete => Ok((None, State::Complete)),
        }
    }

    fn advance(&mut self) -> (Option<Event>, State) {
        match self.handle_state() {
            Ok((event, state)) => (event, state),
            Err(error) => {
                log::debug!("RIFF parse failed: {}", error);
                (Some(Event::Failed { error }), State::Error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::{Cursor, Write};

    fn build_riff(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.write_all(b"WAVE").unwrap();
        for (sig, data) in chunks {
            body.write_all(*sig).unwrap();
            body.write_u32::<LittleEndian>(data.len() as u32).unwrap();
            body.write_all(data).unwrap();
            if data.len() % 2 == 1 {
                body.write_u8(0).unwrap();
            }
        }

        let mut out = Vec::new();
        out.write_all(b"RIFF").unwrap();
        out.write_u32::<LittleEndian>(body.len() as u32).unwrap();
        out.write_all(&body).unwrap();
        out
    }

    #[test]
    fn walks_two_chunks_in_order() {
        let raw = build_riff(&[(b"fmt ", &[0u8; 16]), (b"data", &[1, 2, 3, 4])]);
        let list = Parser::make(Cursor::new(raw)).unwrap().into_chunk_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].signature, FourCC::make(b"fmt "));
        assert_eq!(list[1].signature, FourCC::make(b"data"));
        assert_eq!(list[1].length, 4);
    }

    #[test]
    fn odd_sized_chunk_is_padded() {
        let raw = build_riff(&[(b"fmt ", &[0u8; 16]), (b"data", &[1, 2, 3])]);
        let list = Parser::make(Cursor::new(raw)).unwrap().into_chunk_list().unwrap();
        assert_eq!(list[1].length, 3);
    }

    #[test]
    fn rejects_non_wave_magic() {
        let mut out = Vec::new();
        out.write_all(b"RIFF").unwrap();
        out.write_u32::<LittleEndian>(4).unwrap();
        out.write_all(b"XXXX").unwrap();
        let result = Parser::make(Cursor::new(out)).unwrap().into_chunk_list();
        assert!(matches!(result, Err(OpenError::NotWave)));
    }

    #[test]
    fn oversized_chunk_declaration_is_bad_size() {
        let mut out = Vec::new();
        out.write_all(b"RIFF").unwrap();
        out.write_u32::<LittleEndian>(20).unwrap();
        out.write_all(b"WAVE").unwrap();
        out.write_all(b"data").unwrap();
        out.write_u32::<LittleEndian>(1000).unwrap();
        out.write_all(&[0u8; 4]).unwrap();
        let result = Parser::make(Cursor::new(out)).unwrap().into_chunk_list();
        assert!(matches!(result, Err(OpenError::BadSize)));
    }
}
