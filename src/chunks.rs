//! Binary (de)serialization of the `fmt ` and `fact` chunk contents.
//!
//! `ReadBWaveChunks`/`WriteBWaveChunks` only support the integer-PCM profile:
//! tag `0x0001`, size 16, or tag `0xFFFE`, size 40, subtype PCM. Broadcast
//! Wave (`bext`) serialization is dropped entirely (see `DESIGN.md`).

use std::io::{Read, Write};

use byteorder::LittleEndian;
use byteorder::{ReadBytesExt, WriteBytesExt};

use uuid::Uuid;

use super::errors::OpenError;
use super::fmt::{WaveFmt, WaveFmtExtended};

pub trait ReadBWaveChunks: Read {
    fn read_wave_fmt(&mut self, chunk_len: u64) -> Result<WaveFmt, OpenError>;
    fn read_fact_sample_count(&mut self) -> Result<u32, OpenError>;
}

pub trait WriteBWaveChunks: Write {
    fn write_wave_fmt(&mut self, format: &WaveFmt) -> std::io::Result<()>;
    fn write_fact_sample_count(&mut self, count: u32) -> std::io::Result<()>;
}

impl<T> WriteBWaveChunks for T
where
    T: Write,
{
    fn write_wave_fmt(&mut self, format: &WaveFmt) -> std::io::Result<()> {
        self.write_u16::<LittleEndian>(format.tag)?;
        self.write_u16::<LittleEndian>(format.channel_count)?;
        self.write_u32::<LittleEndian>(format.sample_rate)?;
        self.write_u32::<LittleEndian>(format.bytes_per_second)?;
        self.write_u16::<LittleEndian>(format.block_alignment)?;
        self.write_u16::<LittleEndian>(format.bits_per_sample)?;

        if let Some(ext) = &format.extended_format {
            self.write_u16::<LittleEndian>(22)?; // cbSize
            self.write_u16::<LittleEndian>(ext.valid_bits_per_sample)?;
            self.write_u32::<LittleEndian>(ext.channel_mask)?;
            self.write_all(ext.subformat.as_bytes())?;
        }

        Ok(())
    }

    fn write_fact_sample_count(&mut self, count: u32) -> std::io::Result<()> {
        self.write_u32::<LittleEndian>(count)
    }
}

impl<T> ReadBWaveChunks for T
where
    T: Read,
{
    fn read_wave_fmt(&mut self, chunk_len: u64) -> Result<WaveFmt, OpenError> {
        if chunk_len < 16 {
            return Err(OpenError::BadWave(None));
        }

        let tag = self.read_u16::<LittleEndian>()?;
        let channel_count = self.read_u16::<LittleEndian>()?;
        let sample_rate = self.read_u32::<LittleEndian>()?;
        let bytes_per_second = self.read_u32::<LittleEndian>()?;
        let block_alignment = self.read_u16::<LittleEndian>()?;
        let bits_per_sample = self.read_u16::<LittleEndian>()?;

        let extended_format = if chunk_len >= 18 {
            let cb_size = self.read_u16::<LittleEndian>()?;
            if tag == super::common_format::WAVE_TAG_EXTENSIBLE {
                if cb_size < 22 || chunk_len < 40 {
                    return Err(OpenError::BadFormat);
                }
                let valid_bits_per_sample = self.read_u16::<LittleEndian>()?;
                let channel_mask = self.read_u32::<LittleEndian>()?;
                let mut guid_buf = [0u8; 16];
                self.read_exact(&mut guid_buf)?;
                Some(WaveFmtExtended {
                    valid_bits_per_sample,
                    channel_mask,
                    subformat: Uuid::from_slice(&guid_buf)?,
                })
            } else {
                None
            }
        } else {
            None
        };

        Ok(WaveFmt {
            tag,
            channel_count,
            sample_rate,
            bytes_per_second,
            block_alignment,
            bits_per_sample,
            extended_format,
        })
    }

    fn read_fact_sample_count(&mut self) -> Result<u32, OpenError> {
        Ok(self.read_u32::<LittleEndian>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_plain_pcm_format() {
        let fmt = WaveFmt::new_pcm(44_100, 16, 2);
        let mut buf = Vec::new();
        Cursor::new(&mut buf).write_wave_fmt(&fmt).unwrap();
        assert_eq!(buf.len(), 16);

        let read_back = Cursor::new(&buf).read_wave_fmt(buf.len() as u64).unwrap();
        assert_eq!(read_back.sample_rate, 44_100);
        assert_eq!(read_back.channel_count, 2);
        assert_eq!(read_back.bits_per_sample, 16);
        assert!(read_back.extended_format.is_none());
    }

    #[test]
    fn round_trips_extensible_format_with_channel_mask() {
        let fmt = WaveFmt::new_pcm(48_000, 24, 6);
        let mut buf = Vec::new();
        Cursor::new(&mut buf).write_wave_fmt(&fmt).unwrap();
        assert_eq!(buf.len(), 40);

        let read_back = Cursor::new(&buf).read_wave_fmt(buf.len() as u64).unwrap();
        let ext = read_back.extended_format.unwrap();
        assert_eq!(ext.channel_mask, 0b11_1111);
        assert_eq!(ext.subformat, super::super::common_format::WAVE_UUID_PCM);
    }

    #[test]
    fn rejects_truncated_extensible_format() {
        let fmt = WaveFmt::new_pcm(48_000, 24, 6);
        let mut buf = Vec::new();
        Cursor::new(&mut buf).write_wave_fmt(&fmt).unwrap();
        buf.truncate(20);
        assert!(Cursor::new(&buf).read_wave_fmt(buf.len() as u64).is_err());
    }
}
