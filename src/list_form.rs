use super::fourcc::{FourCC, ReadFourCC};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

pub struct ListFormItem {
    pub signature: FourCC,
    pub contents: Vec<u8>,
}

/// Accept a `LIST` chunk's raw payload (starting with the 4-byte form type)
/// and walk its sub-chunks, observing the same odd-byte padding rule as the
/// outer RIFF walk.
///
/// Used both for the `wavl` waveform list and the `adtl` sub-chunks of a
/// cue point's labels/notes.
pub fn collect_list_form(list_contents: &[u8]) -> std::io::Result<Vec<ListFormItem>> {
    let mut cursor = Cursor::new(list_contents);
    let mut remain = list_contents.len();
    let _ = cursor.read_fourcc()?; // skip form-type signature

    remain -= 4;
    let mut retval: Vec<ListFormItem> = vec![];

    while remain >= 8 {
        let this_sig = cursor.read_fourcc()?;
        let this_size = cursor.read_u32::<LittleEndian>()? as usize;
        remain -= 8;

        let mut content_buf = vec![0u8; this_size];
        cursor.read_exact(&mut content_buf)?;
        remain -= this_size;

        retval.push(ListFormItem {
            signature: this_sig,
            contents: content_buf,
        });

        if this_size % 2 == 1 {
            cursor.read_u8()?;
            remain -= 1;
        }
    }

    Ok(retval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn make_list(form_type: &[u8; 4], subchunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_all(form_type).unwrap();
        for (sig, data) in subchunks {
            buf.write_all(*sig).unwrap();
            buf.write_u32::<LittleEndian>(data.len() as u32).unwrap();
            buf.write_all(data).unwrap();
            if data.len() % 2 == 1 {
                buf.write_u8(0).unwrap();
            }
        }
        buf
    }

    #[test]
    fn walks_subchunks_with_odd_padding() {
        let raw = make_list(b"wavl", &[(b"slnt", &[1, 2, 3, 4]), (b"data", &[0xAA, 0xBB, 0xCC])]);
        let items = collect_list_form(&raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].contents, vec![1, 2, 3, 4]);
        assert_eq!(items[1].contents, vec![0xAA, 0xBB, 0xCC]);
    }
}
