use crate::{ByteCursor, PsoFile};

/// A chunk of a little endian IFF file: a four character type id followed by
/// a u32 size and the chunk data.
#[derive(Clone, Debug, PartialEq)]
pub struct IffChunk {
    pub type_id: String,
    pub data: ByteCursor,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IffFile {
    pub chunks: Vec<IffChunk>,
}

impl PsoFile for IffFile {
    type ReadOptions = ();
    type WriteOptions = ();

    fn read(mut reader: ByteCursor, _: &Self::ReadOptions) -> Result<Self, anyhow::Error> {
        let mut chunks = Vec::new();
        while reader.bytes_left() > 0 {
            chunks.push(read_chunk(&mut reader)?);
        }
        Ok(Self { chunks })
    }

    fn write(&self, writer: &mut ByteCursor, _: &Self::WriteOptions) -> Result<(), anyhow::Error> {
        for chunk in self.chunks.iter() {
            writer.write_string_ascii(&chunk.type_id, 4);
            writer.write_u32(chunk.data.size() as u32);
            writer.write_cursor(&chunk.data);
        }
        Ok(())
    }
}

fn read_chunk(reader: &mut ByteCursor) -> Result<IffChunk, anyhow::Error> {
    let type_id = reader.string_ascii(4, false, false)?;
    let size = reader.read_u32()? as usize;
    let data = reader.take(size)?;
    Ok(IffChunk { type_id, data })
}

impl IffFile {
    /// Reads chunks until one with `type_id` is found, chunks after it are not
    /// read.
    pub fn find_chunk(
        reader: &mut ByteCursor,
        type_id: &str,
    ) -> Result<Option<ByteCursor>, anyhow::Error> {
        while reader.bytes_left() > 0 {
            let chunk_type_id = reader.string_ascii(4, false, false)?;
            let size = reader.read_u32()? as usize;

            if chunk_type_id == type_id {
                return Ok(Some(reader.take(size)?));
            }

            log::debug!("Skipping IFF chunk {:?} of {} bytes", chunk_type_id, size);
            reader.seek(size as i64)?;
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iff_bytes() -> Vec<u8> {
        let mut writer = ByteCursor::default();
        writer.write_string_ascii("NJTL", 4).write_u32(4).write_u32(0xAABBCCDD);
        writer.write_string_ascii("NJCM", 4).write_u32(2).write_u8(1).write_u8(2);
        writer.write_string_ascii("POF0", 4).write_u32(0);
        writer.into_vec()
    }

    #[test]
    fn read_chunks() {
        let file = IffFile::read(ByteCursor::from(iff_bytes()), &()).unwrap();
        let type_ids: Vec<&str> = file.chunks.iter().map(|c| c.type_id.as_str()).collect();
        assert_eq!(type_ids, vec!["NJTL", "NJCM", "POF0"]);
        assert_eq!(file.chunks[1].data.as_slice(), &[1, 2]);

        let mut writer = ByteCursor::default();
        file.write(&mut writer, &()).unwrap();
        assert_eq!(writer.as_slice(), &iff_bytes()[..]);
    }

    #[test]
    fn find_chunk_skips_other_chunks() {
        let mut reader = ByteCursor::from(iff_bytes());
        let chunk = IffFile::find_chunk(&mut reader, "NJCM").unwrap().unwrap();
        assert_eq!(chunk.as_slice(), &[1, 2]);

        let mut reader = ByteCursor::from(iff_bytes());
        assert!(IffFile::find_chunk(&mut reader, "NMDM").unwrap().is_none());
    }

    #[test]
    fn oversized_chunk_is_an_error() {
        let mut writer = ByteCursor::default();
        writer.write_string_ascii("NJCM", 4).write_u32(100).write_u32(0);
        writer.rewind();
        assert!(IffFile::read(writer, &()).is_err());
    }
}
