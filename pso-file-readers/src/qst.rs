use std::fmt;

use thiserror::Error;

use crate::{ByteCursor, Endianness, ParseWarning, PsoFile};

const HEADER_PREFIX_SIZE: usize = 44;
const HEADER_FILE_NAME_SIZE: usize = 16;
const HEADER_SUFFIX_SIZE: usize = 24;
const CHUNK_SIZE: usize = 1056;
const CHUNK_HEADER_SIZE: usize = 24;
const CHUNK_DATA_SIZE: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QstError {
    #[error("QST headers do not name a .dat or .bin file")]
    NoEmbeddedFiles,
    #[error("QST chunk at offset {offset} is truncated, only {remaining} bytes left")]
    TruncatedChunk { offset: usize, remaining: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QstVersion {
    DreamcastGameCube,
    DreamcastDownload,
    Pc,
    BlueBurst,
}

impl QstVersion {
    fn detect(data: &[u8]) -> Self {
        match (data.first(), data.get(2)) {
            (Some(0x44), _) => QstVersion::DreamcastGameCube,
            (Some(0x58), Some(0x44)) => QstVersion::BlueBurst,
            (Some(0xA6), _) => QstVersion::DreamcastDownload,
            _ => QstVersion::Pc,
        }
    }

    /// First four bytes of a header in this flavour.
    fn signature(self) -> [u8; 4] {
        match self {
            QstVersion::DreamcastGameCube => [0x44, 0x00, 0x3C, 0x00],
            QstVersion::DreamcastDownload => [0xA6, 0x00, 0x3C, 0x00],
            QstVersion::Pc => [0x3C, 0x00, 0x44, 0x00],
            QstVersion::BlueBurst => [0x58, 0x00, 0x44, 0x00],
        }
    }
}

impl fmt::Display for QstVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QstVersion::DreamcastGameCube => "Dreamcast/GameCube",
            QstVersion::DreamcastDownload => "Dreamcast download",
            QstVersion::Pc => "PC",
            QstVersion::BlueBurst => "Blue Burst",
        })
    }
}

/// One of the 88 byte headers describing an embedded file. Bytes that are not
/// interpreted are kept so the header is written back unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QstHeader {
    pub prefix: [u8; HEADER_PREFIX_SIZE],
    pub file_name: String,
    pub size: u32,
    pub suffix: [u8; HEADER_SUFFIX_SIZE],
}

impl QstHeader {
    pub fn new(version: QstVersion, file_name: &str, size: u32, quest_number: u16) -> Self {
        let mut prefix = [0; HEADER_PREFIX_SIZE];
        prefix[..4].copy_from_slice(&version.signature());
        prefix[8..10].copy_from_slice(&quest_number.to_le_bytes());
        Self {
            prefix,
            file_name: file_name.to_string(),
            size,
            suffix: [0; HEADER_SUFFIX_SIZE],
        }
    }

    fn read(reader: &mut ByteCursor) -> Result<Self, anyhow::Error> {
        let prefix: [u8; HEADER_PREFIX_SIZE] =
            reader.read_fixed_length_bytes(HEADER_PREFIX_SIZE)?.try_into()?;
        let file_name = reader.string_ascii(HEADER_FILE_NAME_SIZE, true, true)?;
        let size = reader.read_u32()?;
        let suffix: [u8; HEADER_SUFFIX_SIZE] =
            reader.read_fixed_length_bytes(HEADER_SUFFIX_SIZE)?.try_into()?;
        Ok(Self {
            prefix,
            file_name,
            size,
            suffix,
        })
    }

    fn kind(&self) -> Option<EmbeddedFile> {
        EmbeddedFile::from_file_name(&self.file_name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum EmbeddedFile {
    Dat,
    Bin,
}

impl EmbeddedFile {
    fn from_file_name(file_name: &str) -> Option<Self> {
        if file_name.ends_with(".dat") {
            Some(EmbeddedFile::Dat)
        } else if file_name.ends_with(".bin") {
            Some(EmbeddedFile::Bin)
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct QstWriteOptions {
    /// Rewrites the header signatures for another release, `None` keeps them.
    pub version: Option<QstVersion>,
}

/// A quest container holding a PRS compressed .dat and .bin file.
#[derive(Clone, Debug, PartialEq)]
pub struct QstFile {
    pub version: QstVersion,
    pub headers: Vec<QstHeader>,
    pub dat: ByteCursor,
    pub bin: ByteCursor,
}

impl PsoFile for QstFile {
    type ReadOptions = ();
    type WriteOptions = QstWriteOptions;

    fn read(reader: ByteCursor, _: &Self::ReadOptions) -> Result<Self, anyhow::Error> {
        Self::parse(reader, &mut Vec::new())
    }

    fn write(
        &self,
        writer: &mut ByteCursor,
        options: &Self::WriteOptions,
    ) -> Result<(), anyhow::Error> {
        for header in self.headers.iter() {
            let mut prefix = header.prefix;
            if let Some(version) = options.version {
                prefix[..4].copy_from_slice(&version.signature());
            }

            let size = match header.kind() {
                Some(kind) => self.data(kind).size() as u32,
                None => header.size,
            };

            writer.write_bytes(&prefix);
            writer.write_string_ascii(&header.file_name, HEADER_FILE_NAME_SIZE);
            writer.write_u32(size);
            writer.write_bytes(&header.suffix);
        }

        let streams: Vec<(&QstHeader, &[u8])> = self
            .embedded_headers()
            .map(|(header, kind)| (header, self.data(kind).as_slice()))
            .collect();
        let chunk_count = streams
            .iter()
            .map(|(_, data)| (data.len() + CHUNK_DATA_SIZE - 1) / CHUNK_DATA_SIZE)
            .max()
            .unwrap_or(0);

        for chunk_no in 0..chunk_count {
            for (header, data) in streams.iter() {
                let start = chunk_no * CHUNK_DATA_SIZE;
                if start >= data.len() {
                    continue;
                }
                let chunk_data = &data[start..data.len().min(start + CHUNK_DATA_SIZE)];

                writer.write_u16(0x041C);
                writer.write_u16(0x0013);
                writer.write_u32(chunk_no as u32);
                writer.write_string_ascii(&header.file_name, HEADER_FILE_NAME_SIZE);
                writer.write_bytes(chunk_data);
                writer.write_padding(CHUNK_DATA_SIZE - chunk_data.len());
                writer.write_u32(chunk_data.len() as u32);
                writer.write_u32(0);
            }
        }

        Ok(())
    }
}

impl QstFile {
    /// Creates a Blue Burst container for a new quest.
    pub fn new(
        dat_name: &str,
        dat: ByteCursor,
        bin_name: &str,
        bin: ByteCursor,
        quest_number: u16,
    ) -> Self {
        Self {
            version: QstVersion::BlueBurst,
            headers: vec![
                QstHeader::new(QstVersion::BlueBurst, dat_name, dat.size() as u32, quest_number),
                QstHeader::new(QstVersion::BlueBurst, bin_name, bin.size() as u32, quest_number),
            ],
            dat,
            bin,
        }
    }

    pub fn parse(
        mut reader: ByteCursor,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<Self, anyhow::Error> {
        let version = QstVersion::detect(reader.as_slice());
        log::debug!("QST version {}", version);

        let mut headers = Vec::with_capacity(2);
        for _ in 0..2 {
            headers.push(QstHeader::read(&mut reader)?);
        }

        for header in headers.iter().filter(|header| header.kind().is_none()) {
            log::warn!("QST header file {:?} has unexpected extension", header.file_name);
        }

        let has_dat = headers.iter().any(|h| h.kind() == Some(EmbeddedFile::Dat));
        let has_bin = headers.iter().any(|h| h.kind() == Some(EmbeddedFile::Bin));
        if !has_dat && !has_bin {
            return Err(QstError::NoEmbeddedFiles.into());
        }
        if !has_dat {
            ParseWarning::QstMissingHeader { extension: ".dat" }.report(warnings);
        }
        if !has_bin {
            ParseWarning::QstMissingHeader { extension: ".bin" }.report(warnings);
        }

        let mut file = Self {
            version,
            headers,
            dat: ByteCursor::with_capacity(0, Endianness::Little),
            bin: ByteCursor::with_capacity(0, Endianness::Little),
        };
        file.read_chunks(&mut reader, warnings)?;

        let declared_sizes: Vec<(String, u32, usize)> = file
            .embedded_headers()
            .map(|(header, kind)| (header.file_name.clone(), header.size, file.data(kind).size()))
            .collect();
        for (file_name, expected, actual) in declared_sizes {
            if expected as usize != actual {
                ParseWarning::QstSizeMismatch {
                    file_name,
                    expected,
                    actual,
                }
                .report(warnings);
            }
        }

        file.dat.rewind();
        file.bin.rewind();
        Ok(file)
    }

    fn read_chunks(
        &mut self,
        reader: &mut ByteCursor,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<(), anyhow::Error> {
        let mut chunk_index = 0;
        while reader.bytes_left() > 0 {
            if reader.bytes_left() < CHUNK_SIZE {
                return Err(QstError::TruncatedChunk {
                    offset: reader.position(),
                    remaining: reader.bytes_left(),
                }
                .into());
            }

            let mut chunk = reader.take(CHUNK_SIZE)?;
            chunk.seek(8)?;
            let file_name = chunk.string_ascii(HEADER_FILE_NAME_SIZE, true, true)?;
            chunk.seek_start(CHUNK_HEADER_SIZE + CHUNK_DATA_SIZE)?;
            let mut size = chunk.read_u32()?;

            if size as usize > CHUNK_DATA_SIZE {
                ParseWarning::QstChunkTooLarge {
                    chunk: chunk_index,
                    size,
                }
                .report(warnings);
                size = CHUNK_DATA_SIZE as u32;
            }

            let data =
                &chunk.as_slice()[CHUNK_HEADER_SIZE..CHUNK_HEADER_SIZE + size as usize];
            match EmbeddedFile::from_file_name(&file_name) {
                Some(EmbeddedFile::Dat) => {
                    self.dat.write_bytes(data);
                }
                Some(EmbeddedFile::Bin) => {
                    self.bin.write_bytes(data);
                }
                None => ParseWarning::QstUnknownChunkFile {
                    chunk: chunk_index,
                    file_name,
                }
                .report(warnings),
            }

            chunk_index += 1;
        }

        Ok(())
    }

    fn data(&self, kind: EmbeddedFile) -> &ByteCursor {
        match kind {
            EmbeddedFile::Dat => &self.dat,
            EmbeddedFile::Bin => &self.bin,
        }
    }

    /// Headers that own a data stream, in file order. A second header of the
    /// same kind does not own a stream.
    fn embedded_headers(&self) -> impl Iterator<Item = (&QstHeader, EmbeddedFile)> {
        let mut seen_dat = false;
        let mut seen_bin = false;
        self.headers.iter().filter_map(move |header| {
            let kind = header.kind()?;
            let seen = match kind {
                EmbeddedFile::Dat => &mut seen_dat,
                EmbeddedFile::Bin => &mut seen_bin,
            };
            if *seen {
                None
            } else {
                *seen = true;
                Some((header, kind))
            }
        })
    }

    pub fn dat_file_name(&self) -> Option<&str> {
        self.embedded_headers()
            .find(|(_, kind)| *kind == EmbeddedFile::Dat)
            .map(|(header, _)| header.file_name.as_str())
    }

    pub fn bin_file_name(&self) -> Option<&str> {
        self.embedded_headers()
            .find(|(_, kind)| *kind == EmbeddedFile::Bin)
            .map(|(header, _)| header.file_name.as_str())
    }
}
