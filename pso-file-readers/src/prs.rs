//! PRS compression, an LZSS variant with bit-packed flags.
//!
//! A stream is a series of tokens, each introduced by one or more flag bits
//! read LSB first from flag bytes interleaved with the data:
//!
//! * `1` copies one literal byte.
//! * `00ss` followed by one byte is a short copy of `ss + 2` bytes from
//!   `byte - 256` bytes back.
//! * `01` followed by a little endian u16 is a long copy. The low 3 bits hold
//!   `size - 2`, or 0 when an extra byte holding `size - 1` follows. The upper
//!   13 bits minus 8192 hold the offset. A zero word ends the stream.

use thiserror::Error;

use crate::{ByteCursor, Endianness};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrsError {
    #[error("PRS stream ended at offset {position} without a terminator")]
    MissingTerminator { position: usize },
    #[error("PRS back reference {offset} at output offset {position} is outside of the output")]
    InvalidBackReference { offset: i64, position: usize },
}

const MAX_SHORT_DISTANCE: usize = 256;
const MAX_SHORT_SIZE: usize = 5;
const MAX_INLINE_LONG_SIZE: usize = 9;
const MAX_LONG_DISTANCE: usize = 8191;
const MAX_COPY_SIZE: usize = 256;

struct Decoder<'a> {
    src: &'a mut ByteCursor,
    dst: ByteCursor,
    flags: u8,
    bit_pos: u32,
}

impl<'a> Decoder<'a> {
    fn read_byte(&mut self) -> Result<u8, PrsError> {
        self.src.read_u8().map_err(|_| PrsError::MissingTerminator {
            position: self.src.position(),
        })
    }

    fn read_short(&mut self) -> Result<u16, PrsError> {
        let low = self.read_byte()? as u16;
        let high = self.read_byte()? as u16;
        Ok(low | (high << 8))
    }

    fn read_flag_bit(&mut self) -> Result<u8, PrsError> {
        if self.bit_pos == 0 {
            self.flags = self.read_byte()?;
            self.bit_pos = 8;
        }

        let bit = self.flags & 1;
        self.flags >>= 1;
        self.bit_pos -= 1;
        Ok(bit)
    }

    fn offset_copy(&mut self, offset: i64, size: usize) -> Result<(), PrsError> {
        if !(-8192..0).contains(&offset) {
            log::warn!("PRS offset was {}, should be between -8192 and 0", offset);
        }

        if !(1..=MAX_COPY_SIZE).contains(&size) {
            log::warn!("PRS size was {}, should be between 1 and 256", size);
        }

        let position = self.dst.position();
        let invalid = || PrsError::InvalidBackReference { offset, position };
        if offset >= 0 {
            return Err(invalid());
        }

        // A window shorter than the copy is repeated until size bytes are written.
        let window_size = ((-offset) as usize).min(size);
        self.dst.seek(offset).map_err(|_| invalid())?;
        let window = self.dst.take(window_size).map_err(|_| invalid())?;
        self.dst.seek_start(position).map_err(|_| invalid())?;

        for _ in 0..size / window_size {
            self.dst.write_cursor(&window);
        }
        self.dst
            .write_bytes(&window.as_slice()[..size % window_size]);
        Ok(())
    }
}

/// Decompresses a PRS stream starting at the current position of `src`.
///
/// The returned cursor is positioned at the start of the decompressed data.
pub fn decompress(src: &mut ByteCursor) -> Result<ByteCursor, PrsError> {
    let mut decoder = Decoder {
        dst: ByteCursor::with_capacity(4 * src.bytes_left(), Endianness::Little),
        src,
        flags: 0,
        bit_pos: 0,
    };

    loop {
        if decoder.read_flag_bit()? == 1 {
            let byte = decoder.read_byte()?;
            decoder.dst.write_u8(byte);
            continue;
        }

        let (offset, size) = if decoder.read_flag_bit()? == 0 {
            let mut size = (decoder.read_flag_bit()? as usize) << 1;
            size |= decoder.read_flag_bit()? as usize;
            let offset = decoder.read_byte()? as i64 - 256;
            (offset, size + 2)
        } else {
            let word = decoder.read_short()?;
            if word == 0 {
                break;
            }

            let size = match (word & 0b111) as usize {
                0 => decoder.read_byte()? as usize + 1,
                size => size + 2,
            };
            ((word >> 3) as i64 - 8192, size)
        };

        decoder.offset_copy(offset, size)?;
    }

    let mut dst = decoder.dst;
    dst.rewind();
    Ok(dst)
}

pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>, PrsError> {
    Ok(decompress(&mut ByteCursor::from(data))?.into_vec())
}

struct Encoder {
    output: Vec<u8>,
    flag_offset: usize,
    bit_pos: u32,
}

impl Encoder {
    fn new(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            flag_offset: 0,
            bit_pos: 8,
        }
    }

    fn put_bit(&mut self, bit: bool) {
        if self.bit_pos == 8 {
            self.flag_offset = self.output.len();
            self.output.push(0);
            self.bit_pos = 0;
        }

        if bit {
            self.output[self.flag_offset] |= 1 << self.bit_pos;
        }
        self.bit_pos += 1;
    }

    fn literal(&mut self, byte: u8) {
        self.put_bit(true);
        self.output.push(byte);
    }

    fn short_copy(&mut self, distance: usize, size: usize) {
        let size_bits = size - 2;
        self.put_bit(false);
        self.put_bit(false);
        self.put_bit(size_bits & 0b10 != 0);
        self.put_bit(size_bits & 0b01 != 0);
        self.output.push((MAX_SHORT_DISTANCE - distance) as u8);
    }

    fn long_copy(&mut self, distance: usize, size: usize) {
        let offset_bits = ((8192 - distance) as u16) << 3;
        self.put_bit(false);
        self.put_bit(true);
        if size <= MAX_INLINE_LONG_SIZE {
            self.output
                .extend_from_slice(&(offset_bits | (size - 2) as u16).to_le_bytes());
        } else {
            self.output.extend_from_slice(&offset_bits.to_le_bytes());
            self.output.push((size - 1) as u8);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        self.put_bit(false);
        self.put_bit(true);
        self.output.extend_from_slice(&[0, 0]);
        self.output
    }
}

const HASH_BITS: u32 = 15;
const MAX_CHAIN_LENGTH: usize = 128;
const NO_POSITION: usize = usize::MAX;

struct MatchFinder<'a> {
    data: &'a [u8],
    head: Vec<usize>,
    prev: Vec<usize>,
}

impl<'a> MatchFinder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            head: vec![NO_POSITION; 1 << HASH_BITS],
            prev: vec![NO_POSITION; data.len()],
        }
    }

    fn hash(&self, position: usize) -> usize {
        let key = (self.data[position] as u32) << 16
            | (self.data[position + 1] as u32) << 8
            | self.data[position + 2] as u32;
        (key.wrapping_mul(2654435761) >> (32 - HASH_BITS)) as usize
    }

    fn insert(&mut self, position: usize) {
        if position + 2 < self.data.len() {
            let hash = self.hash(position);
            self.prev[position] = self.head[hash];
            self.head[hash] = position;
        }
    }

    fn match_length(&self, candidate: usize, position: usize, max_length: usize) -> usize {
        (0..max_length)
            .take_while(|&i| self.data[candidate + i] == self.data[position + i])
            .count()
    }

    /// Returns the longest earlier match as `(distance, length)`. Matches may
    /// overlap the position being encoded.
    fn find(&self, position: usize) -> Option<(usize, usize)> {
        let max_length = MAX_COPY_SIZE.min(self.data.len() - position);
        let mut best: Option<(usize, usize)> = None;

        if max_length >= 3 {
            let mut candidate = self.head[self.hash(position)];
            let mut steps = 0;
            while candidate != NO_POSITION
                && position - candidate <= MAX_LONG_DISTANCE
                && steps < MAX_CHAIN_LENGTH
            {
                let length = self.match_length(candidate, position, max_length);
                if length >= 3 && best.map_or(true, |(_, best_length)| length > best_length) {
                    best = Some((position - candidate, length));
                    if length == max_length {
                        break;
                    }
                }
                candidate = self.prev[candidate];
                steps += 1;
            }
        }

        if best.is_none() && max_length >= 2 {
            best = (1..=MAX_SHORT_DISTANCE.min(position))
                .find(|&distance| self.match_length(position - distance, position, 2) == 2)
                .map(|distance| (distance, 2));
        }

        best
    }
}

/// Compresses the remaining bytes of `src` into a new PRS stream.
pub fn compress(src: &mut ByteCursor) -> ByteCursor {
    let data = src.read_remaining_bytes();
    let mut encoder = Encoder::new(data.len() / 2 + 16);
    let mut finder = MatchFinder::new(data);
    let mut position = 0;

    while position < data.len() {
        let length = match finder.find(position) {
            Some((distance, length))
                if length <= MAX_SHORT_SIZE && distance <= MAX_SHORT_DISTANCE =>
            {
                encoder.short_copy(distance, length);
                length
            }
            Some((distance, length)) if length >= 3 => {
                encoder.long_copy(distance, length);
                length
            }
            _ => {
                encoder.literal(data[position]);
                1
            }
        };

        for i in position..position + length {
            finder.insert(i);
        }
        position += length;
    }

    ByteCursor::from(encoder.finish())
}

pub fn compress_bytes(data: &[u8]) -> Vec<u8> {
    compress(&mut ByteCursor::from(data)).into_vec()
}
