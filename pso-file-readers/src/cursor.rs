use bytes::{Buf, BufMut};
use encoding_rs::{UTF_16BE, UTF_16LE, WINDOWS_1252};
use thiserror::Error;

use crate::types::Vec3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("Unexpected end of file: needed {requested} bytes at position {position}")]
    UnexpectedEof { position: usize, requested: usize },
    #[error("Offset {offset} is out of bounds for size {size}")]
    OutOfBounds { offset: i64, size: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// A seekable cursor for reading and writing binary data.
///
/// The cursor owns its buffer. `size` is the logical length of the data and is
/// always less than or equal to `capacity`, the allocated length. Writing past
/// the capacity reallocates by doubling until the write fits.
#[derive(Clone, Debug)]
pub struct ByteCursor {
    buffer: Vec<u8>,
    size: usize,
    position: usize,
    endianness: Endianness,
}

impl Default for ByteCursor {
    fn default() -> Self {
        Self::with_capacity(0, Endianness::Little)
    }
}

impl From<Vec<u8>> for ByteCursor {
    fn from(vec: Vec<u8>) -> Self {
        Self::new(vec, Endianness::Little)
    }
}

impl From<&Vec<u8>> for ByteCursor {
    fn from(vec: &Vec<u8>) -> Self {
        Self::new(vec.clone(), Endianness::Little)
    }
}

impl From<&[u8]> for ByteCursor {
    fn from(slice: &[u8]) -> Self {
        Self::new(slice.to_vec(), Endianness::Little)
    }
}

impl PartialEq for ByteCursor {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl ByteCursor {
    /// Wraps existing data, size and capacity are both the length of `data`.
    pub fn new(data: Vec<u8>, endianness: Endianness) -> Self {
        Self {
            size: data.len(),
            buffer: data,
            position: 0,
            endianness,
        }
    }

    /// Creates an empty cursor with `capacity` bytes preallocated.
    pub fn with_capacity(capacity: usize, endianness: Endianness) -> Self {
        Self {
            buffer: vec![0; capacity],
            size: 0,
            position: 0,
            endianness,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn bytes_left(&self) -> usize {
        self.size - self.position
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn is_little_endian(&self) -> bool {
        self.endianness == Endianness::Little
    }

    /// The logical contents of the cursor, independent of the position.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.size]
    }

    pub fn into_vec(mut self) -> Vec<u8> {
        self.buffer.truncate(self.size);
        self.buffer
    }

    pub fn rewind(&mut self) -> &mut Self {
        self.position = 0;
        self
    }

    /// Seek forward or backward relative to the current position.
    pub fn seek(&mut self, offset: i64) -> Result<&mut Self, ReadError> {
        self.seek_start_i64(self.position as i64 + offset)
    }

    pub fn seek_start(&mut self, offset: usize) -> Result<&mut Self, ReadError> {
        self.seek_start_i64(offset as i64)
    }

    /// Seek backward from the end of the data.
    pub fn seek_end(&mut self, offset: usize) -> Result<&mut Self, ReadError> {
        if offset > self.size {
            return Err(ReadError::OutOfBounds {
                offset: offset as i64,
                size: self.size,
            });
        }

        self.position = self.size - offset;
        Ok(self)
    }

    fn seek_start_i64(&mut self, offset: i64) -> Result<&mut Self, ReadError> {
        if offset < 0 || offset > self.size as i64 {
            return Err(ReadError::OutOfBounds {
                offset,
                size: self.size,
            });
        }

        self.position = offset as usize;
        Ok(self)
    }

    fn ensure_remaining(&self, length: usize) -> Result<(), ReadError> {
        if self.bytes_left() < length {
            Err(ReadError::UnexpectedEof {
                position: self.position,
                requested: length,
            })
        } else {
            Ok(())
        }
    }

    fn read_with<T>(&mut self, width: usize, read: impl FnOnce(&[u8]) -> T) -> Result<T, ReadError> {
        self.ensure_remaining(width)?;
        let value = read(&self.buffer[self.position..self.position + width]);
        self.position += width;
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        self.read_with(1, |mut src| src.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadError> {
        self.read_with(1, |mut src| src.get_i8())
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        match self.endianness {
            Endianness::Little => self.read_with(2, |mut src| src.get_u16_le()),
            Endianness::Big => self.read_with(2, |mut src| src.get_u16()),
        }
    }

    pub fn read_i16(&mut self) -> Result<i16, ReadError> {
        match self.endianness {
            Endianness::Little => self.read_with(2, |mut src| src.get_i16_le()),
            Endianness::Big => self.read_with(2, |mut src| src.get_i16()),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        match self.endianness {
            Endianness::Little => self.read_with(4, |mut src| src.get_u32_le()),
            Endianness::Big => self.read_with(4, |mut src| src.get_u32()),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32, ReadError> {
        match self.endianness {
            Endianness::Little => self.read_with(4, |mut src| src.get_i32_le()),
            Endianness::Big => self.read_with(4, |mut src| src.get_i32()),
        }
    }

    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        match self.endianness {
            Endianness::Little => self.read_with(4, |mut src| src.get_f32_le()),
            Endianness::Big => self.read_with(4, |mut src| src.get_f32()),
        }
    }

    pub fn read_u16_array(&mut self, count: usize) -> Result<Vec<u16>, ReadError> {
        self.ensure_remaining(count * 2)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_u16()?);
        }
        Ok(values)
    }

    pub fn read_vector3_f32(&mut self) -> Result<Vec3<f32>, ReadError> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vec3 { x, y, z })
    }

    pub fn read_vector3_i32(&mut self) -> Result<Vec3<i32>, ReadError> {
        let x = self.read_i32()?;
        let y = self.read_i32()?;
        let z = self.read_i32()?;
        Ok(Vec3 { x, y, z })
    }

    pub fn read_fixed_length_bytes(&mut self, length: usize) -> Result<&[u8], ReadError> {
        self.ensure_remaining(length)?;
        let start = self.position;
        self.position += length;
        Ok(&self.buffer[start..self.position])
    }

    /// Consumes everything from the current position to the end.
    pub fn read_remaining_bytes(&mut self) -> &[u8] {
        let start = self.position;
        self.position = self.size;
        &self.buffer[start..self.size]
    }

    /// Consumes `length` bytes and returns a new cursor over a copy of them.
    pub fn take(&mut self, length: usize) -> Result<ByteCursor, ReadError> {
        let endianness = self.endianness;
        let bytes = self.read_fixed_length_bytes(length)?.to_vec();
        Ok(ByteCursor::new(bytes, endianness))
    }

    /// Reads up to `max_length` bytes as a string.
    ///
    /// With `null_terminated` the string stops at the first zero byte. With
    /// `drop_remaining` the cursor always advances by `max_length`, otherwise it
    /// advances by the length of the string.
    pub fn string_ascii(
        &mut self,
        max_length: usize,
        null_terminated: bool,
        drop_remaining: bool,
    ) -> Result<String, ReadError> {
        let string_length = if null_terminated {
            self.index_of_u8(0, max_length)
                .map(|index| index - self.position)
                .unwrap_or(max_length)
        } else {
            max_length
        };
        let advance = if drop_remaining {
            max_length
        } else {
            string_length
        };
        self.ensure_remaining(string_length.max(advance))?;

        let start = self.position;
        let (decoded, _, _) = WINDOWS_1252.decode(&self.buffer[start..start + string_length]);
        let string = decoded.into_owned();
        self.position += advance;
        Ok(string)
    }

    /// Reads up to `max_byte_length` bytes as UTF-16 in the cursor's byte order.
    pub fn string_utf16(
        &mut self,
        max_byte_length: usize,
        null_terminated: bool,
        drop_remaining: bool,
    ) -> Result<String, ReadError> {
        let string_length = if null_terminated {
            self.index_of_u16(0, max_byte_length)
                .map(|index| index - self.position)
                .unwrap_or(max_byte_length)
        } else {
            max_byte_length / 2 * 2
        };
        let advance = if drop_remaining {
            max_byte_length
        } else {
            string_length
        };
        self.ensure_remaining(string_length.max(advance))?;

        let start = self.position;
        let bytes = &self.buffer[start..start + string_length];
        let (decoded, _, _) = match self.endianness {
            Endianness::Little => UTF_16LE.decode(bytes),
            Endianness::Big => UTF_16BE.decode(bytes),
        };
        let string = decoded.into_owned();
        self.position += advance;
        Ok(string)
    }

    fn index_of_u8(&self, value: u8, max_length: usize) -> Option<usize> {
        let end = (self.position + max_length).min(self.size);
        (self.position..end).find(|&i| self.buffer[i] == value)
    }

    fn index_of_u16(&self, value: u16, max_byte_length: usize) -> Option<usize> {
        let end = (self.position + max_byte_length).min(self.size);
        (self.position..end)
            .step_by(2)
            .take_while(|&i| i + 2 <= end)
            .find(|&i| {
                let bytes = [self.buffer[i], self.buffer[i + 1]];
                let unit = match self.endianness {
                    Endianness::Little => u16::from_le_bytes(bytes),
                    Endianness::Big => u16::from_be_bytes(bytes),
                };
                unit == value
            })
    }

    fn ensure_capacity(&mut self, min_new_size: usize) {
        if min_new_size > self.capacity() {
            let mut new_capacity = self.capacity().max(1);
            while new_capacity < min_new_size {
                new_capacity *= 2;
            }
            self.buffer.resize(new_capacity, 0);
        }
    }

    fn write_with(&mut self, width: usize, write: impl FnOnce(&mut [u8])) -> &mut Self {
        let end = self.position + width;
        self.ensure_capacity(end);
        write(&mut self.buffer[self.position..end]);
        self.position = end;
        if self.position > self.size {
            self.size = self.position;
        }
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.write_with(1, |mut dst| dst.put_u8(value))
    }

    pub fn write_i8(&mut self, value: i8) -> &mut Self {
        self.write_with(1, |mut dst| dst.put_i8(value))
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        match self.endianness {
            Endianness::Little => self.write_with(2, |mut dst| dst.put_u16_le(value)),
            Endianness::Big => self.write_with(2, |mut dst| dst.put_u16(value)),
        }
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        match self.endianness {
            Endianness::Little => self.write_with(2, |mut dst| dst.put_i16_le(value)),
            Endianness::Big => self.write_with(2, |mut dst| dst.put_i16(value)),
        }
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        match self.endianness {
            Endianness::Little => self.write_with(4, |mut dst| dst.put_u32_le(value)),
            Endianness::Big => self.write_with(4, |mut dst| dst.put_u32(value)),
        }
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        match self.endianness {
            Endianness::Little => self.write_with(4, |mut dst| dst.put_i32_le(value)),
            Endianness::Big => self.write_with(4, |mut dst| dst.put_i32(value)),
        }
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        match self.endianness {
            Endianness::Little => self.write_with(4, |mut dst| dst.put_f32_le(value)),
            Endianness::Big => self.write_with(4, |mut dst| dst.put_f32(value)),
        }
    }

    pub fn write_vector3_f32(&mut self, value: &Vec3<f32>) -> &mut Self {
        self.write_f32(value.x).write_f32(value.y).write_f32(value.z)
    }

    pub fn write_vector3_i32(&mut self, value: &Vec3<i32>) -> &mut Self {
        self.write_i32(value.x).write_i32(value.y).write_i32(value.z)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_with(bytes.len(), |mut dst| dst.put_slice(bytes))
    }

    /// Writes the full logical contents of `other`, ignoring its position.
    pub fn write_cursor(&mut self, other: &ByteCursor) -> &mut Self {
        self.write_bytes(other.as_slice())
    }

    pub fn write_padding(&mut self, length: usize) -> &mut Self {
        self.write_with(length, |dst| dst.fill(0))
    }

    /// Writes `string` into a field of exactly `byte_length` bytes, truncating
    /// or zero padding as needed.
    pub fn write_string_ascii(&mut self, string: &str, byte_length: usize) -> &mut Self {
        let (encoded, _, _) = WINDOWS_1252.encode(string);
        let length = encoded.len().min(byte_length);
        self.write_bytes(&encoded[..length]);
        self.write_padding(byte_length - length)
    }

    /// Writes `string` as UTF-16 into a field of exactly `byte_length` bytes.
    pub fn write_string_utf16(&mut self, string: &str, byte_length: usize) -> &mut Self {
        let max_units = byte_length / 2;
        let mut written = 0;
        for unit in string.encode_utf16().take(max_units) {
            self.write_u16(unit);
            written += 2;
        }
        self.write_padding(byte_length - written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_invariants(cursor: &ByteCursor) {
        assert!(cursor.position() <= cursor.size());
        assert!(cursor.size() <= cursor.capacity());
        assert_eq!(cursor.size(), cursor.position() + cursor.bytes_left());
    }

    #[test]
    fn simple_properties_and_invariants() {
        let mut cursor = ByteCursor::with_capacity(10, Endianness::Little);
        assert_invariants(&cursor);
        assert_eq!(cursor.size(), 0);
        assert_eq!(cursor.capacity(), 10);
        assert_eq!(cursor.position(), 0);
        assert!(cursor.is_little_endian());

        cursor.write_u8(99).write_u8(99).write_u8(99).write_u8(99);
        cursor.seek(-1).unwrap();

        assert_invariants(&cursor);
        assert_eq!(cursor.size(), 4);
        assert_eq!(cursor.capacity(), 10);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.bytes_left(), 1);
    }

    #[test]
    fn byte_order() {
        let bytes = vec![1, 2, 3, 4];
        assert_eq!(
            ByteCursor::new(bytes.clone(), Endianness::Big)
                .read_u32()
                .unwrap(),
            0x01020304
        );
        assert_eq!(
            ByteCursor::new(bytes, Endianness::Little)
                .read_u32()
                .unwrap(),
            0x04030201
        );
    }

    #[test]
    fn reallocation_doubles_and_preserves_content() {
        let mut cursor = ByteCursor::with_capacity(3, Endianness::Little);
        cursor.write_u8(1).write_u8(2).write_u8(3).write_u8(4);
        assert_eq!(cursor.size(), 4);
        assert_eq!(cursor.capacity(), 6);
        assert_eq!(cursor.as_slice(), &[1, 2, 3, 4]);

        cursor.write_bytes(&[0xAA; 20]);
        assert_eq!(cursor.capacity(), 24);
        assert_eq!(&cursor.as_slice()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn growth_from_empty_capacity() {
        let mut cursor = ByteCursor::with_capacity(0, Endianness::Little);
        cursor.write_u32(0xDEADBEEF);
        assert_eq!(cursor.capacity(), 4);
        cursor.write_u8(1);
        assert_eq!(cursor.capacity(), 8);
    }

    #[test]
    fn reads_past_end_fail() {
        let mut cursor = ByteCursor::from(vec![1u8, 2, 3]);
        assert!(cursor.read_u32().is_err());
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_u16().unwrap(), 0x0201);
        assert_eq!(
            cursor.read_u16(),
            Err(ReadError::UnexpectedEof {
                position: 2,
                requested: 2
            })
        );
    }

    #[test]
    fn seeks_out_of_bounds_fail() {
        let mut cursor = ByteCursor::from(vec![0u8; 8]);
        assert!(cursor.seek(-1).is_err());
        assert!(cursor.seek_start(9).is_err());
        assert!(cursor.seek_end(9).is_err());
        assert_eq!(cursor.seek_end(8).unwrap().position(), 0);
        assert_eq!(cursor.seek_start(8).unwrap().position(), 8);
        assert_eq!(cursor.seek(-3).unwrap().position(), 5);
    }

    #[test]
    fn take_copies_bytes() {
        let mut cursor = ByteCursor::from(vec![1u8, 2, 3, 4, 5]);
        cursor.seek(1).unwrap();
        let mut taken = cursor.take(3).unwrap();
        assert_eq!(cursor.position(), 4);
        assert_eq!(taken.as_slice(), &[2, 3, 4]);

        // Writes to the source must not affect the taken copy.
        cursor.seek_start(1).unwrap();
        cursor.write_bytes(&[9; 64]);
        assert_eq!(taken.read_u8().unwrap(), 2);
        assert!(cursor.take(1).is_err());
    }

    #[test]
    fn ascii_strings() {
        let mut cursor = ByteCursor::from(b"quest1.dat\0\0\0\0\0\0rest".to_vec());
        assert_eq!(cursor.string_ascii(16, true, true).unwrap(), "quest1.dat");
        assert_eq!(cursor.position(), 16);

        cursor.seek_start(0).unwrap();
        assert_eq!(cursor.string_ascii(16, true, false).unwrap(), "quest1.dat");
        assert_eq!(cursor.position(), 10);

        cursor.seek_start(16).unwrap();
        assert_eq!(cursor.string_ascii(4, false, false).unwrap(), "rest");
        assert!(cursor.string_ascii(4, false, false).is_err());
    }

    #[test]
    fn utf16_strings() {
        let mut cursor = ByteCursor::with_capacity(0, Endianness::Little);
        cursor.write_string_utf16("Hé", 8);
        assert_eq!(cursor.size(), 8);
        cursor.seek_start(0).unwrap();
        assert_eq!(cursor.string_utf16(8, true, true).unwrap(), "Hé");
        assert_eq!(cursor.position(), 8);

        cursor.seek_start(0).unwrap();
        assert_eq!(cursor.string_utf16(8, true, false).unwrap(), "Hé");
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn fixed_length_ascii_write() {
        let mut cursor = ByteCursor::default();
        cursor.write_string_ascii("abc", 5);
        cursor.write_string_ascii("toolongname", 4);
        assert_eq!(cursor.as_slice(), b"abc\0\0tool");
    }

    #[test]
    fn big_endian_writes() {
        let mut cursor = ByteCursor::with_capacity(0, Endianness::Big);
        cursor.write_u16(0x0102).write_u32(0x03040506);
        assert_eq!(cursor.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[derive(Debug, Clone)]
    enum Operation {
        Seek(i64),
        SeekStart(usize),
        SeekEnd(usize),
        ReadU8,
        ReadU32,
        WriteU16(u16),
        WriteF32(f32),
        WriteBytes(Vec<u8>),
        Take(usize),
    }

    fn operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            (-64i64..64).prop_map(Operation::Seek),
            (0usize..128).prop_map(Operation::SeekStart),
            (0usize..128).prop_map(Operation::SeekEnd),
            Just(Operation::ReadU8),
            Just(Operation::ReadU32),
            any::<u16>().prop_map(Operation::WriteU16),
            any::<f32>().prop_map(Operation::WriteF32),
            proptest::collection::vec(any::<u8>(), 0..40).prop_map(Operation::WriteBytes),
            (0usize..16).prop_map(Operation::Take),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_after_every_operation(
            initial_capacity in 0usize..16,
            operations in proptest::collection::vec(operation(), 0..64),
        ) {
            let mut cursor = ByteCursor::with_capacity(initial_capacity, Endianness::Little);

            for operation in operations {
                let before = cursor.as_slice().to_vec();
                let _ = match operation {
                    Operation::Seek(offset) => cursor.seek(offset).map(|_| ()),
                    Operation::SeekStart(offset) => cursor.seek_start(offset).map(|_| ()),
                    Operation::SeekEnd(offset) => cursor.seek_end(offset).map(|_| ()),
                    Operation::ReadU8 => cursor.read_u8().map(|_| ()),
                    Operation::ReadU32 => cursor.read_u32().map(|_| ()),
                    Operation::WriteU16(value) => {
                        let position = cursor.position();
                        cursor.write_u16(value);
                        prop_assert_eq!(&cursor.as_slice()[..position], &before[..position]);
                        Ok(())
                    }
                    Operation::WriteF32(value) => {
                        cursor.write_f32(value);
                        Ok(())
                    }
                    Operation::WriteBytes(bytes) => {
                        cursor.write_bytes(&bytes);
                        Ok(())
                    }
                    Operation::Take(length) => cursor.take(length).map(|_| ()),
                };

                prop_assert!(cursor.position() <= cursor.size());
                prop_assert!(cursor.size() <= cursor.capacity());
            }
        }
    }
}
