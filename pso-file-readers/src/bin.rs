use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ByteCursor, ParseWarning, PsoFile, ReadError};

const HEADER_SIZE: usize = 920;
const QUEST_NAME_SIZE: usize = 64;
const SHORT_DESCRIPTION_SIZE: usize = 256;
const LONG_DESCRIPTION_SIZE: usize = 576;

pub const OPCODE_RET: u16 = 0x01;
pub const OPCODE_SET_EPISODE: u16 = 0xF8BC;
pub const OPCODE_BB_MAP_DESIGNATE: u16 = 0xF951;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinReadError {
    #[error("BIN object code offset {offset} is outside of the header and data ({size} bytes)")]
    InvalidObjectCodeOffset { offset: u32, size: usize },
    #[error("BIN function table offset {offset} is outside of the object code and data ({size} bytes)")]
    InvalidFunctionTableOffset { offset: u32, size: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinEditError {
    #[error("BIN function {function_index} was not found in the instruction stream")]
    FunctionNotFound { function_index: usize },
    #[error("BIN instructions cover {size} bytes but the object code is {object_code_size} bytes")]
    InstructionsOutOfRange { size: usize, object_code_size: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParameterType {
    U8,
    U16,
    U32,
    I32,
    F32,
    Register,
    Label,
    RegisterList,
    LabelList,
    String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub enum InstructionArgument {
    U8(u8),
    U16(u16),
    U32(u32),
    I32(i32),
    F32(f32),
    Register(u8),
    Label(u16),
    RegisterList(Vec<u8>),
    LabelList(Vec<u16>),
    String(String),
}

impl InstructionArgument {
    /// The argument as an unsigned integer, if it is a single numeric value.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            InstructionArgument::U8(value) | InstructionArgument::Register(value) => {
                Some(value as u32)
            }
            InstructionArgument::U16(value) | InstructionArgument::Label(value) => {
                Some(value as u32)
            }
            InstructionArgument::U32(value) => Some(value),
            InstructionArgument::I32(value) => Some(value as u32),
            _ => None,
        }
    }
}

pub struct Opcode {
    pub code: u16,
    pub mnemonic: &'static str,
    pub parameters: &'static [ParameterType],
}

macro_rules! opcodes {
    ($($code:literal $mnemonic:literal [$($parameter:ident),*];)*) => {
        static OPCODES: &[Opcode] = &[
            $(Opcode {
                code: $code,
                mnemonic: $mnemonic,
                parameters: &[$(ParameterType::$parameter),*],
            },)*
        ];
    };
}

// Opcodes with inline operands. Everything else takes its arguments from the
// argument stack and is encoded as the opcode alone.
opcodes! {
    0x00 "nop" [];
    0x01 "ret" [];
    0x02 "sync" [];
    0x03 "exit" [I32];
    0x04 "thread" [Label];
    0x05 "va_start" [];
    0x06 "va_end" [];
    0x07 "va_call" [Label];
    0x08 "let" [Register, Register];
    0x09 "leti" [Register, I32];
    0x0A "letb" [Register, U8];
    0x0B "letw" [Register, U16];
    0x0C "leta" [Register, Register];
    0x0D "leto" [Register, Label];
    0x10 "set" [Register];
    0x11 "clear" [Register];
    0x12 "rev" [Register];
    0x13 "gset" [U16];
    0x14 "gclear" [U16];
    0x15 "grev" [U16];
    0x16 "glet" [U16, Register];
    0x17 "gget" [U16, Register];
    0x18 "add" [Register, Register];
    0x19 "addi" [Register, I32];
    0x1A "sub" [Register, Register];
    0x1B "subi" [Register, I32];
    0x1C "mul" [Register, Register];
    0x1D "muli" [Register, I32];
    0x1E "div" [Register, Register];
    0x1F "divi" [Register, I32];
    0x20 "and" [Register, Register];
    0x21 "andi" [Register, I32];
    0x22 "or" [Register, Register];
    0x23 "ori" [Register, I32];
    0x24 "xor" [Register, Register];
    0x25 "xori" [Register, I32];
    0x26 "mod" [Register, Register];
    0x27 "modi" [Register, I32];
    0x28 "jmp" [Label];
    0x29 "call" [Label];
    0x2A "jmp_on" [Label, RegisterList];
    0x2B "jmp_off" [Label, RegisterList];
    0x2C "jmp_=" [Register, Register, Label];
    0x2D "jmpi_=" [Register, I32, Label];
    0x2E "jmp_!=" [Register, Register, Label];
    0x2F "jmpi_!=" [Register, I32, Label];
    0x30 "ujmp_>" [Register, Register, Label];
    0x31 "ujmpi_>" [Register, I32, Label];
    0x32 "jmp_>" [Register, Register, Label];
    0x33 "jmpi_>" [Register, I32, Label];
    0x34 "ujmp_<" [Register, Register, Label];
    0x35 "ujmpi_<" [Register, I32, Label];
    0x36 "jmp_<" [Register, Register, Label];
    0x37 "jmpi_<" [Register, I32, Label];
    0x38 "ujmp_>=" [Register, Register, Label];
    0x39 "ujmpi_>=" [Register, I32, Label];
    0x3A "jmp_>=" [Register, Register, Label];
    0x3B "jmpi_>=" [Register, I32, Label];
    0x3C "ujmp_<=" [Register, Register, Label];
    0x3D "ujmpi_<=" [Register, I32, Label];
    0x3E "jmp_<=" [Register, Register, Label];
    0x3F "jmpi_<=" [Register, I32, Label];
    0x40 "switch_jmp" [Register, LabelList];
    0x41 "switch_call" [Register, LabelList];
    0x42 "stack_push" [Register];
    0x43 "stack_pop" [Register];
    0x44 "stack_pushm" [Register, U32];
    0x45 "stack_popm" [Register, U32];
    0x48 "arg_pushr" [Register];
    0x49 "arg_pushl" [I32];
    0x4A "arg_pushb" [U8];
    0x4B "arg_pushw" [U16];
    0x4C "arg_pusha" [Register];
    0x4D "arg_pusho" [Label];
    0x4E "arg_pushs" [String];
    0xF8BC "set_episode" [U32];
    0xF951 "BB_Map_Designate" [U8, U16, U8, U8];
}

impl Opcode {
    pub fn find(code: u16) -> Option<&'static Opcode> {
        OPCODES.iter().find(|opcode| opcode.code == code)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct BinInstruction {
    pub opcode: u16,
    pub mnemonic: String,
    pub arguments: Vec<InstructionArgument>,
    /// Encoded size in bytes, opcode included.
    pub size: usize,
}

impl BinInstruction {
    fn read(reader: &mut ByteCursor) -> Result<Self, ReadError> {
        let start = reader.position();
        let mut code = reader.read_u8()? as u16;
        if code == 0xF8 || code == 0xF9 {
            code = (code << 8) | reader.read_u8()? as u16;
        }

        let opcode = Opcode::find(code);
        let mut arguments = Vec::new();
        match opcode {
            Some(opcode) => {
                for parameter in opcode.parameters {
                    arguments.push(read_argument(reader, *parameter)?);
                }
            }
            None => log::debug!("Unknown opcode {:#X} at offset {}", code, start),
        }

        Ok(Self {
            opcode: code,
            mnemonic: opcode.map_or("unknown", |opcode| opcode.mnemonic).to_string(),
            arguments,
            size: reader.position() - start,
        })
    }
}

fn read_argument(
    reader: &mut ByteCursor,
    parameter: ParameterType,
) -> Result<InstructionArgument, ReadError> {
    Ok(match parameter {
        ParameterType::U8 => InstructionArgument::U8(reader.read_u8()?),
        ParameterType::U16 => InstructionArgument::U16(reader.read_u16()?),
        ParameterType::U32 => InstructionArgument::U32(reader.read_u32()?),
        ParameterType::I32 => InstructionArgument::I32(reader.read_i32()?),
        ParameterType::F32 => InstructionArgument::F32(reader.read_f32()?),
        ParameterType::Register => InstructionArgument::Register(reader.read_u8()?),
        ParameterType::Label => InstructionArgument::Label(reader.read_u16()?),
        ParameterType::RegisterList => {
            let count = reader.read_u8()? as usize;
            InstructionArgument::RegisterList(reader.read_fixed_length_bytes(count)?.to_vec())
        }
        ParameterType::LabelList => {
            let count = reader.read_u8()? as usize;
            InstructionArgument::LabelList(reader.read_u16_array(count)?)
        }
        ParameterType::String => {
            let string = reader.string_utf16(reader.bytes_left(), true, false)?;
            if reader.bytes_left() < 2 {
                return Err(ReadError::UnexpectedEof {
                    position: reader.position(),
                    requested: 2,
                });
            }
            reader.seek(2)?;
            InstructionArgument::String(string)
        }
    })
}

pub struct BinReadOptions {
    pub decode_instructions: bool,
}

impl Default for BinReadOptions {
    fn default() -> Self {
        Self {
            decode_instructions: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinFile {
    pub quest_number: u32,
    pub language: u32,
    pub quest_name: String,
    pub short_description: String,
    pub long_description: String,
    /// Bytes between the fixed header and the object code.
    pub header_data: Vec<u8>,
    pub object_code: Vec<u8>,
    /// Offsets relative to the start of the object code.
    pub function_offsets: Vec<i32>,
    pub instructions: Vec<BinInstruction>,
}

impl PsoFile for BinFile {
    type ReadOptions = BinReadOptions;
    type WriteOptions = ();

    fn read(reader: ByteCursor, options: &Self::ReadOptions) -> Result<Self, anyhow::Error> {
        Self::parse(reader, options, &mut Vec::new())
    }

    fn write(&self, writer: &mut ByteCursor, _: &Self::WriteOptions) -> Result<(), anyhow::Error> {
        let object_code_offset = HEADER_SIZE + self.header_data.len();
        let function_table_offset = object_code_offset + self.object_code.len();
        let bin_size = function_table_offset + 4 * self.function_offsets.len();

        writer
            .write_u32(object_code_offset as u32)
            .write_u32(function_table_offset as u32)
            .write_u32(bin_size as u32)
            .write_u32(0xFFFFFFFF)
            .write_u32(self.quest_number)
            .write_u32(self.language)
            .write_string_utf16(&self.quest_name, QUEST_NAME_SIZE)
            .write_string_utf16(&self.short_description, SHORT_DESCRIPTION_SIZE)
            .write_string_utf16(&self.long_description, LONG_DESCRIPTION_SIZE)
            .write_bytes(&self.header_data)
            .write_bytes(&self.object_code);
        for offset in self.function_offsets.iter() {
            writer.write_i32(*offset);
        }
        Ok(())
    }
}

impl BinFile {
    pub fn parse(
        mut reader: ByteCursor,
        options: &BinReadOptions,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<Self, anyhow::Error> {
        let object_code_offset = reader.read_u32()?;
        let function_table_offset = reader.read_u32()?;
        let _bin_size = reader.read_u32()?;
        let _ = reader.read_u32()?;
        let quest_number = reader.read_u32()?;
        let language = reader.read_u32()?;
        let quest_name = reader.string_utf16(QUEST_NAME_SIZE, true, true)?;
        let short_description = reader.string_utf16(SHORT_DESCRIPTION_SIZE, true, true)?;
        let long_description = reader.string_utf16(LONG_DESCRIPTION_SIZE, true, true)?;

        let size = reader.size();
        if (object_code_offset as usize) < HEADER_SIZE || object_code_offset as usize > size {
            return Err(BinReadError::InvalidObjectCodeOffset {
                offset: object_code_offset,
                size,
            }
            .into());
        }
        if function_table_offset < object_code_offset || function_table_offset as usize > size {
            return Err(BinReadError::InvalidFunctionTableOffset {
                offset: function_table_offset,
                size,
            }
            .into());
        }

        let header_data = reader
            .read_fixed_length_bytes(object_code_offset as usize - HEADER_SIZE)?
            .to_vec();
        let object_code = reader
            .take((function_table_offset - object_code_offset) as usize)?;

        let mut function_offsets = Vec::with_capacity(reader.bytes_left() / 4);
        while reader.bytes_left() >= 4 {
            function_offsets.push(reader.read_i32()?);
        }

        let instructions = if options.decode_instructions {
            decode_instructions(object_code.clone(), warnings)
        } else {
            Vec::new()
        };

        Ok(Self {
            quest_number,
            language,
            quest_name,
            short_description,
            long_description,
            header_data,
            object_code: object_code.into_vec(),
            function_offsets,
            instructions,
        })
    }

    /// The instructions of function `function_index`, up to and including its
    /// first `ret`.
    pub fn function_instructions(
        &self,
        function_index: usize,
        warnings: &mut Vec<ParseWarning>,
    ) -> Option<&[BinInstruction]> {
        let offset = *self.function_offsets.get(function_index)?;
        let instructions = get_function_operations(&self.instructions, offset);
        if instructions.is_none() {
            ParseWarning::BinFunctionNotFound { function_index }.report(warnings);
        }
        instructions
    }

    /// Decodes `object_code` into `instructions`, replacing any already decoded.
    pub fn decode(&mut self, warnings: &mut Vec<ParseWarning>) {
        self.instructions = decode_instructions(ByteCursor::from(&self.object_code), warnings);
    }

    /// Removes the instructions of function `function_index` for which
    /// `remove` returns true and inserts `code` at the start of the function.
    ///
    /// Function offsets past the start follow the code they point at. An
    /// offset to a removed instruction moves to the instruction after it.
    pub fn rewrite_function(
        &mut self,
        function_index: usize,
        code: &[u8],
        remove: impl Fn(&BinInstruction) -> bool,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<(), BinEditError> {
        if self.instructions.is_empty() {
            self.decode(warnings);
        }

        let size: usize = self.instructions.iter().map(|instruction| instruction.size).sum();
        if size > self.object_code.len() {
            return Err(BinEditError::InstructionsOutOfRange {
                size,
                object_code_size: self.object_code.len(),
            });
        }

        let function_not_found = BinEditError::FunctionNotFound { function_index };
        let start = *self
            .function_offsets
            .get(function_index)
            .ok_or_else(|| function_not_found.clone())?;
        let (first, last) =
            function_range(&self.instructions, start).ok_or(function_not_found)?;
        let start = start as usize;

        let mut removed = Vec::new();
        let mut offset = start;
        for instruction in &self.instructions[first..last] {
            if remove(instruction) {
                removed.push((offset, offset + instruction.size));
            }
            offset += instruction.size;
        }

        let mut object_code = Vec::with_capacity(self.object_code.len() + code.len());
        object_code.extend_from_slice(&self.object_code[..start]);
        object_code.extend_from_slice(code);
        let mut position = start;
        for &(removed_start, removed_end) in removed.iter() {
            object_code.extend_from_slice(&self.object_code[position..removed_start]);
            position = removed_end;
        }
        object_code.extend_from_slice(&self.object_code[position..]);

        for function_offset in self.function_offsets.iter_mut() {
            if *function_offset <= start as i32 {
                continue;
            }
            let old = *function_offset as usize;
            let removed_before: usize = removed
                .iter()
                .map(|&(removed_start, removed_end)| {
                    old.min(removed_end).saturating_sub(removed_start)
                })
                .sum();
            *function_offset = (old + code.len() - removed_before) as i32;
        }

        self.object_code = object_code;
        self.decode(warnings);
        Ok(())
    }
}

fn decode_instructions(
    mut object_code: ByteCursor,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<BinInstruction> {
    let mut instructions = Vec::new();
    while object_code.bytes_left() > 0 {
        let offset = object_code.position();
        match BinInstruction::read(&mut object_code) {
            Ok(instruction) => instructions.push(instruction),
            Err(_) => {
                ParseWarning::BinTruncatedInstructions { offset }.report(warnings);
                break;
            }
        }
    }
    instructions
}

/// Finds the instruction starting exactly at `function_offset` and returns it
/// with the instructions that follow, up to and including the first `ret`.
pub fn get_function_operations(
    instructions: &[BinInstruction],
    function_offset: i32,
) -> Option<&[BinInstruction]> {
    let (start, end) = function_range(instructions, function_offset)?;
    Some(&instructions[start..end])
}

fn function_range(instructions: &[BinInstruction], function_offset: i32) -> Option<(usize, usize)> {
    let mut position = 0i64;
    let start = instructions.iter().position(|instruction| {
        let found = position == function_offset as i64;
        position += instruction.size as i64;
        found
    })?;

    let end = instructions[start..]
        .iter()
        .position(|instruction| instruction.opcode == OPCODE_RET)
        .map_or(instructions.len(), |index| start + index + 1);
    Some((start, end))
}
