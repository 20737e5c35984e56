mod cursor;
mod warning;
pub use cursor::{ByteCursor, Endianness, ReadError};
pub use warning::ParseWarning;

pub trait PsoFile {
    type ReadOptions: Default;
    type WriteOptions: Default;

    fn read(reader: ByteCursor, options: &Self::ReadOptions) -> Result<Self, anyhow::Error>
    where
        Self: Sized;

    fn write(
        &self,
        _writer: &mut ByteCursor,
        _options: &Self::WriteOptions,
    ) -> Result<(), anyhow::Error> {
        Err(anyhow::anyhow!("Writing is not supported for this file type"))
    }
}

pub mod prs;
pub mod types;

mod bin;
mod dat;
mod iff;
mod ninja;
mod qst;

pub use bin::{
    get_function_operations, BinEditError, BinFile, BinInstruction, BinReadError, BinReadOptions,
    InstructionArgument, Opcode, ParameterType, OPCODE_BB_MAP_DESIGNATE, OPCODE_RET,
    OPCODE_SET_EPISODE,
};
pub use dat::{DatBlock, DatEntityBlock, DatFile, DatNpc, DatObject, DatUnknownBlock};
pub use iff::{IffChunk, IffFile};
pub use ninja::{
    parse_model, parse_model_with_warnings, NinjaGeometry, NjEvalFlags, NjFormat, NjReadError,
    NjReadOptions, NjStripOptions,
};
pub use qst::{QstError, QstFile, QstHeader, QstVersion, QstWriteOptions};
