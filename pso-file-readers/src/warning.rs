use thiserror::Error;

/// A recoverable anomaly found while parsing. The parser that reports one has
/// already applied its fallback and carried on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseWarning {
    #[error("QST header for {extension} file is missing")]
    QstMissingHeader { extension: &'static str },
    #[error("QST chunk {chunk} declares {size} bytes, truncated to 1024")]
    QstChunkTooLarge { chunk: usize, size: u32 },
    #[error("QST chunk {chunk} belongs to unknown file {file_name:?}")]
    QstUnknownChunkFile { chunk: usize, file_name: String },
    #[error("QST file {file_name:?} should be {expected} bytes but {actual} were read")]
    QstSizeMismatch {
        file_name: String,
        expected: u32,
        actual: usize,
    },
    #[error("DAT block of type {entity_type} declares {expected} payload bytes but {actual} were read")]
    DatPayloadMismatch {
        entity_type: u32,
        expected: u32,
        actual: usize,
    },
    #[error("DAT block at offset {offset} declares total size {total_size}, stopping")]
    DatInvalidBlockSize { offset: usize, total_size: u32 },
    #[error("DAT stream ends without a terminator block")]
    DatMissingTerminator,
    #[error("DAT block of type {entity_type} has area id {area_id} out of range, kept unparsed")]
    DatInvalidAreaId { entity_type: u32, area_id: u32 },
    #[error("BIN function {function_index} was not found in the instruction stream")]
    BinFunctionNotFound { function_index: usize },
    #[error("BIN instruction stream is truncated at offset {offset}")]
    BinTruncatedInstructions { offset: usize },
    #[error("No set_episode instruction found, defaulting to episode 1")]
    MissingEpisode,
    #[error("Unknown set_episode argument {argument}, defaulting to episode 1")]
    InvalidEpisodeArgument { argument: u32 },
    #[error("BIN contains no functions, defaulting to episode 1")]
    BinNoFunctions,
    #[error("Map designation of area {area_id} variant {variant_id} is out of range")]
    InvalidMapDesignation { area_id: u32, variant_id: u32 },
    #[error("Area {area_id} variant {variant_id} does not exist in episode {episode}")]
    InvalidAreaVariant {
        episode: u8,
        area_id: u8,
        variant_id: u8,
    },
    #[error("Unknown NPC type id {type_id:#X} (skin {skin}, area {area_id})")]
    UnknownNpcType {
        type_id: u16,
        skin: u32,
        area_id: u16,
    },
    #[error("Unknown object type id {type_id}")]
    UnknownObjectType { type_id: u16 },
    #[error("NJCM chunk of {size} bytes is too small for a node")]
    NjcmTooSmall { size: usize },
    #[error("Unknown NJ chunk type {chunk_type} at offset {offset}")]
    NjUnknownChunkType { chunk_type: u8, offset: usize },
}

impl ParseWarning {
    /// Logs the warning and appends it to `warnings`.
    pub fn report(self, warnings: &mut Vec<ParseWarning>) {
        log::warn!("{}", self);
        warnings.push(self);
    }
}
