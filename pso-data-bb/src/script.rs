use std::collections::BTreeMap;

use pso_data::{AreaVariant, Episode};
use pso_file_readers::{
    get_function_operations, BinFile, BinInstruction, ByteCursor, InstructionArgument,
    ParseWarning, OPCODE_BB_MAP_DESIGNATE, OPCODE_RET, OPCODE_SET_EPISODE,
};

fn argument(instruction: &BinInstruction, index: usize) -> Option<u32> {
    instruction
        .arguments
        .get(index)
        .and_then(InstructionArgument::as_u32)
}

/// Episode from the first `set_episode` in `instructions`, episode I when
/// there is none or its argument is unknown.
pub fn get_episode(instructions: &[BinInstruction], warnings: &mut Vec<ParseWarning>) -> Episode {
    let set_episode = match instructions
        .iter()
        .find(|instruction| instruction.opcode == OPCODE_SET_EPISODE)
    {
        Some(set_episode) => set_episode,
        None => {
            ParseWarning::MissingEpisode.report(warnings);
            return Episode::I;
        }
    };

    let argument = argument(set_episode, 0).unwrap_or(u32::MAX);
    Episode::from_set_episode_argument(argument).unwrap_or_else(|| {
        ParseWarning::InvalidEpisodeArgument { argument }.report(warnings);
        Episode::I
    })
}

/// Area variants designated by `BB_Map_Designate` instructions. A later
/// designation of the same area replaces an earlier one. Sorted by area
/// display order, then variant id.
pub fn get_area_variants(
    episode: Episode,
    instructions: &[BinInstruction],
    warnings: &mut Vec<ParseWarning>,
) -> Vec<AreaVariant> {
    let mut designations = BTreeMap::new();
    for instruction in instructions
        .iter()
        .filter(|instruction| instruction.opcode == OPCODE_BB_MAP_DESIGNATE)
    {
        if let (Some(area_id), Some(variant_id)) = (argument(instruction, 0), argument(instruction, 2))
        {
            match (u8::try_from(area_id), u8::try_from(variant_id)) {
                (Ok(area), Ok(variant)) => {
                    designations.insert(area, variant);
                }
                _ => ParseWarning::InvalidMapDesignation {
                    area_id,
                    variant_id,
                }
                .report(warnings),
            }
        }
    }

    let mut area_variants: Vec<AreaVariant> = designations
        .into_iter()
        .filter_map(|(area_id, variant_id)| {
            let area_variant = AreaVariant::new(episode, area_id, variant_id);
            if area_variant.is_none() {
                ParseWarning::InvalidAreaVariant {
                    episode: episode.number(),
                    area_id,
                    variant_id,
                }
                .report(warnings);
            }
            area_variant
        })
        .collect();
    area_variants.sort_by_key(AreaVariant::display_order);
    area_variants
}

fn write_opcode(code: &mut ByteCursor, opcode: u16) -> &mut ByteCursor {
    code.write_u8((opcode >> 8) as u8).write_u8(opcode as u8)
}

fn write_designations(code: &mut ByteCursor, episode: Episode, area_variants: &[AreaVariant]) {
    write_opcode(code, OPCODE_SET_EPISODE).write_u32(episode.set_episode_argument());
    for area_variant in area_variants {
        write_opcode(code, OPCODE_BB_MAP_DESIGNATE)
            .write_u8(area_variant.area_id)
            .write_u16(0)
            .write_u8(area_variant.id)
            .write_u8(0);
    }
}

/// Object code for a new quest's function 0: the episode, one map designation
/// per area variant, then `ret`.
pub fn create_script(episode: Episode, area_variants: &[AreaVariant]) -> Vec<u8> {
    let mut code = ByteCursor::default();
    write_designations(&mut code, episode, area_variants);
    code.write_u8(OPCODE_RET as u8);
    code.into_vec()
}

/// Makes function 0 of `bin` set `episode` and designate `area_variants`.
///
/// Left untouched when it already does. Otherwise its `set_episode` and
/// `BB_Map_Designate` instructions are replaced by new ones at the start of
/// the function. When function 0 does not exist a new one is appended.
pub fn update_script(
    bin: &mut BinFile,
    episode: Episode,
    area_variants: &[AreaVariant],
) -> Result<(), anyhow::Error> {
    let mut warnings = Vec::new();
    if bin.instructions.is_empty() {
        bin.decode(&mut warnings);
    }

    let function_0 = bin
        .function_offsets
        .first()
        .and_then(|&offset| get_function_operations(&bin.instructions, offset));
    match function_0 {
        Some(instructions) => {
            if get_episode(instructions, &mut warnings) == episode
                && get_area_variants(episode, instructions, &mut warnings) == area_variants
            {
                return Ok(());
            }
        }
        None => {
            log::debug!("BIN has no function 0, appending a new one");
            let offset = bin.object_code.len() as i32;
            match bin.function_offsets.first_mut() {
                Some(function_offset) => *function_offset = offset,
                None => bin.function_offsets.push(offset),
            }
            bin.object_code
                .extend_from_slice(&create_script(episode, area_variants));
            bin.decode(&mut warnings);
            return Ok(());
        }
    }

    let mut code = ByteCursor::default();
    write_designations(&mut code, episode, area_variants);
    bin.rewrite_function(
        0,
        code.as_slice(),
        |instruction| {
            instruction.opcode == OPCODE_SET_EPISODE
                || instruction.opcode == OPCODE_BB_MAP_DESIGNATE
        },
        &mut warnings,
    )?;
    Ok(())
}
