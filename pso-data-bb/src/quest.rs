use anyhow::Context;

use pso_data::{Episode, NpcType, Quest, QuestNpc, QuestObject};
use pso_file_readers::{
    prs, BinFile, BinReadOptions, ByteCursor, DatFile, DatNpc, ParseWarning, PsoFile, QstFile,
    QstWriteOptions,
};

use crate::{
    create_script, get_area_variants, get_episode, get_npc_type, get_object_type, set_npc_type,
    update_script,
};

pub fn parse_quest(reader: ByteCursor) -> Result<Quest, anyhow::Error> {
    parse_quest_with_warnings(reader, &mut Vec::new())
}

/// Parses a Blue Burst QST file. Recoverable anomalies are appended to
/// `warnings` and the quest is still returned.
pub fn parse_quest_with_warnings(
    reader: ByteCursor,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Quest, anyhow::Error> {
    let mut qst = QstFile::parse(reader, warnings)?;

    let dat = prs::decompress(&mut qst.dat).context("Failed to decompress DAT")?;
    let dat = DatFile::parse(dat, warnings)?;

    let bin = prs::decompress(&mut qst.bin).context("Failed to decompress BIN")?;
    let bin = BinFile::parse(bin, &BinReadOptions::default(), warnings)?;

    let (episode, area_variants) = if bin.function_offsets.is_empty() {
        ParseWarning::BinNoFunctions.report(warnings);
        (Episode::I, Vec::new())
    } else {
        match bin.function_instructions(0, warnings) {
            Some(instructions) => {
                let episode = get_episode(instructions, warnings);
                let area_variants = get_area_variants(episode, instructions, warnings);
                (episode, area_variants)
            }
            None => {
                ParseWarning::MissingEpisode.report(warnings);
                (Episode::I, Vec::new())
            }
        }
    };

    let objects = dat
        .objects
        .into_iter()
        .map(|data| QuestObject {
            object_type: get_object_type(data.type_id, warnings),
            data,
        })
        .collect();

    let npcs = dat
        .npcs
        .into_iter()
        .map(|data| QuestNpc {
            npc_type: get_npc_type(episode, &data, warnings),
            data,
        })
        .collect();

    Ok(Quest {
        name: bin.quest_name.clone(),
        short_description: bin.short_description.clone(),
        long_description: bin.long_description.clone(),
        quest_number: bin.quest_number,
        episode,
        area_variants,
        objects,
        npcs,
        bin: Some(bin),
        dat_blocks: dat.blocks,
    })
}

/// Serializes `quest` as a Blue Burst QST file containing
/// `{base_file_name}.dat` and `{base_file_name}.bin`.
///
/// The BIN the quest was parsed from is reused, with the episode and map
/// designations of function 0 rewritten when they no longer match the quest.
/// A quest without one gets a script that sets its episode and area variants.
/// An NPC whose `npc_type` disagrees with its record has the record's type id,
/// skin and regular flag changed to match.
pub fn write_quest(quest: &Quest, base_file_name: &str) -> Result<ByteCursor, anyhow::Error> {
    let dat = DatFile {
        objects: quest
            .objects
            .iter()
            .map(|object| {
                let mut data = object.data.clone();
                if let Some(type_id) = object.object_type.type_id() {
                    data.type_id = type_id;
                }
                data
            })
            .collect(),
        npcs: quest
            .npcs
            .iter()
            .map(|npc| npc_record(quest.episode, npc))
            .collect(),
        blocks: quest.dat_blocks.clone(),
    };
    let mut dat_bytes = ByteCursor::default();
    dat.write(&mut dat_bytes, &())?;

    let mut bin = match quest.bin.clone() {
        Some(mut bin) => {
            update_script(&mut bin, quest.episode, &quest.area_variants)?;
            bin
        }
        None => BinFile {
            object_code: create_script(quest.episode, &quest.area_variants),
            function_offsets: vec![0],
            ..Default::default()
        },
    };
    bin.quest_number = quest.quest_number;
    bin.quest_name = quest.name.clone();
    bin.short_description = quest.short_description.clone();
    bin.long_description = quest.long_description.clone();
    let mut bin_bytes = ByteCursor::default();
    bin.write(&mut bin_bytes, &())?;

    dat_bytes.rewind();
    bin_bytes.rewind();
    let qst = QstFile::new(
        &format!("{}.dat", base_file_name),
        prs::compress(&mut dat_bytes),
        &format!("{}.bin", base_file_name),
        prs::compress(&mut bin_bytes),
        quest.quest_number as u16,
    );

    let mut writer = ByteCursor::default();
    qst.write(&mut writer, &QstWriteOptions::default())?;
    writer.rewind();
    Ok(writer)
}

fn npc_record(episode: Episode, npc: &QuestNpc) -> DatNpc {
    let mut data = npc.data.clone();
    if npc.npc_type != NpcType::Unknown
        && get_npc_type(episode, &data, &mut Vec::new()) != npc.npc_type
        && !set_npc_type(episode, npc.npc_type, &mut data)
    {
        log::warn!(
            "{} has no type id in episode {}, keeping type id {:#X}",
            npc.npc_type.name(),
            episode.number(),
            data.type_id
        );
    }
    data
}
