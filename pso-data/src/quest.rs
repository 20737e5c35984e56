use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pso_file_readers::{types::Vec3, BinFile, DatBlock, DatNpc, DatObject};

use crate::{AreaVariant, Episode, NpcType, ObjectType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestError {
    #[error("Invalid episode {episode}, expected 1, 2 or 4")]
    InvalidEpisode { episode: u32 },
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct QuestObject {
    pub object_type: ObjectType,
    #[serde(flatten)]
    pub data: DatObject,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct QuestNpc {
    pub npc_type: NpcType,
    #[serde(flatten)]
    pub data: DatNpc,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Quest {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub quest_number: u32,
    pub episode: Episode,
    /// Sorted by area display order, then variant id.
    pub area_variants: Vec<AreaVariant>,
    pub objects: Vec<QuestObject>,
    pub npcs: Vec<QuestNpc>,

    /// Parsed BIN the quest was read from, reused when writing.
    #[serde(skip)]
    pub bin: Option<BinFile>,
    /// Block layout of the DAT the quest was read from, reused when writing.
    #[serde(skip)]
    pub dat_blocks: Vec<DatBlock>,
}

impl Quest {
    pub fn entities(&self) -> impl Iterator<Item = QuestEntity<'_>> {
        self.objects
            .iter()
            .map(QuestEntity::Object)
            .chain(self.npcs.iter().map(QuestEntity::Npc))
    }

    pub fn entities_in_area(&self, area_id: u16) -> impl Iterator<Item = QuestEntity<'_>> {
        self.entities()
            .filter(move |entity| entity.area_id() == area_id)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum QuestEntity<'a> {
    Object(&'a QuestObject),
    Npc(&'a QuestNpc),
}

impl<'a> QuestEntity<'a> {
    pub fn area_id(&self) -> u16 {
        match self {
            QuestEntity::Object(object) => object.data.area_id,
            QuestEntity::Npc(npc) => npc.data.area_id,
        }
    }

    pub fn section_id(&self) -> u16 {
        match self {
            QuestEntity::Object(object) => object.data.section_id,
            QuestEntity::Npc(npc) => npc.data.section_id,
        }
    }

    pub fn position(&self) -> Vec3<f32> {
        match self {
            QuestEntity::Object(object) => object.data.position,
            QuestEntity::Npc(npc) => npc.data.position,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuestEntity::Object(object) => object.object_type.name(),
            QuestEntity::Npc(npc) => npc.npc_type.name(),
        }
    }
}
