mod area;
mod episode;
mod npc_type;
mod object_type;
mod quest;

pub use area::{Area, AreaVariant};
pub use episode::Episode;
pub use npc_type::NpcType;
pub use object_type::ObjectType;
pub use quest::{Quest, QuestEntity, QuestError, QuestNpc, QuestObject};
