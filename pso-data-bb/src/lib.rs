mod entity_type;
mod quest;
mod script;

pub use entity_type::{get_npc_type, get_object_type, set_npc_type};
pub use quest::{parse_quest, parse_quest_with_warnings, write_quest};
pub use script::{create_script, get_area_variants, get_episode, update_script};
