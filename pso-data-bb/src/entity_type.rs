use pso_data::{Episode, NpcType, ObjectType};
use pso_file_readers::{DatNpc, ParseWarning};

const MAX_NPC_TYPE_ID: u16 = 0x11F;

/// Resolves the catalog type of a DAT NPC record. Several monsters share a
/// type id and are told apart by skin, episode, area or the regular flag.
pub fn get_npc_type(episode: Episode, npc: &DatNpc, warnings: &mut Vec<ParseWarning>) -> NpcType {
    let npc_type = resolve_npc_type(episode, npc);
    if npc_type == NpcType::Unknown {
        ParseWarning::UnknownNpcType {
            type_id: npc.type_id,
            skin: npc.skin,
            area_id: npc.area_id,
        }
        .report(warnings);
    }

    npc_type
}

/// Changes the type id, skin and regular flag of `npc` so that it resolves to
/// `npc_type` in `episode`, preferring its current values. Returns false and
/// leaves `npc` untouched when no record in its area resolves to `npc_type`.
pub fn set_npc_type(episode: Episode, npc_type: NpcType, npc: &mut DatNpc) -> bool {
    if npc_type == NpcType::Unknown {
        return false;
    }

    let type_ids = std::iter::once(npc.type_id).chain(0..=MAX_NPC_TYPE_ID);
    for type_id in type_ids {
        for skin in [npc.skin, 0, 1, 2] {
            for regular in [npc.regular, !npc.regular] {
                let candidate = DatNpc {
                    type_id,
                    skin,
                    regular,
                    area_id: npc.area_id,
                    ..Default::default()
                };
                if resolve_npc_type(episode, &candidate) == npc_type {
                    npc.type_id = type_id;
                    npc.skin = skin;
                    npc.regular = regular;
                    return true;
                }
            }
        }
    }
    false
}

fn resolve_npc_type(episode: Episode, npc: &DatNpc) -> NpcType {
    by_skin_of_three(episode, npc)
        .or_else(|| by_skin_of_two(episode, npc))
        .or_else(|| by_episode(episode, npc))
        .or_else(|| by_type_id(npc.type_id))
        .unwrap_or(NpcType::Unknown)
}

pub fn get_object_type(type_id: u16, warnings: &mut Vec<ParseWarning>) -> ObjectType {
    let object_type = ObjectType::from_type_id(type_id);
    if object_type == ObjectType::Unknown {
        ParseWarning::UnknownObjectType { type_id }.report(warnings);
    }
    object_type
}

fn by_skin_of_three(episode: Episode, npc: &DatNpc) -> Option<NpcType> {
    use Episode::*;

    Some(match (npc.type_id, npc.skin % 3, episode) {
        (0x044, 0, I) => NpcType::Booma,
        (0x044, 1, I) => NpcType::Gobooma,
        (0x044, 2, I) => NpcType::Gigobooma,

        (0x063, 0, I) => NpcType::EvilShark,
        (0x063, 1, I) => NpcType::PalShark,
        (0x063, 2, I) => NpcType::GuilShark,

        (0x0A6, 0, I) => NpcType::Dimenian,
        (0x0A6, 0, II) => NpcType::Dimenian2,
        (0x0A6, 1, I) => NpcType::LaDimenian,
        (0x0A6, 1, II) => NpcType::LaDimenian2,
        (0x0A6, 2, I) => NpcType::SoDimenian,
        (0x0A6, 2, II) => NpcType::SoDimenian2,

        (0x0D6, 0, II) => NpcType::Mericarol,
        (0x0D6, 1, II) => NpcType::Mericus,
        (0x0D6, 2, II) => NpcType::Merikle,

        (0x115, 0, IV) => NpcType::Boota,
        (0x115, 1, IV) => NpcType::ZeBoota,
        (0x115, 2, IV) => NpcType::BaBoota,
        (0x117, 0, IV) => NpcType::Goran,
        (0x117, 1, IV) => NpcType::PyroGoran,
        (0x117, 2, IV) => NpcType::GoranDetonator,
        _ => return None,
    })
}

fn by_skin_of_two(episode: Episode, npc: &DatNpc) -> Option<NpcType> {
    use Episode::*;

    let high_area = npc.area_id > 15;

    Some(match (npc.type_id, npc.skin % 2, episode) {
        (0x040, 0, I) => NpcType::Hildebear,
        (0x040, 0, II) => NpcType::Hildebear2,
        (0x040, 1, I) => NpcType::Hildeblue,
        (0x040, 1, II) => NpcType::Hildeblue2,
        (0x041, 0, I) => NpcType::RagRappy,
        (0x041, 0, II) => NpcType::RagRappy2,
        (0x041, 0, IV) => NpcType::SandRappy,
        (0x041, 1, I) => NpcType::AlRappy,
        (0x041, 1, II) => NpcType::LoveRappy,
        (0x041, 1, IV) => NpcType::DelRappy,
        (0x043, 0, I) => NpcType::SavageWolf,
        (0x043, 0, II) => NpcType::SavageWolf2,
        (0x043, 1, I) => NpcType::BarbarousWolf,
        (0x043, 1, II) => NpcType::BarbarousWolf2,

        (0x061, _, I) | (0x061, _, II) if high_area => NpcType::DelLily,
        (0x061, 0, I) => NpcType::PoisonLily,
        (0x061, 0, II) => NpcType::PoisonLily2,
        (0x061, 1, I) => NpcType::NarLily,
        (0x061, 1, II) => NpcType::NarLily2,

        (0x080, 0, I) => NpcType::Dubchic,
        (0x080, 0, II) => NpcType::Dubchic2,
        (0x080, 1, I) => NpcType::Gilchic,
        (0x080, 1, II) => NpcType::Gilchic2,

        (0x0D4, 0, II) => NpcType::SinowBerill,
        (0x0D4, 1, II) => NpcType::SinowSpigell,
        (0x0D5, 0, II) => NpcType::Merillia,
        (0x0D5, 1, II) => NpcType::Meriltas,
        (0x0D7, 0, II) => NpcType::UlGibbon,
        (0x0D7, 1, II) => NpcType::ZolGibbon,

        (0x0DD, 0, II) => NpcType::Dolmolm,
        (0x0DD, 1, II) => NpcType::Dolmdarl,
        (0x0E0, _, II) if high_area => NpcType::Epsilon,
        (0x0E0, 0, II) => NpcType::SinowZoa,
        (0x0E0, 1, II) => NpcType::SinowZele,

        (0x112, 0, IV) => NpcType::MerissaA,
        (0x112, 1, IV) => NpcType::MerissaAA,
        (0x114, 0, IV) => NpcType::Zu,
        (0x114, 1, IV) => NpcType::Pazuzu,
        (0x116, 0, IV) => NpcType::Dorphon,
        (0x116, 1, IV) => NpcType::DorphonEclair,
        (0x119, 0, IV) => NpcType::SaintMillion,
        (0x119, 1, IV) => NpcType::Shambertin,
        _ => return None,
    })
}

fn by_episode(episode: Episode, npc: &DatNpc) -> Option<NpcType> {
    use Episode::*;

    let regular = npc.regular;

    Some(match (npc.type_id, episode) {
        (0x042, I) => NpcType::Monest,
        (0x042, II) => NpcType::Monest2,

        (0x060, I) => NpcType::GrassAssassin,
        (0x060, II) => NpcType::GrassAssassin2,
        (0x062, I) => NpcType::NanoDragon,
        (0x064, I) if regular => NpcType::PofuillySlime,
        (0x064, I) => NpcType::PouillySlime,
        (0x065, I) => NpcType::PanArms,
        (0x065, II) => NpcType::PanArms2,

        (0x081, I) => NpcType::Garanz,
        (0x081, II) => NpcType::Garanz2,
        (0x082, I) if regular => NpcType::SinowBeat,
        (0x082, I) => NpcType::SinowGold,
        (0x083, I) => NpcType::Canadine,
        (0x084, I) => NpcType::Canane,
        (0x085, I) => NpcType::Dubswitch,
        (0x085, II) => NpcType::Dubswitch2,

        (0x0A0, I) => NpcType::Delsaber,
        (0x0A0, II) => NpcType::Delsaber2,
        (0x0A1, I) => NpcType::ChaosSorcerer,
        (0x0A1, II) => NpcType::ChaosSorcerer2,
        (0x0A2, I) => NpcType::DarkGunner,
        (0x0A4, I) => NpcType::ChaosBringer,
        (0x0A5, I) => NpcType::DarkBelra,
        (0x0A5, II) => NpcType::DarkBelra2,
        (0x0A7, I) => NpcType::Bulclaw,
        (0x0A8, I) => NpcType::Claw,

        (0x0C0, I) => NpcType::Dragon,
        (0x0C0, II) => NpcType::GalGryphon,
        (0x0C1, I) => NpcType::DeRolLe,
        (0x0C5, I) => NpcType::VolOpt,
        (0x0C8, I) => NpcType::DarkFalz,
        (0x0CA, II) => NpcType::OlgaFlow,
        (0x0CB, II) => NpcType::BarbaRay,
        (0x0CC, II) => NpcType::GolDragon,

        (0x0D8, II) => NpcType::Gibbles,
        (0x0D9, II) => NpcType::Gee,
        (0x0DA, II) => NpcType::GiGue,

        (0x0DB, II) => NpcType::Deldepth,
        (0x0DC, II) => NpcType::Delbiter,
        (0x0DE, II) => NpcType::Morfos,
        (0x0DF, II) => NpcType::Recobox,
        (0x0E1, II) => NpcType::IllGill,

        (0x110, IV) => NpcType::Astark,
        (0x111, IV) if regular => NpcType::SatelliteLizard,
        (0x111, IV) => NpcType::Yowie,
        (0x113, IV) => NpcType::Girtablulu,
        _ => return None,
    })
}

fn by_type_id(type_id: u16) -> Option<NpcType> {
    Some(match type_id {
        0x004 => NpcType::FemaleFat,
        0x005 => NpcType::FemaleMacho,
        0x007 => NpcType::FemaleTall,
        0x00A => NpcType::MaleDwarf,
        0x00B => NpcType::MaleFat,
        0x00C => NpcType::MaleMacho,
        0x00D => NpcType::MaleOld,
        0x019 => NpcType::BlueSoldier,
        0x01A => NpcType::RedSoldier,
        0x01B => NpcType::Principal,
        0x01C => NpcType::Tekker,
        0x01D => NpcType::GuildLady,
        0x01E => NpcType::Scientist,
        0x01F => NpcType::Nurse,
        0x020 => NpcType::Irene,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npc(type_id: u16, skin: u32, area_id: u16, regular: bool) -> DatNpc {
        DatNpc {
            type_id,
            skin,
            area_id,
            regular,
            ..Default::default()
        }
    }

    fn npc_type(episode: Episode, npc: DatNpc) -> NpcType {
        get_npc_type(episode, &npc, &mut Vec::new())
    }

    #[test]
    fn skin_selects_variant() {
        assert_eq!(npc_type(Episode::I, npc(0x044, 0, 1, true)), NpcType::Booma);
        assert_eq!(npc_type(Episode::I, npc(0x044, 4, 1, true)), NpcType::Gobooma);
        assert_eq!(npc_type(Episode::I, npc(0x044, 5, 1, true)), NpcType::Gigobooma);
        assert_eq!(npc_type(Episode::II, npc(0x040, 3, 1, true)), NpcType::Hildeblue2);
        assert_eq!(npc_type(Episode::IV, npc(0x041, 1, 1, true)), NpcType::DelRappy);
    }

    #[test]
    fn area_selects_tower_variant() {
        assert_eq!(npc_type(Episode::II, npc(0x061, 0, 16, true)), NpcType::DelLily);
        assert_eq!(npc_type(Episode::II, npc(0x061, 1, 15, true)), NpcType::NarLily2);
        assert_eq!(npc_type(Episode::II, npc(0x0E0, 1, 17, true)), NpcType::Epsilon);
        assert_eq!(npc_type(Episode::II, npc(0x0E0, 1, 3, true)), NpcType::SinowZele);
    }

    #[test]
    fn regular_flag_selects_rare_variant() {
        assert_eq!(npc_type(Episode::I, npc(0x064, 0, 5, true)), NpcType::PofuillySlime);
        assert_eq!(npc_type(Episode::I, npc(0x064, 0, 5, false)), NpcType::PouillySlime);
        assert_eq!(npc_type(Episode::IV, npc(0x111, 0, 1, false)), NpcType::Yowie);
    }

    #[test]
    fn friendly_npcs_ignore_episode() {
        assert_eq!(npc_type(Episode::IV, npc(0x01B, 0, 0, true)), NpcType::Principal);
    }

    #[test]
    fn set_npc_type_prefers_current_record() {
        let mut rappy = npc(0x041, 3, 2, true);
        assert!(set_npc_type(Episode::II, NpcType::LoveRappy, &mut rappy));
        assert_eq!((rappy.type_id, rappy.skin, rappy.regular), (0x041, 3, true));
        assert!(set_npc_type(Episode::II, NpcType::RagRappy2, &mut rappy));
        assert_eq!((rappy.type_id, rappy.skin, rappy.regular), (0x041, 0, true));

        let mut slime = npc(0x064, 0, 5, true);
        assert!(set_npc_type(Episode::I, NpcType::PouillySlime, &mut slime));
        assert_eq!((slime.type_id, slime.regular), (0x064, false));

        let mut booma = npc(0x040, 0, 1, true);
        assert!(set_npc_type(Episode::I, NpcType::Gigobooma, &mut booma));
        assert_eq!((booma.type_id, booma.skin), (0x044, 2));
        assert_eq!(npc_type(Episode::I, booma), NpcType::Gigobooma);
    }

    #[test]
    fn set_npc_type_outside_its_episode_fails() {
        let mut rappy = npc(0x041, 0, 1, true);
        assert!(!set_npc_type(Episode::IV, NpcType::Gibbles, &mut rappy));
        assert!(!set_npc_type(Episode::I, NpcType::Unknown, &mut rappy));
        assert_eq!((rappy.type_id, rappy.skin), (0x041, 0));
    }

    #[test]
    fn unknown_types_are_warnings() {
        let mut warnings = Vec::new();
        assert_eq!(
            get_npc_type(Episode::IV, &npc(0x0C8, 0, 0, true), &mut warnings),
            NpcType::Unknown
        );
        assert_eq!(get_object_type(0x1234, &mut warnings), ObjectType::Unknown);
        assert_eq!(
            warnings,
            vec![
                ParseWarning::UnknownNpcType {
                    type_id: 0x0C8,
                    skin: 0,
                    area_id: 0
                },
                ParseWarning::UnknownObjectType { type_id: 0x1234 },
            ]
        );
    }
}
