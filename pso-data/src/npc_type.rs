use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_rules! npc_types {
    ($($variant:ident => $name:literal, $enemy:literal;)*) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
        pub enum NpcType {
            $($variant,)*
        }

        impl NpcType {
            pub const ALL: &'static [NpcType] = &[$(NpcType::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(NpcType::$variant => $name,)*
                }
            }

            pub fn is_enemy(self) -> bool {
                match self {
                    $(NpcType::$variant => $enemy,)*
                }
            }
        }
    };
}

npc_types! {
    Unknown => "Unknown", false;
    FemaleFat => "Female Fat", false;
    FemaleMacho => "Female Macho", false;
    FemaleTall => "Female Tall", false;
    MaleDwarf => "Male Dwarf", false;
    MaleFat => "Male Fat", false;
    MaleMacho => "Male Macho", false;
    MaleOld => "Male Old", false;
    BlueSoldier => "Blue Soldier", false;
    RedSoldier => "Red Soldier", false;
    Principal => "Principal", false;
    Tekker => "Tekker", false;
    GuildLady => "Guild Lady", false;
    Scientist => "Scientist", false;
    Nurse => "Nurse", false;
    Irene => "Irene", false;
    Hildebear => "Hildebear", true;
    Hildeblue => "Hildeblue", true;
    RagRappy => "Rag Rappy", true;
    AlRappy => "Al Rappy", true;
    Monest => "Monest", true;
    SavageWolf => "Savage Wolf", true;
    BarbarousWolf => "Barbarous Wolf", true;
    Booma => "Booma", true;
    Gobooma => "Gobooma", true;
    Gigobooma => "Gigobooma", true;
    Dragon => "Dragon", true;
    GrassAssassin => "Grass Assassin", true;
    PoisonLily => "Poison Lily", true;
    NarLily => "Nar Lily", true;
    NanoDragon => "Nano Dragon", true;
    EvilShark => "Evil Shark", true;
    PalShark => "Pal Shark", true;
    GuilShark => "Guil Shark", true;
    PofuillySlime => "Pofuilly Slime", true;
    PouillySlime => "Pouilly Slime", true;
    PanArms => "Pan Arms", true;
    DeRolLe => "De Rol Le", true;
    Dubchic => "Dubchic", true;
    Gilchic => "Gilchic", true;
    Garanz => "Garanz", true;
    SinowBeat => "Sinow Beat", true;
    SinowGold => "Sinow Gold", true;
    Canadine => "Canadine", true;
    Canane => "Canane", true;
    Dubswitch => "Dubswitch", true;
    VolOpt => "Vol Opt", true;
    Delsaber => "Delsaber", true;
    ChaosSorcerer => "Chaos Sorcerer", true;
    DarkGunner => "Dark Gunner", true;
    ChaosBringer => "Chaos Bringer", true;
    DarkBelra => "Dark Belra", true;
    Dimenian => "Dimenian", true;
    LaDimenian => "La Dimenian", true;
    SoDimenian => "So Dimenian", true;
    Bulclaw => "Bulclaw", true;
    Claw => "Claw", true;
    DarkFalz => "Dark Falz", true;
    Hildebear2 => "Hildebear (Ep. II)", true;
    Hildeblue2 => "Hildeblue (Ep. II)", true;
    RagRappy2 => "Rag Rappy (Ep. II)", true;
    LoveRappy => "Love Rappy", true;
    Monest2 => "Monest (Ep. II)", true;
    PoisonLily2 => "Poison Lily (Ep. II)", true;
    NarLily2 => "Nar Lily (Ep. II)", true;
    GrassAssassin2 => "Grass Assassin (Ep. II)", true;
    Dimenian2 => "Dimenian (Ep. II)", true;
    LaDimenian2 => "La Dimenian (Ep. II)", true;
    SoDimenian2 => "So Dimenian (Ep. II)", true;
    DarkBelra2 => "Dark Belra (Ep. II)", true;
    BarbaRay => "Barba Ray", true;
    SavageWolf2 => "Savage Wolf (Ep. II)", true;
    BarbarousWolf2 => "Barbarous Wolf (Ep. II)", true;
    PanArms2 => "Pan Arms (Ep. II)", true;
    Dubchic2 => "Dubchic (Ep. II)", true;
    Gilchic2 => "Gilchic (Ep. II)", true;
    Garanz2 => "Garanz (Ep. II)", true;
    Dubswitch2 => "Dubswitch (Ep. II)", true;
    Delsaber2 => "Delsaber (Ep. II)", true;
    ChaosSorcerer2 => "Chaos Sorcerer (Ep. II)", true;
    GolDragon => "Gol Dragon", true;
    SinowBerill => "Sinow Berill", true;
    SinowSpigell => "Sinow Spigell", true;
    Merillia => "Merillia", true;
    Meriltas => "Meriltas", true;
    Mericarol => "Mericarol", true;
    Mericus => "Mericus", true;
    Merikle => "Merikle", true;
    UlGibbon => "Ul Gibbon", true;
    ZolGibbon => "Zol Gibbon", true;
    Gibbles => "Gibbles", true;
    Gee => "Gee", true;
    GiGue => "Gi Gue", true;
    GalGryphon => "Gal Gryphon", true;
    Deldepth => "Deldepth", true;
    Delbiter => "Delbiter", true;
    Dolmolm => "Dolmolm", true;
    Dolmdarl => "Dolmdarl", true;
    Morfos => "Morfos", true;
    Recobox => "Recobox", true;
    Epsilon => "Epsilon", true;
    SinowZoa => "Sinow Zoa", true;
    SinowZele => "Sinow Zele", true;
    IllGill => "Ill Gill", true;
    DelLily => "Del Lily", true;
    OlgaFlow => "Olga Flow", true;
    SandRappy => "Sand Rappy", true;
    DelRappy => "Del Rappy", true;
    Astark => "Astark", true;
    SatelliteLizard => "Satellite Lizard", true;
    Yowie => "Yowie", true;
    MerissaA => "Merissa A", true;
    MerissaAA => "Merissa AA", true;
    Girtablulu => "Girtablulu", true;
    Zu => "Zu", true;
    Pazuzu => "Pazuzu", true;
    Boota => "Boota", true;
    ZeBoota => "Ze Boota", true;
    BaBoota => "Ba Boota", true;
    Dorphon => "Dorphon", true;
    DorphonEclair => "Dorphon Eclair", true;
    Goran => "Goran", true;
    PyroGoran => "Pyro Goran", true;
    GoranDetonator => "Goran Detonator", true;
    SaintMillion => "Saint-Million", true;
    Shambertin => "Shambertin", true;
    Kondrieu => "Kondrieu", true;
}

impl Default for NpcType {
    fn default() -> Self {
        NpcType::Unknown
    }
}

impl NpcType {
    /// Stable catalog id, starting at 1 for `Unknown`.
    pub fn id(self) -> u16 {
        self as u16 + 1
    }

    pub fn from_id(id: u16) -> Option<Self> {
        NpcType::ALL.get(id.checked_sub(1)? as usize).copied()
    }
}
