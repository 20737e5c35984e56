use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_rules! object_types {
    ($($variant:ident = $type_id:literal => $name:literal;)*) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
        pub enum ObjectType {
            Unknown,
            $($variant,)*
        }

        impl ObjectType {
            pub fn from_type_id(type_id: u16) -> Self {
                match type_id {
                    $($type_id => ObjectType::$variant,)*
                    _ => ObjectType::Unknown,
                }
            }

            /// The DAT type id, `None` for `Unknown`.
            pub fn type_id(self) -> Option<u16> {
                match self {
                    ObjectType::Unknown => None,
                    $(ObjectType::$variant => Some($type_id),)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    ObjectType::Unknown => "Unknown",
                    $(ObjectType::$variant => $name,)*
                }
            }
        }
    };
}

object_types! {
    PlayerSet = 0 => "Player Set";
    Particle = 1 => "Particle";
    Teleporter = 2 => "Teleporter";
    Warp = 3 => "Warp";
    LightCollision = 4 => "Light Collision";
    Item = 5 => "Item";
    EnvSound = 6 => "Env Sound";
    FogCollision = 7 => "Fog Collision";
    EventCollision = 8 => "Event Collision";
    CharaCollision = 9 => "Chara Collision";
    ElementalTrap = 10 => "Elemental Trap";
    StatusTrap = 11 => "Status Trap";
    HealTrap = 12 => "Heal Trap";
    LargeElementalTrap = 13 => "Large Elemental Trap";
    ObjRoomId = 14 => "Obj Room ID";
    Sensor = 15 => "Sensor";
    Lensflare = 17 => "Lensflare";
    ScriptCollision = 18 => "Script Collision";
    HealRing = 19 => "Heal Ring";
    MapCollision = 20 => "Map Collision";
    ScriptCollisionA = 21 => "Script Collision A";
    ItemLight = 22 => "Item Light";
    RadarCollision = 23 => "Radar Collision";
    FogCollisionSw = 24 => "Fog Collision SW";
    BossTeleporter = 25 => "Boss Teleporter";
    ImageBoard = 26 => "Image Board";
    QuestWarp = 27 => "Quest Warp";
    Epilogue = 28 => "Epilogue";
    BoxDetectObject = 32 => "Box Detect Object";
    SymbolChatObject = 33 => "Symbol Chat Object";
    TouchPlateObject = 34 => "Touch Plate Object";
    TargetableObject = 35 => "Targetable Object";
    EffectObject = 36 => "Effect Object";
    CountDownObject = 37 => "Count Down Object";
    MenuActivation = 64 => "Menu Activation";
    TelepipeLocation = 65 => "Telepipe Location";
    BgmCollision = 66 => "BGM Collision";
    MainRagolTeleporter = 67 => "Main Ragol Teleporter";
    PrincipalWarp = 68 => "Principal Warp";
    ShopDoor = 69 => "Shop Door";
    HuntersGuildDoor = 70 => "Hunter's Guild Door";
    TeleporterDoor = 71 => "Teleporter Door";
    MedicalCenterDoor = 72 => "Medical Center Door";
    Elevator = 73 => "Elevator";
    EasterEgg = 74 => "Easter Egg";
    ValentinesHeart = 75 => "Valentines Heart";
    ChristmasTree = 76 => "Christmas Tree";
    ChristmasWreath = 77 => "Christmas Wreath";
    HalloweenPumpkin = 78 => "Halloween Pumpkin";
    WelcomeBoard = 81 => "Welcome Board";
    Firework = 82 => "Firework";
    LobbyScreenDoor = 83 => "Lobby Screen Door";
    LabTeleporterDoor = 85 => "Lab Teleporter Door";
    ForestDoor = 128 => "Forest Door";
    ForestSwitch = 129 => "Forest Switch";
    LaserFence = 130 => "Laser Fence";
    LaserSquareFence = 131 => "Laser Square Fence";
    ForestLaserFenceSwitch = 132 => "Forest Laser Fence Switch";
    LightRays = 133 => "Light Rays";
    BlueButterfly = 134 => "Blue Butterfly";
    Probe = 135 => "Probe";
    RandomTypeBox = 136 => "Random Type Box";
    ForestWeatherStation = 137 => "Forest Weather Station";
    Battery = 138 => "Battery";
    ForestConsole = 139 => "Forest Console";
    BlackSlidingDoor = 140 => "Black Sliding Door";
    RicoMessagePod = 141 => "Rico Message Pod";
    EnergyBarrier = 142 => "Energy Barrier";
    ForestRisingBridge = 143 => "Forest Rising Bridge";
    SwitchNoneDoor = 144 => "Switch (none door)";
    EnemyBoxGrey = 145 => "Enemy Box (Grey)";
    FixedTypeBox = 146 => "Fixed Type Box";
    EnemyBoxBrown = 147 => "Enemy Box (Brown)";
    EmptyTypeBox = 149 => "Empty Type Box";
}

impl Default for ObjectType {
    fn default() -> Self {
        ObjectType::Unknown
    }
}
