use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Episode;

/// An area of an episode. `order` is its position in the episode's area
/// list, which is not always the id order.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Area {
    pub id: u8,
    pub name: &'static str,
    pub order: usize,
    pub variant_count: u8,
}

macro_rules! areas {
    ($($id:literal => $name:literal, $variant_count:literal;)*) => {
        areas!(@entries 0usize; []; $($id => $name, $variant_count;)*)
    };
    (@entries $order:expr; [$($done:expr,)*];) => {
        &[$($done,)*]
    };
    (@entries $order:expr; [$($done:expr,)*]; $id:literal => $name:literal, $variant_count:literal; $($rest:tt)*) => {
        areas!(@entries $order + 1; [$($done,)* Area {
            id: $id,
            name: $name,
            order: $order,
            variant_count: $variant_count,
        },]; $($rest)*)
    };
}

static EPISODE_I_AREAS: &[Area] = areas! {
    0 => "Pioneer II", 1;
    1 => "Forest 1", 1;
    2 => "Forest 2", 1;
    3 => "Cave 1", 6;
    4 => "Cave 2", 5;
    5 => "Cave 3", 6;
    6 => "Mine 1", 6;
    7 => "Mine 2", 6;
    8 => "Ruins 1", 5;
    9 => "Ruins 2", 5;
    10 => "Ruins 3", 5;
    11 => "Dragon", 1;
    12 => "De Rol Le", 1;
    13 => "Vol Opt", 1;
    14 => "Dark Falz", 1;
};

static EPISODE_II_AREAS: &[Area] = areas! {
    0 => "Lab", 1;
    1 => "VR Temple Alpha", 3;
    2 => "VR Temple Beta", 3;
    3 => "VR Space Ship Alpha", 3;
    4 => "VR Space Ship Beta", 3;
    5 => "Jungle 1", 1;
    6 => "Jungle East", 1;
    7 => "Jungle 3", 1;
    8 => "Jungle 4", 3;
    9 => "Seaside", 1;
    10 => "Jungle 6", 1;
    16 => "Seabed Upper", 3;
    11 => "Seabed Lower", 3;
    17 => "Jungle 7", 5;
    14 => "Barba Ray", 1;
    15 => "Gol Dragon", 1;
    12 => "Gal Gryphon", 1;
    13 => "Olga Flow", 1;
};

static EPISODE_IV_AREAS: &[Area] = areas! {
    0 => "Pioneer II (Ep. IV)", 1;
    1 => "Crater Route 1", 1;
    2 => "Crater Route 2", 1;
    3 => "Crater Route 3", 1;
    4 => "Crater Route 4", 1;
    5 => "Crater Interior", 1;
    6 => "Subterranean Desert 1", 3;
    7 => "Subterranean Desert 2", 3;
    8 => "Subterranean Desert 3", 3;
    9 => "Saint-Milion", 1;
};

impl Area {
    /// The areas of `episode` in display order.
    pub fn list(episode: Episode) -> &'static [Area] {
        match episode {
            Episode::I => EPISODE_I_AREAS,
            Episode::II => EPISODE_II_AREAS,
            Episode::IV => EPISODE_IV_AREAS,
        }
    }

    pub fn get(episode: Episode, area_id: u8) -> Option<&'static Area> {
        Area::list(episode).iter().find(|area| area.id == area_id)
    }
}

/// One of the alternate layouts of an area.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub struct AreaVariant {
    pub episode: Episode,
    pub area_id: u8,
    pub id: u8,
}

impl AreaVariant {
    /// Returns `None` when the area or variant does not exist in `episode`.
    pub fn new(episode: Episode, area_id: u8, id: u8) -> Option<Self> {
        let area = Area::get(episode, area_id)?;
        if id < area.variant_count {
            Some(Self {
                episode,
                area_id,
                id,
            })
        } else {
            None
        }
    }

    pub fn area(&self) -> Option<&'static Area> {
        Area::get(self.episode, self.area_id)
    }

    /// Sort key: area display order, then variant id.
    pub fn display_order(&self) -> (usize, u8) {
        (self.area().map_or(usize::MAX, |area| area.order), self.id)
    }
}
