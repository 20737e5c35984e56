use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::QuestError;

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Deserialize, Serialize, JsonSchema,
)]
pub enum Episode {
    I = 1,
    II = 2,
    IV = 4,
}

impl Default for Episode {
    fn default() -> Self {
        Episode::I
    }
}

impl Episode {
    pub fn from_number(number: u32) -> Result<Self, QuestError> {
        FromPrimitive::from_u32(number).ok_or(QuestError::InvalidEpisode { episode: number })
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Maps the argument of the `set_episode` script instruction.
    pub fn from_set_episode_argument(argument: u32) -> Option<Self> {
        match argument {
            0 => Some(Episode::I),
            1 => Some(Episode::II),
            2 => Some(Episode::IV),
            _ => None,
        }
    }

    pub fn set_episode_argument(self) -> u32 {
        match self {
            Episode::I => 0,
            Episode::II => 1,
            Episode::IV => 2,
        }
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Episode::I => write!(f, "Episode I"),
            Episode::II => write!(f, "Episode II"),
            Episode::IV => write!(f, "Episode IV"),
        }
    }
}
