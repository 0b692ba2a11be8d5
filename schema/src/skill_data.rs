use crate::PokemonType;
use serde::{Deserialize, Serialize};

/// An immutable move definition.
///
/// A power of 0 marks a utility move that never deals damage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: PokemonType,
    pub power: u16,
    pub accuracy: u8,
    #[serde(default)]
    pub description: String,
}

impl Skill {
    pub fn is_damaging(&self) -> bool {
        self.power > 0
    }
}
