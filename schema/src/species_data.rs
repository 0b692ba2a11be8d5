use crate::PokemonType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
}

/// Static description of a combatant; instances are created from it at
/// battle start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonTemplate {
    pub id: String,
    pub name: String,
    pub pokemon_type: PokemonType,
    pub level: u8,
    pub max_hp: u16,
    pub base_stats: BaseStats,
    pub skills: Vec<String>, // skill ids, resolved against the skill catalog
}
