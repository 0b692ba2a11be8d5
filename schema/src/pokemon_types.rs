use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Elemental types known to the battle client.
///
/// The set is closed: every pair must have an entry in
/// [`PokemonType::type_effectiveness`]. Adding a variant means adding its row
/// and column there.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PokemonType {
    Fire,
    Water,
    Electric,
    Normal,
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &'static str = self.into();
        write!(f, "{}", label)
    }
}

/// The only multipliers the effectiveness table may produce.
pub const EFFECTIVENESS_STEPS: [f64; 6] = [0.0, 0.25, 0.5, 1.0, 2.0, 4.0];

impl PokemonType {
    /// Calculate type effectiveness multiplier for attacking type vs defending type
    /// Returns: 2.0 = Super Effective, 1.0 = Normal, 0.5 = Not Very Effective, 0.0 = No Effect
    pub fn type_effectiveness(attacking: PokemonType, defending: PokemonType) -> f64 {
        use PokemonType::*;

        match (attacking, defending) {
            // Fire
            (Fire, Fire) | (Fire, Water) => 0.5,
            (Fire, _) => 1.0,

            // Water
            (Water, Water) | (Water, Electric) => 0.5,
            (Water, Fire) => 2.0,
            (Water, _) => 1.0,

            // Electric
            (Electric, Electric) => 0.5,
            (Electric, Water) => 2.0,
            (Electric, _) => 1.0,

            // Normal
            (Normal, _) => 1.0,
        }
    }

    pub fn is_immune(attacking: PokemonType, defending: PokemonType) -> bool {
        Self::type_effectiveness(attacking, defending) == 0.0
    }

    /// Resolve a type label coming from a remote service.
    ///
    /// Accepts the English names (any case) and the localized labels the move
    /// service emits. Anything unrecognised becomes `Normal`.
    pub fn from_label(label: &str) -> PokemonType {
        let trimmed = label.trim();
        if let Ok(parsed) = trimmed.parse::<PokemonType>() {
            return parsed;
        }
        match trimmed {
            "火" => PokemonType::Fire,
            "水" => PokemonType::Water,
            "電" => PokemonType::Electric,
            _ => PokemonType::Normal,
        }
    }
}
