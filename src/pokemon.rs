use schema::{BaseStats, PokemonTemplate, PokemonType, Skill};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::moves::placeholder_moves;

/// A battle participant. Created from a template when a battle starts and
/// discarded when it ends; HP does not carry over between encounters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub level: u8,
    pub stats: BaseStats,
    current_hp: u16,
    pub max_hp: u16,
    pub pokemon_type: PokemonType,
    pub moves: Vec<Skill>,
}

impl Combatant {
    /// Instantiate from a template. Current HP is set to max.
    ///
    /// A template without resolvable moves gets placeholder moves of its own
    /// type so it can always act.
    pub fn from_template(template: &PokemonTemplate, level: Option<u8>, moves: Vec<Skill>) -> Self {
        let moves = if moves.is_empty() {
            placeholder_moves(template.pokemon_type, 4)
        } else {
            moves
        };
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            level: level.unwrap_or(template.level),
            stats: template.base_stats,
            current_hp: template.max_hp,
            max_hp: template.max_hp,
            pokemon_type: template.pokemon_type,
            moves,
        }
    }

    pub fn current_hp(&self) -> u16 {
        self.current_hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_alive(&self) -> bool {
        !self.is_fainted()
    }

    /// Apply damage, clamping at 0. Returns true if this hit caused fainting.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        let was_alive = self.is_alive();
        let remaining = u32::from(self.current_hp).saturating_sub(damage);
        self.current_hp = remaining as u16;
        was_alive && self.is_fainted()
    }

    pub fn set_hp(&mut self, hp: u16) {
        self.current_hp = hp.min(self.max_hp);
    }

    pub fn set_hp_to_max(&mut self) {
        self.current_hp = self.max_hp;
    }

    /// Replace the known moves; used once at battle start with the drafted set.
    pub fn with_moves(mut self, moves: Vec<Skill>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn move_at(&self, index: usize) -> Option<&Skill> {
        self.moves.get(index)
    }
}

impl fmt::Display for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (Lv.{}, {})", self.name, self.level, self.pokemon_type)?;
        writeln!(f, "--------------------")?;
        const LABEL_WIDTH: usize = 8;

        writeln!(f, "{:<LABEL_WIDTH$} : {}/{}", "HP", self.current_hp, self.max_hp)?;
        writeln!(f, "{:<LABEL_WIDTH$} : {}", "Attack", self.stats.attack)?;
        writeln!(f, "{:<LABEL_WIDTH$} : {}", "Defense", self.stats.defense)?;
        write!(f, "{:<LABEL_WIDTH$} : {}", "Speed", self.stats.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template() -> PokemonTemplate {
        PokemonTemplate {
            id: "dummy".to_string(),
            name: "Dummy".to_string(),
            pokemon_type: PokemonType::Electric,
            level: 3,
            max_hp: 20,
            base_stats: BaseStats { attack: 10, defense: 10, speed: 10 },
            skills: vec![],
        }
    }

    #[test]
    fn damage_clamps_at_zero_and_reports_fainting_once() {
        let mut combatant = Combatant::from_template(&template(), None, vec![]);

        assert!(!combatant.take_damage(5));
        assert_eq!(combatant.current_hp(), 15);

        assert!(combatant.take_damage(100));
        assert_eq!(combatant.current_hp(), 0);
        assert!(combatant.is_fainted());

        // Already fainted: no second faint report.
        assert!(!combatant.take_damage(1));
    }

    #[test]
    fn empty_move_list_gets_placeholders() {
        let combatant = Combatant::from_template(&template(), Some(7), vec![]);
        assert_eq!(combatant.level, 7);
        assert_eq!(combatant.moves.len(), 4);
        assert!(combatant.moves.iter().all(|m| m.move_type == PokemonType::Electric));
    }

    #[test]
    fn set_hp_never_exceeds_max() {
        let mut combatant = Combatant::from_template(&template(), None, vec![]);
        combatant.set_hp(999);
        assert_eq!(combatant.current_hp(), 20);
        combatant.set_hp(1);
        combatant.set_hp_to_max();
        assert_eq!(combatant.current_hp(), 20);
    }
}
