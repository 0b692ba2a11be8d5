use crate::battle::engine::BattleEngine;
use crate::battle::state::{BattleState, TurnRng};
use crate::config::BattleConfig;
use crate::errors::BattleResult;
use crate::player::{BattlePlayer, PlayerType};
use crate::pokemon::Combatant;
use crate::services::testing::UnreachableDamageService;
use crate::services::DamageService;
use crate::species;
use schema::{PokemonType, Skill};
use std::sync::Arc;

/// A builder for creating test combatants from catalog templates.
///
/// # Example
/// ```
/// let charmander = TestCombatantBuilder::new("charmander")
///     .with_moves(&["ember"])
///     .with_hp(10)
///     .build();
/// ```
pub struct TestCombatantBuilder {
    template: String,
    level: Option<u8>,
    moves: Option<Vec<Skill>>,
    current_hp: Option<u16>,
    max_hp: Option<u16>,
    attack: Option<u16>,
    defense: Option<u16>,
    pokemon_type: Option<PokemonType>,
}

impl TestCombatantBuilder {
    /// Creates a new builder for a given template id.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            level: None,
            moves: None,
            current_hp: None,
            max_hp: None,
            attack: None,
            defense: None,
            pokemon_type: None,
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the moves from catalog ids. An empty slice leaves no moves at all.
    pub fn with_moves(mut self, move_ids: &[&str]) -> Self {
        let moves = move_ids
            .iter()
            .map(|id| match species::get_move(id) {
                Ok(skill) => skill,
                Err(err) => panic!("Failed to load move {}: {}", id, err),
            })
            .collect();
        self.moves = Some(moves);
        self
    }

    pub fn with_skills(mut self, skills: Vec<Skill>) -> Self {
        self.moves = Some(skills);
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_max_hp(mut self, max_hp: u16) -> Self {
        self.max_hp = Some(max_hp);
        self
    }

    pub fn with_attack(mut self, attack: u16) -> Self {
        self.attack = Some(attack);
        self
    }

    pub fn with_defense(mut self, defense: u16) -> Self {
        self.defense = Some(defense);
        self
    }

    pub fn with_type(mut self, pokemon_type: PokemonType) -> Self {
        self.pokemon_type = Some(pokemon_type);
        self
    }

    pub fn build(self) -> Combatant {
        let mut combatant = match species::instantiate(&self.template, self.level) {
            Ok(combatant) => combatant,
            Err(err) => panic!("Failed to instantiate {}: {}", self.template, err),
        };

        if let Some(moves) = self.moves {
            combatant = combatant.with_moves(moves);
        }
        if let Some(max_hp) = self.max_hp {
            combatant.max_hp = max_hp;
            combatant.set_hp_to_max();
        }
        if let Some(attack) = self.attack {
            combatant.stats.attack = attack;
        }
        if let Some(defense) = self.defense {
            combatant.stats.defense = defense;
        }
        if let Some(pokemon_type) = self.pokemon_type {
            combatant.pokemon_type = pokemon_type;
        }
        if let Some(hp) = self.current_hp {
            combatant.set_hp(hp);
        }

        combatant
    }
}

/// A skill that always hits and hits hard.
pub fn sure_hit(power: u16) -> Skill {
    Skill {
        id: format!("sure-hit-{}", power),
        name: format!("Sure Hit {}", power),
        move_type: PokemonType::Normal,
        power,
        accuracy: 100,
        description: String::new(),
    }
}

/// Wraps combatants as attacking seats: the first is the human, the rest bots.
pub fn create_attackers(combatants: Vec<Combatant>) -> Vec<BattlePlayer> {
    combatants
        .into_iter()
        .enumerate()
        .map(|(i, combatant)| {
            let player_type = if i == 0 { PlayerType::Human } else { PlayerType::Bot };
            BattlePlayer::new(format!("p{}", i + 1), format!("Trainer {}", i + 1), player_type, combatant)
        })
        .collect()
}

/// Creates a battle state with the given attackers against one defender.
pub fn raid_state(attackers: Vec<Combatant>, defender: Combatant) -> BattleState {
    BattleState::new("test_battle", create_attackers(attackers), defender, 20)
}

/// Creates an engine whose damage service is unreachable, so every hit runs
/// the local formula against the given scripted draws.
pub fn offline_engine(attackers: Vec<Combatant>, defender: Combatant, outcomes: Vec<f64>) -> BattleEngine {
    engine_with_service(attackers, defender, outcomes, Arc::new(UnreachableDamageService::default()))
}

pub fn engine_with_service(
    attackers: Vec<Combatant>,
    defender: Combatant,
    outcomes: Vec<f64>,
    damage: Arc<dyn DamageService>,
) -> BattleEngine {
    assert_ok(BattleEngine::new(
        "test_battle",
        create_attackers(attackers),
        defender,
        BattleConfig::default(),
        damage,
        TurnRng::new_for_test(outcomes),
    ))
}

/// Creates a `TurnRng` with a long list of middling draws.
/// Useful for tests where the specific RNG outcome is not important, preventing panics from exhaustion.
pub fn predictable_rng() -> TurnRng {
    TurnRng::new_for_test(vec![0.5; 100])
}

/// Helper function to assert that a Result is Ok and return the value.
/// Provides clear error messages in tests when functions unexpectedly fail.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
