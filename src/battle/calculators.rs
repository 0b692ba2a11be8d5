use crate::battle::state::TurnRng;
use schema::Skill;

/// Multiplier applied to a critical hit.
pub const CRITICAL_MULTIPLIER: f64 = 1.5;

/// Everything the damage formula looks at for one connecting attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    pub attacker_level: u8,
    pub attacker_attack: u16,
    pub defender_defense: u16,
    pub move_power: u16,
    /// `None` when effectiveness is unknown (treated as neutral).
    pub type_multiplier: Option<f64>,
    pub is_critical: bool,
}

/// Scaled-stat base damage, before critical, spread and type modifiers.
///
/// A defense of 0 is treated as 1.
pub fn base_damage(input: &DamageInput) -> f64 {
    let level = f64::from(input.attacker_level);
    let power = f64::from(input.move_power);
    let attack = f64::from(input.attacker_attack);
    let defense = f64::from(input.defender_defense.max(1));

    (((2.0 * level / 5.0 + 2.0) * power * attack) / (defense * 50.0) + 2.0).floor()
}

/// The damage formula with the random spread factor already drawn.
///
/// Non-damaging moves short-circuit to 0; anything else deals at least 1.
pub fn compute_damage_with_factor(input: &DamageInput, random_factor: f64) -> u32 {
    if input.move_power == 0 {
        return 0;
    }

    let mut damage = base_damage(input);
    if input.is_critical {
        damage *= CRITICAL_MULTIPLIER;
    }
    damage *= random_factor.clamp(0.85, 1.0);
    if let Some(multiplier) = input.type_multiplier {
        damage *= multiplier;
    }

    (damage.floor() as u32).max(1)
}

/// Compute damage, drawing the spread factor in `[0.85, 1.0]` from the oracle.
///
/// No draw is made for a non-damaging move.
pub fn compute_damage(input: &DamageInput, rng: &mut TurnRng) -> u32 {
    if input.move_power == 0 {
        return 0;
    }
    compute_damage_with_factor(input, rng.damage_factor())
}

/// Accuracy check: a hit when `draw * 100 < accuracy`.
pub fn move_hits(skill: &Skill, rng: &mut TurnRng) -> bool {
    rng.roll_percent(skill.accuracy, "accuracy check")
}

/// Critical-hit check at `1 / denominator`.
pub fn roll_critical(rng: &mut TurnRng, denominator: u32) -> bool {
    rng.one_in(denominator, "critical hit check")
}
