use schema::{PokemonType, Skill};

/// (name suffix, power, accuracy) for each placeholder slot, mirroring the
/// spread of a real twelve-move batch from weak and reliable to strong and wild.
const PLACEHOLDER_TIERS: [(&str, u16, u8); 12] = [
    ("Jab", 40, 100),
    ("Wheel", 60, 100),
    ("Stream", 90, 100),
    ("Fist", 75, 100),
    ("Blast", 110, 85),
    ("Fang", 65, 95),
    ("Storm", 100, 50),
    ("Wave", 95, 90),
    ("Kick", 85, 90),
    ("Charge", 50, 100),
    ("Spin", 35, 85),
    ("Burn", 60, 100),
];

fn type_prefix(kind: PokemonType) -> &'static str {
    match kind {
        PokemonType::Fire => "Flame",
        PokemonType::Water => "Tide",
        PokemonType::Electric => "Volt",
        PokemonType::Normal => "Impact",
    }
}

/// Deterministic stand-in moves for when no remote move data is available.
///
/// The same `(kind, count)` always yields the same moves; past twelve the
/// tiers repeat with a numeric suffix.
pub fn placeholder_moves(kind: PokemonType, count: usize) -> Vec<Skill> {
    let prefix = type_prefix(kind);
    (0..count)
        .map(|n| {
            let (suffix, power, accuracy) = PLACEHOLDER_TIERS[n % PLACEHOLDER_TIERS.len()];
            let round = n / PLACEHOLDER_TIERS.len();
            let name = if round == 0 {
                format!("{} {}", prefix, suffix)
            } else {
                format!("{} {} {}", prefix, suffix, round + 1)
            };
            Skill {
                id: format!("placeholder_{}_{}", kind, n),
                name,
                move_type: kind,
                power,
                accuracy,
                description: format!("A {}-type attack with {} power.", kind, power),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn placeholders_are_deterministic() {
        let first = placeholder_moves(PokemonType::Fire, 12);
        let second = placeholder_moves(PokemonType::Fire, 12);
        assert_eq!(first, second);
        assert_eq!(first.len(), 12);
        assert_eq!(first[0].id, "placeholder_fire_0");
        assert_eq!(first[4].power, 110);
        assert!(first.iter().all(|m| m.is_damaging()));
    }

    #[test]
    fn placeholders_past_one_batch_stay_unique() {
        let moves = placeholder_moves(PokemonType::Water, 13);
        assert_eq!(moves[12].name, "Tide Jab 2");
        assert_ne!(moves[0].id, moves[12].id);
    }
}
