//! Simulated raid members that join the player in boss battles.
use crate::errors::{CatalogError, CatalogResult};
use crate::player::{BattlePlayer, PlayerType};
use crate::pokemon::Combatant;
use crate::species::catalog;

const MOCK_NAMES: [&str; 10] = [
    "Ash", "Misty", "Brock", "Lance", "Bruno", "Agatha", "Koga", "Blue", "Red", "Silver",
];

const FIRST_MOCK_LEVEL: usize = 5;

/// `count` bot players cycling through the regular templates, the first at
/// level 5 and each next one a level higher.
pub fn mock_party(count: usize) -> CatalogResult<Vec<BattlePlayer>> {
    let catalog = catalog()?;
    let templates = catalog.template_ids();
    if templates.is_empty() && count > 0 {
        return Err(CatalogError::MalformedData("no templates for mock players".to_string()));
    }

    (0..count)
        .map(|i| {
            let level = u8::try_from(FIRST_MOCK_LEVEL + i).unwrap_or(u8::MAX);
            let combatant = catalog.instantiate(&templates[i % templates.len()], Some(level))?;
            Ok(BattlePlayer::new(
                format!("mock-player-{}", i + 1),
                MOCK_NAMES[i % MOCK_NAMES.len()],
                PlayerType::Bot,
                combatant,
            ))
        })
        .collect()
}

/// The human in seat 0 followed by `mocks` bot players.
pub fn raid_party(player_name: &str, player: Combatant, mocks: usize) -> CatalogResult<Vec<BattlePlayer>> {
    let mut party = vec![BattlePlayer::human(player_name, player)];
    party.extend(mock_party(mocks)?);
    Ok(party)
}
