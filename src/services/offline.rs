use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use schema::{PokemonType, Skill};

use super::{DamageRequest, DamageResponse, DamageService, MoveSource};
use crate::battle::calculators::{compute_damage, DamageInput};
use crate::battle::state::TurnRng;
use crate::errors::{ServiceError, ServiceResult};
use crate::moves::placeholder_moves;
use crate::species::effectiveness;

/// Serves placeholder moves. Successive batches continue the sequence so
/// buffered moves keep distinct ids.
#[derive(Debug, Default)]
pub struct OfflineMoveSource {
    served: AtomicUsize,
}

impl OfflineMoveSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MoveSource for OfflineMoveSource {
    async fn fetch_batch(&self, element: PokemonType, count: usize) -> ServiceResult<Vec<Skill>> {
        let start = self.served.fetch_add(count, Ordering::Relaxed);
        let mut moves = placeholder_moves(element, start + count);
        Ok(moves.split_off(start))
    }
}

/// The damage formula evaluated in-process with the type table applied.
#[derive(Debug)]
pub struct LocalDamageService {
    rng: Mutex<TurnRng>,
}

impl LocalDamageService {
    pub fn new() -> Self {
        Self::with_rng(TurnRng::new_random())
    }

    pub fn with_rng(rng: TurnRng) -> Self {
        Self { rng: Mutex::new(rng) }
    }
}

impl Default for LocalDamageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DamageService for LocalDamageService {
    async fn calculate_damage(&self, request: &DamageRequest) -> ServiceResult<DamageResponse> {
        let multiplier = effectiveness(request.skill_type, request.defender_type);
        let input = DamageInput {
            attacker_level: request.attacker_level,
            attacker_attack: request.attacker_attack,
            defender_defense: request.defender_defense,
            move_power: request.skill_power,
            type_multiplier: Some(multiplier),
            is_critical: request.is_critical,
        };

        let damage = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| ServiceError::Rejected("damage rng poisoned".to_string()))?;
            compute_damage(&input, &mut rng)
        };

        let message = if request.is_critical {
            "A critical hit!".to_string()
        } else {
            format!("Dealt {} damage", damage)
        };
        Ok(DamageResponse {
            damage,
            type_effectiveness: multiplier,
            is_critical: request.is_critical,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn offline_batches_continue_the_sequence() {
        let source = OfflineMoveSource::new();
        let first = source.fetch_batch(PokemonType::Fire, 12).await.unwrap();
        let second = source.fetch_batch(PokemonType::Fire, 12).await.unwrap();

        assert_eq!(first.len(), 12);
        assert_eq!(second.len(), 12);
        assert_eq!(first[0].id, "placeholder_fire_0");
        assert_eq!(second[0].id, "placeholder_fire_12");
        assert_eq!(second[0].name, "Flame Jab 2");
    }

    #[tokio::test]
    async fn local_service_applies_the_type_table() {
        let service = LocalDamageService::with_rng(TurnRng::new_for_test(vec![1.0]));
        let response = service
            .calculate_damage(&DamageRequest {
                attacker_level: 5,
                attacker_attack: 48,
                defender_defense: 43,
                skill_power: 40,
                skill_type: PokemonType::Water,
                defender_type: PokemonType::Fire,
                is_critical: false,
            })
            .await
            .unwrap();

        // base floor(4*40*48/2150 + 2) = 5, doubled by water against fire
        assert_eq!(response.type_effectiveness, 2.0);
        assert_eq!(response.damage, 10);
    }
}
