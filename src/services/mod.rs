//! Remote collaborators of the battle client.
//!
//! The core only depends on the traits below. [`http`] talks to the game
//! backend, [`offline`] stands in when no backend is configured.
use std::sync::Arc;

use async_trait::async_trait;
use schema::{PokemonType, Skill};
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::errors::ServiceResult;

pub mod http;
pub mod offline;
pub mod sprites;

#[cfg(test)]
pub mod testing;

pub use http::{HttpDamageService, HttpMoveSource, HttpSpriteService};
pub use offline::{LocalDamageService, OfflineMoveSource};
pub use sprites::await_sprite_typing;

/// Source of move batches for the skill buffer.
#[async_trait]
pub trait MoveSource: Send + Sync {
    /// Fetch exactly `count` moves of the given element.
    async fn fetch_batch(&self, element: PokemonType, count: usize) -> ServiceResult<Vec<Skill>>;
}

/// Remote damage calculator. Callers fall back to the local formula on error.
#[async_trait]
pub trait DamageService: Send + Sync {
    async fn calculate_damage(&self, request: &DamageRequest) -> ServiceResult<DamageResponse>;
}

/// AI sprite generation and typing for an uploaded photo.
#[async_trait]
pub trait SpriteTypingService: Send + Sync {
    /// Upload a source image; returns the opaque upload id.
    async fn upload(&self, image: SpriteUpload) -> ServiceResult<String>;

    /// Query the processing status of an earlier upload.
    async fn check_status(&self, upload_id: &str) -> ServiceResult<ProcessResponse>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRequest {
    pub attacker_level: u8,
    pub attacker_attack: u16,
    pub defender_defense: u16,
    pub skill_power: u16,
    pub skill_type: PokemonType,
    pub defender_type: PokemonType,
    pub is_critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageResponse {
    pub damage: u32,
    pub type_effectiveness: f64,
    pub is_critical: bool,
    #[serde(default)]
    pub message: String,
}

/// Body of the move-fetch endpoint. Older deployments name the list `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveBatchResponse {
    pub success: bool,
    #[serde(default, alias = "data")]
    pub moves: Vec<RemoteMove>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMove {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(rename = "type")]
    pub move_type: String,
    #[serde(default)]
    pub power: Option<u16>,
    #[serde(default)]
    pub accuracy: Option<u8>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RemoteMove {
    /// Convert into a catalog skill. Missing power means a utility move,
    /// missing accuracy means a sure hit.
    pub fn into_skill(self) -> Skill {
        let id = match self.id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        };
        let name = self
            .name
            .or(self.name_en)
            .unwrap_or_else(|| format!("Move {}", id));
        Skill {
            name,
            move_type: PokemonType::from_label(&self.move_type),
            power: self.power.unwrap_or(0),
            accuracy: self.accuracy.unwrap_or(100).min(100),
            description: self.description.unwrap_or_default(),
            id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpriteUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub success: bool,
    pub status: ProcessStatus,
    #[serde(default)]
    pub data: Option<SpriteData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteData {
    pub front_image: String,
    pub back_image: String,
    #[serde(rename = "type")]
    pub pokemon_type: String,
}

/// A finished sprite job: both images and the type the backend assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedSprite {
    pub front_image: String,
    pub back_image: String,
    pub pokemon_type: PokemonType,
}

/// The service set a game session runs against.
#[derive(Clone)]
pub struct Services {
    pub moves: Arc<dyn MoveSource>,
    pub damage: Arc<dyn DamageService>,
    pub sprites: Option<Arc<dyn SpriteTypingService>>,
}

impl Services {
    /// HTTP clients when a backend is configured, offline stand-ins otherwise.
    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        let move_url = config.move_url.clone().or_else(|| {
            config
                .base_url
                .as_ref()
                .map(|base| format!("{}/api/v1/skills", base.trim_end_matches('/')))
        });
        let Some(move_url) = move_url else {
            tracing::info!("no backend configured, using offline services");
            return Ok(Self::offline());
        };

        let client = http::build_client(config.request_timeout)?;
        let moves: Arc<dyn MoveSource> = Arc::new(HttpMoveSource::new(client.clone(), move_url));

        // Damage and sprites live on the main backend only.
        let (damage, sprites): (Arc<dyn DamageService>, Option<Arc<dyn SpriteTypingService>>) =
            match &config.base_url {
                Some(base) => (
                    Arc::new(HttpDamageService::new(client.clone(), base)),
                    Some(Arc::new(HttpSpriteService::new(client, base))),
                ),
                None => (Arc::new(LocalDamageService::new()), None),
            };

        Ok(Self { moves, damage, sprites })
    }

    pub fn offline() -> Self {
        Self {
            moves: Arc::new(OfflineMoveSource::new()),
            damage: Arc::new(LocalDamageService::new()),
            sprites: None,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("sprites", &self.sprites.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn remote_moves_accept_either_list_key() {
        let body = r#"{"success": true, "data": [
            {"id": 7, "name": "Ember", "type": "fire", "power": 40, "accuracy": 100},
            {"id": "x1", "name_en": "Splash", "type": "水"}
        ]}"#;
        let response: MoveBatchResponse = serde_json::from_str(body).unwrap();
        let skills: Vec<Skill> = response.moves.into_iter().map(RemoteMove::into_skill).collect();

        assert_eq!(skills[0].id, "7");
        assert_eq!(skills[0].move_type, PokemonType::Fire);
        assert_eq!(skills[1].name, "Splash");
        assert_eq!(skills[1].move_type, PokemonType::Water);
        assert_eq!(skills[1].power, 0);
        assert_eq!(skills[1].accuracy, 100);
    }

    #[test]
    fn damage_request_uses_backend_field_names() {
        let request = DamageRequest {
            attacker_level: 5,
            attacker_attack: 52,
            defender_defense: 43,
            skill_power: 40,
            skill_type: PokemonType::Fire,
            defender_type: PokemonType::Water,
            is_critical: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["skill_power"], 40);
        assert_eq!(json["skill_type"], "fire");
        assert_eq!(json["defender_type"], "water");
    }

    #[test]
    fn process_status_parses() {
        let body = r#"{"success": true, "status": "completed",
            "data": {"front_image": "f", "back_image": "b", "type": "electric"}}"#;
        let response: ProcessResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, ProcessStatus::Completed);
        assert_eq!(response.data.unwrap().pokemon_type, "electric");
    }
}
