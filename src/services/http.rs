use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use schema::{PokemonType, Skill};
use serde::Deserialize;

use super::{
    DamageRequest, DamageResponse, DamageService, MoveBatchResponse, MoveSource, ProcessResponse,
    RemoteMove, SpriteTypingService, SpriteUpload,
};
use crate::errors::{ServiceError, ServiceResult};

const DAMAGE_PATH: &str = "/api/v1/battle/calculate-damage";
const UPLOAD_PATH: &str = "/api/v1/pokemon/upload";
const PROCESS_PATH: &str = "/api/v1/pokemon/process";

pub(crate) fn build_client(timeout: Duration) -> ServiceResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::Transport(e.to_string()))
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// `GET <url>?type=<element>&count=<n>`
#[derive(Debug, Clone)]
pub struct HttpMoveSource {
    client: Client,
    url: String,
}

impl HttpMoveSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl MoveSource for HttpMoveSource {
    async fn fetch_batch(&self, element: PokemonType, count: usize) -> ServiceResult<Vec<Skill>> {
        let count_param = count.to_string();
        let response: MoveBatchResponse = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .query(&[("type", element.to_string()), ("count", count_param)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success {
            return Err(ServiceError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "move service reported failure".to_string()),
            ));
        }
        if response.moves.len() < count {
            return Err(ServiceError::Rejected(format!(
                "expected {} moves, received {}",
                count,
                response.moves.len()
            )));
        }

        Ok(response
            .moves
            .into_iter()
            .take(count)
            .map(RemoteMove::into_skill)
            .collect())
    }
}

/// `POST /api/v1/battle/calculate-damage`
#[derive(Debug, Clone)]
pub struct HttpDamageService {
    client: Client,
    url: String,
}

impl HttpDamageService {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: join(base_url, DAMAGE_PATH),
        }
    }
}

#[async_trait]
impl DamageService for HttpDamageService {
    async fn calculate_damage(&self, request: &DamageRequest) -> ServiceResult<DamageResponse> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    upload_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Photo upload and sprite processing endpoints.
#[derive(Debug, Clone)]
pub struct HttpSpriteService {
    client: Client,
    base_url: String,
}

impl HttpSpriteService {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpriteTypingService for HttpSpriteService {
    async fn upload(&self, image: SpriteUpload) -> ServiceResult<String> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(join(&self.base_url, UPLOAD_PATH))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: UploadResponse = response.json().await?;
        match body.upload_id {
            Some(id) if status.is_success() => Ok(id),
            _ => Err(body
                .error
                .map(ServiceError::Rejected)
                .unwrap_or(ServiceError::Status(status.as_u16()))),
        }
    }

    async fn check_status(&self, upload_id: &str) -> ServiceResult<ProcessResponse> {
        let url = format!("{}/{}", join(&self.base_url, PROCESS_PATH), upload_id);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}
