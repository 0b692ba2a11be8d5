use schema::PokemonType;

use super::{ProcessStatus, SpriteTypingService, TypedSprite};
use crate::config::PollPolicy;
use crate::errors::{ServiceError, ServiceResult};

/// Poll a sprite job until it completes, fails, or the attempts run out.
///
/// Transport errors on an individual poll are retried like a pending job;
/// only the last one is surfaced.
pub async fn await_sprite_typing(
    service: &dyn SpriteTypingService,
    upload_id: &str,
    policy: PollPolicy,
) -> ServiceResult<TypedSprite> {
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match service.check_status(upload_id).await {
            Ok(response) => match response.status {
                ProcessStatus::Completed => {
                    let data = response.data.ok_or_else(|| {
                        ServiceError::Decode("completed job carried no sprite data".to_string())
                    })?;
                    tracing::info!(upload_id, attempt, pokemon_type = %data.pokemon_type, "sprite ready");
                    return Ok(TypedSprite {
                        front_image: data.front_image,
                        back_image: data.back_image,
                        pokemon_type: PokemonType::from_label(&data.pokemon_type),
                    });
                }
                ProcessStatus::Failed => {
                    let reason = response
                        .error
                        .unwrap_or_else(|| "image processing failed".to_string());
                    tracing::warn!(upload_id, %reason, "sprite job failed");
                    return Err(ServiceError::Rejected(reason));
                }
                ProcessStatus::Processing => {
                    tracing::debug!(upload_id, attempt, max = policy.max_attempts, "sprite still processing");
                }
            },
            Err(err) => {
                tracing::warn!(upload_id, attempt, error = %err, "sprite status poll failed");
                last_error = Some(err);
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(match last_error {
        Some(err) if policy.max_attempts == 1 => err,
        _ => ServiceError::PollTimeout {
            attempts: policy.max_attempts,
            waited: policy.interval.saturating_mul(policy.max_attempts),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::ScriptedSpriteService;
    use crate::services::{ProcessResponse, SpriteData};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn processing() -> ServiceResult<ProcessResponse> {
        Ok(ProcessResponse {
            success: true,
            status: ProcessStatus::Processing,
            data: None,
            error: None,
        })
    }

    fn completed() -> ServiceResult<ProcessResponse> {
        Ok(ProcessResponse {
            success: true,
            status: ProcessStatus::Completed,
            data: Some(SpriteData {
                front_image: "front".to_string(),
                back_image: "back".to_string(),
                pokemon_type: "electric".to_string(),
            }),
            error: None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_completed() {
        let service = ScriptedSpriteService::new(vec![
            processing(),
            Err(ServiceError::Transport("reset".to_string())),
            completed(),
        ]);
        let started = tokio::time::Instant::now();

        let sprite = await_sprite_typing(&service, "abc", PollPolicy::default())
            .await
            .unwrap();

        assert_eq!(sprite.pokemon_type, PokemonType::Electric);
        assert_eq!(service.polls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_stops_polling() {
        let service = ScriptedSpriteService::new(vec![
            processing(),
            Ok(ProcessResponse {
                success: false,
                status: ProcessStatus::Failed,
                data: None,
                error: Some("no creature found".to_string()),
            }),
            completed(),
        ]);

        let err = await_sprite_typing(&service, "abc", PollPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Rejected("no creature found".to_string()));
        assert_eq!(service.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_bounded_attempts() {
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 3,
        };
        let service = ScriptedSpriteService::new(vec![processing(), processing(), processing()]);

        let err = await_sprite_typing(&service, "abc", policy).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::PollTimeout {
                attempts: 3,
                waited: Duration::from_secs(6)
            }
        );
    }
}
