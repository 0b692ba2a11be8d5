//! Headless demo: loads the move pool, meets the configured boss and plays
//! one raid with every seat driven by a bot.
use std::process::ExitCode;
use std::sync::Arc;

use pokemon_battle::battle::ai::ScoringBehavior;
use pokemon_battle::battle::selection::RandomDelayBot;
use pokemon_battle::config::DRAFT_SIZE;
use pokemon_battle::{Action, GameConfig, GameResult, GameSession, Screen, Services, TurnRng};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(GameConfig::from_env()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "demo failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GameConfig) -> GameResult<()> {
    let services = Services::from_config(&config.services)?;
    let battle_config = config.battle.clone();
    let session = GameSession::new(config, services)?;

    session.dispatch(Action::StartLoadingSkills).await;
    if let Some(message) = session.state().error_message {
        println!("{}", message);
        return Ok(());
    }

    session.trigger_encounter().await?;
    let state = session.state();
    let Some(mut offered) = state.fetched_moves else {
        println!("{}", state.error_message.unwrap_or_default());
        return Ok(());
    };

    // Draft the hardest hitters on offer.
    offered.sort_by(|a, b| b.power.cmp(&a.power));
    offered.truncate(DRAFT_SIZE);
    println!("Drafted:");
    for skill in &offered {
        println!("  {} ({}, power {}, accuracy {})", skill.name, skill.move_type, skill.power, skill.accuracy);
    }
    session.dispatch(Action::SetSelectedSkills(offered)).await;
    session.dispatch(Action::StartBattle).await;
    if session.state().screen != Screen::Battle {
        println!("The battle could not start.");
        return Ok(());
    }

    let pilot = RandomDelayBot::new(
        Box::new(ScoringBehavior::new()),
        battle_config.bot_delay_min,
        battle_config.bot_delay_max,
        TurnRng::new_random(),
    );
    let report = session.play_battle(Arc::new(pilot)).await?;

    println!();
    for line in &report.info.log {
        println!("{}", line);
    }
    println!();
    println!("Result: {:?} after {} turn(s)", report.outcome, report.turns);

    session.settle().await;
    println!("Moves buffered for the next encounter: {}", session.skill_buffer().status().buffer_size);
    Ok(())
}
