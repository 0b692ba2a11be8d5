//! Top-level game state and its transition table.
//!
//! [`reducer`] is pure: it takes the current state and an action and returns
//! the next state together with the side effects the session driver has to
//! run. Anything that touches the skill buffer or the network is an
//! [`Effect`]; its result comes back as another [`Action`].
use schema::{PokemonType, Skill};
use serde::Serialize;

use crate::battle::runner::BattleInfo;
use crate::battle::state::BattleOutcome;
use crate::config::DRAFT_SIZE;
use crate::pokemon::Combatant;

/// Message shown when the move pool cannot be loaded at all.
pub const RECONNECT_MESSAGE: &str = "Lost the connection to the move server. Please restart the game.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Screen {
    #[default]
    Start,
    Dialogue,
    ImageUpload,
    Loading,
    Map,
    SkillSelection,
    Battle,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteImages {
    pub front: String,
    pub back: String,
}

/// The battle the session is currently in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveBattle {
    /// The player's combatant carrying the drafted moves.
    pub player: Combatant,
    pub enemy: Combatant,
    /// Latest snapshot published by the running battle.
    pub snapshot: Option<BattleInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub screen: Screen,
    pub dialogue_index: usize,
    pub has_seen_intro: bool,
    /// Element requested for every move batch.
    pub element: PokemonType,
    pub player_party: Vec<Combatant>,
    pub nickname: Option<String>,
    /// Type assigned by the sprite service, if the player uploaded a photo.
    pub pokemon_type: Option<PokemonType>,
    pub sprite: Option<SpriteImages>,
    /// Last known contents of the skill buffer.
    pub skill_buffer: Vec<Skill>,
    pub is_preloading: bool,
    pub skills_loaded: bool,
    pub current_enemy: Option<Combatant>,
    /// The twelve moves offered for this encounter.
    pub fetched_moves: Option<Vec<Skill>>,
    pub selected_skills: Option<Vec<Skill>>,
    pub battle: Option<ActiveBattle>,
    pub last_result: Option<BattleOutcome>,
    pub error_message: Option<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(PokemonType::Fire, Vec::new())
    }
}

impl GameState {
    pub fn new(element: PokemonType, player_party: Vec<Combatant>) -> Self {
        Self {
            screen: Screen::Start,
            dialogue_index: 0,
            has_seen_intro: false,
            element,
            player_party,
            nickname: None,
            pokemon_type: None,
            sprite: None,
            skill_buffer: Vec::new(),
            is_preloading: false,
            skills_loaded: false,
            current_enemy: None,
            fetched_moves: None,
            selected_skills: None,
            battle: None,
            last_result: None,
            error_message: None,
        }
    }

    pub fn lead(&self) -> Option<&Combatant> {
        self.player_party.first()
    }

    fn lead_mut(&mut self) -> Option<&mut Combatant> {
        self.player_party.first_mut()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetScreen(Screen),
    NextDialogue,
    ResetDialogue,
    SetHasSeenIntro(bool),
    SetNickname(String),
    SkipImageUpload,
    SetPokemonType(PokemonType),
    SetSpriteImages { front: String, back: String },
    /// Dialogue is over; fill the skill buffer before the map opens.
    StartLoadingSkills,
    SkillsLoaded { buffered: Vec<Skill> },
    StartPreloading,
    PreloadingComplete { buffered: Vec<Skill> },
    /// An encounter was triggered; draw this encounter's moves.
    StartSkillSelection { enemy: Combatant },
    SkillPoolDrawn { moves: Vec<Skill> },
    SkillPoolShort { available: usize },
    SetSelectedSkills(Vec<Skill>),
    StartBattle,
    UpdateBattle(BattleInfo),
    EndBattle(BattleOutcome),
    SetError(String),
}

/// Work the session driver performs on behalf of the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Clear the buffer and load the first two batches.
    InitializeSkills { element: PokemonType },
    /// Take one encounter's worth of moves from the buffer.
    DrawSkillPool,
    /// The buffer ran short: refill it, then draw again.
    RefillForEncounter { element: PokemonType },
    /// Top up the buffer in the background for the next encounter.
    ReplenishSkills { element: PokemonType },
}

/// Result of one reducer step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: GameState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: GameState, effect: Effect) -> Self {
        Self {
            state,
            effects: vec![effect],
        }
    }
}

pub fn reducer(mut state: GameState, action: Action) -> Transition {
    match action {
        Action::SetScreen(screen) => {
            state.screen = screen;
            Transition::to(state)
        }

        Action::NextDialogue => {
            state.dialogue_index += 1;
            Transition::to(state)
        }

        Action::ResetDialogue => {
            state.dialogue_index = 0;
            Transition::to(state)
        }

        Action::SetHasSeenIntro(value) => {
            state.has_seen_intro = value;
            Transition::to(state)
        }

        Action::SetNickname(nickname) => {
            if let Some(lead) = state.lead_mut() {
                lead.name = nickname.clone();
            }
            state.nickname = Some(nickname);
            Transition::to(state)
        }

        Action::SkipImageUpload => {
            state.screen = Screen::Dialogue;
            state.dialogue_index += 1;
            Transition::to(state)
        }

        Action::SetPokemonType(pokemon_type) => {
            if let Some(lead) = state.lead_mut() {
                lead.pokemon_type = pokemon_type;
            }
            state.pokemon_type = Some(pokemon_type);
            Transition::to(state)
        }

        Action::SetSpriteImages { front, back } => {
            state.sprite = Some(SpriteImages { front, back });
            Transition::to(state)
        }

        Action::StartLoadingSkills => {
            state.screen = Screen::Loading;
            state.skills_loaded = false;
            let element = state.element;
            Transition::with(state, Effect::InitializeSkills { element })
        }

        Action::SkillsLoaded { buffered } => {
            state.screen = Screen::Map;
            state.skill_buffer = buffered;
            state.skills_loaded = true;
            Transition::to(state)
        }

        Action::StartPreloading => {
            state.is_preloading = true;
            Transition::to(state)
        }

        Action::PreloadingComplete { buffered } => {
            state.skill_buffer = buffered;
            state.is_preloading = false;
            Transition::to(state)
        }

        Action::StartSkillSelection { enemy } => {
            state.current_enemy = Some(enemy);
            state.fetched_moves = None;
            state.selected_skills = None;
            Transition::with(state, Effect::DrawSkillPool)
        }

        Action::SkillPoolDrawn { moves } => {
            if state.current_enemy.is_none() {
                tracing::warn!("skill pool drawn without an encounter, ignoring");
                return Transition::to(state);
            }
            // Keep the mirror in step with the buffer's front.
            let drawn = moves.len().min(state.skill_buffer.len());
            state.skill_buffer.drain(..drawn);
            state.screen = Screen::SkillSelection;
            state.fetched_moves = Some(moves);
            Transition::to(state)
        }

        Action::SkillPoolShort { available } => {
            tracing::warn!(available, "not enough buffered moves, refilling before the encounter");
            state.screen = Screen::Loading;
            let element = state.element;
            Transition::with(state, Effect::RefillForEncounter { element })
        }

        Action::SetSelectedSkills(skills) => {
            state.selected_skills = Some(skills);
            Transition::to(state)
        }

        Action::StartBattle => {
            let (Some(enemy), Some(draft)) = (&state.current_enemy, &state.selected_skills) else {
                tracing::warn!("battle requested without an enemy or a move draft, ignoring");
                return Transition::to(state);
            };
            if draft.len() != DRAFT_SIZE {
                tracing::warn!(drafted = draft.len(), "battle requested with an incomplete draft, ignoring");
                return Transition::to(state);
            }
            let Some(lead) = state.lead() else {
                tracing::warn!("battle requested with an empty party, ignoring");
                return Transition::to(state);
            };

            let player = lead.clone().with_moves(draft.clone());
            state.battle = Some(ActiveBattle {
                player,
                enemy: enemy.clone(),
                snapshot: None,
            });
            state.screen = Screen::Battle;
            Transition::to(state)
        }

        Action::UpdateBattle(info) => {
            match state.battle.as_mut() {
                Some(battle) => battle.snapshot = Some(info),
                None => tracing::debug!("battle update with no active battle, ignoring"),
            }
            Transition::to(state)
        }

        Action::EndBattle(outcome) => {
            state.screen = Screen::Map;
            state.battle = None;
            state.current_enemy = None;
            state.fetched_moves = None;
            state.selected_skills = None;
            state.last_result = Some(outcome);
            state.is_preloading = true;
            let element = state.element;
            Transition::with(state, Effect::ReplenishSkills { element })
        }

        Action::SetError(message) => {
            state.screen = Screen::Error;
            state.error_message = Some(message);
            Transition::to(state)
        }
    }
}
