//! The static type & skill catalog.
//!
//! Catalog data ships inside the binary (`data/catalog.ron`) and is parsed
//! once on first access.
use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::errors::{CatalogError, CatalogResult};
use crate::pokemon::Combatant;
use schema::{PokemonTemplate, PokemonType, Skill};

const CATALOG_RON: &str = include_str!("../data/catalog.ron");

static CATALOG: LazyLock<CatalogResult<Catalog>> = LazyLock::new(|| Catalog::from_ron(CATALOG_RON));

#[derive(Debug, Deserialize)]
struct CatalogFile {
    skills: Vec<Skill>,
    templates: Vec<PokemonTemplate>,
    bosses: Vec<PokemonTemplate>,
}

#[derive(Debug)]
pub struct Catalog {
    skills: HashMap<String, Skill>,
    templates: HashMap<String, PokemonTemplate>,
    /// Player/mock template ids in file order.
    template_order: Vec<String>,
    boss_order: Vec<String>,
}

impl Catalog {
    pub fn from_ron(source: &str) -> CatalogResult<Self> {
        let file: CatalogFile =
            ron::from_str(source).map_err(|e| CatalogError::MalformedData(e.to_string()))?;

        let skills: HashMap<String, Skill> =
            file.skills.into_iter().map(|s| (s.id.clone(), s)).collect();

        let mut templates = HashMap::new();
        let mut template_order = Vec::new();
        let mut boss_order = Vec::new();

        for (template, is_boss) in file
            .templates
            .into_iter()
            .map(|t| (t, false))
            .chain(file.bosses.into_iter().map(|t| (t, true)))
        {
            // Every referenced skill must resolve, otherwise instantiation could fail mid-battle.
            if let Some(missing) = template.skills.iter().find(|id| !skills.contains_key(*id)) {
                return Err(CatalogError::MalformedData(format!(
                    "template {} references unknown skill {}",
                    template.id, missing
                )));
            }
            if is_boss {
                boss_order.push(template.id.clone());
            } else {
                template_order.push(template.id.clone());
            }
            templates.insert(template.id.clone(), template);
        }

        Ok(Self {
            skills,
            templates,
            template_order,
            boss_order,
        })
    }

    pub fn get_template(&self, pokemon_id: &str) -> CatalogResult<&PokemonTemplate> {
        self.templates
            .get(pokemon_id)
            .ok_or_else(|| CatalogError::TemplateNotFound(pokemon_id.to_string()))
    }

    pub fn get_move(&self, move_id: &str) -> CatalogResult<&Skill> {
        self.skills
            .get(move_id)
            .ok_or_else(|| CatalogError::MoveNotFound(move_id.to_string()))
    }

    /// Ids of the regular (non-boss) templates, in catalog order.
    pub fn template_ids(&self) -> &[String] {
        &self.template_order
    }

    pub fn boss_ids(&self) -> &[String] {
        &self.boss_order
    }

    /// Create a fresh combatant from a template. Current HP starts at max.
    pub fn instantiate(&self, pokemon_id: &str, level: Option<u8>) -> CatalogResult<Combatant> {
        let template = self.get_template(pokemon_id)?;
        let moves = template
            .skills
            .iter()
            .map(|id| self.get_move(id).cloned())
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok(Combatant::from_template(template, level, moves))
    }
}

/// Access the embedded catalog.
pub fn catalog() -> CatalogResult<&'static Catalog> {
    CATALOG.as_ref().map_err(Clone::clone)
}

pub fn get_template(pokemon_id: &str) -> CatalogResult<PokemonTemplate> {
    catalog()?.get_template(pokemon_id).cloned()
}

pub fn get_move(move_id: &str) -> CatalogResult<Skill> {
    catalog()?.get_move(move_id).cloned()
}

pub fn instantiate(pokemon_id: &str, level: Option<u8>) -> CatalogResult<Combatant> {
    catalog()?.instantiate(pokemon_id, level)
}

/// Total over the closed type set.
pub fn effectiveness(attack_type: PokemonType, defense_type: PokemonType) -> f64 {
    PokemonType::type_effectiveness(attack_type, defense_type)
}
