use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    pokemon::repo_types::{DashboardStats, Pokemon, PokemonFilter},
    validation::{not_blank, validate_image_url},
};

/// `GET /pokemon?type=..&ability=..`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PokemonQuery {
    #[serde(rename = "type")]
    #[validate(length(max = 100, message = "type filter is too long"))]
    pub kind: Option<String>,
    #[validate(length(max = 100, message = "ability filter is too long"))]
    pub ability: Option<String>,
}

impl From<PokemonQuery> for PokemonFilter {
    fn from(q: PokemonQuery) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        PokemonFilter {
            kind: present(q.kind),
            ability: present(q.ability),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePokemonRequest {
    #[validate(
        length(min = 1, message = "name is required"),
        custom(function = "not_blank")
    )]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(
        length(min = 1, message = "type is required"),
        custom(function = "not_blank")
    )]
    pub kind: String,
    #[validate(length(min = 1, max = 3, message = "abilities must have between 1 and 3 entries"))]
    pub abilities: Vec<String>,
    #[validate(
        length(min = 1, message = "createdBy is required"),
        custom(function = "not_blank")
    )]
    pub created_by: String,
    #[validate(custom(function = "validate_image_url"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "require_pokemon_changes"))]
pub struct UpdatePokemonRequest {
    #[validate(
        length(min = 1, message = "name must not be empty"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(
        length(min = 1, message = "type must not be empty"),
        custom(function = "not_blank")
    )]
    pub kind: Option<String>,
    #[validate(length(min = 1, max = 3, message = "abilities must have between 1 and 3 entries"))]
    pub abilities: Option<Vec<String>>,
    #[validate(custom(function = "validate_image_url"))]
    pub image_url: Option<String>,
}

fn require_pokemon_changes(req: &UpdatePokemonRequest) -> Result<(), ValidationError> {
    if req.name.is_none() && req.kind.is_none() && req.abilities.is_none() && req.image_url.is_none() {
        let mut err = ValidationError::new("no_fields");
        err.message = Some("at least one field must be provided".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PokemonListResponse {
    pub success: bool,
    pub pokemon: Vec<Pokemon>,
}

#[derive(Debug, Serialize)]
pub struct PokemonResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub pokemon: Pokemon,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
}
