use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Pokemon record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pokemon {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub abilities: Vec<String>,
    pub image_url: Option<String>,
    pub created_by: String, // creator's login
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPokemon {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub abilities: Vec<String>,
    pub image_url: Option<String>,
    pub created_by: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PokemonChanges {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub abilities: Option<Vec<String>>,
    pub image_url: Option<String>,
}

/// List filter. `kind` is a case-insensitive substring of the type,
/// `ability` must equal one of the abilities. Both apply when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PokemonFilter {
    pub kind: Option<String>,
    pub ability: Option<String>,
}

impl PokemonFilter {
    pub fn matches(&self, p: &Pokemon) -> bool {
        let kind_ok = self
            .kind
            .as_deref()
            .map_or(true, |k| p.kind.to_lowercase().contains(&k.to_lowercase()));
        let ability_ok = self
            .ability
            .as_deref()
            .map_or(true, |a| p.abilities.iter().any(|x| x == a));
        kind_ok && ability_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct NameCount {
    pub name: String,
    pub count: i64,
}

/// Raw dashboard inputs taken from one snapshot of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSource {
    pub total: i64,
    pub top_types: Vec<NameCount>,
    pub abilities: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: i64,
    pub top_types: Vec<NameCount>,
    pub top_abilities: Vec<NameCount>,
}
