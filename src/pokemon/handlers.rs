use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::{AppError, ServiceError},
    pokemon::{
        dto::{
            CreatePokemonRequest, DashboardResponse, PokemonListResponse, PokemonQuery,
            PokemonResponse, UpdatePokemonRequest,
        },
        services::PokemonService,
    },
    state::AppState,
    users::dto::MessageResponse,
    validation::{IdPath, ValidJson, ValidQuery},
};

pub fn pokemon_routes() -> Router<AppState> {
    Router::new()
        .route("/pokemon", get(list_pokemon).post(create_pokemon))
        .route("/pokemon/dashboard", get(dashboard))
        .route(
            "/pokemon/:id",
            get(get_pokemon).put(update_pokemon).delete(delete_pokemon),
        )
}

#[instrument(skip(pokemon))]
pub async fn list_pokemon(
    State(pokemon): State<PokemonService>,
    ValidQuery(query): ValidQuery<PokemonQuery>,
) -> Result<Json<PokemonListResponse>, AppError> {
    let list = pokemon
        .find_all(query.into())
        .await
        .map_err(AppError::internal)?;
    Ok(Json(PokemonListResponse {
        success: true,
        pokemon: list,
    }))
}

#[instrument(skip(pokemon))]
pub async fn dashboard(
    State(pokemon): State<PokemonService>,
) -> Result<Json<DashboardResponse>, AppError> {
    let stats = pokemon.dashboard_stats().await.map_err(AppError::internal)?;
    Ok(Json(DashboardResponse {
        success: true,
        stats,
    }))
}

#[instrument(skip(pokemon))]
pub async fn get_pokemon(
    State(pokemon): State<PokemonService>,
    IdPath(id): IdPath,
) -> Result<Json<PokemonResponse>, AppError> {
    let found = pokemon.find_by_id(id).await.map_err(|e| match e {
        ServiceError::PokemonNotFound => AppError::NotFound("Pokemon not found."),
        other => AppError::internal(other),
    })?;
    Ok(Json(PokemonResponse {
        success: true,
        message: None,
        pokemon: found,
    }))
}

#[instrument(skip(pokemon, payload))]
pub async fn create_pokemon(
    State(pokemon): State<PokemonService>,
    ValidJson(payload): ValidJson<CreatePokemonRequest>,
) -> Result<Json<PokemonResponse>, AppError> {
    let created = pokemon.create(payload).await.map_err(|e| match e {
        ServiceError::UserNotFound => AppError::NotFound("Creator user not found."),
        ServiceError::PokemonAlreadyExists => AppError::Conflict("Pokemon name must be unique."),
        other => AppError::internal(other),
    })?;
    Ok(Json(PokemonResponse {
        success: true,
        message: Some("Pokemon successfully registered."),
        pokemon: created,
    }))
}

#[instrument(skip(pokemon, payload))]
pub async fn update_pokemon(
    State(pokemon): State<PokemonService>,
    IdPath(id): IdPath,
    ValidJson(payload): ValidJson<UpdatePokemonRequest>,
) -> Result<Json<PokemonResponse>, AppError> {
    let updated = pokemon.update(id, payload).await.map_err(|e| match e {
        ServiceError::PokemonNotFound => AppError::NotFound("Pokemon not found."),
        ServiceError::PokemonNameAlreadyExists => {
            AppError::Conflict("Pokemon name already in use.")
        }
        other => AppError::internal(other),
    })?;
    Ok(Json(PokemonResponse {
        success: true,
        message: Some("Pokemon successfully updated."),
        pokemon: updated,
    }))
}

#[instrument(skip(pokemon))]
pub async fn delete_pokemon(
    State(pokemon): State<PokemonService>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    pokemon.delete(id).await.map_err(|e| match e {
        ServiceError::PokemonNotFound => AppError::NotFound("Pokemon not found."),
        other => AppError::internal(other),
    })?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Pokemon successfully deleted.",
    }))
}
