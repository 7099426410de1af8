pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use services::PokemonService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::pokemon_routes())
}
