//! Creates the default users and a starter pokemon. Safe to run repeatedly.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use pokedex::{
    config::AppConfig,
    db,
    error::ServiceError,
    pokemon::dto::CreatePokemonRequest,
    state::AppState,
    users::dto::CreateUserRequest,
};

const DEFAULT_LOGINS: [&str; 3] = ["user1", "user2", "user3"];
const DEFAULT_PASSWORD: &str = "123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pokedex::init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;
    let state = AppState::postgres(config, pool);

    for login in DEFAULT_LOGINS {
        let input = CreateUserRequest {
            login: login.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        };
        match state.users.create(input).await {
            Ok(user) => info!(user_id = %user.id, login, "user created"),
            Err(ServiceError::UserAlreadyExists) => info!(login, "user already present"),
            Err(e) => return Err(e).with_context(|| format!("seed user {login}")),
        }
    }

    let pikachu = CreatePokemonRequest {
        name: "Pikachu".into(),
        kind: "Electric".into(),
        abilities: vec!["Thunder Shock".into(), "Quick Attack".into()],
        created_by: "user1".into(),
        image_url: None,
    };
    match state.pokemon.create(pikachu).await {
        Ok(p) => info!(pokemon_id = %p.id, name = %p.name, "pokemon created"),
        Err(ServiceError::PokemonAlreadyExists) => info!("Pikachu already present"),
        Err(e) => return Err(e).context("seed Pikachu"),
    }

    info!("seed complete");
    Ok(())
}
