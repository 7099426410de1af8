use std::sync::Arc;

use pokedex::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pokedex::init_tracing();

    let config = Arc::new(AppConfig::from_env()?);

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let state = AppState::postgres(config.clone(), pool);
    app::serve(app::build_app(state), &config).await
}
