//! REST backend for users and pokemon records with login-based auth.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod pokemon;
pub mod state;
pub mod store;
pub mod users;
pub mod validation;

/// Installs the global tracing subscriber. `LOG_FORMAT=json` switches to
/// JSON lines; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "pokedex=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
