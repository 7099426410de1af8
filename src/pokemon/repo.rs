use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::pokemon::repo_types::{
    DashboardSource, NameCount, NewPokemon, Pokemon, PokemonChanges, PokemonFilter,
};
use crate::store::StoreResult;

/// Persistence port for pokemon. Name lookups are case-insensitive.
#[async_trait]
pub trait PokemonRepo: Send + Sync {
    async fn list(&self, filter: &PokemonFilter) -> StoreResult<Vec<Pokemon>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Pokemon>>;
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Pokemon>>;
    async fn insert(&self, pokemon: NewPokemon) -> StoreResult<Pokemon>;
    /// `Ok(None)` when no row has this id.
    async fn update(&self, id: Uuid, changes: PokemonChanges) -> StoreResult<Option<Pokemon>>;
    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    /// Count, top types and every record's abilities, read from one
    /// consistent snapshot. Types are ordered count desc then name asc.
    async fn dashboard(&self, type_limit: i64) -> StoreResult<DashboardSource>;
}

#[derive(Clone)]
pub struct PgPokemonRepo {
    db: PgPool,
}

impl PgPokemonRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PokemonRepo for PgPokemonRepo {
    async fn list(&self, filter: &PokemonFilter) -> StoreResult<Vec<Pokemon>> {
        let rows = sqlx::query_as::<_, Pokemon>(
            r#"
            SELECT id, name, type, abilities, image_url, created_by, created_at
            FROM pokemon
            WHERE ($1::TEXT IS NULL OR POSITION(LOWER($1) IN LOWER(type)) > 0)
              AND ($2::TEXT IS NULL OR $2 = ANY(abilities))
            ORDER BY created_at ASC, name ASC
            "#,
        )
        .bind(filter.kind.as_deref())
        .bind(filter.ability.as_deref())
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Pokemon>> {
        let row = sqlx::query_as::<_, Pokemon>(
            r#"
            SELECT id, name, type, abilities, image_url, created_by, created_at
            FROM pokemon
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Pokemon>> {
        let row = sqlx::query_as::<_, Pokemon>(
            r#"
            SELECT id, name, type, abilities, image_url, created_by, created_at
            FROM pokemon
            WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert(&self, p: NewPokemon) -> StoreResult<Pokemon> {
        let row = sqlx::query_as::<_, Pokemon>(
            r#"
            INSERT INTO pokemon (id, name, type, abilities, image_url, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, type, abilities, image_url, created_by, created_at
            "#,
        )
        .bind(p.id)
        .bind(&p.name)
        .bind(&p.kind)
        .bind(&p.abilities)
        .bind(p.image_url.as_deref())
        .bind(&p.created_by)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: PokemonChanges) -> StoreResult<Option<Pokemon>> {
        let row = sqlx::query_as::<_, Pokemon>(
            r#"
            UPDATE pokemon
               SET name = COALESCE($2, name),
                   type = COALESCE($3, type),
                   abilities = COALESCE($4, abilities),
                   image_url = COALESCE($5, image_url)
             WHERE id = $1
            RETURNING id, name, type, abilities, image_url, created_by, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.kind)
        .bind(changes.abilities)
        .bind(changes.image_url)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM pokemon WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn dashboard(&self, type_limit: i64) -> StoreResult<DashboardSource> {
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let (total,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM pokemon")
            .fetch_one(&mut *tx)
            .await?;

        let top_types = sqlx::query_as::<_, NameCount>(
            r#"
            SELECT type AS name, COUNT(*) AS count
            FROM pokemon
            GROUP BY type
            ORDER BY count DESC, name ASC
            LIMIT $1
            "#,
        )
        .bind(type_limit)
        .fetch_all(&mut *tx)
        .await?;

        let abilities = sqlx::query_as::<_, (Vec<String>,)>("SELECT abilities FROM pokemon")
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(DashboardSource {
            total,
            top_types,
            abilities: abilities.into_iter().map(|(a,)| a).collect(),
        })
    }
}
