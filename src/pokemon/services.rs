use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::FromRef;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    pokemon::{
        dto::{CreatePokemonRequest, UpdatePokemonRequest},
        repo::PokemonRepo,
        repo_types::{DashboardStats, NameCount, NewPokemon, Pokemon, PokemonChanges, PokemonFilter},
    },
    state::AppState,
    store::StoreError,
    users::repo::UserRepo,
};

/// Length of the dashboard top lists.
pub const DASHBOARD_TOP_N: usize = 3;

#[derive(Clone)]
pub struct PokemonService {
    pokemon: Arc<dyn PokemonRepo>,
    users: Arc<dyn UserRepo>,
}

impl PokemonService {
    pub fn new(pokemon: Arc<dyn PokemonRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { pokemon, users }
    }

    pub async fn find_all(&self, filter: PokemonFilter) -> ServiceResult<Vec<Pokemon>> {
        Ok(self.pokemon.list(&filter).await?)
    }

    pub async fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        let source = self.pokemon.dashboard(DASHBOARD_TOP_N as i64).await?;
        Ok(DashboardStats {
            total: source.total,
            top_types: source.top_types,
            top_abilities: rank_abilities(&source.abilities, DASHBOARD_TOP_N),
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> ServiceResult<Pokemon> {
        self.pokemon
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::PokemonNotFound)
    }

    /// Requires an unused name and an existing creator login.
    pub async fn create(&self, input: CreatePokemonRequest) -> ServiceResult<Pokemon> {
        if self.pokemon.find_by_name(&input.name).await?.is_some() {
            return Err(ServiceError::PokemonAlreadyExists);
        }

        let creator = self
            .users
            .find_by_login(&input.created_by)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let pokemon = self
            .pokemon
            .insert(NewPokemon {
                id: Uuid::new_v4(),
                name: input.name,
                kind: input.kind,
                abilities: input.abilities,
                image_url: input.image_url,
                created_by: creator.login,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => ServiceError::PokemonAlreadyExists,
                StoreError::ForeignKeyViolation => ServiceError::UserNotFound,
                other => other.into(),
            })?;

        info!(pokemon_id = %pokemon.id, name = %pokemon.name, created_by = %pokemon.created_by, "pokemon created");
        Ok(pokemon)
    }

    pub async fn update(&self, id: Uuid, input: UpdatePokemonRequest) -> ServiceResult<Pokemon> {
        if self.pokemon.find_by_id(id).await?.is_none() {
            return Err(ServiceError::PokemonNotFound);
        }

        if let Some(name) = input.name.as_deref() {
            if let Some(holder) = self.pokemon.find_by_name(name).await? {
                if holder.id != id {
                    return Err(ServiceError::PokemonNameAlreadyExists);
                }
            }
        }

        let changes = PokemonChanges {
            name: input.name,
            kind: input.kind,
            abilities: input.abilities,
            image_url: input.image_url,
        };
        let pokemon = self
            .pokemon
            .update(id, changes)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => ServiceError::PokemonNameAlreadyExists,
                other => other.into(),
            })?
            .ok_or(ServiceError::PokemonNotFound)?;

        info!(pokemon_id = %pokemon.id, "pokemon updated");
        Ok(pokemon)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        if self.pokemon.find_by_id(id).await?.is_none() {
            return Err(ServiceError::PokemonNotFound);
        }
        if !self.pokemon.delete(id).await? {
            return Err(ServiceError::PokemonNotFound);
        }
        info!(pokemon_id = %id, "pokemon deleted");
        Ok(())
    }
}

/// Counts trimmed ability names over all records and keeps the `limit`
/// most frequent. Equal counts are ordered by name.
pub fn rank_abilities(records: &[Vec<String>], limit: usize) -> Vec<NameCount> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for ability in records.iter().flatten() {
        let ability = ability.trim();
        if ability.is_empty() {
            continue;
        }
        *counts.entry(ability).or_default() += 1;
    }

    let mut ranked: Vec<NameCount> = counts
        .into_iter()
        .map(|(name, count)| NameCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

impl FromRef<AppState> for PokemonService {
    fn from_ref(state: &AppState) -> Self {
        state.pokemon.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::repo_types::DashboardSource;
    use crate::store::{MemoryStore, StoreResult};
    use crate::users::repo_types::{NewUser, User, UserChanges};
    use async_trait::async_trait;
    use time::OffsetDateTime;

    async fn setup() -> (PokemonService, MemoryStore) {
        let store = MemoryStore::new();
        for login in ["user1", "user2"] {
            UserRepo::insert(
                &store,
                NewUser {
                    id: Uuid::new_v4(),
                    login: login.into(),
                    password_hash: "unused".into(),
                },
            )
            .await
            .unwrap();
        }
        let shared = Arc::new(store.clone());
        (PokemonService::new(shared.clone(), shared), store)
    }

    fn body(name: &str, kind: &str, abilities: &[&str], created_by: &str) -> CreatePokemonRequest {
        CreatePokemonRequest {
            name: name.into(),
            kind: kind.into(),
            abilities: abilities.iter().map(|s| s.to_string()).collect(),
            created_by: created_by.into(),
            image_url: None,
        }
    }

    fn pikachu() -> CreatePokemonRequest {
        body("Pikachu", "Electric", &["Thunder Shock", "Quick Attack"], "user1")
    }

    #[tokio::test]
    async fn create_assigns_id_and_creator() {
        let (svc, _) = setup().await;
        let p = svc.create(pikachu()).await.unwrap();
        assert_eq!(p.name, "Pikachu");
        assert_eq!(p.created_by, "user1");
        assert_eq!(svc.find_by_id(p.id).await.unwrap(), p);
    }

    #[tokio::test]
    async fn case_variant_name_is_already_taken() {
        let (svc, _) = setup().await;
        svc.create(pikachu()).await.unwrap();

        let err = svc
            .create(body("pikachu", "Electric", &["Static"], "user2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PokemonAlreadyExists));
    }

    #[tokio::test]
    async fn unknown_creator_is_rejected_and_nothing_persisted() {
        let (svc, _) = setup().await;
        let err = svc
            .create(body("Eevee", "Normal", &["Run Away"], "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound));
        assert!(svc.find_all(PokemonFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn creator_login_is_stored_canonically() {
        let (svc, _) = setup().await;
        let p = svc
            .create(body("Eevee", "Normal", &["Run Away"], "USER2"))
            .await
            .unwrap();
        assert_eq!(p.created_by, "user2");
    }

    #[tokio::test]
    async fn rename_to_other_records_name_fails() {
        let (svc, _) = setup().await;
        svc.create(pikachu()).await.unwrap();
        let raichu = svc
            .create(body("Raichu", "Electric", &["Static"], "user1"))
            .await
            .unwrap();

        let err = svc
            .update(
                raichu.id,
                UpdatePokemonRequest {
                    name: Some("PIKACHU".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PokemonNameAlreadyExists));
    }

    #[tokio::test]
    async fn rename_to_own_name_succeeds() {
        let (svc, _) = setup().await;
        let p = svc.create(pikachu()).await.unwrap();

        let updated = svc
            .update(
                p.id,
                UpdatePokemonRequest {
                    name: Some("Pikachu".into()),
                    abilities: Some(vec!["Static".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Pikachu");
        assert_eq!(updated.abilities, vec!["Static"]);
        assert_eq!(updated.kind, "Electric");
    }

    #[tokio::test]
    async fn update_of_unknown_pokemon_fails() {
        let (svc, _) = setup().await;
        let err = svc
            .update(
                Uuid::new_v4(),
                UpdatePokemonRequest {
                    kind: Some("Fire".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PokemonNotFound));
    }

    #[tokio::test]
    async fn delete_then_lookup_fails() {
        let (svc, _) = setup().await;
        let p = svc.create(pikachu()).await.unwrap();
        svc.delete(p.id).await.unwrap();

        assert!(matches!(
            svc.find_by_id(p.id).await.unwrap_err(),
            ServiceError::PokemonNotFound
        ));
        assert!(matches!(
            svc.delete(p.id).await.unwrap_err(),
            ServiceError::PokemonNotFound
        ));
    }

    #[tokio::test]
    async fn filters_compose() {
        let (svc, _) = setup().await;
        svc.create(pikachu()).await.unwrap();
        svc.create(body("Raichu", "Electric", &["Static"], "user1"))
            .await
            .unwrap();
        svc.create(body("Charmander", "Fire", &["Blaze"], "user2"))
            .await
            .unwrap();

        let names = |v: Vec<Pokemon>| v.into_iter().map(|p| p.name).collect::<Vec<_>>();

        let by_type = svc
            .find_all(PokemonFilter {
                kind: Some("elec".into()),
                ability: None,
            })
            .await
            .unwrap();
        assert_eq!(names(by_type), vec!["Pikachu", "Raichu"]);

        let by_both = svc
            .find_all(PokemonFilter {
                kind: Some("ELECTRIC".into()),
                ability: Some("Static".into()),
            })
            .await
            .unwrap();
        assert_eq!(names(by_both), vec!["Raichu"]);

        // ability match is exact
        let partial = svc
            .find_all(PokemonFilter {
                kind: None,
                ability: Some("static".into()),
            })
            .await
            .unwrap();
        assert!(partial.is_empty());
    }

    #[tokio::test]
    async fn dashboard_on_empty_store() {
        let (svc, _) = setup().await;
        let stats = svc.dashboard_stats().await.unwrap();
        assert_eq!(stats.total, 0);
        assert!(stats.top_types.is_empty());
        assert!(stats.top_abilities.is_empty());
    }

    #[tokio::test]
    async fn dashboard_counts_types_and_abilities() {
        let (svc, _) = setup().await;
        svc.create(pikachu()).await.unwrap();
        svc.create(body("Raichu", "Electric", &["Static", " Quick Attack "], "user1"))
            .await
            .unwrap();
        svc.create(body("Charmander", "Fire", &["Blaze"], "user2"))
            .await
            .unwrap();
        svc.create(body("Squirtle", "Water", &["Torrent"], "user2"))
            .await
            .unwrap();
        svc.create(body("Bulbasaur", "Grass", &["Overgrow"], "user2"))
            .await
            .unwrap();

        let stats = svc.dashboard_stats().await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(
            stats.top_types,
            vec![
                NameCount { name: "Electric".into(), count: 2 },
                NameCount { name: "Fire".into(), count: 1 },
                NameCount { name: "Grass".into(), count: 1 },
            ]
        );
        assert_eq!(stats.top_abilities[0], NameCount { name: "Quick Attack".into(), count: 2 });
        assert_eq!(stats.top_abilities.len(), 3);
    }

    #[test]
    fn rank_abilities_ties_are_deterministic() {
        let records = vec![
            vec!["Static".to_string(), "Blaze".to_string()],
            vec!["Torrent".to_string(), "Blaze".to_string()],
            vec!["Overgrow".to_string(), "  ".to_string()],
        ];
        let first = rank_abilities(&records, 3);
        let second = rank_abilities(&records, 3);
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                NameCount { name: "Blaze".into(), count: 2 },
                NameCount { name: "Overgrow".into(), count: 1 },
                NameCount { name: "Static".into(), count: 1 },
            ]
        );
    }

    /// Reports every name as free so the insert or update hits the unique index.
    struct StaleNames(MemoryStore);

    #[async_trait]
    impl PokemonRepo for StaleNames {
        async fn list(&self, filter: &PokemonFilter) -> StoreResult<Vec<Pokemon>> {
            PokemonRepo::list(&self.0, filter).await
        }
        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Pokemon>> {
            PokemonRepo::find_by_id(&self.0, id).await
        }
        async fn find_by_name(&self, _name: &str) -> StoreResult<Option<Pokemon>> {
            Ok(None)
        }
        async fn insert(&self, pokemon: NewPokemon) -> StoreResult<Pokemon> {
            PokemonRepo::insert(&self.0, pokemon).await
        }
        async fn update(&self, id: Uuid, changes: PokemonChanges) -> StoreResult<Option<Pokemon>> {
            PokemonRepo::update(&self.0, id, changes).await
        }
        async fn delete(&self, id: Uuid) -> StoreResult<bool> {
            PokemonRepo::delete(&self.0, id).await
        }
        async fn dashboard(&self, type_limit: i64) -> StoreResult<DashboardSource> {
            PokemonRepo::dashboard(&self.0, type_limit).await
        }
    }

    /// Resolves any login, as if the creator was deleted right after the lookup.
    struct VanishingCreator(MemoryStore);

    #[async_trait]
    impl UserRepo for VanishingCreator {
        async fn list(&self) -> StoreResult<Vec<User>> {
            UserRepo::list(&self.0).await
        }
        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
            UserRepo::find_by_id(&self.0, id).await
        }
        async fn find_by_login(&self, login: &str) -> StoreResult<Option<User>> {
            Ok(Some(User {
                id: Uuid::new_v4(),
                login: login.to_string(),
                password_hash: "unused".into(),
                created_at: OffsetDateTime::now_utc(),
            }))
        }
        async fn insert(&self, user: NewUser) -> StoreResult<User> {
            UserRepo::insert(&self.0, user).await
        }
        async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
            UserRepo::update(&self.0, id, changes).await
        }
        async fn delete(&self, id: Uuid) -> StoreResult<bool> {
            UserRepo::delete(&self.0, id).await
        }
    }

    #[tokio::test]
    async fn late_unique_violation_maps_to_named_failures() {
        let (_, store) = setup().await;
        let svc = PokemonService::new(
            Arc::new(StaleNames(store.clone())),
            Arc::new(store.clone()),
        );
        svc.create(pikachu()).await.unwrap();
        let raichu = svc
            .create(body("Raichu", "Electric", &["Static"], "user1"))
            .await
            .unwrap();

        let err = svc
            .create(body("PIKACHU", "Electric", &["Static"], "user2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PokemonAlreadyExists));

        let err = svc
            .update(
                raichu.id,
                UpdatePokemonRequest {
                    name: Some("pikachu".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PokemonNameAlreadyExists));
        assert_eq!(svc.find_by_id(raichu.id).await.unwrap().name, "Raichu");
    }

    #[tokio::test]
    async fn late_missing_creator_maps_to_user_not_found() {
        let (_, store) = setup().await;
        let svc = PokemonService::new(
            Arc::new(store.clone()),
            Arc::new(VanishingCreator(store.clone())),
        );

        let err = svc
            .create(body("Eevee", "Normal", &["Run Away"], "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound));
        assert!(svc.find_all(PokemonFilter::default()).await.unwrap().is_empty());
    }
}
