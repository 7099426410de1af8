use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::pokemon::repo::PokemonRepo;
use crate::pokemon::repo_types::{
    DashboardSource, NameCount, NewPokemon, Pokemon, PokemonChanges, PokemonFilter,
};
use crate::users::repo::UserRepo;
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    pokemon: Vec<Pokemon>,
}

/// In-process stand-in for the Postgres schema.
///
/// Enforces the same constraints as the migrations: case-insensitive unique
/// logins and names, `created_by` must name an existing login, logins are
/// cascaded on rename and a referenced user cannot be deleted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_key(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.lock().await.users.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| same_key(&u.login, login)).cloned())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.lock().await;
        if t
            .users
            .iter()
            .any(|u| u.id == user.id || same_key(&u.login, &user.login))
        {
            return Err(StoreError::UniqueViolation);
        }
        let row = User {
            id: user.id,
            login: user.login,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut t = self.tables.lock().await;
        let Some(idx) = t.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(login) = changes.login.as_deref() {
            if t
                .users
                .iter()
                .any(|u| u.id != id && same_key(&u.login, login))
            {
                return Err(StoreError::UniqueViolation);
            }
            let old = t.users[idx].login.clone();
            for p in t.pokemon.iter_mut().filter(|p| p.created_by == old) {
                p.created_by = login.to_string();
            }
        }

        let user = &mut t.users[idx];
        if let Some(login) = changes.login {
            user.login = login;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let Some(idx) = t.users.iter().position(|u| u.id == id) else {
            return Ok(false);
        };
        let login = &t.users[idx].login;
        if t.pokemon.iter().any(|p| &p.created_by == login) {
            return Err(StoreError::ForeignKeyViolation);
        }
        t.users.remove(idx);
        Ok(true)
    }
}

#[async_trait]
impl PokemonRepo for MemoryStore {
    async fn list(&self, filter: &PokemonFilter) -> StoreResult<Vec<Pokemon>> {
        let t = self.tables.lock().await;
        Ok(t.pokemon.iter().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Pokemon>> {
        let t = self.tables.lock().await;
        Ok(t.pokemon.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Pokemon>> {
        let t = self.tables.lock().await;
        Ok(t.pokemon.iter().find(|p| same_key(&p.name, name)).cloned())
    }

    async fn insert(&self, p: NewPokemon) -> StoreResult<Pokemon> {
        let mut t = self.tables.lock().await;
        if t
            .pokemon
            .iter()
            .any(|x| x.id == p.id || same_key(&x.name, &p.name))
        {
            return Err(StoreError::UniqueViolation);
        }
        if !t.users.iter().any(|u| u.login == p.created_by) {
            return Err(StoreError::ForeignKeyViolation);
        }
        let row = Pokemon {
            id: p.id,
            name: p.name,
            kind: p.kind,
            abilities: p.abilities,
            image_url: p.image_url,
            created_by: p.created_by,
            created_at: OffsetDateTime::now_utc(),
        };
        t.pokemon.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: PokemonChanges) -> StoreResult<Option<Pokemon>> {
        let mut t = self.tables.lock().await;
        let Some(idx) = t.pokemon.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name.as_deref() {
            if t
                .pokemon
                .iter()
                .any(|p| p.id != id && same_key(&p.name, name))
            {
                return Err(StoreError::UniqueViolation);
            }
        }

        let p = &mut t.pokemon[idx];
        if let Some(name) = changes.name {
            p.name = name;
        }
        if let Some(kind) = changes.kind {
            p.kind = kind;
        }
        if let Some(abilities) = changes.abilities {
            p.abilities = abilities;
        }
        if let Some(url) = changes.image_url {
            p.image_url = Some(url);
        }
        Ok(Some(p.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.pokemon.len();
        t.pokemon.retain(|p| p.id != id);
        Ok(t.pokemon.len() < before)
    }

    async fn dashboard(&self, type_limit: i64) -> StoreResult<DashboardSource> {
        let t = self.tables.lock().await;
        let mut counts: std::collections::BTreeMap<&str, i64> = Default::default();
        for p in &t.pokemon {
            *counts.entry(p.kind.as_str()).or_default() += 1;
        }
        let mut top_types: Vec<NameCount> = counts
            .into_iter()
            .map(|(name, count)| NameCount {
                name: name.to_string(),
                count,
            })
            .collect();
        // BTreeMap yields names ascending; the stable sort keeps that order within a count.
        top_types.sort_by(|a, b| b.count.cmp(&a.count));
        top_types.truncate(type_limit.max(0) as usize);

        Ok(DashboardSource {
            total: t.pokemon.len() as i64,
            top_types,
            abilities: t.pokemon.iter().map(|p| p.abilities.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(login: &str) -> NewUser {
        NewUser {
            id: Uuid::new_v4(),
            login: login.into(),
            password_hash: "hash".into(),
        }
    }

    fn new_pokemon(name: &str, kind: &str, created_by: &str) -> NewPokemon {
        NewPokemon {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: kind.into(),
            abilities: vec!["Tackle".into()],
            image_url: None,
            created_by: created_by.into(),
        }
    }

    #[tokio::test]
    async fn duplicate_login_is_a_unique_violation() {
        let store = MemoryStore::new();
        UserRepo::insert(&store, new_user("ash")).await.unwrap();
        let err = UserRepo::insert(&store, new_user("ASH")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
        assert_eq!(UserRepo::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pokemon_requires_existing_creator() {
        let store = MemoryStore::new();
        let err = PokemonRepo::insert(&store, new_pokemon("Eevee", "Normal", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation));
        assert_eq!(PokemonRepo::dashboard(&store, 3).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn referenced_user_cannot_be_deleted() {
        let store = MemoryStore::new();
        let user = UserRepo::insert(&store, new_user("misty")).await.unwrap();
        PokemonRepo::insert(&store, new_pokemon("Staryu", "Water", "misty"))
            .await
            .unwrap();

        let err = UserRepo::delete(&store, user.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation));
        assert!(UserRepo::find_by_id(&store, user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn login_rename_cascades_to_pokemon() {
        let store = MemoryStore::new();
        let user = UserRepo::insert(&store, new_user("brock")).await.unwrap();
        let onix = PokemonRepo::insert(&store, new_pokemon("Onix", "Rock", "brock"))
            .await
            .unwrap();

        let changes = UserChanges {
            login: Some("brock2".into()),
            password_hash: None,
        };
        UserRepo::update(&store, user.id, changes).await.unwrap();

        let onix = PokemonRepo::find_by_id(&store, onix.id).await.unwrap().unwrap();
        assert_eq!(onix.created_by, "brock2");
    }

    #[tokio::test]
    async fn dashboard_ranks_types_by_count_then_name() {
        let store = MemoryStore::new();
        UserRepo::insert(&store, new_user("oak")).await.unwrap();
        for (name, kind) in [("A", "Water"), ("B", "Fire"), ("C", "Grass"), ("D", "Water")] {
            PokemonRepo::insert(&store, new_pokemon(name, kind, "oak"))
                .await
                .unwrap();
        }
        let source = PokemonRepo::dashboard(&store, 2).await.unwrap();
        assert_eq!(source.total, 4);
        assert_eq!(source.abilities.len(), 4);
        assert_eq!(
            source.top_types,
            vec![
                NameCount { name: "Water".into(), count: 2 },
                NameCount { name: "Fire".into(), count: 1 },
            ]
        );
    }
}
