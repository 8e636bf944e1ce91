//! In-memory identity directory
//!
//! Users and roles are append-only for the life of the process. Users refer
//! to roles by id; role names are resolved when a token is minted or a user
//! listing is rendered.

use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use super::password::SecretHasher;
use super::roles::{ADMIN, BOOTSTRAP_ROLES, RESEARCHER, TEACHER};
use super::TokenInput;
use crate::types::ServiceError;

/// Accounts created when demo data is seeded: (username, secret, role)
pub const BOOTSTRAP_USERS: [(&str, &str, &str); 3] = [
    ("enseignant", "enseignant123", TEACHER),
    ("chercheur", "chercheur123", RESEARCHER),
    ("admin", "admin123", ADMIN),
];

#[derive(Debug, Clone)]
struct Role {
    id: u64,
    name: String,
}

#[derive(Debug, Clone)]
struct User {
    id: u64,
    username: String,
    password_hash: String,
    role_ids: Vec<u64>,
}

/// Public view of a user; never carries the hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Default)]
struct Directory {
    roles: Vec<Role>,
    users: Vec<User>,
    next_user_id: u64,
}

impl Directory {
    fn role_names(&self, role_ids: &[u64]) -> Vec<String> {
        role_ids
            .iter()
            .filter_map(|id| self.roles.iter().find(|r| r.id == *id))
            .map(|r| r.name.clone())
            .collect()
    }

    fn role_ids(&self, names: &[&str]) -> Result<Vec<u64>, ServiceError> {
        names
            .iter()
            .map(|name| {
                self.roles
                    .iter()
                    .find(|r| r.name == *name)
                    .map(|r| r.id)
                    .ok_or_else(|| ServiceError::BadRequest(format!("Unknown role '{}'", name)))
            })
            .collect()
    }

    fn find(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    fn summary(&self, user: &User) -> UserSummary {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            roles: self.role_names(&user.role_ids),
        }
    }
}

/// Users, roles and credential verification
pub struct IdentityStore {
    directory: RwLock<Directory>,
    hasher: SecretHasher,
}

impl IdentityStore {
    /// Empty directory holding only the fixed roles
    pub fn new() -> Result<Self, ServiceError> {
        let roles = BOOTSTRAP_ROLES
            .iter()
            .zip(1u64..)
            .map(|(name, id)| Role {
                id,
                name: name.to_string(),
            })
            .collect();

        Ok(Self {
            directory: RwLock::new(Directory {
                roles,
                users: Vec::new(),
                next_user_id: 1,
            }),
            hasher: SecretHasher::new()?,
        })
    }

    /// Directory with the three bootstrap accounts
    pub fn with_bootstrap_users() -> Result<Self, ServiceError> {
        let store = Self::new()?;
        for (username, secret, role) in BOOTSTRAP_USERS {
            store.create_if_absent(username, secret, &[role])?;
        }
        info!("Identity store seeded with {} users", store.user_count());
        Ok(store)
    }

    /// Create a user; a taken username is a `BadRequest`
    #[cfg(test)]
    fn create_user(
        &self,
        username: &str,
        secret: &str,
        roles: &[&str],
    ) -> Result<UserSummary, ServiceError> {
        self.insert(username, secret, roles)?
            .ok_or_else(|| ServiceError::BadRequest(format!("Username '{}' already exists", username)))
    }

    /// Create a user unless the username is taken. Returns whether it was created.
    pub fn create_if_absent(
        &self,
        username: &str,
        secret: &str,
        roles: &[&str],
    ) -> Result<bool, ServiceError> {
        Ok(self.insert(username, secret, roles)?.is_some())
    }

    fn insert(
        &self,
        username: &str,
        secret: &str,
        roles: &[&str],
    ) -> Result<Option<UserSummary>, ServiceError> {
        if username.trim().is_empty() || secret.is_empty() {
            return Err(ServiceError::BadRequest(
                "username and password are required".into(),
            ));
        }

        {
            let dir = self.directory.read().unwrap_or_else(PoisonError::into_inner);
            if dir.find(username).is_some() {
                return Ok(None);
            }
            dir.role_ids(roles)?;
        }

        // argon2 runs without holding the directory lock
        let password_hash = self.hasher.hash(secret)?;

        let mut dir = self.directory.write().unwrap_or_else(PoisonError::into_inner);
        if dir.find(username).is_some() {
            return Ok(None);
        }
        let role_ids = dir.role_ids(roles)?;
        let user = User {
            id: dir.next_user_id,
            username: username.to_string(),
            password_hash,
            role_ids,
        };
        dir.next_user_id += 1;
        let summary = dir.summary(&user);
        dir.users.push(user);

        debug!("Created user {} (id {})", summary.username, summary.id);
        Ok(Some(summary))
    }

    /// Check credentials. `None` for an unknown user and a wrong secret alike.
    pub fn authenticate(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<Option<TokenInput>, ServiceError> {
        let candidate = {
            let dir = self.directory.read().unwrap_or_else(PoisonError::into_inner);
            dir.find(username).map(|user| {
                (
                    user.password_hash.clone(),
                    TokenInput {
                        user_id: user.id.to_string(),
                        username: user.username.clone(),
                        roles: dir.role_names(&user.role_ids),
                    },
                )
            })
        };

        let stored = candidate.as_ref().map(|(hash, _)| hash.as_str());
        if !self.hasher.verify_account(secret, stored)? {
            return Ok(None);
        }
        Ok(candidate.map(|(_, input)| input))
    }

    pub fn list_users(&self) -> Vec<UserSummary> {
        let dir = self.directory.read().unwrap_or_else(PoisonError::into_inner);
        dir.users.iter().map(|u| dir.summary(u)).collect()
    }

    pub fn role_names(&self) -> Vec<String> {
        let dir = self.directory.read().unwrap_or_else(PoisonError::into_inner);
        dir.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn user_count(&self) -> usize {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .users
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_accounts_authenticate() {
        let store = IdentityStore::with_bootstrap_users().unwrap();
        assert_eq!(store.user_count(), 3);

        let input = store.authenticate("admin", "admin123").unwrap().unwrap();
        assert_eq!(input.username, "admin");
        assert_eq!(input.roles, vec!["admin".to_string()]);
        assert_eq!(input.user_id, "3");
    }

    #[test]
    fn test_wrong_secret_and_unknown_user_look_alike() {
        let store = IdentityStore::with_bootstrap_users().unwrap();
        assert!(store.authenticate("admin", "nope").unwrap().is_none());
        assert!(store.authenticate("ghost", "admin123").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = IdentityStore::new().unwrap();
        store.create_user("ana", "secret-1", &[TEACHER]).unwrap();

        let err = store.create_user("ana", "secret-2", &[ADMIN]).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert!(!store.create_if_absent("ana", "secret-3", &[TEACHER]).unwrap());
        assert_eq!(store.user_count(), 1);
        // the original credentials still work
        assert!(store.authenticate("ana", "secret-1").unwrap().is_some());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let store = IdentityStore::new().unwrap();
        let err = store.create_user("bo", "pw", &["demo"]).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_listing_resolves_role_names() {
        let store = IdentityStore::new().unwrap();
        store
            .create_user("multi", "pw", &[TEACHER, RESEARCHER])
            .unwrap();

        let users = store.list_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].roles, vec!["enseignant", "chercheur"]);
        assert_eq!(store.role_names(), vec!["enseignant", "chercheur", "admin"]);
    }
}
