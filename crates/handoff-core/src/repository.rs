//! Abstract user lookup for the verifying side.
//!
//! The verifier resolves the configured user model name against a
//! [`ModelRegistry`] and queries the resulting [`UserRepository`] by
//! field and value. Registry entries are type-erased; resolution is an
//! explicit interface assertion, so a name registered with something
//! that is not a user repository fails with a configuration error
//! rather than a request error.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ConfigError;
use crate::identity::Authenticatable;

/// Errors from a user repository lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The repository does not index the requested field.
    #[error("Unknown lookup field: {0}")]
    UnknownField(String),

    /// The underlying store failed.
    #[error("User lookup failed: {0}")]
    Backend(String),
}

/// A user record resolved on the verifying side.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserRecord {
    /// Primary identifier.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// External reference shared between the two applications, if any.
    pub external_ref: Option<String>,
}

impl UserRecord {
    /// Create a record with no external reference.
    #[must_use]
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            external_ref: None,
        }
    }

    /// Attach an external reference.
    #[must_use]
    pub fn with_external_ref(mut self, external_ref: impl Into<String>) -> Self {
        self.external_ref = Some(external_ref.into());
        self
    }
}

impl Authenticatable for UserRecord {
    fn auth_identifier(&self) -> String {
        self.id.to_string()
    }
}

/// Lookup capability over a collection of users.
///
/// The repository also declares which field identifies its users for
/// handoff, mirroring [`Authenticatable`] on the issuing side: a custom
/// handoff identifier, when declared, takes precedence over the
/// standard one.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Field name of the standard authentication identifier.
    fn auth_identifier_name(&self) -> &str {
        "id"
    }

    /// Field name of the custom handoff identifier, if the repository
    /// declares one.
    fn handoff_identifier_name(&self) -> Option<&str> {
        None
    }

    /// Find the user whose `field` equals `value`.
    async fn find_by(&self, field: &str, value: &str)
        -> Result<Option<UserRecord>, RepositoryError>;
}

/// The field the verifier must query, honoring the custom identifier.
#[must_use]
pub fn repository_lookup_field(repository: &dyn UserRepository) -> &str {
    repository
        .handoff_identifier_name()
        .unwrap_or_else(|| repository.auth_identifier_name())
}

/// Registry of named user model entries.
///
/// Entries are type-erased so the registry can hold anything a
/// deployment wires in; [`resolve`](Self::resolve) asserts the entry is
/// actually a user repository and reports a configuration error
/// otherwise.
#[derive(Default)]
pub struct ModelRegistry {
    entries: RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user repository under `name`.
    pub fn register(&self, name: impl Into<String>, repository: Arc<dyn UserRepository>) {
        self.entries.write().insert(name.into(), Box::new(repository));
    }

    /// Register an arbitrary entry under `name`.
    ///
    /// Exists so deployments (and tests) can wire in entries that are
    /// not repositories; resolving such a name fails with
    /// [`ConfigError::NotAuthenticatable`].
    pub fn register_opaque(&self, name: impl Into<String>, entry: Box<dyn Any + Send + Sync>) {
        self.entries.write().insert(name.into(), entry);
    }

    /// Resolve `name` to a user repository.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownUserModel`] if no entry exists for `name`.
    /// - [`ConfigError::NotAuthenticatable`] if the entry is not a
    ///   [`UserRepository`].
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn UserRepository>, ConfigError> {
        let entries = self.entries.read();
        let entry = entries
            .get(name)
            .ok_or_else(|| ConfigError::UnknownUserModel(name.to_string()))?;

        entry
            .downcast_ref::<Arc<dyn UserRepository>>()
            .cloned()
            .ok_or_else(|| ConfigError::NotAuthenticatable(name.to_string()))
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("ModelRegistry").field("models", &names).finish()
    }
}

/// HashMap-backed repository used by the demo server and tests.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Vec<UserRecord>,
    handoff_identifier: Option<String>,
}

impl InMemoryUserRepository {
    /// Create an empty repository identified by the standard `id` field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with `users`.
    #[must_use]
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            handoff_identifier: None,
        }
    }

    /// Declare a custom handoff identifier field for this repository.
    #[must_use]
    pub fn with_handoff_identifier(mut self, field: impl Into<String>) -> Self {
        self.handoff_identifier = Some(field.into());
        self
    }

    /// Add a user.
    pub fn insert(&mut self, user: UserRecord) {
        self.users.push(user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    fn handoff_identifier_name(&self) -> Option<&str> {
        self.handoff_identifier.as_deref()
    }

    async fn find_by(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let matches = |user: &&UserRecord| match field {
            "id" => user.id.to_string() == value,
            "email" => user.email == value,
            "external_ref" => user.external_ref.as_deref() == Some(value),
            _ => false,
        };

        match field {
            "id" | "email" | "external_ref" => Ok(self.users.iter().find(matches).cloned()),
            other => Err(RepositoryError::UnknownField(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserRecord {
        UserRecord::new(Uuid::new_v4(), "ada@example.com").with_external_ref("legacy-77")
    }

    #[tokio::test]
    async fn in_memory_repository_finds_by_id() {
        let user = sample_user();
        let repo = InMemoryUserRepository::with_users(vec![user.clone()]);

        let found = repo.find_by("id", &user.id.to_string()).await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn in_memory_repository_finds_by_external_ref() {
        let user = sample_user();
        let repo = InMemoryUserRepository::with_users(vec![user.clone()]);

        let found = repo.find_by("external_ref", "legacy-77").await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn in_memory_repository_misses_unknown_value() {
        let repo = InMemoryUserRepository::with_users(vec![sample_user()]);
        let found = repo.find_by("email", "nobody@example.com").await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn in_memory_repository_rejects_unknown_field() {
        let repo = InMemoryUserRepository::new();
        let result = repo.find_by("ssn", "x").await;
        assert_eq!(result, Err(RepositoryError::UnknownField("ssn".to_string())));
    }

    #[test]
    fn lookup_field_defaults_to_auth_identifier() {
        let repo = InMemoryUserRepository::new();
        assert_eq!(repository_lookup_field(&repo), "id");
    }

    #[test]
    fn lookup_field_prefers_handoff_identifier() {
        let repo = InMemoryUserRepository::new().with_handoff_identifier("external_ref");
        assert_eq!(repository_lookup_field(&repo), "external_ref");
    }

    #[test]
    fn registry_resolves_registered_repository() {
        let registry = ModelRegistry::new();
        let repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        registry.register("users", repo);

        assert!(registry.resolve("users").is_ok());
    }

    #[test]
    fn registry_reports_unknown_model() {
        let registry = ModelRegistry::new();
        assert_eq!(
            registry.resolve("users").err(),
            Some(ConfigError::UnknownUserModel("users".to_string()))
        );
    }

    #[test]
    fn registry_reports_non_repository_entry() {
        let registry = ModelRegistry::new();
        registry.register_opaque("users", Box::new("not a repository"));

        assert_eq!(
            registry.resolve("users").err(),
            Some(ConfigError::NotAuthenticatable("users".to_string()))
        );
    }

    #[test]
    fn user_record_is_authenticatable_by_id() {
        let user = sample_user();
        assert_eq!(crate::identity::user_key(&user), user.id.to_string());
        assert_eq!(crate::identity::lookup_field(&user), "id");
    }
}
