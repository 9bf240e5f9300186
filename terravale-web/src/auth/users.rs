//! User accounts and the credential store

#[cfg(feature = "sqlite")]
use super::database::DatabaseUserStore;
use super::jwt::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use terravale_core::{Role, UserProfile};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash verified against when the email is unknown, so both failure paths cost the same
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("terravale-timing-equaliser").ok());

/// User registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// User login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile edit; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
}

/// Public user information
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Number of accounts per role
#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct RoleCounts {
    pub admin: u64,
    pub buyer: u64,
    pub labour: u64,
}

impl RoleCounts {
    pub fn total(&self) -> u64 {
        self.admin + self.buyer + self.labour
    }

    pub fn add(&mut self, role: Role, count: u64) {
        match role {
            Role::Admin => self.admin += count,
            Role::Buyer => self.buyer += count,
            Role::Labour => self.labour += count,
        }
    }
}

/// Internal user data with password hash
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserData {
    /// Create new user with hashed password
    pub fn new(
        email: &str,
        password: &str,
        role: Role,
        profile: UserProfile,
    ) -> Result<Self, AuthError> {
        let password_hash = hash_password(password)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            profile,
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify password
    pub fn verify_password(&self, password: &str) -> Result<bool, AuthError> {
        verify_password(password, &self.password_hash)
    }

    /// Convert to public user info
    pub fn to_user_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            profile: self.profile.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User store abstraction supporting both in-memory and database storage
#[derive(Debug, Clone)]
pub enum UserStore {
    /// In-memory storage (for development and testing), keyed by user ID
    Memory {
        users: Arc<RwLock<HashMap<String, UserData>>>,
    },
    /// Database storage (for production)
    #[cfg(feature = "sqlite")]
    Database(DatabaseUserStore),
}

impl Default for UserStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl UserStore {
    /// Create in-memory user store
    pub fn memory() -> Self {
        Self::Memory {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create database user store
    #[cfg(feature = "sqlite")]
    pub fn database(database_store: DatabaseUserStore) -> Self {
        Self::Database(database_store)
    }

    /// Short backend name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory { .. } => "memory",
            #[cfg(feature = "sqlite")]
            Self::Database(_) => "sqlite",
        }
    }

    /// Insert a new user; fails with `EmailTaken` on duplicate email
    pub async fn insert_user(&self, user: UserData) -> Result<UserData, AuthError> {
        match self {
            Self::Memory { users } => {
                let mut users = users.write().await;

                if users.values().any(|u| u.email == user.email) {
                    debug!("Registration failed: email '{}' already exists", user.email);
                    return Err(AuthError::EmailTaken);
                }

                users.insert(user.id.clone(), user.clone());
                Ok(user)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => {
                db_store.insert_user(&user).await?;
                Ok(user)
            }
        }
    }

    /// Get user by login email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserData>, AuthError> {
        let email = normalize_email(email);
        match self {
            Self::Memory { users } => {
                let users = users.read().await;
                Ok(users.values().find(|u| u.email == email).cloned())
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.get_user_by_email(&email).await,
        }
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserData>, AuthError> {
        match self {
            Self::Memory { users } => {
                let users = users.read().await;
                Ok(users.get(user_id).cloned())
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.get_user_by_id(user_id).await,
        }
    }

    /// Replace a user's profile; `None` when the user does not exist
    pub async fn update_profile(
        &self,
        user_id: &str,
        profile: UserProfile,
    ) -> Result<Option<UserData>, AuthError> {
        let updated_at = Utc::now();
        match self {
            Self::Memory { users } => {
                let mut users = users.write().await;
                Ok(users.get_mut(user_id).map(|user| {
                    user.profile = profile;
                    user.updated_at = updated_at;
                    user.clone()
                }))
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => {
                if db_store
                    .update_profile(user_id, &profile, updated_at)
                    .await?
                {
                    db_store.get_user_by_id(user_id).await
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Count accounts per role
    pub async fn role_counts(&self) -> Result<RoleCounts, AuthError> {
        match self {
            Self::Memory { users } => {
                let users = users.read().await;
                let mut counts = RoleCounts::default();
                for user in users.values() {
                    counts.add(user.role, 1);
                }
                Ok(counts)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.role_counts().await,
        }
    }
}

/// User service for account operations
#[derive(Debug, Clone, Default)]
pub struct UserService {
    store: UserStore,
}

impl UserService {
    /// Create new user service with custom store
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Public sign-up. Only self-registrable roles are accepted.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserData, AuthError> {
        debug!("Starting user registration for: {}", request.email);

        if !request.role.is_self_registrable() {
            warn!(
                "Rejected self-registration of role '{}' for {}",
                request.role, request.email
            );
            return Err(AuthError::RoleNotRegistrable(request.role));
        }

        let profile = UserProfile {
            full_name: request.full_name,
            phone: non_empty(request.phone),
            location: non_empty(request.location),
            company: non_empty(request.company),
        };

        self.provision(&request.email, &request.password, request.role, profile)
            .await
    }

    /// Create an account of any role. Used by operators and by `register`.
    pub async fn provision(
        &self,
        email: &str,
        password: &str,
        role: Role,
        profile: UserProfile,
    ) -> Result<UserData, AuthError> {
        validate_email(email)?;
        validate_password(password)?;
        if profile.full_name.trim().is_empty() {
            return Err(AuthError::InvalidInput {
                field: "full_name",
                message: "must not be empty",
            });
        }

        let profile = UserProfile {
            full_name: profile.full_name.trim().to_string(),
            ..profile
        };
        let user_data = UserData::new(email, password, role, profile)?;
        let user_data = self.store.insert_user(user_data).await?;

        info!("Registered new {} account: {}", user_data.role, user_data.email);
        Ok(user_data)
    }

    /// Check a credential pair against the store
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<UserData, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let Some(user) = self.store.get_user_by_email(&request.email).await? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&request.password, dummy);
            }
            debug!("Login failed: unknown email {}", request.email);
            return Err(AuthError::InvalidCredentials);
        };

        if !user.verify_password(&request.password)? {
            warn!("Invalid password for user: {}", user.email);
            return Err(AuthError::InvalidCredentials);
        }

        debug!("User authenticated: {}", user.email);
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserData>, AuthError> {
        self.store.get_user_by_id(user_id).await
    }

    /// Apply a profile edit for the given user
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserData, AuthError> {
        let current = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let mut profile = current.profile;
        if let Some(full_name) = request.full_name {
            let full_name = full_name.trim();
            if full_name.is_empty() {
                return Err(AuthError::InvalidInput {
                    field: "full_name",
                    message: "must not be empty",
                });
            }
            profile.full_name = full_name.to_string();
        }
        if request.phone.is_some() {
            profile.phone = non_empty(request.phone);
        }
        if request.location.is_some() {
            profile.location = non_empty(request.location);
        }
        if request.company.is_some() {
            profile.company = non_empty(request.company);
        }

        let updated = self
            .store
            .update_profile(user_id, profile)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        info!("Updated profile for user: {}", updated.email);
        Ok(updated)
    }

    /// Count accounts per role
    pub async fn role_counts(&self) -> Result<RoleCounts, AuthError> {
        self.store.role_counts().await
    }

    /// Get user store
    pub fn store(&self) -> &UserStore {
        &self.store
    }
}

/// Lower-cased, trimmed email used as the login key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidInput {
            field: "email",
            message: "must be a valid email address",
        })
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidInput {
            field: "password",
            message: "must be at least 8 characters",
        });
    }
    Ok(())
}

/// Hash password using Argon2
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify password against a PHC hash string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("stored password hash is corrupt: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
