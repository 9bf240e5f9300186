//! Database-backed user storage implementation

use super::{
    jwt::AuthError,
    users::{RoleCounts, UserData},
};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::str::FromStr;
use terravale_core::{Role, UserProfile};
use tracing::{debug, error, info, warn};

/// Database user record
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: String,
    email: String,
    password_hash: String,
    role: String,
    profile: String,    // JSON object
    created_at: String, // RFC 3339
    updated_at: String, // RFC 3339
}

impl UserRecord {
    /// Convert to UserData
    fn to_user_data(&self) -> Result<UserData, AuthError> {
        let role = self.role.parse::<Role>().map_err(|e| {
            error!("User {} has an invalid role: {}", self.id, e);
            AuthError::Internal(e)
        })?;

        let profile: UserProfile = serde_json::from_str(&self.profile)
            .map_err(|e| AuthError::Internal(format!("invalid profile for {}: {}", self.id, e)))?;

        Ok(UserData {
            id: self.id.clone(),
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            role,
            profile,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }

    /// Create from UserData
    fn from_user_data(user: &UserData) -> Result<Self, AuthError> {
        let profile = serde_json::to_string(&user.profile)
            .map_err(|e| AuthError::Internal(format!("failed to encode profile: {}", e)))?;

        Ok(Self {
            id: user.id.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.to_string(),
            profile,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AuthError::Internal(format!("invalid timestamp '{}': {}", value, e)))
}

fn store_error(operation: &str, e: sqlx::Error) -> AuthError {
    error!("Credential store {} failed: {}", operation, e);
    AuthError::StoreUnavailable(e.to_string())
}

/// Database-backed user store
#[derive(Debug, Clone)]
pub struct DatabaseUserStore {
    pool: SqlitePool,
}

impl DatabaseUserStore {
    /// Connect to the store at `url`, creating the database file if needed
    pub async fn connect(url: &str) -> Result<Self, AuthError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| store_error("connect", e))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens a separate database; keep exactly one alive.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| store_error("connect", e))?;

        Self::new(pool).await
    }

    /// Create new database user store on an existing pool
    pub async fn new(pool: SqlitePool) -> Result<Self, AuthError> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create database tables
    async fn create_tables(&self) -> Result<(), AuthError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                profile TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| store_error("create_tables", e))?;
        }

        info!("Users table ready");
        Ok(())
    }

    /// Insert user into database
    pub async fn insert_user(&self, user: &UserData) -> Result<(), AuthError> {
        let record = UserRecord::from_user_data(user)?;

        let query = r#"
            INSERT INTO users (id, email, password_hash, role, profile, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(&record.id)
            .bind(&record.email)
            .bind(&record.password_hash)
            .bind(&record.role)
            .bind(&record.profile)
            .bind(&record.created_at)
            .bind(&record.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    debug!("Email already registered: {}", record.email);
                    AuthError::EmailTaken
                }
                other => store_error("insert_user", other),
            })?;

        debug!("User inserted successfully: {}", user.email);
        Ok(())
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserData>, AuthError> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("get_user_by_email", e))?;

        record.map(|r| r.to_user_data()).transpose()
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserData>, AuthError> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("get_user_by_id", e))?;

        record.map(|r| r.to_user_data()).transpose()
    }

    /// Replace the profile of a user; returns whether a row was updated
    pub async fn update_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let profile = serde_json::to_string(profile)
            .map_err(|e| AuthError::Internal(format!("failed to encode profile: {}", e)))?;

        let result = sqlx::query("UPDATE users SET profile = ?, updated_at = ? WHERE id = ?")
            .bind(&profile)
            .bind(updated_at.to_rfc3339())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("update_profile", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count accounts per role
    pub async fn role_counts(&self) -> Result<RoleCounts, AuthError> {
        let rows = sqlx::query("SELECT role, COUNT(*) AS count FROM users GROUP BY role")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("role_counts", e))?;

        let mut counts = RoleCounts::default();
        for row in rows {
            let role: String = row.get("role");
            let count: i64 = row.get("count");
            match role.parse::<Role>() {
                Ok(role) => counts.add(role, count.max(0) as u64),
                Err(_) => warn!("Ignoring {} users with unknown role '{}'", count, role),
            }
        }

        Ok(counts)
    }
}
