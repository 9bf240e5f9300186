//! Credential store diagnostics
//!
//! Lists the tables ("collections") of the store and reports on the two
//! spellings of the labour collection. When both exist the data is split
//! between them; the doctor flags it and leaves the choice to an operator.

use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::str::FromStr;
use terravale_core::{log_operation_start, storage_error, Role, TerravaleError};
use tracing::{info, warn};

/// Collections whose coexistence indicates split labour data
pub const LABOUR_COLLECTIONS: [&str; 2] = ["labour", "labours"];

/// Exit code when no store is configured
pub const EXIT_MISSING_CONFIG: u8 = 1;

/// Findings for one store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoctorReport {
    pub collections: Vec<String>,
    /// Document count of `labour`, when the collection exists
    pub labour: Option<i64>,
    /// Document count of `labours`, when the collection exists
    pub labours: Option<i64>,
    /// Account counts per stored role string, when a `users` table exists
    pub user_roles: Vec<(String, i64)>,
}

impl DoctorReport {
    pub fn labour_collections_conflict(&self) -> bool {
        self.labour.is_some() && self.labours.is_some()
    }

    /// Stored role strings that are not a known role
    pub fn unknown_roles(&self) -> Vec<&str> {
        self.user_roles
            .iter()
            .map(|(role, _)| role.as_str())
            .filter(|role| role.parse::<Role>().is_err())
            .collect()
    }
}

/// Result of a doctor run
#[derive(Debug)]
pub enum DoctorOutcome {
    /// No database URL configured
    MissingConfig,
    /// Store could not be reached or inspected; already logged
    Failed(String),
    Completed(DoctorReport),
}

impl DoctorOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            DoctorOutcome::MissingConfig => EXIT_MISSING_CONFIG,
            DoctorOutcome::Failed(_) | DoctorOutcome::Completed(_) => 0,
        }
    }
}

/// Connect to `database_url` and inspect it
pub async fn run(database_url: Option<&str>) -> DoctorOutcome {
    let Some(url) = database_url.filter(|url| !url.trim().is_empty()) else {
        warn!("No database URL configured; set DATABASE_URL or pass --database-url");
        return DoctorOutcome::MissingConfig;
    };

    log_operation_start!("doctor");

    let pool = match connect(url).await {
        Ok(pool) => pool,
        Err(e) => return failed("open", e),
    };

    let outcome = match inspect(&pool).await {
        Ok(report) => {
            info!(collections = report.collections.len(), "Store inspected");
            DoctorOutcome::Completed(report)
        }
        Err(e) => failed("inspect", e),
    };

    pool.close().await;
    outcome
}

fn failed(operation: &str, e: sqlx::Error) -> DoctorOutcome {
    let error: TerravaleError = storage_error!(
        format!("Failed to {} the credential store: {}", operation, e),
        "doctor",
        e
    );
    error.log();
    DoctorOutcome::Failed(error.to_string())
}

/// Open the store read-only; the doctor never creates a database
async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(false)
        .read_only(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

/// Collect the report from an open pool
pub async fn inspect(pool: &SqlitePool) -> Result<DoctorReport, sqlx::Error> {
    let collections: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    let mut report = DoctorReport::default();

    for name in LABOUR_COLLECTIONS {
        if !collections.iter().any(|c| c == name) {
            continue;
        }
        // Table names come from the fixed list above
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{}\"", name))
            .fetch_one(pool)
            .await?;
        match name {
            "labour" => report.labour = Some(count),
            _ => report.labours = Some(count),
        }
    }

    if collections.iter().any(|c| c == "users") {
        report.user_roles = user_roles(pool).await;
    }

    report.collections = collections;
    Ok(report)
}

/// Account counts per role. Older stores may lack a `role` column; the
/// breakdown is then skipped and the rest of the report still stands.
async fn user_roles(pool: &SqlitePool) -> Vec<(String, i64)> {
    let query = "SELECT role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role";
    match sqlx::query(query).fetch_all(pool).await {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| {
                let role = row.try_get::<String, _>("role").ok()?;
                let count = row.try_get::<i64, _>("count").ok()?;
                Some((role, count))
            })
            .collect(),
        Err(e) => {
            warn!("Skipping per-role user counts: {}", e);
            Vec::new()
        }
    }
}

/// Human-readable report
pub fn render(report: &DoctorReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("Collections ({}):\n", report.collections.len()));
    for name in &report.collections {
        out.push_str(&format!("  - {}\n", name));
    }

    let count = |value: Option<i64>| match value {
        Some(n) => n.to_string(),
        None => "missing".to_string(),
    };
    out.push_str(&format!("labour:  {}\n", count(report.labour)));
    out.push_str(&format!("labours: {}\n", count(report.labours)));

    if !report.user_roles.is_empty() {
        out.push_str("users by role:\n");
        for (role, n) in &report.user_roles {
            out.push_str(&format!("  {}: {}\n", role, n));
        }
    }

    if report.labour_collections_conflict() {
        out.push_str(
            "WARNING: both 'labour' and 'labours' exist; labour data is split between them\n",
        );
    }
    for role in report.unknown_roles() {
        out.push_str(&format!("WARNING: users table contains unknown role '{}'\n", role));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store(dir: &tempfile::TempDir, tables: &[&str]) -> String {
        let statements: Vec<String> = tables
            .iter()
            .map(|table| format!("CREATE TABLE \"{}\" (id TEXT PRIMARY KEY)", table))
            .collect();
        let statements: Vec<&str> = statements.iter().map(String::as_str).collect();
        store_with(dir, &statements).await
    }

    async fn store_with(dir: &tempfile::TempDir, statements: &[&str]) -> String {
        let url = format!("sqlite://{}", dir.path().join("store.db").display());
        let options = SqliteConnectOptions::from_str(&url)
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        for statement in statements {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        pool.close().await;
        url
    }

    #[tokio::test]
    async fn test_missing_url_exits_with_one() {
        assert_eq!(run(None).await.exit_code(), EXIT_MISSING_CONFIG);
        assert_eq!(run(Some("  ")).await.exit_code(), EXIT_MISSING_CONFIG);
    }

    #[tokio::test]
    async fn test_unreachable_store_exits_with_zero() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("absent.db").display());

        let outcome = run(Some(&url)).await;
        assert!(matches!(outcome, DoctorOutcome::Failed(_)));
        assert_eq!(outcome.exit_code(), 0);
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn test_flags_both_labour_collections() {
        let dir = tempfile::tempdir().unwrap();
        let url = seeded_store(&dir, &["labour", "labours", "orders"]).await;

        let DoctorOutcome::Completed(report) = run(Some(&url)).await else {
            panic!("doctor should complete");
        };
        assert_eq!(report.collections, vec!["labour", "labours", "orders"]);
        assert_eq!(report.labour, Some(0));
        assert_eq!(report.labours, Some(0));
        assert!(report.labour_collections_conflict());
        assert!(render(&report).contains("both 'labour' and 'labours' exist"));
    }

    #[tokio::test]
    async fn test_single_labour_collection_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let url = seeded_store(&dir, &["labour"]).await;

        let DoctorOutcome::Completed(report) = run(Some(&url)).await else {
            panic!("doctor should complete");
        };
        assert_eq!(report.labours, None);
        assert!(!report.labour_collections_conflict());
        assert!(render(&report).contains("labours: missing"));
    }

    #[tokio::test]
    async fn test_users_table_without_role_column_keeps_counts() {
        let dir = tempfile::tempdir().unwrap();
        let url = store_with(
            &dir,
            &[
                "CREATE TABLE users (id TEXT PRIMARY KEY)",
                "CREATE TABLE labour (id TEXT PRIMARY KEY)",
                "CREATE TABLE labours (id TEXT PRIMARY KEY)",
                "INSERT INTO labour (id) VALUES ('w-1')",
            ],
        )
        .await;

        let DoctorOutcome::Completed(report) = run(Some(&url)).await else {
            panic!("doctor should complete");
        };
        assert_eq!(report.labour, Some(1));
        assert_eq!(report.labours, Some(0));
        assert!(report.user_roles.is_empty());
        assert!(render(&report).contains("both 'labour' and 'labours' exist"));
    }

    #[tokio::test]
    async fn test_counts_users_by_role() {
        let dir = tempfile::tempdir().unwrap();
        let url = store_with(
            &dir,
            &[
                "CREATE TABLE users (id TEXT PRIMARY KEY, role TEXT NOT NULL)",
                "INSERT INTO users (id, role) VALUES ('u-1', 'buyer'), ('u-2', 'buyer'), ('u-3', 'labours')",
            ],
        )
        .await;

        let DoctorOutcome::Completed(report) = run(Some(&url)).await else {
            panic!("doctor should complete");
        };
        assert_eq!(
            report.user_roles,
            vec![("buyer".to_string(), 2), ("labours".to_string(), 1)]
        );
        assert!(render(&report).contains("unknown role 'labours'"));
    }

    #[test]
    fn test_unknown_roles() {
        let report = DoctorReport {
            user_roles: vec![("buyer".to_string(), 3), ("labours".to_string(), 1)],
            ..DoctorReport::default()
        };
        assert_eq!(report.unknown_roles(), vec!["labours"]);
    }
}
