//! Opening the local SQLite store.

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

const PRAGMAS: [&str; 3] = [
    "PRAGMA journal_mode=WAL",
    "PRAGMA busy_timeout=5000",
    "PRAGMA synchronous=NORMAL",
];

/// WAL so readers never block the sync writer, a 5s busy wait instead of
/// failing fast on a lock, and NORMAL sync which is safe under WAL.
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    for pragma in PRAGMAS {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }
    Ok(())
}

fn is_file_backed(database_url: &str) -> bool {
    database_url.starts_with("sqlite://") && !database_url.contains(":memory:")
}

/// Open the store at `database_url` without touching the schema.
///
/// File-backed SQLite URLs get the pragmas from [`configure_sqlite`].
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    if is_file_backed(database_url) {
        configure_sqlite(&db).await?;
    }
    tracing::debug!(url = database_url, "database connected");
    Ok(db)
}

/// Open the store and bring the schema up to date.
///
/// ```ignore
/// let db = omg::connect_and_migrate("sqlite:///home/me/.local/state/omg/omg.db?mode=rwc").await?;
/// ```
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_file_urls_are_tuned() {
        assert!(is_file_backed("sqlite:///tmp/omg.db?mode=rwc"));
        assert!(!is_file_backed("sqlite::memory:"));
        assert!(!is_file_backed("sqlite://:memory:"));
    }

    #[tokio::test]
    async fn connect_returns_error_for_invalid_database_url() {
        let err = connect("this-is-not-a-db-url")
            .await
            .expect_err("invalid URL should error");
        assert!(!err.to_string().is_empty());
    }

    #[cfg(feature = "migrate")]
    #[tokio::test]
    async fn file_database_runs_in_wal_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("omg.db").display());

        let db = connect_and_migrate(&url).await.expect("open file db");
        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "PRAGMA journal_mode".to_string(),
            ))
            .await
            .expect("query pragma")
            .expect("pragma returns a row");
        let mode: String = row.try_get_by_index(0).expect("journal_mode column");
        assert_eq!(mode.to_ascii_lowercase(), "wal");
    }

    #[cfg(feature = "migrate")]
    #[tokio::test]
    async fn migrating_twice_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("omg.db").display());

        let first = connect_and_migrate(&url).await.expect("first open");
        drop(first);
        connect_and_migrate(&url).await.expect("second open");
    }

    #[cfg(feature = "migrate")]
    #[tokio::test]
    async fn migration_creates_the_named_tables_and_views() {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("migrate in-memory db");
        let rows = db
            .query_all(Statement::from_string(
                db.get_database_backend(),
                "SELECT type, name FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name LIKE 'omg_%' ORDER BY name"
                    .to_string(),
            ))
            .await
            .expect("list schema");
        let objects: Vec<(String, String)> = rows
            .iter()
            .map(|row| {
                (
                    row.try_get_by_index(0).expect("type column"),
                    row.try_get_by_index(1).expect("name column"),
                )
            })
            .collect();

        let expected = [
            ("table", "omg_migrations"),
            ("table", "omg_my_repo"),
            ("view", "omg_my_repo_view"),
            ("table", "omg_my_star"),
            ("view", "omg_my_star_view"),
            ("table", "omg_repo"),
        ];
        let objects: Vec<(&str, &str)> = objects
            .iter()
            .map(|(kind, name)| (kind.as_str(), name.as_str()))
            .collect();
        assert_eq!(objects, expected);

        // The views must resolve against real tables.
        for view in ["omg_my_repo_view", "omg_my_star_view"] {
            db.query_all(Statement::from_string(
                db.get_database_backend(),
                format!("SELECT * FROM {view}"),
            ))
            .await
            .expect("view selects");
        }
    }
}
