use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::{debug, error, info, instrument};

#[instrument]
pub async fn init_database(database_url: &str) -> Result<()> {
    info!("Initializing database");

    let db = Database::connect(database_url).await.map_err(|e| {
        error!("Failed to connect to database '{}': {}", database_url, e);
        e
    })?;
    debug!("Database connection established");

    Migrator::up(&db, None).await.map_err(|e| {
        error!("Failed to run database migrations: {}", e);
        e
    })?;

    info!("Database initialization completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, Statement};

    #[tokio::test]
    async fn test_init_database_creates_schema() {
        let dir = std::env::temp_dir().join(format!("billcycle-initdb-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.join("bills.sqlite").display());

        init_database(&url).await.unwrap();
        // Running twice is a no-op
        init_database(&url).await.unwrap();

        let db = Database::connect(&url).await.unwrap();
        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "SELECT count(*) AS n FROM sqlite_master WHERE name = 'recurring_bill_occurrences'",
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get::<i64>("", "n").unwrap(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
