use sqlx::SqlitePool;

pub const IMPORT_MODE: &str = "import_mode";
pub const POLLING_INTERVAL: &str = "polling_interval";

/// Get a setting value by key.
pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(v,)| v))
}

/// Set a setting value (upsert).
pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO settings (key, value, updated_ts) VALUES (?, ?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_ts = excluded.updated_ts",
    )
    .bind(key)
    .bind(value)
    .bind(crate::now_ts())
    .execute(pool)
    .await?;
    Ok(())
}

/// Seed settings that do not exist yet. Existing values are never overwritten.
pub async fn insert_defaults(
    pool: &SqlitePool,
    defaults: &[(&str, &str)],
) -> Result<(), sqlx::Error> {
    let now = crate::now_ts();
    for (key, value) in defaults {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value, updated_ts) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(pool)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool() -> SqlitePool {
        let pool = crate::connect(":memory:").await.unwrap();
        crate::migrate::run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn set_then_get_round_trips_and_overwrites() {
        let pool = pool().await;
        assert_eq!(get(&pool, IMPORT_MODE).await.unwrap(), None);

        set(&pool, IMPORT_MODE, "auto").await.unwrap();
        set(&pool, IMPORT_MODE, "import").await.unwrap();
        assert_eq!(get(&pool, IMPORT_MODE).await.unwrap().as_deref(), Some("import"));
    }

    #[tokio::test]
    async fn defaults_do_not_clobber_existing_values() {
        let pool = pool().await;
        set(&pool, POLLING_INTERVAL, "60").await.unwrap();

        insert_defaults(&pool, &[(IMPORT_MODE, "none"), (POLLING_INTERVAL, "300")])
            .await
            .unwrap();

        assert_eq!(get(&pool, IMPORT_MODE).await.unwrap().as_deref(), Some("none"));
        assert_eq!(get(&pool, POLLING_INTERVAL).await.unwrap().as_deref(), Some("60"));
    }
}
