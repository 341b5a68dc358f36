use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct ShowRow {
    pub id: i64,
    pub sonarr_id: Option<i64>,
    pub title: String,
    pub sort_title: Option<String>,
    pub path: String,
    pub status: Option<String>,
    pub overview: Option<String>,
    pub network: Option<String>,
    pub year: Option<i64>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

/// A show plus the sizes of its tree, for list views.
#[derive(Debug, Clone)]
pub struct ShowSummaryRow {
    pub id: i64,
    pub sonarr_id: Option<i64>,
    pub title: String,
    pub path: String,
    pub status: Option<String>,
    pub network: Option<String>,
    pub year: Option<i64>,
    pub seasons_count: i64,
    pub episodes_count: i64,
}

/// What identifies an already imported show: the catalog id when known,
/// otherwise the `(title, path)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportKey {
    pub sonarr_id: Option<i64>,
    pub title: String,
    pub path: String,
}

pub async fn count_shows(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shows")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of shows ordered by sort title, with season/episode counts.
pub async fn list_shows_page(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ShowSummaryRow>, sqlx::Error> {
    let rows: Vec<(
        i64,
        Option<i64>,
        String,
        String,
        Option<String>,
        Option<String>,
        Option<i64>,
        i64,
        i64,
    )> = sqlx::query_as(
        "SELECT s.id, s.sonarr_id, s.title, s.path, s.status, s.network, s.year, \
         (SELECT COUNT(*) FROM seasons se WHERE se.show_id = s.id), \
         (SELECT COUNT(*) FROM episodes e JOIN seasons se ON e.season_id = se.id \
          WHERE se.show_id = s.id) \
         FROM shows s \
         ORDER BY COALESCE(s.sort_title, s.title) COLLATE NOCASE, s.id \
         LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| ShowSummaryRow {
            id: r.0,
            sonarr_id: r.1,
            title: r.2,
            path: r.3,
            status: r.4,
            network: r.5,
            year: r.6,
            seasons_count: r.7,
            episodes_count: r.8,
        })
        .collect())
}

pub async fn get_show(pool: &SqlitePool, show_id: i64) -> Result<Option<ShowRow>, sqlx::Error> {
    let row: Option<(
        i64,
        Option<i64>,
        String,
        Option<String>,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<i64>,
        i64,
        i64,
    )> = sqlx::query_as(
        "SELECT id, sonarr_id, title, sort_title, path, status, overview, network, year, \
         created_ts, updated_ts FROM shows WHERE id = ?",
    )
    .bind(show_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ShowRow {
        id: r.0,
        sonarr_id: r.1,
        title: r.2,
        sort_title: r.3,
        path: r.4,
        status: r.5,
        overview: r.6,
        network: r.7,
        year: r.8,
        created_ts: r.9,
        updated_ts: r.10,
    }))
}

pub async fn find_by_sonarr_id(
    pool: &SqlitePool,
    sonarr_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM shows WHERE sonarr_id = ?")
        .bind(sonarr_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn list_import_keys(pool: &SqlitePool) -> Result<Vec<ImportKey>, sqlx::Error> {
    let rows: Vec<(Option<i64>, String, String)> =
        sqlx::query_as("SELECT sonarr_id, title, path FROM shows")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(sonarr_id, title, path)| ImportKey {
            sonarr_id,
            title,
            path,
        })
        .collect())
}

/// Catalog ids of every imported show that has one, in title order.
pub async fn list_catalog_ids(pool: &SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT sonarr_id FROM shows WHERE sonarr_id IS NOT NULL \
         ORDER BY COALESCE(sort_title, title) COLLATE NOCASE",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Number of seasons, episodes and episode files under one show.
pub async fn tree_counts(pool: &SqlitePool, show_id: i64) -> Result<(i64, i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT \
         (SELECT COUNT(*) FROM seasons WHERE show_id = ?1), \
         (SELECT COUNT(*) FROM episodes e JOIN seasons se ON e.season_id = se.id \
          WHERE se.show_id = ?1), \
         (SELECT COUNT(*) FROM episode_files f JOIN episodes e ON f.episode_id = e.id \
          JOIN seasons se ON e.season_id = se.id WHERE se.show_id = ?1)",
    )
    .bind(show_id)
    .fetch_one(pool)
    .await
}

/// Delete a show and everything below it in one transaction.
///
/// Children are removed explicitly, leaf first, so the result does not depend
/// on the connection having foreign keys enabled. Returns `false` when the
/// show did not exist.
pub async fn delete_show(pool: &SqlitePool, show_id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM episode_files WHERE episode_id IN ( \
         SELECT e.id FROM episodes e JOIN seasons se ON e.season_id = se.id \
         WHERE se.show_id = ?)",
    )
    .bind(show_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM episodes WHERE season_id IN (SELECT id FROM seasons WHERE show_id = ?)")
        .bind(show_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM seasons WHERE show_id = ?")
        .bind(show_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM shows WHERE id = ?")
        .bind(show_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
