//! Transactional writer for one imported show tree.
//!
//! The importer builds a [`ShowImport`] from catalog data (all network calls
//! happen before this point) and hands it to [`write_show`], which upserts the
//! show, its seasons, episodes and episode files inside a single transaction.

use sqlx::{SqliteConnection, SqlitePool};

use crate::DbError;

#[derive(Debug, Clone, Default)]
pub struct ShowImport {
    pub sonarr_id: i64,
    pub title: String,
    pub sort_title: Option<String>,
    pub path: String,
    pub status: Option<String>,
    pub overview: Option<String>,
    pub network: Option<String>,
    pub year: Option<i64>,
    pub seasons: Vec<SeasonImport>,
}

#[derive(Debug, Clone, Default)]
pub struct SeasonImport {
    pub season_number: i64,
    pub monitored: bool,
    pub episodes: Vec<EpisodeImport>,
}

#[derive(Debug, Clone, Default)]
pub struct EpisodeImport {
    pub sonarr_episode_id: i64,
    pub episode_number: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub file: Option<EpisodeFileImport>,
}

#[derive(Debug, Clone, Default)]
pub struct EpisodeFileImport {
    pub sonarr_file_id: Option<i64>,
    pub path: String,
    pub size: i64,
    pub quality: Option<String>,
}

/// What a single [`write_show`] call touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub show_id: i64,
    /// The show row was inserted rather than updated.
    pub created: bool,
    pub seasons: usize,
    pub episodes: usize,
    /// Episodes that did not exist before this write.
    pub episodes_added: usize,
    pub files: usize,
}

/// Upsert a whole show tree atomically. Any error rolls the show back.
pub async fn write_show(pool: &SqlitePool, show: &ShowImport) -> Result<WriteSummary, DbError> {
    let mut tx = pool.begin().await?;
    let now = crate::now_ts();

    let (show_id, created) = upsert_show(&mut tx, show, now).await?;
    let mut summary = WriteSummary {
        show_id,
        created,
        ..Default::default()
    };

    for season in &show.seasons {
        let season_id = upsert_season(&mut tx, show_id, season, now).await?;
        summary.seasons += 1;

        for episode in &season.episodes {
            let (episode_id, added) = upsert_episode(&mut tx, season_id, episode, now).await?;
            summary.episodes += 1;
            if added {
                summary.episodes_added += 1;
            }
            if sync_episode_file(&mut tx, episode_id, episode.file.as_ref(), now).await? {
                summary.files += 1;
            }
        }
    }

    tx.commit().await?;
    Ok(summary)
}

async fn upsert_show(
    conn: &mut SqliteConnection,
    show: &ShowImport,
    now: i64,
) -> Result<(i64, bool), DbError> {
    let by_catalog_id: Option<(i64, Option<i64>)> =
        sqlx::query_as("SELECT id, sonarr_id FROM shows WHERE sonarr_id = ?")
            .bind(show.sonarr_id)
            .fetch_optional(&mut *conn)
            .await?;

    let existing = match by_catalog_id {
        Some(row) => Some(row),
        None => {
            sqlx::query_as("SELECT id, sonarr_id FROM shows WHERE title = ? AND path = ?")
                .bind(&show.title)
                .bind(&show.path)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    match existing {
        Some((_, Some(owner))) if owner != show.sonarr_id => Err(DbError::Conflict(format!(
            "show '{}' at '{}' is already imported from catalog id {owner}",
            show.title, show.path
        ))),
        Some((id, _)) => {
            sqlx::query(
                "UPDATE shows SET sonarr_id = ?, title = ?, sort_title = ?, path = ?, status = ?, \
                 overview = ?, network = ?, year = ?, updated_ts = ? WHERE id = ?",
            )
            .bind(show.sonarr_id)
            .bind(&show.title)
            .bind(&show.sort_title)
            .bind(&show.path)
            .bind(&show.status)
            .bind(&show.overview)
            .bind(&show.network)
            .bind(show.year)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            Ok((id, false))
        }
        None => {
            let result = sqlx::query(
                "INSERT INTO shows (sonarr_id, title, sort_title, path, status, overview, network, \
                 year, created_ts, updated_ts) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(show.sonarr_id)
            .bind(&show.title)
            .bind(&show.sort_title)
            .bind(&show.path)
            .bind(&show.status)
            .bind(&show.overview)
            .bind(&show.network)
            .bind(show.year)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;
            Ok((result.last_insert_rowid(), true))
        }
    }
}

async fn upsert_season(
    conn: &mut SqliteConnection,
    show_id: i64,
    season: &SeasonImport,
    now: i64,
) -> Result<i64, sqlx::Error> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM seasons WHERE show_id = ? AND season_number = ?")
            .bind(show_id)
            .bind(season.season_number)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some((id,)) = existing {
        sqlx::query("UPDATE seasons SET monitored = ?, updated_ts = ? WHERE id = ?")
            .bind(season.monitored)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        return Ok(id);
    }

    let result = sqlx::query(
        "INSERT INTO seasons (show_id, season_number, monitored, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(show_id)
    .bind(season.season_number)
    .bind(season.monitored)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn upsert_episode(
    conn: &mut SqliteConnection,
    season_id: i64,
    episode: &EpisodeImport,
    now: i64,
) -> Result<(i64, bool), sqlx::Error> {
    // The catalog is the system of record: a stale row holding this slot under
    // another catalog id gives way.
    sqlx::query(
        "DELETE FROM episodes WHERE season_id = ? AND episode_number = ? \
         AND (sonarr_episode_id IS NULL OR sonarr_episode_id != ?)",
    )
    .bind(season_id)
    .bind(episode.episode_number)
    .bind(episode.sonarr_episode_id)
    .execute(&mut *conn)
    .await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM episodes WHERE sonarr_episode_id = ?")
            .bind(episode.sonarr_episode_id)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some((id,)) = existing {
        sqlx::query(
            "UPDATE episodes SET season_id = ?, episode_number = ?, title = ?, overview = ?, \
             air_date = ?, has_file = ?, updated_ts = ? WHERE id = ?",
        )
        .bind(season_id)
        .bind(episode.episode_number)
        .bind(&episode.title)
        .bind(&episode.overview)
        .bind(&episode.air_date)
        .bind(episode.file.is_some())
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        return Ok((id, false));
    }

    let result = sqlx::query(
        "INSERT INTO episodes (season_id, episode_number, title, sonarr_episode_id, overview, \
         air_date, has_file, created_ts, updated_ts) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(season_id)
    .bind(episode.episode_number)
    .bind(&episode.title)
    .bind(episode.sonarr_episode_id)
    .bind(&episode.overview)
    .bind(&episode.air_date)
    .bind(episode.file.is_some())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok((result.last_insert_rowid(), true))
}

/// Make the stored file for an episode match the catalog. Returns whether a
/// file row exists afterwards.
async fn sync_episode_file(
    conn: &mut SqliteConnection,
    episode_id: i64,
    file: Option<&EpisodeFileImport>,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let Some(file) = file else {
        sqlx::query("DELETE FROM episode_files WHERE episode_id = ?")
            .bind(episode_id)
            .execute(&mut *conn)
            .await?;
        return Ok(false);
    };

    sqlx::query(
        "INSERT INTO episode_files (episode_id, sonarr_file_id, file_path, size, quality, \
         created_ts, updated_ts) VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(episode_id) DO UPDATE SET \
         sonarr_file_id = excluded.sonarr_file_id, \
         file_path = excluded.file_path, \
         size = excluded.size, \
         quality = excluded.quality, \
         updated_ts = excluded.updated_ts",
    )
    .bind(episode_id)
    .bind(file.sonarr_file_id)
    .bind(&file.path)
    .bind(file.size)
    .bind(&file.quality)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(true)
}
