use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct EpisodeFileRow {
    pub id: i64,
    pub file_path: String,
    pub size: i64,
    pub quality: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EpisodeRow {
    pub id: i64,
    pub season_id: i64,
    pub episode_number: i64,
    pub title: Option<String>,
    pub sonarr_episode_id: Option<i64>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub has_file: bool,
    pub file: Option<EpisodeFileRow>,
}

/// All episodes of a show with their file (if any), ordered by season then episode.
pub async fn list_for_show(pool: &SqlitePool, show_id: i64) -> Result<Vec<EpisodeRow>, sqlx::Error> {
    let rows: Vec<(
        i64,
        i64,
        i64,
        Option<String>,
        Option<i64>,
        Option<String>,
        Option<String>,
        bool,
        Option<i64>,
        Option<String>,
        Option<i64>,
        Option<String>,
    )> = sqlx::query_as(
        "SELECT e.id, e.season_id, e.episode_number, e.title, e.sonarr_episode_id, \
         e.overview, e.air_date, e.has_file, f.id, f.file_path, f.size, f.quality \
         FROM episodes e \
         JOIN seasons se ON e.season_id = se.id \
         LEFT JOIN episode_files f ON f.episode_id = e.id \
         WHERE se.show_id = ? \
         ORDER BY se.season_number, e.episode_number",
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| EpisodeRow {
            id: r.0,
            season_id: r.1,
            episode_number: r.2,
            title: r.3,
            sonarr_episode_id: r.4,
            overview: r.5,
            air_date: r.6,
            has_file: r.7,
            file: match (r.8, r.9) {
                (Some(id), Some(file_path)) => Some(EpisodeFileRow {
                    id,
                    file_path,
                    size: r.10.unwrap_or(0),
                    quality: r.11,
                }),
                _ => None,
            },
        })
        .collect())
}
