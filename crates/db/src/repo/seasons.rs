use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SeasonRow {
    pub id: i64,
    pub show_id: i64,
    pub season_number: i64,
    pub monitored: bool,
}

pub async fn list_for_show(pool: &SqlitePool, show_id: i64) -> Result<Vec<SeasonRow>, sqlx::Error> {
    let rows: Vec<(i64, i64, i64, bool)> = sqlx::query_as(
        "SELECT id, show_id, season_number, monitored FROM seasons \
         WHERE show_id = ? ORDER BY season_number",
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, show_id, season_number, monitored)| SeasonRow {
            id,
            show_id,
            season_number,
            monitored,
        })
        .collect())
}
