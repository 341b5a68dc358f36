use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use cliparr_catalog::{CatalogError, CatalogProvider, SonarrClient};
use serde_json::json;

const KEY: &str = "test-key";

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(KEY)
}

fn fake_sonarr() -> Router {
    Router::new()
        .route(
            "/sonarr/api/v3/series",
            get(|headers: HeaderMap| async move {
                if !authorized(&headers) {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(json!([
                    { "id": 7, "title": "Show A", "path": "/tv/showA", "seasons": [] },
                    { "id": 9, "title": "Show B", "path": "/tv/showB" }
                ]))
                .into_response()
            }),
        )
        .route(
            "/sonarr/api/v3/series/{id}",
            get(|Path(id): Path<i64>| async move {
                match id {
                    7 => Json(json!({ "id": 7, "title": "Show A", "path": "/tv/showA" }))
                        .into_response(),
                    500 => (StatusCode::INTERNAL_SERVER_ERROR, "database is locked")
                        .into_response(),
                    _ => StatusCode::NOT_FOUND.into_response(),
                }
            }),
        )
        .route(
            "/sonarr/api/v3/episode",
            get(
                |Query(q): Query<std::collections::HashMap<String, String>>| async move {
                    let series_id: i64 = q.get("seriesId").and_then(|s| s.parse().ok()).unwrap_or(0);
                    Json(json!([
                        { "id": 701, "seriesId": series_id, "seasonNumber": 1,
                          "episodeNumber": 1, "hasFile": true, "episodeFileId": 55 }
                    ]))
                },
            ),
        )
        .route(
            "/sonarr/api/v3/episodefile",
            get(|| async { Json(json!({ "not": "a list" })) }),
        )
        .route(
            "/sonarr/api/v3/system/status",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "appName": "Sonarr", "version": "3.0.10" }))
            }),
        )
}

async fn spawn_fake() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fake_sonarr()).await.unwrap();
    });
    format!("{addr}/sonarr")
}

fn client(base: &str, key: &str) -> SonarrClient {
    SonarrClient::new(base, key.to_string(), Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn lists_series_with_api_key_and_bare_host_url() {
    let base = spawn_fake().await;
    let series = client(&base, KEY).list_series().await.unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].title, "Show A");
    assert_eq!(series[1].path.as_deref(), Some("/tv/showB"));
}

#[tokio::test]
async fn wrong_api_key_is_unauthorized() {
    let base = spawn_fake().await;
    let err = client(&base, "nope").list_series().await.unwrap_err();
    assert!(matches!(err, CatalogError::Unauthorized(401)), "got {err:?}");
}

#[tokio::test]
async fn series_detail_status_mapping() {
    let base = spawn_fake().await;
    let c = client(&base, KEY);

    assert_eq!(c.get_series(7).await.unwrap().title, "Show A");
    assert!(matches!(c.get_series(8).await, Err(CatalogError::NotFound)));
    match c.get_series(500).await {
        Err(CatalogError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("locked"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn episodes_are_queried_by_series_id() {
    let base = spawn_fake().await;
    let episodes = client(&base, KEY).list_episodes(7).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].series_id, 7);
    assert_eq!(episodes[0].file_id(), Some(55));
}

#[tokio::test]
async fn unexpected_shape_is_a_decode_error() {
    let base = spawn_fake().await;
    let err = client(&base, KEY).list_episode_files(7).await.unwrap_err();
    assert!(matches!(err, CatalogError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_catalog_times_out() {
    let base = spawn_fake().await;
    let c = SonarrClient::new(&base, KEY.into(), Duration::from_millis(100)).unwrap();
    let err = c.system_status().await.unwrap_err();
    assert!(matches!(err, CatalogError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), KEY)
        .list_series()
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Unreachable(_)), "got {err:?}");
}
