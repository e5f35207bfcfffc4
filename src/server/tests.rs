use super::router;

use axum::{
    extract::{Path, Query},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::external::openroute::OpenRouteService;
use crate::store::MemoryMarkerStore;
use crate::testing::spawn_app;

/// Stand-in for the directions provider: routes anything except a start at
/// `0,0`, which gets the provider's error payload.
async fn spawn_provider() -> String {
    let app = Router::new().route(
        "/v2/directions/:profile",
        get(
            |Path(_profile): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                match params.get("start").map(String::as_str) {
                    Some("0,0") => Json(json!({
                        "error": {"code": 2010, "message": "Could not find routable point"}
                    })),
                    _ => Json(json!({
                        "type": "FeatureCollection",
                        "features": [{
                            "geometry": {"coordinates": [[-3.70, 40.41], [-3.69, 40.42]]},
                            "properties": {"summary": {"distance": 1000, "duration": 120}}
                        }]
                    })),
                }
            },
        ),
    );

    format!("http://{}", spawn_app(app).await)
}

async fn spawn_service(provider_base: String) -> String {
    let directions =
        OpenRouteService::new(provider_base, "key", "driving-car", Duration::from_secs(2)).unwrap();
    let engine = Engine::new(Arc::new(MemoryMarkerStore::new()), directions);

    format!("http://{}", spawn_app(router(engine)).await)
}

#[tokio::test]
async fn route_requires_start_and_end() {
    let base = spawn_service(spawn_provider().await).await;

    for query in ["", "?start=-3.70,40.41", "?start=abc&end=-3.69,40.42"] {
        let res = reqwest::get(format!("{}/route{}", base, query)).await.unwrap();
        assert_eq!(res.status().as_u16(), 400);

        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "start and end query params required");
    }
}

#[tokio::test]
async fn route_passes_provider_body_through() {
    let base = spawn_service(spawn_provider().await).await;

    let res = reqwest::get(format!("{}/route?start=-3.70,40.41&end=-3.69,40.42", base))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["features"][0]["properties"]["summary"]["distance"], 1000);

    let res = reqwest::get(format!("{}/route?start=0,0&end=-3.69,40.42", base))
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Could not find routable point");
}

#[tokio::test]
async fn unreachable_provider_answers_500() {
    let base = spawn_service("http://127.0.0.1:9".into()).await;

    let res = reqwest::get(format!("{}/route?start=-3.70,40.41&end=-3.69,40.42", base))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 500);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Failed to fetch route");
}

#[tokio::test]
async fn client_follows_the_proxy() {
    use crate::entities::Coordinates;
    use crate::external::{directions::DirectionsClient, DirectionsProvider};

    let base = spawn_service(spawn_provider().await).await;
    let client =
        DirectionsClient::new(format!("{}/route", base), None, Duration::from_secs(2)).unwrap();

    let route = client
        .fetch_route(Coordinates::new(40.41, -3.70), Coordinates::new(40.42, -3.69))
        .await
        .unwrap();
    assert_eq!(route.distance_meters, 1000.0);
    assert_eq!(route.coordinates[0], Coordinates::new(40.41, -3.70));

    let err = client
        .fetch_route(Coordinates::new(0.0, 0.0), Coordinates::new(40.42, -3.69))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Could not find routable point");
}

#[tokio::test]
async fn markers_round_trip_over_http() {
    let base = spawn_service(spawn_provider().await).await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("{}/markers", base))
        .json(&json!({"lat": 40.41, "lng": -3.70, "title": "Sol", "category": "Beach"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let res = http
        .post(format!("{}/markers", base))
        .json(&json!({"lat": 40.41, "lng": -3.70, "title": "Sol", "category": "Subway"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["category"], "Subway");

    let listed: Value = http
        .get(format!("{}/markers", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);

    let res = http
        .get(format!("{}/markers/export", base))
        .send()
        .await
        .unwrap();
    let disposition = res
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment;"));

    let exported: Value = res.json().await.unwrap();
    assert_eq!(exported, listed);
}

#[tokio::test]
async fn malformed_marker_body_gets_json_error() {
    let base = spawn_service(spawn_provider().await).await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("{}/markers", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 101);
    assert!(body["error"].is_string());

    let res = http
        .post(format!("{}/markers", base))
        .json(&json!({"title": "no coordinates", "category": "Parc"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 101);
}
