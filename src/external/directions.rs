use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::DirectionsProvider;
use crate::{
    entities::{Coordinates, Route},
    error::{format_error, no_route_error, provider_error, upstream_status_error, Error},
};

/// Client for a directions endpoint answering `GET ?start=lng,lat&end=lng,lat`
/// with a GeoJSON feature collection (the route proxy, or the provider itself
/// when an API key is supplied).
#[derive(Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl DirectionsClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl DirectionsProvider for DirectionsClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_route(&self, start: Coordinates, end: Coordinates) -> Result<Route, Error> {
        let mut request = self.http.get(&self.endpoint);

        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key)]);
        }

        let res = request
            .query(&[("start", start.to_lng_lat())])
            .query(&[("end", end.to_lng_lat())])
            .send()
            .await?;

        read_directions(res).await
    }
}

pub(crate) async fn read_directions(res: reqwest::Response) -> Result<Route, Error> {
    let status = res.status().as_u16();
    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = res.text().await?;

    parse_directions(status, &content_type, &body)
}

/// JSON and any `+json` media type (the provider answers `application/geo+json`).
pub fn is_structured(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || essence.ends_with("+json")
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    features: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Default, Deserialize)]
struct Properties {
    #[serde(default)]
    summary: Summary,
}

// The provider leaves out zero distance and duration.
#[derive(Default, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

fn provider_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => error.to_string(),
        },
        _ => error.to_string(),
    }
}

pub fn parse_directions(status: u16, content_type: &str, body: &str) -> Result<Route, Error> {
    if !is_structured(content_type) {
        tracing::error!(
            "directions response is not JSON ({:?}): {:.200}",
            content_type,
            body
        );
        return Err(format_error(format!("content type {:?}", content_type)));
    }

    let data: FeatureCollection = serde_json::from_str(body)?;

    if let Some(error) = data.error {
        let message = provider_message(&error);
        tracing::error!("directions provider error: {}", message);
        return Err(provider_error(message));
    }

    if !(200..300).contains(&status) {
        return Err(upstream_status_error(status));
    }

    let feature = match data.features {
        Some(features) if !features.is_empty() => features.into_iter().next(),
        _ => None,
    };

    let feature: Feature = match feature {
        Some(feature) => serde_json::from_value(feature)?,
        None => {
            tracing::warn!("no route found between the selected points");
            return Err(no_route_error());
        }
    };

    let mut coordinates = Vec::with_capacity(feature.geometry.coordinates.len());

    for position in feature.geometry.coordinates {
        match position.as_slice() {
            [lng, lat, ..] => coordinates.push(Coordinates::new(*lat, *lng)),
            _ => return Err(format_error("position with fewer than two values")),
        }
    }

    let summary = feature.properties.summary;

    Ok(Route::new(summary.distance, summary.duration, coordinates))
}

#[test]
fn feature_collection_becomes_route() {
    let body = r#"{
        "type": "FeatureCollection",
        "features": [{
            "geometry": {"coordinates": [[-3.70, 40.41], [-3.69, 40.42]]},
            "properties": {"summary": {"distance": 1000, "duration": 120}}
        }]
    }"#;

    let route = parse_directions(200, "application/geo+json;charset=UTF-8", body).unwrap();

    assert_eq!(route.distance_meters, 1000.0);
    assert_eq!(route.duration_seconds, 120.0);
    assert_eq!(
        route.coordinates,
        vec![Coordinates::new(40.41, -3.70), Coordinates::new(40.42, -3.69)]
    );
}

#[test]
fn empty_features_mean_no_route() {
    use crate::error::ErrorKind;

    for body in [r#"{"features": []}"#, r#"{"type": "FeatureCollection"}"#] {
        let err = parse_directions(200, "application/json", body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoRoute);
    }
}

#[test]
fn error_field_is_a_provider_error() {
    use crate::error::ErrorKind;

    let err = parse_directions(200, "application/json", r#"{"error": "quota exceeded"}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert_eq!(err.message, "quota exceeded");

    let body = r#"{"error": {"code": 2010, "message": "Could not find routable point"}}"#;
    let err = parse_directions(404, "application/json", body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert_eq!(err.message, "Could not find routable point");
}

#[test]
fn markup_never_reaches_the_parser() {
    use crate::error::ErrorKind;

    // would be a valid route if it were parsed
    let body = r#"{"features": [{"geometry": {"coordinates": []}}]}"#;

    let err = parse_directions(200, "text/html; charset=utf-8", body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let err = parse_directions(200, "", body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn failing_status_without_error_field_is_transport() {
    use crate::error::ErrorKind;

    let err = parse_directions(503, "application/json", r#"{"features": []}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn malformed_feature_is_a_format_error() {
    use crate::error::ErrorKind;

    let body = r#"{"features": [{"geometry": {"coordinates": [[1.0]]}}]}"#;
    let err = parse_directions(200, "application/json", body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let err = parse_directions(200, "application/json", "{not json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn missing_summary_defaults_to_zero() {
    let body = r#"{"features": [{"geometry": {"coordinates": [[2.0, 1.0], [2.0, 1.0]]}}]}"#;
    let route = parse_directions(200, "application/json", body).unwrap();

    assert_eq!(route.distance_meters, 0.0);
    assert_eq!(route.duration_seconds, 0.0);
}

#[tokio::test]
async fn client_sends_lng_lat_query() {
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    let app = Router::new().route(
        "/route",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let start = params.get("start").cloned().unwrap_or_default();
            let end = params.get("end").cloned().unwrap_or_default();

            match (start.as_str(), end.as_str()) {
                ("2,1", "4,3") => Json(json!({
                    "features": [{
                        "geometry": {"coordinates": [[2.0, 1.0], [4.0, 3.0]]},
                        "properties": {"summary": {"distance": 1000, "duration": 120}}
                    }]
                })),
                _ => Json(json!({ "error": format!("unexpected {} {}", start, end) })),
            }
        }),
    );
    let addr = crate::testing::spawn_app(app).await;

    let client =
        DirectionsClient::new(format!("http://{}/route", addr), None, Duration::from_secs(5))
            .unwrap();
    let route = client
        .fetch_route(Coordinates::new(1.0, 2.0), Coordinates::new(3.0, 4.0))
        .await
        .unwrap();

    assert_eq!(
        route.coordinates,
        vec![Coordinates::new(1.0, 2.0), Coordinates::new(3.0, 4.0)]
    );
}

#[tokio::test]
async fn client_rejects_html_pages() {
    use crate::error::ErrorKind;
    use axum::{response::Html, routing::get, Router};

    let app = Router::new().route(
        "/route",
        get(|| async { Html("<html><body>Deployment not found</body></html>") }),
    );
    let addr = crate::testing::spawn_app(app).await;

    let client =
        DirectionsClient::new(format!("http://{}/route", addr), None, Duration::from_secs(5))
            .unwrap();
    let err = client
        .fetch_route(Coordinates::new(1.0, 2.0), Coordinates::new(3.0, 4.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Format);
}

#[tokio::test]
async fn client_times_out() {
    use crate::error::ErrorKind;
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    let app = Router::new().route(
        "/route",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "features": [] }))
        }),
    );
    let addr = crate::testing::spawn_app(app).await;

    let client = DirectionsClient::new(
        format!("http://{}/route", addr),
        None,
        Duration::from_millis(100),
    )
    .unwrap();
    let err = client
        .fetch_route(Coordinates::new(1.0, 2.0), Coordinates::new(3.0, 4.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.is_route_unavailable());
}
