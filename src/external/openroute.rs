use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{directions::read_directions, DirectionsProvider};
use crate::{
    entities::{Coordinates, Route},
    error::Error,
};

/// OpenRouteService directions API. Holds the API key, which is why the
/// browser-facing side goes through the route proxy instead.
#[derive(Clone)]
pub struct OpenRouteService {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    profile: String,
}

impl OpenRouteService {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        profile: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
            profile: profile.into(),
        })
    }

    fn request(&self, start: Coordinates, end: Coordinates) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v2/directions/{}",
            self.api_base.trim_end_matches('/'),
            self.profile
        );

        self.http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(&[("start", start.to_lng_lat())])
            .query(&[("end", end.to_lng_lat())])
    }

    /// Raw provider answer, error payloads included.
    #[tracing::instrument(skip(self))]
    pub async fn directions(&self, start: Coordinates, end: Coordinates) -> Result<Value, Error> {
        let res = self.request(start, end).send().await?;

        tracing::info!("directions provider answered {}", res.status());

        let data: Value = res.json().await?;

        Ok(data)
    }
}

#[async_trait]
impl DirectionsProvider for OpenRouteService {
    #[tracing::instrument(skip(self))]
    async fn fetch_route(&self, start: Coordinates, end: Coordinates) -> Result<Route, Error> {
        let res = self.request(start, end).send().await?;

        read_directions(res).await
    }
}

#[tokio::test]
async fn profile_and_key_reach_the_provider() {
    use axum::{
        extract::{Path, Query},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    let app = Router::new().route(
        "/v2/directions/:profile",
        get(
            |Path(profile): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "profile": profile,
                    "api_key": params.get("api_key"),
                    "start": params.get("start"),
                    "end": params.get("end"),
                }))
            },
        ),
    );
    let addr = crate::testing::spawn_app(app).await;

    let service = OpenRouteService::new(
        format!("http://{}/", addr),
        "secret",
        "driving-car",
        Duration::from_secs(5),
    )
    .unwrap();

    let data = service
        .directions(Coordinates::new(40.0, -3.0), Coordinates::new(41.0, -4.0))
        .await
        .unwrap();

    assert_eq!(data["profile"], "driving-car");
    assert_eq!(data["api_key"], "secret");
    assert_eq!(data["start"], "-3,40");
    assert_eq!(data["end"], "-4,41");
}
