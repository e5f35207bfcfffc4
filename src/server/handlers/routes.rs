use axum::extract::{Extension, Json, Query};
use serde::Deserialize;
use serde_json::Value;

use crate::entities::Coordinates;
use crate::error::{validation_error, Error};
use crate::server::DynAPI;

#[derive(Deserialize)]
pub struct FindParams {
    start: Option<String>,
    end: Option<String>,
}

fn endpoints(params: &FindParams) -> Option<(Coordinates, Coordinates)> {
    let start: Coordinates = params.start.as_deref()?.parse().ok()?;
    let end: Coordinates = params.end.as_deref()?.parse().ok()?;

    Some((start, end))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<FindParams>,
) -> Result<Json<Value>, Error> {
    let (start, end) = endpoints(&params)
        .ok_or_else(|| validation_error("start and end query params required"))?;

    let data = api.find_route(start, end).await?;

    Ok(data.into())
}
