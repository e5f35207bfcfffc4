use axum::extract::{rejection::JsonRejection, Extension, Json};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;

use crate::entities::{Marker, MarkerDraft};
use crate::error::{validation_error, Error};
use crate::server::DynAPI;

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<Marker>>, Error> {
    let markers = api.list_markers().await?;

    Ok(markers.into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    payload: Result<Json<MarkerDraft>, JsonRejection>,
) -> Result<Json<Marker>, Error> {
    let Json(draft) = payload.map_err(|err| validation_error(err.to_string()))?;
    let marker = api.create_marker(draft).await?;

    Ok(marker.into())
}

pub async fn export(Extension(api): Extension<DynAPI>) -> Result<impl IntoResponse, Error> {
    let body = api.export_markers().await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        Utc::now().format("markers-%Y%m%d-%H%M%S.json")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
