use crate::error::{AppError, Result};
use crate::extract::{Json, Owner, Path, Query};
use crate::model::{LinkListResponse, LinkResponse};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use linkhop_core::{LinkId, ShortCode};
use linkhop_shortener::{CreateLink, ListFilter, UpdateLink};

fn parse_id(raw: &str) -> Result<LinkId> {
    raw.parse::<u64>()
        .map(LinkId::new)
        .map_err(|_| AppError::NotFound)
}

pub async fn create_link_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(request): Json<CreateLink>,
) -> Result<(StatusCode, axum::Json<LinkResponse>)> {
    let link = state.links().create(&owner, request).await?;
    Ok((
        StatusCode::CREATED,
        axum::Json(LinkResponse::from_link(link, state.base_url())),
    ))
}

/// Lists the owner's links, optionally narrowed by `q`, `visibility` and `tag`.
pub async fn list_links_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(filter): Query<ListFilter>,
) -> Result<axum::Json<LinkListResponse>> {
    let listing = state.links().list(&owner, &filter).await?;
    Ok(axum::Json(LinkListResponse::from_listing(
        listing,
        state.base_url(),
    )))
}

pub async fn get_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<axum::Json<LinkResponse>> {
    let code = ShortCode::new(code).map_err(|_| AppError::NotFound)?;
    let link = state.links().get(&owner, &code).await?;
    Ok(axum::Json(LinkResponse::from_link(link, state.base_url())))
}

pub async fn update_link_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(request): Json<UpdateLink>,
) -> Result<axum::Json<LinkResponse>> {
    let id = parse_id(&id)?;
    let link = state.links().update(&owner, id, request).await?;
    Ok(axum::Json(LinkResponse::from_link(link, state.base_url())))
}

pub async fn delete_link_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<axum::Json<LinkResponse>> {
    let id = parse_id(&id)?;
    let link = state.links().delete(&owner, id).await?;
    Ok(axum::Json(LinkResponse::from_link(link, state.base_url())))
}
