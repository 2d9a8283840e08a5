//! REST surface over the personne service.
//!
//! # Responsibility
//! - Expose create/read-one/read-all/update/delete and search under
//!   `/api/personnes`.
//! - Gate the table reset behind the admin token header.

use crate::error::ApiError;
use crate::state::{AppState, ADMIN_TOKEN_HEADER};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use personne_core::{core_version, Personne, PersonneId, PersonneInput, PersonneSearch};
use serde::{Deserialize, Serialize};

/// Liveness payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query string of `GET /api/personnes/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub telephone: Option<String>,
}

impl From<SearchParams> for PersonneSearch {
    fn from(value: SearchParams) -> Self {
        Self {
            nom: value.nom,
            prenom: value.prenom,
            telephone: value.telephone,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/personnes",
            get(list_personnes)
                .post(create_personne)
                .delete(reset_table),
        )
        .route("/api/personnes/search", get(search_personnes))
        .route(
            "/api/personnes/{id}",
            get(get_personne)
                .put(update_personne)
                .delete(delete_personne),
        )
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: core_version().to_string(),
    })
}

async fn list_personnes(State(state): State<AppState>) -> Result<Json<Vec<Personne>>, ApiError> {
    let personnes = state.db.run(|service| service.find_all()).await?;
    Ok(Json(personnes))
}

async fn create_personne(
    State(state): State<AppState>,
    Json(input): Json<PersonneInput>,
) -> Result<(StatusCode, Json<Personne>), ApiError> {
    let created = state.db.run(move |service| service.create(&input)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn search_personnes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Personne>>, ApiError> {
    let query = PersonneSearch::from(params);
    let found = state.db.run(move |service| service.search(&query)).await?;
    Ok(Json(found))
}

async fn get_personne(
    State(state): State<AppState>,
    Path(id): Path<PersonneId>,
) -> Result<Json<Personne>, ApiError> {
    let personne = state.db.run(move |service| service.find_by_id(id)).await?;
    Ok(Json(personne))
}

async fn update_personne(
    State(state): State<AppState>,
    Path(id): Path<PersonneId>,
    Json(input): Json<PersonneInput>,
) -> Result<Json<Personne>, ApiError> {
    let updated = state
        .db
        .run(move |service| service.update(id, &input))
        .await?;
    Ok(Json(updated))
}

async fn delete_personne(
    State(state): State<AppState>,
    Path(id): Path<PersonneId>,
) -> Result<StatusCode, ApiError> {
    state.db.run(move |service| service.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_table(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    state.reset_gate.check(presented)?;
    state.db.run(|service| service.reset_table()).await?;
    Ok(StatusCode::NO_CONTENT)
}
