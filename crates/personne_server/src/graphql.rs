//! GraphQL surface over the personne service.
//!
//! # Responsibility
//! - Expose `allPersonnes`, `personne` and `searchPersonnes` queries.
//! - Expose create/update/delete and `resetTable` mutations.
//!
//! # Invariants
//! - Resolver errors carry the REST error code in `extensions.code`.
//! - `resetTable` checks the admin token forwarded from the HTTP header.

use crate::error::ApiError;
use crate::state::{AppState, Database, ResetGate, ADMIN_TOKEN_HEADER};
use async_graphql::{
    Context, EmptySubscription, InputObject, Object, Request, Response, Schema, SimpleObject,
};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use personne_core::{Personne, PersonneId, PersonneInput, PersonneSearch};

pub type PersonneSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Admin token presented by the caller, if any.
struct AdminToken(String);

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Personne")]
pub struct PersonneObject {
    pub id: PersonneId,
    pub nom: String,
    pub prenom: String,
    pub adresse: Option<String>,
    pub telephone: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

impl From<Personne> for PersonneObject {
    fn from(value: Personne) -> Self {
        Self {
            id: value.id,
            nom: value.nom,
            prenom: value.prenom,
            adresse: value.adresse,
            telephone: value.telephone,
            date_naissance: value.date_naissance,
        }
    }
}

#[derive(Debug, Clone, InputObject)]
#[graphql(name = "PersonneInput")]
pub struct PersonneInputObject {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub adresse: Option<String>,
    pub telephone: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

impl From<PersonneInputObject> for PersonneInput {
    fn from(value: PersonneInputObject) -> Self {
        Self {
            nom: value.nom,
            prenom: value.prenom,
            adresse: value.adresse,
            telephone: value.telephone,
            date_naissance: value.date_naissance,
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every stored person, in identifier order.
    async fn all_personnes(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<PersonneObject>> {
        let db = ctx.data::<Database>()?;
        let personnes = db
            .run(|service| service.find_all())
            .await
            .map_err(ApiError::into_graphql)?;
        Ok(personnes.into_iter().map(PersonneObject::from).collect())
    }

    async fn personne(
        &self,
        ctx: &Context<'_>,
        id: PersonneId,
    ) -> async_graphql::Result<PersonneObject> {
        let db = ctx.data::<Database>()?;
        let personne = db
            .run(move |service| service.find_by_id(id))
            .await
            .map_err(ApiError::into_graphql)?;
        Ok(personne.into())
    }

    /// Combined fragment search; omitted arguments match everything.
    async fn search_personnes(
        &self,
        ctx: &Context<'_>,
        nom: Option<String>,
        prenom: Option<String>,
        telephone: Option<String>,
    ) -> async_graphql::Result<Vec<PersonneObject>> {
        let db = ctx.data::<Database>()?;
        let query = PersonneSearch {
            nom,
            prenom,
            telephone,
        };
        let found = db
            .run(move |service| service.search(&query))
            .await
            .map_err(ApiError::into_graphql)?;
        Ok(found.into_iter().map(PersonneObject::from).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_personne(
        &self,
        ctx: &Context<'_>,
        input: PersonneInputObject,
    ) -> async_graphql::Result<PersonneObject> {
        let db = ctx.data::<Database>()?;
        let input = PersonneInput::from(input);
        let created = db
            .run(move |service| service.create(&input))
            .await
            .map_err(ApiError::into_graphql)?;
        Ok(created.into())
    }

    async fn update_personne(
        &self,
        ctx: &Context<'_>,
        id: PersonneId,
        input: PersonneInputObject,
    ) -> async_graphql::Result<PersonneObject> {
        let db = ctx.data::<Database>()?;
        let input = PersonneInput::from(input);
        let updated = db
            .run(move |service| service.update(id, &input))
            .await
            .map_err(ApiError::into_graphql)?;
        Ok(updated.into())
    }

    async fn delete_personne(&self, ctx: &Context<'_>, id: PersonneId) -> async_graphql::Result<bool> {
        let db = ctx.data::<Database>()?;
        db.run(move |service| service.delete(id))
            .await
            .map_err(ApiError::into_graphql)?;
        Ok(true)
    }

    /// Deletes every person and restarts identifiers at 1.
    async fn reset_table(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        let gate = ctx.data::<ResetGate>()?;
        let presented = ctx.data_opt::<AdminToken>().map(|token| token.0.as_str());
        gate.check(presented).map_err(ApiError::into_graphql)?;

        let db = ctx.data::<Database>()?;
        db.run(|service| service.reset_table())
            .await
            .map_err(ApiError::into_graphql)?;
        Ok(true)
    }
}

pub fn build_schema(db: Database, reset_gate: ResetGate) -> PersonneSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .data(reset_gate)
        .finish()
}

/// `POST /graphql`.
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<Request>,
) -> Json<Response> {
    let request = match headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(token) => request.data(AdminToken(token.to_string())),
        None => request,
    };
    Json(state.schema.execute(request).await)
}
