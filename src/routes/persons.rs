//! Handlers for `/persons/` endpoints.
//!
//! | Method   | Path                        | Notes |
//! |----------|-----------------------------|-------|
//! | `GET`    | `/persons/`                 | newest first |
//! | `POST`   | `/persons/`                 | 201 with `Location` |
//! | `GET`    | `/persons/:id/`             | 404 if not found |
//! | `PUT`    | `/persons/:id/`             | every required field |
//! | `PATCH`  | `/persons/:id/`             | any subset of fields |
//! | `DELETE` | `/persons/:id/`             | 204 |
//! | `GET`    | `/persons/search/?q=<text>` | 400 without `q` |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::PersonStore;
use crate::structs::api::{self, PersonBody, SearchPersonQuery};
use crate::structs::person::{Person, PersonFields};

/// An id that is not a UUID can't name a stored record.
fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound)
}

async fn find_person<S: PersonStore>(store: &S, id: Uuid) -> Result<Person, ApiError> {
    store
        .get(id)
        .await
        .map_err(ApiError::store)?
        .ok_or(ApiError::NotFound)
}

async fn save_person<S: PersonStore>(
    store: &S,
    id: Uuid,
    fields: PersonFields,
) -> Result<Json<PersonBody>, ApiError> {
    let person = store
        .update(id, fields)
        .await
        .map_err(ApiError::store)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(person.into()))
}

#[tracing::instrument(name = "List persons", skip(store))]
pub async fn list_persons<S: PersonStore>(
    State(store): State<Arc<S>>,
) -> Result<Json<Vec<PersonBody>>, ApiError> {
    let persons = store.list().await.map_err(ApiError::store)?;
    Ok(Json(persons.into_iter().map(PersonBody::from).collect()))
}

#[tracing::instrument(name = "Retrieve person", skip(store))]
pub async fn get_person<S: PersonStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<PersonBody>, ApiError> {
    let person = find_person(&*store, parse_id(&id)?).await?;
    Ok(Json(person.into()))
}

#[tracing::instrument(name = "Create person", skip(store, body))]
pub async fn create_person<S: PersonStore>(
    State(store): State<Arc<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let fields = api::fields_from_json(&body)?;

    let person = store.insert(fields).await.map_err(ApiError::store)?;
    tracing::info!(person_id = %person.id, "created {person}");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/persons/{}/", person.id))],
        Json(PersonBody::from(person)),
    ))
}

#[tracing::instrument(name = "Update person", skip(store, body))]
pub async fn update_person<S: PersonStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PersonBody>, ApiError> {
    let id = parse_id(&id)?;
    let current = find_person(&*store, id).await?;

    let Json(body) = body?;
    let replacement = api::replacement_from_json(&body)?;

    save_person(&*store, id, replacement.apply(&current.fields)).await
}

#[tracing::instrument(name = "Partially update person", skip(store, body))]
pub async fn partial_update_person<S: PersonStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PersonBody>, ApiError> {
    let id = parse_id(&id)?;
    let current = find_person(&*store, id).await?;

    let Json(body) = body?;
    let patch = api::patch_from_json(&body)?;

    save_person(&*store, id, patch.apply(&current.fields)).await
}

#[tracing::instrument(name = "Delete person", skip(store))]
pub async fn delete_person<S: PersonStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if store.delete(id).await.map_err(ApiError::store)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[tracing::instrument(name = "Search persons", skip(store))]
pub async fn search_persons<S: PersonStore>(
    State(store): State<Arc<S>>,
    Query(query): Query<SearchPersonQuery>,
) -> Result<Json<Vec<PersonBody>>, ApiError> {
    let term = match query.q.as_deref() {
        Some(term) if !term.is_empty() => term,
        _ => return Err(ApiError::MissingParameter("q")),
    };

    let persons = store.search(term).await.map_err(ApiError::store)?;
    Ok(Json(persons.into_iter().map(PersonBody::from).collect()))
}
