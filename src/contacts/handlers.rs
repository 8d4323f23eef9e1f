use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{auth::jwt::CurrentUser, state::AppState};

use super::dto::{ContactPayload, ContactResponse, Pagination, SearchQuery};
use super::repo::Contact;

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts/", get(list_contacts).post(create_contact))
        .route("/contacts/search/", get(search_contacts))
        .route("/contacts/upcoming_birthdays/", get(upcoming_birthdays))
        .route(
            "/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[instrument(skip(state, user, payload), fields(user_id = %user.0.id))]
pub async fn create_contact(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<ContactResponse>, (StatusCode, String)> {
    let contact = Contact::create(&state.db, user.0.id, &payload)
        .await
        .map_err(internal)?;
    info!(contact_id = %contact.id, "contact created");
    Ok(Json(contact.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<ContactResponse>>, (StatusCode, String)> {
    let contacts = Contact::list_by_owner(&state.db, user.0.id, p.skip, p.limit)
        .await
        .map_err(internal)?;
    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn get_contact(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactResponse>, (StatusCode, String)> {
    let contact = Contact::get_scoped(&state.db, user.0.id, id)
        .await
        .map_err(internal)?
        .ok_or(not_found())?;
    Ok(Json(contact.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.0.id))]
pub async fn update_contact(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<ContactResponse>, (StatusCode, String)> {
    let contact = Contact::update_scoped(&state.db, user.0.id, id, &payload)
        .await
        .map_err(internal)?
        .ok_or(not_found())?;
    info!(contact_id = %contact.id, "contact updated");
    Ok(Json(contact.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn delete_contact(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactResponse>, (StatusCode, String)> {
    let contact = Contact::delete_scoped(&state.db, user.0.id, id)
        .await
        .map_err(internal)?
        .ok_or(not_found())?;
    info!(contact_id = %contact.id, "contact deleted");
    Ok(Json(contact.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn search_contacts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<ContactResponse>>, (StatusCode, String)> {
    let contacts = Contact::search(&state.db, user.0.id, &q.query)
        .await
        .map_err(internal)?;
    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn upcoming_birthdays(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ContactResponse>>, (StatusCode, String)> {
    let today = OffsetDateTime::now_utc().date();
    let contacts = Contact::upcoming_birthdays(&state.db, user.0.id, today)
        .await
        .map_err(internal)?;
    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Contact not found".into())
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
